//! Meson build orchestration.
//!
//! This module turns package settings into Meson option plans, cross
//! files and environment overlays, and drives the configure, build,
//! install and test phases.

pub mod activation;
pub mod cross_file;
pub mod env;
pub mod errors;
pub mod meson;
pub mod options;
pub mod version;

pub use activation::{ToolchainActivation, VcvarsActivation};
pub use cross_file::{CrossFile, MachineDescriptor, ToolchainEnv};
pub use env::{EnvScope, EnvironmentOverlay};
pub use errors::{ErrorKind, MesonError};
pub use meson::{ConfigureArgs, LifecycleState, Meson, MesonConfig, PhaseOutcome};
pub use options::{plan_options, OptionPlan};
pub use version::{get_version, version_command};
