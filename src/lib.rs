//! harbour-meson - Meson build orchestration for Harbour packages
//!
//! This crate translates a package's build settings (OS, architecture,
//! compiler, C++ dialect, build type, link mode) into Meson invocations,
//! generates cross files when the host and build machines differ, and
//! runs the configure → build → install → test lifecycle.

pub mod builder;
pub mod core;
pub mod util;

/// Test utilities and mocks for harbour-meson unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a scripted process runner, a fake toolchain
/// activation and package fixtures.
#[cfg(test)]
pub mod test_support;

pub use builder::{ConfigureArgs, Meson, MesonConfig, MesonError, PhaseOutcome};
pub use core::{PackageContext, PackageLayout, Settings};
