//! Core data model: package settings, layout, and the static translation tables.

pub mod arch;
pub mod dialect;
pub mod package;
pub mod platform;
pub mod settings;

pub use arch::{resolve_arch, CpuTriple, Endianness};
pub use dialect::resolve_dialect;
pub use package::{PackageContext, PackageLayout, PhaseFlags};
pub use platform::{cross_building, Platform};
pub use settings::{Settings, SettingsView};
