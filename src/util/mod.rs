//! Shared utilities

pub mod config;
pub mod diagnostic;
pub mod fs;
pub mod process;
pub mod shell;

pub use config::{Config, Profile};
pub use diagnostic::Diagnostic;
pub use process::{CommandLine, DryRunRunner, ProcessOutput, ProcessRunner, SystemRunner};
pub use shell::Shell;
