//! Meson adapter error types and diagnostics.

use std::path::PathBuf;

use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// Broad category of a [`MesonError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad directories, missing prefix, unresolvable settings
    Configuration,
    /// External process failed to launch or exited non-zero
    Execution,
    /// Requested something this adapter does not drive
    UnsupportedFeature,
    /// Could not determine the Meson version
    Probe,
}

/// Error raised by the Meson adapter.
#[derive(Debug, Error)]
pub enum MesonError {
    #[error("use either `source_folder`/`build_folder` or `source_dir`/`build_dir`, not both")]
    InvalidDirectoryConfiguration,

    #[error("failed to create directory `{}`", path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("setting `{0}` is required for cross-compilation")]
    MissingSetting(String),

    #[error("unknown architecture `{0}`")]
    UnknownArchitecture(String),

    #[error("unsupported C++ standard `{0}`")]
    UnsupportedDialect(String),

    #[error("'prefix' not defined for install: no package folder is known")]
    MissingOutputDirectory,

    #[error("failed to write cross file `{}`", path.display())]
    CrossFileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("meson configuration failed: `{command}`")]
    ConfigurationFailed { command: String, output: String },

    #[error("command failed: `{command}`")]
    ExecutionFailed { command: String, output: String },

    #[error("build only supported with 'ninja' backend, got '{0}'")]
    UnsupportedBackend(String),

    #[error("failed to set up toolchain environment: {0}")]
    ToolchainActivation(String),

    #[error("error retrieving Meson version: {0}")]
    VersionProbe(String),
}

impl MesonError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MesonError::InvalidDirectoryConfiguration
            | MesonError::DirectoryCreation { .. }
            | MesonError::MissingSetting(_)
            | MesonError::UnknownArchitecture(_)
            | MesonError::UnsupportedDialect(_)
            | MesonError::MissingOutputDirectory
            | MesonError::CrossFileWrite { .. } => ErrorKind::Configuration,
            MesonError::ConfigurationFailed { .. }
            | MesonError::ExecutionFailed { .. }
            | MesonError::ToolchainActivation(_) => ErrorKind::Execution,
            MesonError::UnsupportedBackend(_) => ErrorKind::UnsupportedFeature,
            MesonError::VersionProbe(_) => ErrorKind::Probe,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());

        match self {
            MesonError::InvalidDirectoryConfiguration => diag.with_suggestion(
                "Pass relative `source_folder`/`build_folder` paths and drop the legacy `source_dir`/`build_dir`",
            ),
            MesonError::DirectoryCreation { path, source } => diag
                .with_context(source.to_string())
                .with_location(path.clone())
                .with_suggestion("Check that the parent directory exists and is writable"),
            MesonError::MissingSetting(name) => diag.with_suggestion(format!(
                "Add `{}` to the [settings] table of the profile",
                name
            )),
            MesonError::UnknownArchitecture(_) => diag.with_suggestion(
                "Use one of the architectures of the settings model (x86_64, armv8, ...)",
            ),
            MesonError::UnsupportedDialect(_) => diag
                .with_context("supported: 98, 11, 14, 17, 20 and their gnu variants"),
            MesonError::MissingOutputDirectory => diag
                .with_suggestion("Make sure `package_folder` is defined in the layout")
                .with_suggestion("Or pass an explicit prefix: `-D prefix=/path`"),
            MesonError::CrossFileWrite { path, source } => diag
                .with_context(source.to_string())
                .with_location(path.clone()),
            MesonError::ConfigurationFailed { output, .. }
            | MesonError::ExecutionFailed { output, .. } => {
                let mut diag = diag;
                for line in output.lines().filter(|l| !l.trim().is_empty()) {
                    diag = diag.with_context(line.to_string());
                }
                diag
            }
            MesonError::UnsupportedBackend(_) => diag
                .with_suggestion("Use `--meson` to run `meson install`/`meson test` directly")
                .with_suggestion("Or set `backend = \"ninja\"` under [meson]"),
            MesonError::ToolchainActivation(_) => {
                diag.with_suggestion("Run from a Visual Studio developer prompt")
            }
            MesonError::VersionProbe(_) => diag
                .with_suggestion("Install Meson: pip install meson, or https://mesonbuild.com/Getting-meson.html"),
        }
    }
}
