//! The package being built: its settings, folders, and enabled phases.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::settings::Settings;

/// Folders the surrounding package manager assigned to the package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageLayout {
    /// Where the sources live
    pub source_folder: PathBuf,
    /// Where out-of-tree build files go
    pub build_folder: PathBuf,
    /// Where generated files (pkg-config `.pc` files) are installed
    pub install_folder: PathBuf,
    /// Install prefix of the final package, if one is known
    pub package_folder: Option<PathBuf>,
    /// Whether the package is being built inside the local package cache
    pub in_local_cache: bool,
}

impl PackageLayout {
    /// A layout rooted at `root` with `build/` holding build and install files.
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        PackageLayout {
            build_folder: root.join("build"),
            install_folder: root.join("build"),
            source_folder: root,
            package_folder: None,
            in_local_cache: false,
        }
    }

    pub fn with_package_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.package_folder = Some(folder.into());
        self
    }
}

/// Which lifecycle phases the caller wants to run.
///
/// A disabled phase is skipped without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseFlags {
    pub configure: bool,
    pub build: bool,
    pub install: bool,
    pub test: bool,
}

impl Default for PhaseFlags {
    fn default() -> Self {
        PhaseFlags::all()
    }
}

impl PhaseFlags {
    pub fn all() -> Self {
        PhaseFlags {
            configure: true,
            build: true,
            install: true,
            test: true,
        }
    }

    pub fn none() -> Self {
        PhaseFlags {
            configure: false,
            build: false,
            install: false,
            test: false,
        }
    }
}

/// Everything the Meson adapter reads about the package.
#[derive(Debug, Clone, Default)]
pub struct PackageContext {
    /// Host settings (`os`, `arch`, `compiler`, `build_type`, ...)
    pub settings: Settings,
    /// Package options (`shared`, `fPIC`, ...)
    pub options: Settings,
    /// Settings of the machine running the build, when declared separately
    pub settings_build: Option<Settings>,
    pub layout: PackageLayout,
    pub phases: PhaseFlags,
}

impl PackageContext {
    pub fn new(settings: Settings, options: Settings, layout: PackageLayout) -> Self {
        PackageContext {
            settings,
            options,
            settings_build: None,
            layout,
            phases: PhaseFlags::all(),
        }
    }

    pub fn with_settings_build(mut self, settings_build: Settings) -> Self {
        self.settings_build = Some(settings_build);
        self
    }

    pub fn with_phases(mut self, phases: PhaseFlags) -> Self {
        self.phases = phases;
        self
    }
}
