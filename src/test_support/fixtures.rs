//! Test fixtures for common adapter scenarios.

use std::path::Path;
use std::sync::Arc;

use crate::builder::cross_file::ToolchainEnv;
use crate::builder::env::EnvironmentOverlay;
use crate::builder::meson::MesonConfig;
use crate::core::settings::Settings;
use crate::core::{PackageContext, PackageLayout, Platform};
use crate::util::shell::Shell;

/// Host settings of a Linux x86_64 gcc release build.
pub fn linux_gcc_settings() -> Settings {
    Settings::new()
        .with("os", "Linux")
        .with("arch", "x86_64")
        .with("compiler", "gcc")
        .with("compiler.version", "12")
        .with("build_type", "Release")
}

/// A shared-library package rooted at `root`.
///
/// Sources live in `root`, build and install files in `root/build`, and
/// the package is installed into `root/package`.
pub fn linux_package(root: &Path) -> PackageContext {
    PackageContext::new(
        linux_gcc_settings(),
        Settings::new().with("shared", "True").with("fPIC", "True"),
        PackageLayout::rooted(root).with_package_folder(root.join("package")),
    )
}

/// Adapter configuration independent of the machine running the tests.
pub fn test_config() -> MesonConfig {
    MesonConfig {
        running_platform: Platform::new("Linux", "x86_64"),
        tool_env: EnvironmentOverlay::new(),
        toolchain_env: ToolchainEnv::default(),
        ..MesonConfig::default()
    }
}

/// A shell that prints nothing.
pub fn quiet_shell() -> Arc<Shell> {
    Arc::new(Shell::quiet())
}

/// Write a profile file into `dir` and return its path.
pub fn write_profile(dir: &Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("harbour-meson.toml");
    std::fs::write(&path, contents).unwrap();
    path
}
