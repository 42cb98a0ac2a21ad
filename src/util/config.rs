//! Configuration file support for harbour-meson.
//!
//! Adapter defaults come from two configuration file locations:
//! - Global: `~/.harbour/meson.toml` - User-wide defaults
//! - Project: `.harbour/meson.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and the `[meson]`
//! table of a profile takes precedence over both.
//!
//! A profile (`harbour-meson.toml`) describes the package being built:
//!
//! ```toml
//! [settings]
//! os = "Linux"
//! arch = "armv8"
//! compiler = { value = "gcc", version = "12", cppstd = "17" }
//! build_type = "Release"
//!
//! [options]
//! shared = true
//!
//! [settings_build]
//! os = "Linux"
//! arch = "x86_64"
//!
//! [layout]
//! build_folder = "build"
//! package_folder = "package"
//!
//! [meson]
//! backend = "ninja"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::meson::MesonConfig;
use crate::core::settings::Settings;
use crate::core::{PackageContext, PackageLayout, PhaseFlags};
use crate::util::fs::absolute_path;

/// Default profile file name.
pub const PROFILE_FILE_NAME: &str = "harbour-meson.toml";

/// The `[meson]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MesonSettings {
    /// Meson backend (ninja, vs, xcode, ...)
    pub backend: Option<String>,

    /// Build type overriding the settings' `build_type`
    pub build_type: Option<String>,

    /// `needs_exe_wrapper` value for generated cross files
    pub exe_wrapper: Option<String>,

    /// Append activated path lists instead of prepending them
    pub append_vcvars: Option<bool>,

    /// Extra variables for every Meson/Ninja invocation
    pub env: BTreeMap<String, String>,
}

impl MesonSettings {
    /// Merge another table into this one (other takes precedence).
    pub fn merge(&mut self, other: MesonSettings) {
        if other.backend.is_some() {
            self.backend = other.backend;
        }
        if other.build_type.is_some() {
            self.build_type = other.build_type;
        }
        if other.exe_wrapper.is_some() {
            self.exe_wrapper = other.exe_wrapper;
        }
        if other.append_vcvars.is_some() {
            self.append_vcvars = other.append_vcvars;
        }
        self.env.extend(other.env);
    }

    /// Adapter configuration with these values applied over the defaults.
    pub fn to_meson_config(&self) -> MesonConfig {
        let mut config = MesonConfig::default();
        if let Some(ref backend) = self.backend {
            config.backend = backend.clone();
        }
        config.build_type = self.build_type.clone();
        if let Some(ref wrapper) = self.exe_wrapper {
            config.exe_wrapper = wrapper.clone();
        }
        config.append_vcvars = self.append_vcvars.unwrap_or(false);
        config.tool_env = self.env.iter().collect();
        config
    }
}

/// Contents of a `meson.toml` configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub meson: MesonSettings,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        self.meson.merge(other.meson);
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.harbour/meson.toml)
/// 2. Global config (~/.harbour/meson.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }
    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global harbour config directory (~/.harbour).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".harbour"))
}

/// Get the global config path (~/.harbour/meson.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("meson.toml"))
}

/// Get the project config path (.harbour/meson.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".harbour").join("meson.toml")
}

/// `[layout]` as written in a profile; paths are relative to the profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawLayout {
    source_folder: Option<PathBuf>,
    build_folder: Option<PathBuf>,
    install_folder: Option<PathBuf>,
    package_folder: Option<PathBuf>,
    in_local_cache: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawProfile {
    settings: toml::Table,
    options: toml::Table,
    settings_build: Option<toml::Table>,
    layout: RawLayout,
    phases: PhaseFlags,
    meson: MesonSettings,
}

/// A parsed profile file.
#[derive(Debug, Clone)]
pub struct Profile {
    /// File the profile was read from
    pub path: PathBuf,
    pub settings: Settings,
    pub options: Settings,
    pub settings_build: Option<Settings>,
    pub layout: PackageLayout,
    pub phases: PhaseFlags,
    pub meson: MesonSettings,
}

impl Profile {
    /// Load a profile, resolving its layout against the profile's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read profile: {}", path.display()))?;
        let base = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let base = if base.is_absolute() {
            base
        } else {
            std::env::current_dir()
                .context("failed to determine the current directory")?
                .join(base)
        };

        Self::parse(&contents, &base)
            .with_context(|| format!("failed to parse profile: {}", path.display()))
            .map(|mut profile| {
                profile.path = path.to_path_buf();
                profile
            })
    }

    /// Parse profile text with `base` as the root of relative layout paths.
    pub fn parse(contents: &str, base: &Path) -> Result<Self> {
        let raw: RawProfile = toml::from_str(contents)?;

        let settings = Settings::from_toml_table(&raw.settings).context("invalid [settings]")?;
        let options = Settings::from_toml_table(&raw.options).context("invalid [options]")?;
        let settings_build = raw
            .settings_build
            .as_ref()
            .map(Settings::from_toml_table)
            .transpose()
            .context("invalid [settings_build]")?;

        let source_folder = absolute_path(raw.layout.source_folder.as_deref(), base);
        let build_folder = absolute_path(
            raw.layout.build_folder.as_deref(),
            &source_folder.join("build"),
        );
        let install_folder = absolute_path(raw.layout.install_folder.as_deref(), &build_folder);
        let layout = PackageLayout {
            source_folder,
            build_folder,
            install_folder,
            package_folder: raw
                .layout
                .package_folder
                .as_deref()
                .map(|p| absolute_path(Some(p), base)),
            in_local_cache: raw.layout.in_local_cache,
        };

        Ok(Profile {
            path: base.join(PROFILE_FILE_NAME),
            settings,
            options,
            settings_build,
            layout,
            phases: raw.phases,
            meson: raw.meson,
        })
    }

    /// The package context the adapter is constructed from.
    pub fn package_context(&self) -> PackageContext {
        let mut package =
            PackageContext::new(self.settings.clone(), self.options.clone(), self.layout.clone())
                .with_phases(self.phases);
        package.settings_build = self.settings_build.clone();
        package
    }

    /// Adapter configuration: `config` with the profile's `[meson]` on top.
    pub fn meson_config(&self, config: &Config) -> MesonConfig {
        let mut meson = config.meson.clone();
        meson.merge(self.meson.clone());
        meson.to_meson_config()
    }
}
