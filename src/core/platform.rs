//! Running platform detection and the cross-building predicate.

use serde::{Deserialize, Serialize};

use crate::core::settings::SettingsView;

/// An operating system and architecture in settings-model vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Platform {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// The platform this process is running on.
    pub fn detect() -> Self {
        Platform {
            os: settings_os(std::env::consts::OS),
            arch: settings_arch(std::env::consts::ARCH),
        }
    }
}

fn settings_os(os: &str) -> String {
    match os {
        "linux" => "Linux".to_string(),
        "windows" => "Windows".to_string(),
        "macos" => "Macos".to_string(),
        "freebsd" => "FreeBSD".to_string(),
        "android" => "Android".to_string(),
        "ios" => "iOS".to_string(),
        "solaris" | "illumos" => "SunOS".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

fn settings_arch(arch: &str) -> String {
    match arch {
        "aarch64" => "armv8",
        "arm" => "armv7",
        "powerpc" => "ppc32be",
        "powerpc64" if cfg!(target_endian = "little") => "ppc64le",
        "powerpc64" => "ppc64",
        "sparc64" => "sparcv9",
        "wasm32" => "wasm",
        other => other,
    }
    .to_string()
}

/// Whether the host settings describe a different machine than the build one.
///
/// The build side comes from the declared build settings when present, then
/// from the legacy `os_build`/`arch_build` host settings, then from the
/// running platform. Values that are unset on the host side never count as
/// a difference.
pub fn cross_building(
    host: &dyn SettingsView,
    build: Option<&dyn SettingsView>,
    running: &Platform,
) -> bool {
    let (build_os, build_arch) = match build {
        Some(build) => (build.get_safe("os"), build.get_safe("arch")),
        None => (
            host.get_safe("os_build")
                .or_else(|| Some(running.os.clone())),
            host.get_safe("arch_build")
                .or_else(|| Some(running.arch.clone())),
        ),
    };

    let differs = |host_value: Option<String>, build_value: Option<String>| match (
        host_value,
        build_value,
    ) {
        (Some(h), Some(b)) => h != b,
        _ => false,
    };

    differs(host.get_safe("os"), build_os) || differs(host.get_safe("arch"), build_arch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::Settings;

    fn linux_x86_64() -> Platform {
        Platform::new("Linux", "x86_64")
    }

    #[test]
    fn test_native_build_is_not_cross() {
        let host = Settings::new().with("os", "Linux").with("arch", "x86_64");
        assert!(!cross_building(&host, None, &linux_x86_64()));
    }

    #[test]
    fn test_declared_build_settings_win() {
        let host = Settings::new().with("os", "Linux").with("arch", "armv8");
        let build = Settings::new().with("os", "Linux").with("arch", "x86_64");
        assert!(cross_building(&host, Some(&build), &Platform::new("Linux", "armv8")));

        let same = Settings::new().with("os", "Linux").with("arch", "armv8");
        assert!(!cross_building(&host, Some(&same), &linux_x86_64()));
    }

    #[test]
    fn test_legacy_build_settings() {
        let host = Settings::new()
            .with("os", "Android")
            .with("arch", "armv7")
            .with("os_build", "Linux")
            .with("arch_build", "x86_64");
        assert!(cross_building(&host, None, &Platform::new("Android", "armv7")));
    }

    #[test]
    fn test_os_difference_is_cross() {
        let host = Settings::new().with("os", "Windows").with("arch", "x86_64");
        assert!(cross_building(&host, None, &linux_x86_64()));
    }

    #[test]
    fn test_unset_host_values_are_not_cross() {
        assert!(!cross_building(&Settings::new(), None, &linux_x86_64()));
    }

    #[test]
    fn test_settings_vocabulary() {
        assert_eq!(settings_os("linux"), "Linux");
        assert_eq!(settings_os("netbsd"), "Netbsd");
        assert_eq!(settings_arch("aarch64"), "armv8");
        assert_eq!(settings_arch("x86_64"), "x86_64");
    }
}
