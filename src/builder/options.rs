//! Meson option plan derived from package settings.

use std::fmt;

use crate::core::dialect::resolve_dialect;
use crate::core::settings::{cppstd_from_settings, SettingsView};
use crate::core::PackageLayout;

/// Conventional install directory names, relative to the prefix.
pub const DEFAULT_LIB: &str = "lib";
pub const DEFAULT_BIN: &str = "bin";
pub const DEFAULT_INCLUDE: &str = "include";

/// Ordered Meson options.
///
/// Keys keep the position of their first insertion; setting an existing
/// key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionPlan {
    entries: Vec<(String, Option<String>)>,
}

impl OptionPlan {
    pub fn new() -> Self {
        OptionPlan::default()
    }

    /// Set `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.put(key.into(), Some(value.into()));
    }

    /// Keep `key` in the plan but omit it from the rendered arguments.
    pub fn unset(&mut self, key: impl Into<String>) {
        self.put(key.into(), None);
    }

    fn put(&mut self, key: String, value: Option<String>) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply user overrides; each key replaces the planned value wholesale.
    pub fn apply_overrides<I, K, V>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in overrides {
            self.set(key, value);
        }
    }

    /// Render as `--key=value` arguments in insertion order.
    pub fn render(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| format!("--{}={}", k, v)))
            .collect()
    }
}

impl fmt::Display for OptionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render().join(" "))
    }
}

/// Seed the option plan from settings, options and the package layout.
///
/// Returns the plan plus warnings for settings that could not be mapped.
pub fn plan_options(
    settings: &dyn SettingsView,
    options: &dyn SettingsView,
    layout: &PackageLayout,
) -> (OptionPlan, Vec<String>) {
    let mut plan = OptionPlan::new();
    let mut warnings = Vec::new();

    if let Some(ref package_folder) = layout.package_folder {
        plan.set("prefix", package_folder.display().to_string());
    }
    plan.set("libdir", DEFAULT_LIB);
    plan.set("bindir", DEFAULT_BIN);
    plan.set("sbindir", DEFAULT_BIN);
    plan.set("libexecdir", DEFAULT_BIN);
    plan.set("includedir", DEFAULT_INCLUDE);

    if let Some(cppstd) = cppstd_from_settings(settings) {
        match resolve_dialect(&cppstd) {
            Ok(token) => plan.set("cpp_std", token),
            Err(e) => warnings.push(format!("{}; `cpp_std` is left to Meson's default", e)),
        }
    }

    // Shared unless the package explicitly disables it
    let shared = options.get_bool("shared");
    let default_library = if shared.unwrap_or(true) {
        "shared"
    } else {
        "static"
    };
    plan.set("default_library", default_library);

    if let Some(os) = settings.get_safe("os") {
        if !os.contains("Windows") {
            if let Some(fpic) = options.get_bool("fPIC") {
                let pic = fpic || shared.unwrap_or(false);
                plan.set("b_staticpic", if pic { "true" } else { "false" });
            }
        }
    }

    (plan, warnings)
}
