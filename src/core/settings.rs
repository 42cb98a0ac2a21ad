//! Read-only view over package settings and options.
//!
//! Settings (`os`, `arch`, `compiler`, `build_type`, ...) and options
//! (`shared`, `fPIC`, ...) are both plain key-value namespaces. Lookups
//! never fail: a missing key is simply `None`.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Safe-lookup accessor over a settings or options namespace.
pub trait SettingsView {
    /// Look up a value, returning `None` when the key is not defined.
    fn get_safe(&self, name: &str) -> Option<String>;

    /// Look up a value and interpret it as a boolean.
    ///
    /// Returns `None` both for missing keys and for values that are not
    /// recognizable booleans.
    fn get_bool(&self, name: &str) -> Option<bool> {
        self.get_safe(name).and_then(|v| parse_bool(&v))
    }
}

/// Interpret a setting value as a boolean (`True`, `false`, `1`, `off`, ...).
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "none" => Some(false),
        _ => None,
    }
}

/// Owned settings namespace.
///
/// Keys use the dotted form of the settings model, e.g. `compiler.version`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    /// Create an empty namespace.
    pub fn new() -> Self {
        Settings::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Insert or replace a value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Remove a value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Build a namespace from a TOML table.
    ///
    /// Nested tables are flattened into dotted keys, so both
    /// `"compiler.version" = "12"` and `[settings.compiler] version = "12"`
    /// are accepted. Booleans become `True`/`False`.
    pub fn from_toml_table(table: &toml::Table) -> Result<Self> {
        let mut settings = Settings::new();
        flatten_into(&mut settings, "", table)?;
        Ok(settings)
    }
}

fn flatten_into(settings: &mut Settings, prefix: &str, table: &toml::Table) -> Result<()> {
    for (key, value) in table {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            toml::Value::String(s) => settings.set(name, s.clone()),
            toml::Value::Boolean(b) => settings.set(name, if *b { "True" } else { "False" }),
            toml::Value::Integer(i) => settings.set(name, i.to_string()),
            toml::Value::Float(f) => settings.set(name, f.to_string()),
            toml::Value::Table(t) => {
                // `[settings.compiler]` with a `value` key sets `compiler` itself
                if let Some(toml::Value::String(s)) = t.get("value") {
                    settings.set(name.clone(), s.clone());
                }
                let nested: toml::Table = t
                    .iter()
                    .filter(|(k, _)| k.as_str() != "value")
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                flatten_into(settings, &name, &nested)?;
            }
            other => bail!("unsupported value for `{}`: {}", name, other),
        }
    }
    Ok(())
}

impl SettingsView for Settings {
    fn get_safe(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Settings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut settings = Settings::new();
        for (k, v) in iter {
            settings.set(k, v);
        }
        settings
    }
}

/// C++ standard declared by the settings.
///
/// `compiler.cppstd` wins over the legacy top-level `cppstd` setting.
pub fn cppstd_from_settings(settings: &dyn SettingsView) -> Option<String> {
    settings
        .get_safe("compiler.cppstd")
        .or_else(|| settings.get_safe("cppstd"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_safe_missing_key() {
        let settings = Settings::new().with("os", "Linux");
        assert_eq!(settings.get_safe("os").as_deref(), Some("Linux"));
        assert_eq!(settings.get_safe("arch"), None);
    }

    #[test]
    fn test_get_bool() {
        let options = Settings::new()
            .with("shared", "True")
            .with("fPIC", "false")
            .with("odd", "maybe");
        assert_eq!(options.get_bool("shared"), Some(true));
        assert_eq!(options.get_bool("fPIC"), Some(false));
        assert_eq!(options.get_bool("odd"), None);
        assert_eq!(options.get_bool("missing"), None);
    }

    #[test]
    fn test_from_toml_table_flattens() {
        let table: toml::Table = toml::from_str(
            r#"
            os = "Linux"
            "compiler.version" = "12"

            [compiler]
            value = "gcc"
            cppstd = "17"
            "#,
        )
        .unwrap();
        let settings = Settings::from_toml_table(&table).unwrap();

        assert_eq!(settings.get_safe("os").as_deref(), Some("Linux"));
        assert_eq!(settings.get_safe("compiler").as_deref(), Some("gcc"));
        assert_eq!(settings.get_safe("compiler.cppstd").as_deref(), Some("17"));
        assert_eq!(settings.get_safe("compiler.version").as_deref(), Some("12"));
    }

    #[test]
    fn test_from_toml_table_booleans() {
        let table: toml::Table = toml::from_str("shared = true\nfPIC = false").unwrap();
        let options = Settings::from_toml_table(&table).unwrap();
        assert_eq!(options.get_safe("shared").as_deref(), Some("True"));
        assert_eq!(options.get_bool("fPIC"), Some(false));
    }

    #[test]
    fn test_cppstd_precedence() {
        let legacy = Settings::new().with("cppstd", "14");
        assert_eq!(cppstd_from_settings(&legacy).as_deref(), Some("14"));

        let both = legacy.with("compiler.cppstd", "gnu17");
        assert_eq!(cppstd_from_settings(&both).as_deref(), Some("gnu17"));
    }
}
