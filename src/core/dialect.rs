//! C++ standard to Meson `cpp_std` token.

use crate::builder::errors::MesonError;

/// Settings `cppstd` value to Meson dialect token.
///
/// `20` maps to the pre-standard `c++1z` spelling understood by every Meson
/// release that accepts a `cpp_std` option.
pub const DIALECT_TABLE: &[(&str, &str)] = &[
    ("98", "c++03"),
    ("gnu98", "gnu++03"),
    ("11", "c++11"),
    ("gnu11", "gnu++11"),
    ("14", "c++14"),
    ("gnu14", "gnu++14"),
    ("17", "c++17"),
    ("gnu17", "gnu++17"),
    ("20", "c++1z"),
    ("gnu20", "gnu++1z"),
];

/// Resolve a settings C++ standard to the Meson dialect token.
pub fn resolve_dialect(cppstd: &str) -> Result<&'static str, MesonError> {
    DIALECT_TABLE
        .iter()
        .find(|(id, _)| *id == cppstd)
        .map(|(_, token)| *token)
        .ok_or_else(|| MesonError::UnsupportedDialect(cppstd.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_dialect() {
        assert_eq!(resolve_dialect("98").unwrap(), "c++03");
        assert_eq!(resolve_dialect("gnu14").unwrap(), "gnu++14");
        assert_eq!(resolve_dialect("17").unwrap(), "c++17");
        assert_eq!(resolve_dialect("20").unwrap(), "c++1z");
    }

    #[test]
    fn test_unsupported_dialect() {
        assert!(matches!(
            resolve_dialect("23"),
            Err(MesonError::UnsupportedDialect(ref d)) if d == "23"
        ));
    }
}
