//! Environment overlays for Meson and Ninja invocations.
//!
//! An [`EnvironmentOverlay`] maps variable names to a value or to "unset".
//! Overlays are layered from least to most specific; on conflict the later
//! layer wins. [`EnvScope`] applies an overlay to the process environment
//! and restores the previous values when dropped.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard};

use crate::util::fs::PATH_LIST_SEPARATOR;

/// Variables whose activation values are merged with the current value
/// instead of replacing it.
pub const PATH_LIST_VARS: &[&str] = &["PATH", "INCLUDE", "LIB", "LIBPATH"];

/// Compilers that need the vendor environment activated before running Ninja.
const ACTIVATED_COMPILERS: &[&str] = &["Visual Studio", "msvc"];

/// Set of environment changes; `None` unsets the variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentOverlay {
    vars: BTreeMap<String, Option<String>>,
}

impl EnvironmentOverlay {
    pub fn new() -> Self {
        EnvironmentOverlay::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), Some(value.into()));
    }

    pub fn unset(&mut self, key: impl Into<String>) {
        self.vars.insert(key.into(), None);
    }

    /// The overlay's entry for `key`: `None` if the overlay does not touch
    /// it, `Some(None)` if it unsets it.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.vars.get(key).map(|v| v.as_deref())
    }

    /// Whether the overlay unsets `key`.
    pub fn unsets(&self, key: &str) -> bool {
        matches!(self.vars.get(key), Some(None))
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Layer `other` on top of `self`; entries of `other` win.
    pub fn extend(&mut self, other: &EnvironmentOverlay) {
        for (key, value) in &other.vars {
            self.vars.insert(key.clone(), value.clone());
        }
    }

    /// Collapse layers, least specific first, into one overlay.
    pub fn layered<'a>(layers: impl IntoIterator<Item = &'a EnvironmentOverlay>) -> Self {
        let mut result = EnvironmentOverlay::new();
        for layer in layers {
            result.extend(layer);
        }
        result
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvironmentOverlay {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut overlay = EnvironmentOverlay::new();
        for (k, v) in iter {
            overlay.set(k, v);
        }
        overlay
    }
}

/// Whether commands need the vendor toolchain environment activated.
///
/// Only the Visual Studio compiler driven through Ninja on a Windows
/// machine needs it; every other combination finds its tools on `PATH`.
pub fn needs_toolchain_activation(compiler: Option<&str>, backend: &str, running_os: &str) -> bool {
    compiler.is_some_and(|c| ACTIVATED_COMPILERS.contains(&c))
        && backend == "ninja"
        && running_os == "Windows"
}

/// Turn captured activation variables into an overlay layer.
///
/// Path-list variables are merged with their current value (`current`):
/// activation entries go first unless `append` is set.
pub fn activation_layer(
    vars: &BTreeMap<String, String>,
    append: bool,
    current: impl Fn(&str) -> Option<String>,
) -> EnvironmentOverlay {
    let mut layer = EnvironmentOverlay::new();

    for (key, value) in vars {
        let is_path_list = PATH_LIST_VARS
            .iter()
            .any(|v| v.eq_ignore_ascii_case(key));

        let merged = match current(key).filter(|c| is_path_list && !c.is_empty()) {
            Some(existing) if append => format!("{}{}{}", existing, PATH_LIST_SEPARATOR, value),
            Some(existing) => format!("{}{}{}", value, PATH_LIST_SEPARATOR, existing),
            None => value.clone(),
        };
        layer.set(key.clone(), merged);
    }

    layer
}

/// Serializes every [`EnvScope`] in the process.
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Applies an overlay to the process environment until dropped.
///
/// Previous values are restored on every exit path, including unwinding.
/// Scopes on different threads run one after another; a scope must not be
/// entered again on a thread that already holds one.
#[must_use = "the overlay is removed as soon as the scope is dropped"]
#[derive(Debug)]
pub struct EnvScope {
    saved: Vec<(String, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvScope {
    pub fn enter(overlay: &EnvironmentOverlay) -> Self {
        let lock = match ENV_LOCK.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut saved = Vec::with_capacity(overlay.len());

        for (key, value) in overlay.iter() {
            saved.push((key.to_string(), std::env::var_os(key)));
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }

        tracing::trace!("applied {} environment entries", saved.len());
        EnvScope { saved, _lock: lock }
    }
}

impl Drop for EnvScope {
    fn drop(&mut self) {
        for (key, previous) in self.saved.drain(..).rev() {
            match previous {
                Some(value) => std::env::set_var(&key, value),
                None => std::env::remove_var(&key),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_later_layer_wins() {
        let base: EnvironmentOverlay = [("CFLAGS", "-O2"), ("LIBS", "-lm")].into_iter().collect();
        let mut inner = EnvironmentOverlay::new();
        inner.unset("CFLAGS");
        inner.set("PKG_CONFIG_PATH", "/pc");

        let composed = EnvironmentOverlay::layered([&base, &inner]);
        assert!(composed.unsets("CFLAGS"));
        assert_eq!(composed.get("LIBS"), Some(Some("-lm")));
        assert_eq!(composed.get("PKG_CONFIG_PATH"), Some(Some("/pc")));
        assert_eq!(composed.get("CXX"), None);
    }

    #[test]
    fn test_activation_predicate() {
        assert!(needs_toolchain_activation(Some("Visual Studio"), "ninja", "Windows"));
        assert!(needs_toolchain_activation(Some("msvc"), "ninja", "Windows"));
        assert!(!needs_toolchain_activation(Some("Visual Studio"), "vs2017", "Windows"));
        assert!(!needs_toolchain_activation(Some("Visual Studio"), "ninja", "Linux"));
        assert!(!needs_toolchain_activation(Some("gcc"), "ninja", "Windows"));
        assert!(!needs_toolchain_activation(None, "ninja", "Windows"));
    }

    #[test]
    fn test_activation_layer_prepends_path_lists() {
        let vars: BTreeMap<String, String> = [
            ("PATH".to_string(), "C:\\VC\\bin".to_string()),
            ("VSCMD_ARG_TGT_ARCH".to_string(), "x64".to_string()),
        ]
        .into_iter()
        .collect();
        let current = |key: &str| match key {
            "PATH" => Some("C:\\Windows".to_string()),
            "VSCMD_ARG_TGT_ARCH" => Some("x86".to_string()),
            _ => None,
        };

        let sep = PATH_LIST_SEPARATOR;
        let prepended = activation_layer(&vars, false, current);
        assert_eq!(
            prepended.get("PATH"),
            Some(Some(format!("C:\\VC\\bin{}C:\\Windows", sep).as_str()))
        );
        assert_eq!(prepended.get("VSCMD_ARG_TGT_ARCH"), Some(Some("x64")));

        let appended = activation_layer(&vars, true, current);
        assert_eq!(
            appended.get("PATH"),
            Some(Some(format!("C:\\Windows{}C:\\VC\\bin", sep).as_str()))
        );
    }

    #[test]
    fn test_env_scope_restores() {
        const SET_KEY: &str = "HARBOUR_MESON_SCOPE_TEST_SET";
        const UNSET_KEY: &str = "HARBOUR_MESON_SCOPE_TEST_UNSET";
        std::env::remove_var(SET_KEY);
        std::env::set_var(UNSET_KEY, "original");

        let mut overlay = EnvironmentOverlay::new();
        overlay.set(SET_KEY, "inside");
        overlay.unset(UNSET_KEY);

        {
            let _scope = EnvScope::enter(&overlay);
            assert_eq!(std::env::var(SET_KEY).unwrap(), "inside");
            assert!(std::env::var_os(UNSET_KEY).is_none());
        }

        assert!(std::env::var_os(SET_KEY).is_none());
        assert_eq!(std::env::var(UNSET_KEY).unwrap(), "original");
        std::env::remove_var(UNSET_KEY);
    }

    #[test]
    fn test_env_scope_restores_on_panic() {
        const KEY: &str = "HARBOUR_MESON_SCOPE_TEST_PANIC";
        std::env::remove_var(KEY);
        let mut overlay = EnvironmentOverlay::new();
        overlay.set(KEY, "inside");

        let result = std::panic::catch_unwind(|| {
            let _scope = EnvScope::enter(&overlay);
            panic!("command blew up");
        });

        assert!(result.is_err());
        assert!(std::env::var_os(KEY).is_none());
    }

    #[test]
    fn test_env_scopes_on_threads_do_not_leak() {
        const KEY: &str = "HARBOUR_MESON_SCOPE_TEST_THREADS";
        std::env::remove_var(KEY);

        let workers: Vec<_> = ["from-A", "from-B"]
            .into_iter()
            .map(|value| {
                std::thread::spawn(move || {
                    let mut overlay = EnvironmentOverlay::new();
                    overlay.set(KEY, value);
                    for _ in 0..200 {
                        let _scope = EnvScope::enter(&overlay);
                        assert_eq!(std::env::var(KEY).unwrap(), value);
                        std::thread::yield_now();
                        assert_eq!(std::env::var(KEY).unwrap(), value);
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }
        assert!(std::env::var_os(KEY).is_none());
    }
}
