//! Default header and path-variable sources.
//!
//! Providers are consulted on every conversion; their values are merged with
//! the per-request maps, and request values win on key collision.
//!
//! A plain `HashMap<String, String>` is a static provider. The dynamic
//! providers hold callbacks evaluated at read time; a callback returning
//! `None` drops the key for that request.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Source of default request headers.
pub trait HeaderProvider: Send + Sync {
    /// Current header values.
    fn headers(&self) -> HashMap<String, String>;
}

/// Source of default path-template variables.
pub trait PathVariableProvider: Send + Sync {
    /// Current variable values.
    fn path_variables(&self) -> HashMap<String, String>;
}

impl HeaderProvider for HashMap<String, String> {
    fn headers(&self) -> HashMap<String, String> {
        self.clone()
    }
}

impl PathVariableProvider for HashMap<String, String> {
    fn path_variables(&self) -> HashMap<String, String> {
        self.clone()
    }
}

/// Merge `overrides` on top of `defaults`.
pub(crate) fn merge(
    mut defaults: HashMap<String, String>,
    overrides: &HashMap<String, String>,
) -> HashMap<String, String> {
    defaults.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    defaults
}

/// Merge header `overrides` on top of `defaults`, matching names without
/// regard to ASCII case. The override's spelling of the name is kept.
pub(crate) fn merge_headers(
    mut defaults: HashMap<String, String>,
    overrides: &HashMap<String, String>,
) -> HashMap<String, String> {
    defaults.retain(|name, _| {
        !overrides
            .keys()
            .any(|overriding| overriding.eq_ignore_ascii_case(name))
    });
    merge(defaults, overrides)
}

// ============================================================================
// Callback map
// ============================================================================

type ValueFn = Arc<dyn Fn() -> Option<String> + Send + Sync>;

#[derive(Clone, Default)]
struct CallbackMap {
    entries: Arc<RwLock<HashMap<String, ValueFn>>>,
}

impl CallbackMap {
    fn insert(&self, key: String, value: ValueFn) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value);
    }

    fn remove(&self, key: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    fn resolve(&self) -> HashMap<String, String> {
        let entries: Vec<(String, ValueFn)> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(k, f)| (k.clone(), Arc::clone(f)))
            .collect();

        // Callbacks run outside the lock so they may touch the provider.
        entries
            .into_iter()
            .filter_map(|(key, f)| f().map(|value| (key, value)))
            .collect()
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

impl fmt::Debug for CallbackMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keys()).finish()
    }
}

macro_rules! dynamic_provider {
    ($(#[$meta:meta])* $name:ident, $what:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default)]
        pub struct $name {
            values: CallbackMap,
        }

        impl $name {
            #[doc = concat!("Create an empty ", $what, " provider.")]
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            #[doc = concat!("Set a fixed ", $what, " value.")]
            pub fn add(&self, key: impl Into<String>, value: impl Into<String>) {
                let value = value.into();
                self.values
                    .insert(key.into(), Arc::new(move || Some(value.clone())));
            }

            #[doc = concat!("Set a ", $what, " computed on every request; `None` omits it.")]
            pub fn add_with<F>(&self, key: impl Into<String>, value: F)
            where
                F: Fn() -> Option<String> + Send + Sync + 'static,
            {
                self.values.insert(key.into(), Arc::new(value));
            }

            /// Remove a key. Returns `true` if it was present.
            pub fn remove(&self, key: &str) -> bool {
                self.values.remove(key)
            }
        }
    };
}

dynamic_provider!(
    /// Header provider backed by mutable callbacks.
    ///
    /// Cloning shares the underlying map, so a clone kept by the caller can
    /// add or remove entries while a client is using the provider.
    ///
    /// ```
    /// use resting_core::{DynamicHeaderProvider, HeaderProvider};
    ///
    /// let provider = DynamicHeaderProvider::new();
    /// provider.add("X-Client", "demo");
    /// provider.add_with("X-Token", || None);
    /// assert_eq!(provider.headers().len(), 1);
    /// ```
    DynamicHeaderProvider,
    "header"
);

dynamic_provider!(
    /// Path-variable provider backed by mutable callbacks.
    DynamicPathVariableProvider,
    "path variable"
);

impl HeaderProvider for DynamicHeaderProvider {
    fn headers(&self) -> HashMap<String, String> {
        self.values.resolve()
    }
}

impl PathVariableProvider for DynamicPathVariableProvider {
    fn path_variables(&self) -> HashMap<String, String> {
        self.values.resolve()
    }
}
