//! Navigation context
//!
//! A context records the chain of navigations that led to an item or set:
//! each step binds a key (a category name or an explicit alias) to the
//! identity it came from. Contexts are immutable values; navigation always
//! produces a new, merged context.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Reserved key carrying a traversal's lookup name into set construction.
///
/// Sets strip it from their context before resolving, so it never reaches
/// tier matching, item contexts or accessor context arguments.
pub const LOOKUP_NAME_KEY: &str = "__lookup_name__";

/// Key → value bindings accumulated along a navigation path
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(BTreeMap<String, String>);

impl Context {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Value bound to `key`, if any
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Values in key order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.0.values().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// New context with `key` bound to `value`, replacing any prior binding
    pub fn with(&self, key: impl Into<String>, value: impl Into<String>) -> Context {
        let mut bindings = self.0.clone();
        bindings.insert(key.into(), value.into());
        Context(bindings)
    }

    /// New context holding both sets of bindings; `other` wins on conflicts
    pub fn merge(&self, other: &Context) -> Context {
        let mut bindings = self.0.clone();
        bindings.extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        Context(bindings)
    }

    /// Split off the routing lookup name, returning the cleaned context
    pub(crate) fn take_lookup_name(mut self) -> (Context, Option<String>) {
        let lookup = self.0.remove(LOOKUP_NAME_KEY);
        (self, lookup)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Context(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Context {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        write!(f, "}}")
    }
}
