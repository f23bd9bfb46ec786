//! Derivations - rules computing which identities belong to a category
//!
//! A derivation ties a category to a context shape (the set of keys it
//! requires) and an accessor producing identities for that shape. The
//! [`DerivationRegistry`] holds them in registration order and picks the
//! single best rule for a request.
//!
//! ## Tiered matching
//!
//! ```text
//!   request (category, context)
//!            │
//!            ▼
//!   ┌──────────────────────────────┐
//!   │ 1. perfect   keys == context │──hit──┐
//!   │ 2. partial   keys ⊆ context  │──hit──┤
//!   │ 3. identity  no requirement  │──hit──┤
//!   └──────────────────────────────┘       │
//!            │ miss                        ▼
//!            ▼                      accessor(context, lookup_name)
//!     NoMatchingRule
//! ```
//!
//! Within a tier, the earliest registered rule wins.

mod matcher;
mod registry;

pub use matcher::{DerivationMatcher, MatchTier};
pub use registry::{DerivationRegistry, Selection};

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::error::{AccessorError, CatsError, Result};

/// What an accessor returns: identities, or its own error
pub type AccessorResult = std::result::Result<Vec<String>, AccessorError>;

/// Source of identities for a derivation.
///
/// Implementations should be pure from the engine's point of view. The
/// engine neither caches nor retries calls, and never holds a registry lock
/// while one runs.
pub trait Accessor: Send + Sync {
    /// Produce the identities for `context`.
    ///
    /// `lookup_name` is the routing name of the traversal that triggered
    /// resolution, or `None` for direct set construction.
    fn derive(&self, context: &Context, lookup_name: Option<&str>) -> AccessorResult;
}

/// Accessor from a function of the context alone
pub struct ContextFn<F>(pub F);

impl<F> Accessor for ContextFn<F>
where
    F: Fn(&Context) -> AccessorResult + Send + Sync,
{
    fn derive(&self, context: &Context, _lookup_name: Option<&str>) -> AccessorResult {
        (self.0)(context)
    }
}

/// Accessor from a function that also receives the lookup name
pub struct LookupFn<F>(pub F);

impl<F> Accessor for LookupFn<F>
where
    F: Fn(&Context, Option<&str>) -> AccessorResult + Send + Sync,
{
    fn derive(&self, context: &Context, lookup_name: Option<&str>) -> AccessorResult {
        (self.0)(context, lookup_name)
    }
}

/// A registered rule: category + required context keys + accessor
#[derive(Clone)]
pub struct Derivation {
    category: String,
    /// `None` marks an identity rule
    required: Option<BTreeSet<String>>,
    accessor: Arc<dyn Accessor>,
}

impl Derivation {
    /// Create a rule requiring `required` keys.
    ///
    /// An empty key list makes this an identity rule.
    pub fn new<I, S>(category: impl Into<String>, required: I, accessor: impl Accessor + 'static) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: BTreeSet<String> = required.into_iter().map(Into::into).collect();
        Self {
            category: category.into(),
            required: if keys.is_empty() { None } else { Some(keys) },
            accessor: Arc::new(accessor),
        }
    }

    /// Create an identity rule, matching regardless of context
    pub fn identity(category: impl Into<String>, accessor: impl Accessor + 'static) -> Self {
        Self {
            category: category.into(),
            required: None,
            accessor: Arc::new(accessor),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Required keys, or `None` for an identity rule
    pub fn required_keys(&self) -> Option<&BTreeSet<String>> {
        self.required.as_ref()
    }

    pub fn is_identity(&self) -> bool {
        self.required.is_none()
    }

    /// Run the accessor. Its errors pass through unchanged.
    pub fn invoke(&self, context: &Context, lookup_name: Option<&str>) -> Result<Vec<String>> {
        self.accessor
            .derive(context, lookup_name)
            .map_err(CatsError::Accessor)
    }
}

impl fmt::Display for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.required {
            None => write!(f, "{}->*", self.category),
            Some(keys) => {
                let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
                write!(f, "{}->{}", self.category, keys.join("+"))
            }
        }
    }
}

impl fmt::Debug for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Derivation")
            .field("category", &self.category)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}
