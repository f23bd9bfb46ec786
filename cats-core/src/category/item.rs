//! A single identified member of a category

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use serde_json::Value;

use crate::context::Context;
use crate::error::{CatsError, Result};
use crate::registry::Registry;
use crate::traversal::{Link, Navigated};

use super::{CategorySet, CategoryType};

/// Entity-specific state produced by load hooks
pub type Attributes = BTreeMap<String, Value>;

/// Conversion into an identity string
pub trait IntoIdentity {
    fn into_identity(self) -> String;
}

impl IntoIdentity for String {
    fn into_identity(self) -> String {
        self
    }
}

impl IntoIdentity for &str {
    fn into_identity(self) -> String {
        self.to_string()
    }
}

impl IntoIdentity for &String {
    fn into_identity(self) -> String {
        self.clone()
    }
}

impl IntoIdentity for CategoryItem {
    fn into_identity(self) -> String {
        self.identity
    }
}

impl IntoIdentity for &CategoryItem {
    fn into_identity(self) -> String {
        self.identity.clone()
    }
}

macro_rules! numeric_identity {
    ($($t:ty),*) => {
        $(impl IntoIdentity for $t {
            fn into_identity(self) -> String {
                self.to_string()
            }
        })*
    };
}

numeric_identity!(i32, i64, u32, u64, usize);

/// An item of a category, reached under some navigation context.
///
/// Items compare equal when category and identity match; the context is
/// how the item was reached, not what it is.
#[derive(Clone)]
pub struct CategoryItem {
    kind: Arc<CategoryType>,
    identity: String,
    context: Context,
    registry: Registry,
    initial: Attributes,
    late: OnceLock<Attributes>,
}

impl CategoryItem {
    /// Open an item. Routing keys are dropped from the context and the
    /// category's `initial_load` hook runs before returning.
    pub(crate) fn open(
        kind: Arc<CategoryType>,
        registry: Registry,
        identity: impl IntoIdentity,
        context: Context,
    ) -> Self {
        let (context, _) = context.take_lookup_name();
        let mut item = Self {
            kind,
            identity: identity.into_identity(),
            context,
            registry,
            initial: Attributes::new(),
            late: OnceLock::new(),
        };

        let initial = match item.kind.initial_load_hook() {
            Some(hook) => hook(&item),
            None => Attributes::new(),
        };
        item.initial = initial;
        item
    }

    pub fn category(&self) -> &str {
        self.kind.name()
    }

    pub fn kind(&self) -> &Arc<CategoryType> {
        &self.kind
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Context for navigating away from this item.
    ///
    /// Binds this item's identity under `rename`, or under the category
    /// name case-folded.
    pub fn merged_context(&self, rename: Option<&str>) -> Context {
        let key = match rename {
            Some(key) => key.to_string(),
            None => self.kind.binding_key(),
        };
        self.context.with(key, self.identity.clone())
    }

    fn declared(&self, link: &str) -> Result<&Link> {
        self.kind
            .link_named(link)
            .ok_or_else(|| CatsError::UnknownLink {
                category: self.category().to_string(),
                link: link.to_string(),
            })
    }

    /// Follow a declared link, landing on a set or an item
    pub fn navigate(&self, link: &str) -> Result<Navigated> {
        self.declared(link)?.follow(self)
    }

    /// Follow a link that leads to a set
    pub fn traverse(&self, link: &str) -> Result<CategorySet> {
        match self.declared(link)? {
            Link::Set(traversal) => traversal.resolve(self),
            Link::Item(_) => Err(self.wrong_kind(link, "a set", "an item")),
        }
    }

    /// Follow a link that leads to a single item
    pub fn follow(&self, link: &str) -> Result<CategoryItem> {
        match self.declared(link)? {
            Link::Item(traversal) => traversal.resolve(self),
            Link::Set(_) => Err(self.wrong_kind(link, "an item", "a set")),
        }
    }

    /// Attributes produced by `initial_load`
    pub fn initial_attributes(&self) -> &Attributes {
        &self.initial
    }

    /// Attributes produced by `late_load`, running it on first call
    pub fn late_attributes(&self) -> Result<&Attributes> {
        if let Some(loaded) = self.late.get() {
            return Ok(loaded);
        }

        let loaded = match self.kind.late_load_hook() {
            Some(hook) => hook(self).map_err(CatsError::Accessor)?,
            None => Attributes::new(),
        };
        Ok(self.late.get_or_init(|| loaded))
    }

    /// Look up an attribute, consulting `late_load` only when
    /// `initial_load` did not provide it
    pub fn attribute(&self, key: &str) -> Result<Option<&Value>> {
        if let Some(value) = self.initial.get(key) {
            return Ok(Some(value));
        }
        Ok(self.late_attributes()?.get(key))
    }

    fn wrong_kind(&self, link: &str, expected: &'static str, actual: &'static str) -> CatsError {
        CatsError::WrongLinkKind {
            category: self.category().to_string(),
            link: link.to_string(),
            expected,
            actual,
        }
    }
}

impl PartialEq for CategoryItem {
    fn eq(&self, other: &Self) -> bool {
        self.kind.name() == other.kind.name() && self.identity == other.identity
    }
}

impl Eq for CategoryItem {}

impl Hash for CategoryItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.name().hash(state);
        self.identity.hash(state);
    }
}

impl fmt::Display for CategoryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}", self.category(), self.identity)?;
        for value in self.context.values() {
            write!(f, ", {}", value)?;
        }
        write!(f, ")")
    }
}

impl fmt::Debug for CategoryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CategoryItem")
            .field("category", &self.category())
            .field("identity", &self.identity)
            .field("context", &self.context)
            .finish()
    }
}
