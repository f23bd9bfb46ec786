//! Registry - the category directory and derivation rules behind one handle
//!
//! A [`Registry`] is a cheap-to-clone handle; items and sets keep one so
//! they can navigate further. Tests build a fresh registry each, while
//! applications that want ambient state use [`Registry::global`].
//!
//! Locks are only held while reading or writing the directory and rule
//! list. Accessors run with no lock held, so they may resolve or navigate
//! through the same registry.

use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::category::{
    Category, CategoryDirectory, CategoryItem, CategorySet, CategoryType, IntoIdentity, SetType,
};
use crate::context::Context;
use crate::derivation::{
    AccessorResult, ContextFn, Derivation, DerivationRegistry, LookupFn, Selection,
};
use crate::error::{CatsError, Result};

static GLOBAL: OnceLock<Registry> = OnceLock::new();

#[derive(Default)]
struct Inner {
    derivations: RwLock<DerivationRegistry>,
    directory: RwLock<CategoryDirectory>,
}

/// Handle to a category directory plus its derivation rules
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<Inner>,
}

impl Registry {
    /// Create a new, empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry, created empty on first use
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(Registry::new)
    }

    /// Whether two handles point at the same registry
    pub fn same_as(&self, other: &Registry) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Declaration
    // ═══════════════════════════════════════════════════════════════════════

    /// Declare a category, returning its synthesized set type
    pub fn declare(&self, kind: CategoryType) -> Arc<SetType> {
        self.inner.directory.write().declare(kind)
    }

    /// Declare the category named by a Rust type
    pub fn declare_type<C: Category>(&self) -> Arc<SetType> {
        self.declare(C::define(CategoryType::new(C::NAME)))
    }

    /// Append a derivation rule
    pub fn register(&self, derivation: Derivation) -> usize {
        self.inner.derivations.write().register(derivation)
    }

    /// Register a rule requiring `required` keys; empty means identity rule
    pub fn derive<I, S, F>(&self, category: impl Into<String>, required: I, accessor: F) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Context) -> AccessorResult + Send + Sync + 'static,
    {
        self.register(Derivation::new(category, required, ContextFn(accessor)))
    }

    /// Register a rule whose accessor also receives the lookup name
    pub fn derive_with_lookup<I, S, F>(
        &self,
        category: impl Into<String>,
        required: I,
        accessor: F,
    ) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Context, Option<&str>) -> AccessorResult + Send + Sync + 'static,
    {
        self.register(Derivation::new(category, required, LookupFn(accessor)))
    }

    /// Register the fallback rule that matches any context
    pub fn derive_identity<F>(&self, category: impl Into<String>, accessor: F) -> usize
    where
        F: Fn(&Context) -> AccessorResult + Send + Sync + 'static,
    {
        self.register(Derivation::identity(category, ContextFn(accessor)))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Resolution
    // ═══════════════════════════════════════════════════════════════════════

    /// The rule that would answer for `category` under `context`
    pub fn select(&self, category: &str, context: &Context) -> Option<Selection> {
        self.inner.derivations.read().select(category, context)
    }

    /// Identities of `category` under `context`, from the best matching rule
    pub fn resolve(
        &self,
        category: &str,
        context: &Context,
        lookup_name: Option<&str>,
    ) -> Result<Vec<String>> {
        self.resolve_selected(category, context, lookup_name)
            .map(|(_, items)| items)
    }

    /// Like [`resolve`](Self::resolve), also returning the rule that answered
    pub fn resolve_selected(
        &self,
        category: &str,
        context: &Context,
        lookup_name: Option<&str>,
    ) -> Result<(Selection, Vec<String>)> {
        let selection = self
            .select(category, context)
            .ok_or_else(|| CatsError::NoMatchingRule {
                category: category.to_string(),
            })?;

        tracing::debug!(
            category,
            tier = %selection.tier,
            derivation = %selection.derivation,
            lookup_name,
            "resolving"
        );

        let items = selection.derivation.invoke(context, lookup_name)?;
        Ok((selection, items))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Directory lookups
    // ═══════════════════════════════════════════════════════════════════════

    /// Entity descriptor for a category name
    pub fn category_type(&self, name: &str) -> Result<Arc<CategoryType>> {
        self.inner.directory.read().entity_for(name)
    }

    /// Set descriptor for a category name or set name
    pub fn set_type(&self, name: &str) -> Result<Arc<SetType>> {
        self.inner.directory.read().collection_for(name)
    }

    /// Declared category names, sorted
    pub fn categories(&self) -> Vec<String> {
        self.inner.directory.read().names()
    }

    pub fn derivation_count(&self) -> usize {
        self.inner.derivations.read().len()
    }

    /// Rules registered for `category`, rendered like `Folder->filesystem`
    pub fn describe_derivations(&self, category: &str) -> Vec<String> {
        self.inner
            .derivations
            .read()
            .for_category(category)
            .iter()
            .map(|d| d.to_string())
            .collect()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Opening items and sets
    // ═══════════════════════════════════════════════════════════════════════

    /// Open an item of `category` directly
    pub fn open_item(
        &self,
        category: &str,
        identity: impl IntoIdentity,
        context: Context,
    ) -> Result<CategoryItem> {
        let kind = self.category_type(category)?;
        Ok(CategoryItem::open(kind, self.clone(), identity, context))
    }

    /// Open a set by resolving its items under `context`.
    ///
    /// The accessor receives no lookup name. A [`LOOKUP_NAME_KEY`] entry in
    /// `context` is dropped, not routed; lookup names only come from links.
    ///
    /// [`LOOKUP_NAME_KEY`]: crate::LOOKUP_NAME_KEY
    pub fn open_set(&self, name: &str, context: Context) -> Result<CategorySet> {
        let kind = self.set_type(name)?;
        CategorySet::open(self.clone(), kind, context, None, None)
    }

    /// Build a set from explicit items; no rule is consulted
    pub fn set_of<I>(&self, name: &str, items: I, context: Context) -> Result<CategorySet>
    where
        I: IntoIterator,
        I::Item: IntoIdentity,
    {
        let kind = self.set_type(name)?;
        let items = items.into_iter().map(IntoIdentity::into_identity).collect();
        CategorySet::open(self.clone(), kind, context, Some(items), None)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("categories", &self.categories())
            .field("derivations", &self.derivation_count())
            .finish()
    }
}
