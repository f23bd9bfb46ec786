//! Navigation links between categories
//!
//! Links are static metadata declared on a [`CategoryType`]. Following one
//! from an item merges the item into the context and re-enters the registry:
//!
//! ```text
//!   item (Folder "docs", {filesystem=ourfs})
//!        │  follow "my_files" = Traversal::to("FileSet")
//!        ▼
//!   context {filesystem=ourfs, folder=docs}
//!        │  set_type("FileSet") → resolve("File", context)
//!        ▼
//!   FileSet(items from winning derivation)
//! ```
//!
//! Nothing is cached: every follow resolves from scratch.
//!
//! [`CategoryType`]: crate::CategoryType

use std::fmt;
use std::sync::Arc;

use crate::category::{CategoryItem, CategorySet, IntoIdentity};
use crate::context::Context;
use crate::error::{AccessorError, CatsError, Result};

/// Link from an item to a set of related items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traversal {
    /// Category name or set name of the target
    pub target: String,
    /// Context key to bind the origin under, instead of its category name
    pub rename: Option<String>,
    /// Items to use verbatim instead of resolving
    pub fixed_items: Option<Vec<String>>,
    /// Routing name handed to the target's accessor
    pub lookup_name: Option<String>,
}

impl Traversal {
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            rename: None,
            fixed_items: None,
            lookup_name: None,
        }
    }

    pub fn rename(mut self, key: impl Into<String>) -> Self {
        self.rename = Some(key.into());
        self
    }

    pub fn fixed_items<I>(mut self, items: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoIdentity,
    {
        self.fixed_items = Some(items.into_iter().map(IntoIdentity::into_identity).collect());
        self
    }

    pub fn lookup_name(mut self, name: impl Into<String>) -> Self {
        self.lookup_name = Some(name.into());
        self
    }

    /// Build the target set as seen from `origin`
    pub fn resolve(&self, origin: &CategoryItem) -> Result<CategorySet> {
        let context = origin.merged_context(self.rename.as_deref());

        tracing::debug!(
            from = %origin,
            target = %self.target,
            context = %context,
            lookup_name = self.lookup_name.as_deref(),
            "traversing to set"
        );

        let registry = origin.registry();
        let set_type = registry.set_type(&self.target)?;
        CategorySet::open(
            registry.clone(),
            set_type,
            context,
            self.fixed_items.clone(),
            self.lookup_name.clone(),
        )
    }
}

/// Function computing a target identity from the merged context
pub type IdentityFn =
    Arc<dyn Fn(&Context) -> std::result::Result<String, AccessorError> + Send + Sync>;

/// Where an item link gets its target identity
#[derive(Clone)]
pub enum TargetIdentity {
    /// A literal identity
    Fixed(String),
    /// The value bound to a context key
    FromContext(String),
    /// Computed from the navigation history
    Computed(IdentityFn),
}

impl TargetIdentity {
    pub fn fixed(identity: impl IntoIdentity) -> Self {
        TargetIdentity::Fixed(identity.into_identity())
    }

    pub fn from_context(key: impl Into<String>) -> Self {
        TargetIdentity::FromContext(key.into())
    }

    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Context) -> std::result::Result<String, AccessorError> + Send + Sync + 'static,
    {
        TargetIdentity::Computed(Arc::new(f))
    }

    pub fn evaluate(&self, context: &Context) -> Result<String> {
        match self {
            TargetIdentity::Fixed(identity) => Ok(identity.clone()),
            TargetIdentity::FromContext(key) => context
                .get(key)
                .map(str::to_string)
                .ok_or_else(|| CatsError::MissingContextKey { key: key.clone() }),
            TargetIdentity::Computed(f) => f(context).map_err(CatsError::Accessor),
        }
    }
}

impl fmt::Debug for TargetIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetIdentity::Fixed(identity) => f.debug_tuple("Fixed").field(identity).finish(),
            TargetIdentity::FromContext(key) => f.debug_tuple("FromContext").field(key).finish(),
            TargetIdentity::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Link from an item to a single related item
#[derive(Debug, Clone)]
pub struct ItemTraversal {
    /// Category name of the target
    pub target: String,
    pub identity: TargetIdentity,
    /// Context key to bind the origin under, instead of its category name
    pub rename: Option<String>,
}

impl ItemTraversal {
    pub fn to(target: impl Into<String>, identity: TargetIdentity) -> Self {
        Self {
            target: target.into(),
            identity,
            rename: None,
        }
    }

    pub fn rename(mut self, key: impl Into<String>) -> Self {
        self.rename = Some(key.into());
        self
    }

    /// Open the target item as seen from `origin`
    pub fn resolve(&self, origin: &CategoryItem) -> Result<CategoryItem> {
        let context = origin.merged_context(self.rename.as_deref());
        let registry = origin.registry();
        let kind = registry.category_type(&self.target)?;
        let identity = self.identity.evaluate(&context)?;

        tracing::debug!(
            from = %origin,
            target = %self.target,
            identity = %identity,
            "traversing to item"
        );

        Ok(CategoryItem::open(kind, registry.clone(), identity, context))
    }
}

/// A declared link of either kind
#[derive(Debug, Clone)]
pub enum Link {
    Set(Traversal),
    Item(ItemTraversal),
}

impl Link {
    pub fn target(&self) -> &str {
        match self {
            Link::Set(t) => &t.target,
            Link::Item(t) => &t.target,
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Link::Set(_))
    }

    pub fn follow(&self, origin: &CategoryItem) -> Result<Navigated> {
        match self {
            Link::Set(t) => t.resolve(origin).map(Navigated::Set),
            Link::Item(t) => t.resolve(origin).map(Navigated::Item),
        }
    }
}

impl From<Traversal> for Link {
    fn from(t: Traversal) -> Self {
        Link::Set(t)
    }
}

impl From<ItemTraversal> for Link {
    fn from(t: ItemTraversal) -> Self {
        Link::Item(t)
    }
}

/// Where following a link landed
#[derive(Debug, Clone, PartialEq)]
pub enum Navigated {
    Set(CategorySet),
    Item(CategoryItem),
}

impl Navigated {
    pub fn into_set(self) -> Option<CategorySet> {
        match self {
            Navigated::Set(set) => Some(set),
            Navigated::Item(_) => None,
        }
    }

    pub fn into_item(self) -> Option<CategoryItem> {
        match self {
            Navigated::Item(item) => Some(item),
            Navigated::Set(_) => None,
        }
    }
}

impl fmt::Display for Navigated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Navigated::Set(set) => fmt::Display::fmt(set, f),
            Navigated::Item(item) => fmt::Display::fmt(item, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryType;
    use crate::registry::Registry;

    fn registry() -> Registry {
        let registry = Registry::new();
        registry.declare(
            CategoryType::new("Folder")
                .traversal("my_files", Traversal::to("FileSet"))
                .traversal("owned", Traversal::to("File").rename("owner"))
                .traversal("pinned", Traversal::to("File").fixed_items(["README.md"]))
                .item_traversal(
                    "root",
                    ItemTraversal::to("Folder", TargetIdentity::fixed("/")),
                ),
        );
        registry.declare(CategoryType::new("File"));
        registry.derive_identity("File", |ctx: &Context| {
            Ok(ctx.iter().map(|(k, v)| format!("{}={}", k, v)).collect())
        });
        registry
    }

    #[test]
    fn test_traversal_binds_lowercased_category() {
        let registry = registry();
        let folder = registry
            .open_item("Folder", "docs", Context::from([("filesystem", "ourfs")]))
            .unwrap();

        let files = folder.traverse("my_files").unwrap();
        assert_eq!(files.name(), "FileSet");
        assert_eq!(files.context().get("folder"), Some("docs"));
        assert_eq!(files.items(), &["filesystem=ourfs".to_string(), "folder=docs".to_string()]);
    }

    #[test]
    fn test_rename_replaces_binding_key() {
        let registry = registry();
        let folder = registry.open_item("Folder", "docs", Context::new()).unwrap();

        let files = folder.traverse("owned").unwrap();
        assert_eq!(files.context().get("owner"), Some("docs"));
        assert!(!files.context().contains_key("folder"));
    }

    #[test]
    fn test_fixed_items_skip_resolution() {
        let registry = registry();
        let folder = registry.open_item("Folder", "docs", Context::new()).unwrap();

        let pinned = folder.traverse("pinned").unwrap();
        assert_eq!(pinned.items(), &["README.md".to_string()]);
    }

    #[test]
    fn test_item_traversal() {
        let registry = registry();
        let folder = registry.open_item("Folder", "docs", Context::new()).unwrap();

        let root = folder.follow("root").unwrap();
        assert_eq!(root.identity(), "/");
        assert_eq!(root.context().get("folder"), Some("docs"));
    }

    #[test]
    fn test_wrong_link_kind() {
        let registry = registry();
        let folder = registry.open_item("Folder", "docs", Context::new()).unwrap();

        assert_eq!(folder.follow("my_files").unwrap_err().error_code(), "WRONG_LINK_KIND");
        assert_eq!(folder.traverse("root").unwrap_err().error_code(), "WRONG_LINK_KIND");
        assert!(folder.navigate("root").unwrap().into_item().is_some());
    }

    #[test]
    fn test_target_identity_sources() {
        let ctx = Context::from([("home", "lakers"), ("away", "warriors"), ("team", "lakers")]);

        assert_eq!(TargetIdentity::fixed(7).evaluate(&ctx).unwrap(), "7");
        assert_eq!(TargetIdentity::from_context("away").evaluate(&ctx).unwrap(), "warriors");
        assert!(matches!(
            TargetIdentity::from_context("venue").evaluate(&ctx),
            Err(CatsError::MissingContextKey { ref key }) if key == "venue"
        ));

        let opponent = TargetIdentity::computed(|ctx: &Context| {
            let team = ctx.get("team").ok_or("no team")?;
            let home = ctx.get("home").ok_or("no home team")?;
            let away = ctx.get("away").ok_or("no away team")?;
            let opponent = if team == home { away } else { home };
            Ok(opponent.to_string())
        });
        assert_eq!(opponent.evaluate(&ctx).unwrap(), "warriors");
    }

    #[test]
    fn test_unknown_target_category() {
        let registry = Registry::new();
        registry.declare(CategoryType::new("Folder").traversal("tags", Traversal::to("TagSet")));

        let folder = registry.open_item("Folder", "docs", Context::new()).unwrap();
        assert!(matches!(
            folder.traverse("tags"),
            Err(CatsError::UnknownCategory { ref name }) if name == "TagSet"
        ));
    }

    #[test]
    fn test_unknown_item_target_category() {
        let registry = Registry::new();
        registry.declare(CategoryType::new("Folder").item_traversal(
            "drive",
            ItemTraversal::to("Drive", TargetIdentity::from_context("drive")),
        ));

        let folder = registry
            .open_item("Folder", "docs", Context::from([("drive", "c")]))
            .unwrap();
        assert!(matches!(
            folder.follow("drive"),
            Err(CatsError::UnknownCategory { ref name }) if name == "Drive"
        ));
        assert_eq!(folder.navigate("drive").unwrap_err().error_code(), "UNKNOWN_CATEGORY");
    }

    #[test]
    fn test_lookup_name_reaches_accessor_only_through_link() {
        let registry = Registry::new();
        registry.declare(
            CategoryType::new("Game").traversal("home", Traversal::to("Player").lookup_name("home")),
        );
        registry.declare(CategoryType::new("Player"));
        registry.derive_with_lookup("Player", ["game"], |_, lookup| {
            Ok(vec![lookup.unwrap_or("none").to_string()])
        });

        let game = registry.open_item("Game", "g1", Context::new()).unwrap();
        let home = game.traverse("home").unwrap();
        assert_eq!(home.items(), &["home".to_string()]);
        assert!(matches!(
            home.provenance(),
            crate::category::Provenance::Derived { lookup_name: Some(ref name), .. } if name == "home"
        ));
    }
}
