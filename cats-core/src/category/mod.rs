//! Categories - named kinds of entities and their auto-derived set types
//!
//! Declaring a category stores its [`CategoryType`] in the
//! [`CategoryDirectory`] and synthesizes exactly one [`SetType`] for it with
//! [`make_set_type`]. The set type is reachable both by the category name
//! (`"File"`) and by its own name (`"FileSet"`).
//!
//! ```text
//!   declare(CategoryType "Folder")
//!            │
//!            ├──► categories["Folder"]   = Folder
//!            └──► make_set_type(Folder)
//!                     ├──► sets["Folder"]    = FolderSet
//!                     └──► sets["FolderSet"] = FolderSet
//! ```

mod item;
mod set;

pub use item::{Attributes, CategoryItem, IntoIdentity};
pub use set::{CategorySet, Items, Provenance};

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::error::{AccessorError, CatsError, Result};
use crate::traversal::{ItemTraversal, Link, Traversal};

/// Hook run once right after an item is opened
pub type LoadHook = Arc<dyn Fn(&CategoryItem) -> Attributes + Send + Sync>;

/// Hook run lazily on first attribute access
pub type LateLoadHook =
    Arc<dyn Fn(&CategoryItem) -> std::result::Result<Attributes, AccessorError> + Send + Sync>;

/// Descriptor of an entity type: its name, navigation links and load hooks
#[derive(Clone)]
pub struct CategoryType {
    name: String,
    links: BTreeMap<String, Link>,
    initial_load: Option<LoadHook>,
    late_load: Option<LateLoadHook>,
}

impl CategoryType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            links: BTreeMap::new(),
            initial_load: None,
            late_load: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the auto-derived set type
    pub fn set_name(&self) -> String {
        format!("{}Set", self.name)
    }

    /// Context key items of this category bind when navigated away from
    pub fn binding_key(&self) -> String {
        self.name.to_lowercase()
    }

    /// Declare a link to a set of related items
    pub fn traversal(self, name: impl Into<String>, traversal: Traversal) -> Self {
        self.link(name, traversal)
    }

    /// Declare a link to a single related item
    pub fn item_traversal(self, name: impl Into<String>, traversal: ItemTraversal) -> Self {
        self.link(name, traversal)
    }

    pub fn link(mut self, name: impl Into<String>, link: impl Into<Link>) -> Self {
        self.links.insert(name.into(), link.into());
        self
    }

    pub fn on_initial_load<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CategoryItem) -> Attributes + Send + Sync + 'static,
    {
        self.initial_load = Some(Arc::new(hook));
        self
    }

    pub fn on_late_load<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CategoryItem) -> std::result::Result<Attributes, AccessorError> + Send + Sync + 'static,
    {
        self.late_load = Some(Arc::new(hook));
        self
    }

    pub fn link_named(&self, name: &str) -> Option<&Link> {
        self.links.get(name)
    }

    /// Declared links, sorted by name
    pub fn links(&self) -> impl Iterator<Item = (&str, &Link)> {
        self.links.iter().map(|(name, link)| (name.as_str(), link))
    }

    pub(crate) fn initial_load_hook(&self) -> Option<&LoadHook> {
        self.initial_load.as_ref()
    }

    pub(crate) fn late_load_hook(&self) -> Option<&LateLoadHook> {
        self.late_load.as_ref()
    }
}

impl fmt::Debug for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CategoryType")
            .field("name", &self.name)
            .field("links", &self.links)
            .field("initial_load", &self.initial_load.is_some())
            .field("late_load", &self.late_load.is_some())
            .finish()
    }
}

/// Descriptor of the set type derived from a category
#[derive(Debug, Clone)]
pub struct SetType {
    name: String,
    item: Arc<CategoryType>,
}

impl SetType {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The category this is a set of
    pub fn item(&self) -> &Arc<CategoryType> {
        &self.item
    }
}

/// Synthesize the set type for a category
pub fn make_set_type(item: &Arc<CategoryType>) -> SetType {
    SetType {
        name: item.set_name(),
        item: Arc::clone(item),
    }
}

/// A Rust type that names a category and declares its links
///
/// ```rust
/// use cats_core::{Category, CategoryType, Registry, Traversal};
///
/// struct Folder;
///
/// impl Category for Folder {
///     const NAME: &'static str = "Folder";
///
///     fn define(kind: CategoryType) -> CategoryType {
///         kind.traversal("my_files", Traversal::to("FileSet"))
///     }
/// }
///
/// let registry = Registry::new();
/// let set_type = registry.declare_type::<Folder>();
/// assert_eq!(set_type.name(), "FolderSet");
/// ```
pub trait Category {
    const NAME: &'static str;

    fn define(kind: CategoryType) -> CategoryType {
        kind
    }
}

/// Category name → entity and set descriptors
#[derive(Debug, Default)]
pub struct CategoryDirectory {
    categories: HashMap<String, Arc<CategoryType>>,

    /// Keyed by both category name and set name
    sets: HashMap<String, Arc<SetType>>,
}

impl CategoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a category and its synthesized set type.
    ///
    /// Re-declaring a name replaces the previous entry.
    pub fn declare(&mut self, kind: CategoryType) -> Arc<SetType> {
        let kind = Arc::new(kind);
        let set_type = Arc::new(make_set_type(&kind));

        if self.categories.insert(kind.name().to_string(), Arc::clone(&kind)).is_some() {
            tracing::warn!(category = kind.name(), "category re-declared; replacing previous entry");
        }
        self.sets.insert(kind.name().to_string(), Arc::clone(&set_type));
        self.sets.insert(set_type.name().to_string(), Arc::clone(&set_type));

        set_type
    }

    pub fn entity_for(&self, name: &str) -> Result<Arc<CategoryType>> {
        self.categories
            .get(name)
            .cloned()
            .ok_or_else(|| CatsError::UnknownCategory {
                name: name.to_string(),
            })
    }

    /// Set type by category name or set name
    pub fn collection_for(&self, name: &str) -> Result<Arc<SetType>> {
        self.sets
            .get(name)
            .cloned()
            .ok_or_else(|| CatsError::UnknownCategory {
                name: name.to_string(),
            })
    }

    /// Declared category names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.categories.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_binds_set_under_both_names() {
        let mut directory = CategoryDirectory::new();
        directory.declare(CategoryType::new("Folder"));

        let by_category = directory.collection_for("Folder").unwrap();
        let by_set = directory.collection_for("FolderSet").unwrap();
        assert!(Arc::ptr_eq(&by_category, &by_set));
        assert_eq!(by_category.name(), "FolderSet");
        assert_eq!(by_category.item().name(), "Folder");
    }

    #[test]
    fn test_redeclaration_replaces() {
        let mut directory = CategoryDirectory::new();
        directory.declare(CategoryType::new("Team"));
        directory.declare(CategoryType::new("Team").traversal("games", Traversal::to("Game")));

        assert_eq!(directory.len(), 1);
        let team = directory.entity_for("Team").unwrap();
        assert!(team.link_named("games").is_some());

        let set_type = directory.collection_for("TeamSet").unwrap();
        assert!(Arc::ptr_eq(set_type.item(), &team));
    }

    #[test]
    fn test_unknown_category() {
        let directory = CategoryDirectory::new();
        assert!(matches!(
            directory.entity_for("Team"),
            Err(CatsError::UnknownCategory { ref name }) if name == "Team"
        ));
        assert_eq!(
            directory.collection_for("TeamSet").unwrap_err().error_code(),
            "UNKNOWN_CATEGORY"
        );
    }

    #[test]
    fn test_binding_key_is_case_folded() {
        let kind = CategoryType::new("Folder");
        assert_eq!(kind.binding_key(), "folder");
        assert_eq!(kind.set_name(), "FolderSet");
    }
}
