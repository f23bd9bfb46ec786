//! A context-scoped group of items of one category

use std::collections::HashSet;
use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor};
use std::sync::Arc;

use crate::context::Context;
use crate::derivation::Selection;
use crate::error::{CatsError, Result};
use crate::registry::Registry;

use super::{CategoryItem, SetType};

/// How a set's items were produced
#[derive(Debug, Clone)]
pub enum Provenance {
    /// Items given verbatim, or computed by set algebra; no rule consulted
    Explicit,
    /// Items returned by a derivation
    Derived {
        selection: Selection,
        /// Lookup name handed to the accessor
        lookup_name: Option<String>,
    },
}

/// Identities of one category, materialized once at construction.
///
/// A set built from explicit items is a plain container; otherwise its
/// items come from the best matching derivation for its context. Items are
/// opened lazily while iterating, each carrying the set's context.
#[derive(Clone)]
pub struct CategorySet {
    kind: Arc<SetType>,
    context: Context,
    items: Vec<String>,
    provenance: Provenance,
    registry: Registry,
}

impl CategorySet {
    /// Build a set, resolving items through the registry unless given.
    ///
    /// Routing keys are dropped from `context`; only `lookup_name` reaches
    /// the accessor.
    pub(crate) fn open(
        registry: Registry,
        kind: Arc<SetType>,
        context: Context,
        items: Option<Vec<String>>,
        lookup_name: Option<String>,
    ) -> Result<Self> {
        let (context, _) = context.take_lookup_name();
        let (items, provenance) = match items {
            Some(items) => (items, Provenance::Explicit),
            None => {
                let (selection, items) = registry.resolve_selected(
                    kind.item().name(),
                    &context,
                    lookup_name.as_deref(),
                )?;
                (
                    items,
                    Provenance::Derived {
                        selection,
                        lookup_name,
                    },
                )
            }
        };

        Ok(Self {
            kind,
            context,
            items,
            provenance,
            registry,
        })
    }

    /// Set type name, e.g. `FolderSet`
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    /// Category of the items, e.g. `Folder`
    pub fn item_category(&self) -> &str {
        self.kind.item().name()
    }

    pub fn kind(&self) -> &Arc<SetType> {
        &self.kind
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// True when no derivation produced the items
    pub fn is_explicit(&self) -> bool {
        matches!(self.provenance, Provenance::Explicit)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate the items in order, opening each one
    pub fn iter(&self) -> Items<'_> {
        Items { set: self, pos: 0 }
    }

    /// Open the item at `index`
    pub fn get(&self, index: usize) -> Option<CategoryItem> {
        self.items.get(index).map(|identity| self.open_item(identity))
    }

    /// Open the item with this identity
    pub fn lookup(&self, identity: &str) -> Result<CategoryItem> {
        if self.contains_identity(identity) {
            Ok(self.open_item(identity))
        } else {
            Err(CatsError::IdentityNotInSet {
                set: self.name().to_string(),
                identity: identity.to_string(),
            })
        }
    }

    pub fn contains_identity(&self, identity: &str) -> bool {
        self.items.iter().any(|i| i == identity)
    }

    /// True when `item` is of this set's category and its identity is listed
    pub fn contains(&self, item: &CategoryItem) -> bool {
        item.category() == self.item_category() && self.contains_identity(item.identity())
    }

    /// Identities present in both sets
    pub fn intersection(&self, other: &CategorySet) -> CategorySet {
        self.check_compatible(other, "intersection");
        let theirs: HashSet<&str> = other.items.iter().map(String::as_str).collect();
        self.rewrap(dedup(self.items.iter().filter(|i| theirs.contains(i.as_str()))))
    }

    /// Identities present in either set
    pub fn union(&self, other: &CategorySet) -> CategorySet {
        self.check_compatible(other, "union");
        self.rewrap(dedup(self.items.iter().chain(other.items.iter())))
    }

    /// Identities present in exactly one of the sets
    pub fn symmetric_difference(&self, other: &CategorySet) -> CategorySet {
        self.check_compatible(other, "symmetric difference");
        let ours: HashSet<&str> = self.items.iter().map(String::as_str).collect();
        let theirs: HashSet<&str> = other.items.iter().map(String::as_str).collect();

        let only_ours = self.items.iter().filter(|i| !theirs.contains(i.as_str()));
        let only_theirs = other.items.iter().filter(|i| !ours.contains(i.as_str()));
        self.rewrap(dedup(only_ours.chain(only_theirs)))
    }

    fn open_item(&self, identity: &str) -> CategoryItem {
        CategoryItem::open(
            Arc::clone(self.kind.item()),
            self.registry.clone(),
            identity,
            self.context.clone(),
        )
    }

    /// Same set type, explicit items, empty context
    fn rewrap(&self, items: Vec<String>) -> CategorySet {
        CategorySet {
            kind: Arc::clone(&self.kind),
            context: Context::new(),
            items,
            provenance: Provenance::Explicit,
            registry: self.registry.clone(),
        }
    }

    fn check_compatible(&self, other: &CategorySet, operation: &str) {
        if self.name() != other.name() {
            tracing::warn!(
                left = self.name(),
                right = other.name(),
                operation,
                "combining sets of different categories; result keeps the left type"
            );
        }
    }
}

fn dedup<'a>(identities: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    identities
        .filter(|i| seen.insert(i.as_str()))
        .cloned()
        .collect()
}

/// Iterator over a set's items, exhausted after one pass
pub struct Items<'a> {
    set: &'a CategorySet,
    pos: usize,
}

impl Iterator for Items<'_> {
    type Item = CategoryItem;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.set.get(self.pos)?;
        self.pos += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.set.len().saturating_sub(self.pos);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Items<'_> {}

impl<'a> IntoIterator for &'a CategorySet {
    type Item = CategoryItem;
    type IntoIter = Items<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl PartialEq for CategorySet {
    fn eq(&self, other: &Self) -> bool {
        if self.name() != other.name() || self.len() != other.len() {
            return false;
        }
        let mut ours: Vec<&String> = self.items.iter().collect();
        let mut theirs: Vec<&String> = other.items.iter().collect();
        ours.sort();
        theirs.sort();
        ours == theirs
    }
}

impl BitAnd for &CategorySet {
    type Output = CategorySet;

    fn bitand(self, rhs: Self) -> CategorySet {
        self.intersection(rhs)
    }
}

impl BitOr for &CategorySet {
    type Output = CategorySet;

    fn bitor(self, rhs: Self) -> CategorySet {
        self.union(rhs)
    }
}

impl BitXor for &CategorySet {
    type Output = CategorySet;

    fn bitxor(self, rhs: Self) -> CategorySet {
        self.symmetric_difference(rhs)
    }
}

impl BitAnd for CategorySet {
    type Output = CategorySet;

    fn bitand(self, rhs: Self) -> CategorySet {
        self.intersection(&rhs)
    }
}

impl BitOr for CategorySet {
    type Output = CategorySet;

    fn bitor(self, rhs: Self) -> CategorySet {
        self.union(&rhs)
    }
}

impl BitXor for CategorySet {
    type Output = CategorySet;

    fn bitxor(self, rhs: Self) -> CategorySet {
        self.symmetric_difference(&rhs)
    }
}

impl fmt::Display for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({} {}s)", self.name(), self.len(), self.item_category())
    }
}

impl fmt::Debug for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CategorySet")
            .field("name", &self.name())
            .field("context", &self.context)
            .field("items", &self.items)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryType;

    fn teams(registry: &Registry, items: &[&str]) -> CategorySet {
        registry
            .set_of("Team", items.iter().copied(), Context::new())
            .unwrap()
    }

    fn sorted(set: &CategorySet) -> Vec<&str> {
        let mut items: Vec<&str> = set.items().iter().map(String::as_str).collect();
        items.sort();
        items
    }

    fn registry() -> Registry {
        let registry = Registry::new();
        registry.declare(CategoryType::new("Team"));
        registry.declare(CategoryType::new("Player"));
        registry
    }

    #[test]
    fn test_union_and_intersection() {
        let registry = registry();
        let t1 = teams(&registry, &["lakers", "warriors"]);
        let t2 = teams(&registry, &["warriors", "clippers"]);

        let union = &t1 | &t2;
        assert_eq!(union.len(), 3);
        assert_eq!(sorted(&union), vec!["clippers", "lakers", "warriors"]);

        let both = &t1 & &t2;
        assert_eq!(both.items(), &["warriors".to_string()]);
        assert_eq!(both.name(), "TeamSet");
    }

    #[test]
    fn test_symmetric_difference_excludes_shared() {
        let registry = registry();
        let t1 = teams(&registry, &["lakers", "warriors", "lakers"]);
        let t2 = teams(&registry, &["warriors", "clippers"]);

        let diff = t1 ^ t2;
        assert_eq!(sorted(&diff), vec!["clippers", "lakers"]);
    }

    #[test]
    fn test_algebra_drops_context() {
        let registry = registry();
        let t1 = registry
            .set_of("Team", ["lakers"], Context::from([("season", "2019")]))
            .unwrap();
        let t2 = teams(&registry, &["celtics"]);

        assert!((&t1 | &t2).context().is_empty());
    }

    #[test]
    fn test_membership_checks_category() {
        let registry = registry();
        let set = teams(&registry, &["lakers"]);

        let lakers = registry.open_item("Team", "lakers", Context::new()).unwrap();
        let player = registry.open_item("Player", "lakers", Context::new()).unwrap();

        assert!(set.contains(&lakers));
        assert!(!set.contains(&player));
    }

    #[test]
    fn test_equality_is_order_insensitive() {
        let registry = registry();
        let a = teams(&registry, &["lakers", "warriors"]);
        let b = registry
            .set_of("Team", ["warriors", "lakers"], Context::from([("season", "2019")]))
            .unwrap();
        let c = registry.set_of("Player", ["lakers", "warriors"], Context::new()).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_iteration_carries_context() {
        let registry = registry();
        let set = registry
            .set_of("Team", ["lakers", "warriors"], Context::from([("season", "2019")]))
            .unwrap();

        let mut iter = set.iter();
        assert_eq!(iter.len(), 2);
        let first = iter.next().unwrap();
        assert_eq!(first.identity(), "lakers");
        assert_eq!(first.context().get("season"), Some("2019"));
        assert_eq!(iter.next().unwrap().identity(), "warriors");
        assert!(iter.next().is_none());

        let names: Vec<String> = (&set).into_iter().map(|t| t.identity().to_string()).collect();
        assert_eq!(names, vec!["lakers", "warriors"]);
    }

    #[test]
    fn test_index_and_lookup() {
        let registry = registry();
        let set = teams(&registry, &["lakers", "warriors"]);

        assert_eq!(set.get(1).unwrap().identity(), "warriors");
        assert!(set.get(2).is_none());
        assert_eq!(set.lookup("lakers").unwrap().identity(), "lakers");
        assert!(matches!(
            set.lookup("celtics"),
            Err(CatsError::IdentityNotInSet { ref identity, .. }) if identity == "celtics"
        ));
    }

    #[test]
    fn test_provenance() {
        let registry = registry();
        registry.derive("Team", ["division"], |_| Ok(vec!["lakers".to_string()]));

        let derived = registry
            .open_set("Team", Context::from([("division", "pacific")]))
            .unwrap();
        match derived.provenance() {
            Provenance::Derived { selection, lookup_name } => {
                assert_eq!(selection.derivation.to_string(), "Team->division");
                assert!(lookup_name.is_none());
            }
            Provenance::Explicit => panic!("expected a derived set"),
        }
        assert!(!derived.is_explicit());

        let explicit = teams(&registry, &["lakers"]);
        assert!(explicit.is_explicit());
        assert!((&derived | &explicit).is_explicit());
    }

    #[test]
    fn test_routing_key_in_context_is_not_a_lookup_name() {
        let registry = registry();
        registry.derive_with_lookup("Player", ["game"], |_, lookup| {
            Ok(vec![lookup.unwrap_or("none").to_string()])
        });

        let ctx = Context::from([("game", "g1"), (crate::context::LOOKUP_NAME_KEY, "home")]);
        let players = registry.open_set("Player", ctx).unwrap();

        assert_eq!(players.items(), &["none".to_string()]);
        assert!(!players.context().contains_key(crate::context::LOOKUP_NAME_KEY));
    }

    #[test]
    fn test_display() {
        let registry = registry();
        assert_eq!(teams(&registry, &["lakers", "warriors"]).to_string(), "TeamSet(2 Teams)");
    }
}
