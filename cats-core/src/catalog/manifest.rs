//! Catalog manifest types and validation

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::category::CategoryType;
use crate::derivation::Derivation;
use crate::registry::Registry;
use crate::traversal::{ItemTraversal, TargetIdentity, Traversal};

use super::{TemplateAccessor, VERSION};

/// A declarative bundle of categories, links and derivations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogManifest {
    /// Catalog format version (must be "1.0")
    pub catalog_version: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub categories: Vec<CategorySpec>,

    #[serde(default)]
    pub derivations: Vec<DerivationSpec>,
}

/// A category and its navigation links
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySpec {
    pub name: String,

    #[serde(default)]
    pub links: Vec<LinkSpec>,
}

/// A navigation link as written in a catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkSpec {
    /// Link to a set of items
    Set {
        name: String,
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rename: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        items: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lookup_name: Option<String>,
    },
    /// Link to a single item; exactly one of `identity` / `identity_from`
    Item {
        name: String,
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rename: Option<String>,
        /// Literal target identity
        #[serde(default, skip_serializing_if = "Option::is_none")]
        identity: Option<String>,
        /// Context key whose value is the target identity
        #[serde(default, skip_serializing_if = "Option::is_none")]
        identity_from: Option<String>,
    },
}

impl LinkSpec {
    pub fn name(&self) -> &str {
        match self {
            LinkSpec::Set { name, .. } | LinkSpec::Item { name, .. } => name,
        }
    }
}

/// A template-based derivation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivationSpec {
    pub category: String,

    /// Required context keys; empty makes this the identity rule
    #[serde(default)]
    pub requires: Vec<String>,

    /// Identity templates with `{key}` placeholders
    #[serde(default)]
    pub items: Vec<String>,

    /// Templates per traversal lookup name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub by_lookup: BTreeMap<String, Vec<String>>,
}

impl DerivationSpec {
    pub fn to_derivation(&self) -> Derivation {
        let accessor = self
            .by_lookup
            .iter()
            .fold(TemplateAccessor::new(self.items.iter().cloned()), |acc, (name, templates)| {
                acc.for_lookup(name.clone(), templates.iter().cloned())
            });
        Derivation::new(self.category.clone(), self.requires.iter().cloned(), accessor)
    }
}

impl CatalogManifest {
    /// Validate the manifest, collecting every problem
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = vec![];

        if self.catalog_version != VERSION {
            errors.push(format!(
                "Unsupported catalog version: expected {}, got {}",
                VERSION, self.catalog_version
            ));
        }

        if self.name.is_empty() {
            errors.push("name cannot be empty".to_string());
        }

        let mut seen = HashSet::new();
        for category in &self.categories {
            if category.name.is_empty() {
                errors.push("category name cannot be empty".to_string());
            } else if !seen.insert(category.name.as_str()) {
                errors.push(format!("Duplicate category: {}", category.name));
            }

            let mut link_names = HashSet::new();
            for link in &category.links {
                if !link_names.insert(link.name()) {
                    errors.push(format!("Duplicate link '{}' on {}", link.name(), category.name));
                }

                if let LinkSpec::Item {
                    name,
                    identity,
                    identity_from,
                    ..
                } = link
                {
                    if identity.is_some() == identity_from.is_some() {
                        errors.push(format!(
                            "Item link '{}' on {} needs exactly one of identity / identity_from",
                            name, category.name
                        ));
                    }
                }
            }
        }

        for derivation in &self.derivations {
            if derivation.category.is_empty() {
                errors.push("derivation category cannot be empty".to_string());
            }
            if derivation.requires.iter().any(|k| k.is_empty()) {
                errors.push(format!(
                    "Derivation for {} has an empty required key",
                    derivation.category
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Build the category descriptors declared by this manifest
    pub fn category_types(&self) -> Vec<CategoryType> {
        self.categories
            .iter()
            .map(|spec| {
                spec.links.iter().fold(CategoryType::new(spec.name.clone()), |kind, link| {
                    match link {
                        LinkSpec::Set {
                            name,
                            target,
                            rename,
                            items,
                            lookup_name,
                        } => kind.traversal(
                            name.clone(),
                            Traversal {
                                target: target.clone(),
                                rename: rename.clone(),
                                fixed_items: items.clone(),
                                lookup_name: lookup_name.clone(),
                            },
                        ),
                        LinkSpec::Item {
                            name,
                            target,
                            rename,
                            identity,
                            identity_from,
                        } => {
                            let source = match (identity, identity_from) {
                                (Some(literal), _) => TargetIdentity::fixed(literal),
                                (None, Some(key)) => TargetIdentity::from_context(key.clone()),
                                (None, None) => TargetIdentity::fixed(""),
                            };
                            let traversal = ItemTraversal {
                                target: target.clone(),
                                identity: source,
                                rename: rename.clone(),
                            };
                            kind.item_traversal(name.clone(), traversal)
                        }
                    }
                })
            })
            .collect()
    }

    /// Declare every category and register every derivation
    pub fn install(&self, registry: &Registry) {
        for kind in self.category_types() {
            registry.declare(kind);
        }
        for spec in &self.derivations {
            registry.register(spec.to_derivation());
        }

        tracing::debug!(
            catalog = %self.name,
            categories = self.categories.len(),
            derivations = self.derivations.len(),
            "installed catalog"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manifest(value: serde_json::Value) -> CatalogManifest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_valid_manifest() {
        let m = manifest(json!({
            "catalog_version": "1.0",
            "name": "filesystem",
            "categories": [
                {
                    "name": "Folder",
                    "links": [
                        { "kind": "set", "name": "my_files", "target": "FileSet" },
                        { "kind": "item", "name": "mount", "target": "Filesystem", "identity_from": "filesystem" }
                    ]
                },
                { "name": "File" }
            ],
            "derivations": [
                { "category": "Folder", "requires": ["filesystem"], "items": ["/home/{filesystem}/files"] },
                { "category": "File", "items": [] }
            ]
        }));

        assert!(m.validate().is_ok());
        assert_eq!(m.category_types().len(), 2);
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let m = manifest(json!({
            "catalog_version": "2.0",
            "name": "",
            "categories": [
                {
                    "name": "Team",
                    "links": [
                        { "kind": "item", "name": "rival", "target": "Team" },
                        { "kind": "set", "name": "rival", "target": "Team" }
                    ]
                },
                { "name": "Team" }
            ],
            "derivations": [
                { "category": "Team", "requires": [""], "items": [] }
            ]
        }));

        let errors = m.validate().unwrap_err();
        assert_eq!(errors.len(), 6);
        assert!(errors.iter().any(|e| e.contains("Unsupported catalog version")));
        assert!(errors.iter().any(|e| e.contains("Duplicate category: Team")));
        assert!(errors.iter().any(|e| e.contains("Duplicate link 'rival'")));
        assert!(errors.iter().any(|e| e.contains("exactly one of identity")));
    }

    #[test]
    fn test_link_targets_are_not_checked() {
        let m = manifest(json!({
            "catalog_version": "1.0",
            "name": "dangling",
            "categories": [
                { "name": "Folder", "links": [{ "kind": "set", "name": "tags", "target": "Tag" }] }
            ]
        }));
        assert!(m.validate().is_ok());
    }

    #[test]
    fn test_install_declares_and_registers() {
        let m = manifest(json!({
            "catalog_version": "1.0",
            "name": "filesystem",
            "categories": [{ "name": "Folder" }],
            "derivations": [
                { "category": "Folder", "requires": ["filesystem"], "items": ["/home/{filesystem}/files"] }
            ]
        }));

        let registry = Registry::new();
        m.install(&registry);

        let folders = registry
            .open_set("FolderSet", crate::Context::from([("filesystem", "ourfs")]))
            .unwrap();
        assert_eq!(folders.items(), &["/home/ourfs/files".to_string()]);
    }
}
