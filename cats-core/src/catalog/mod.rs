//! Catalogs - declarative category graphs
//!
//! A catalog is a JSON document declaring categories, their navigation
//! links and template-based derivations. Installing it into a [`Registry`]
//! is equivalent to making the same `declare` / `derive` calls in code.
//!
//! ```json
//! {
//!   "catalog_version": "1.0",
//!   "name": "filesystem",
//!   "categories": [
//!     { "name": "Folder", "links": [{ "kind": "set", "name": "my_files", "target": "FileSet" }] },
//!     { "name": "File" }
//!   ],
//!   "derivations": [
//!     { "category": "Folder", "requires": ["filesystem"], "items": ["/home/{filesystem}/files"] },
//!     { "category": "File", "items": [] }
//!   ]
//! }
//! ```
//!
//! [`Registry`]: crate::Registry

mod loader;
mod manifest;
mod template;

pub use loader::{CatalogLoader, LoadedCatalog};
pub use manifest::{CatalogManifest, CategorySpec, DerivationSpec, LinkSpec};
pub use template::TemplateAccessor;

/// Catalog format version
pub const VERSION: &str = "1.0";
