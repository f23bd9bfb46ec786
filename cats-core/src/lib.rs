//! # Cats Core - Category Traversal System
//!
//! Cats is a data navigation library. Entities are grouped into named
//! categories; items are reached by following links between categories,
//! and which items a set contains is decided by derivation rules keyed on
//! the context accumulated along the way.
//!
//! - **Categories**: named kinds of entities, each with an auto-derived set type
//! - **Derivations**: rules that list identities of a category for a context
//! - **Traversals**: links that merge the current item into the context and
//!   resolve the target from there
//! - **Catalogs**: JSON documents declaring all of the above
//!
//! ## Resolution
//!
//! For a category and context the most specific matching rule answers:
//! a rule whose required keys are exactly the context keys beats one whose
//! keys are merely present, which beats the catch-all identity rule. Ties
//! go to the rule registered first.
//!
//! ## Example
//!
//! ```rust
//! use cats_core::{CategoryType, Context, Registry, Traversal};
//!
//! let registry = Registry::new();
//! registry.declare(CategoryType::new("Folder").traversal("my_files", Traversal::to("FileSet")));
//! registry.declare(CategoryType::new("File"));
//!
//! registry.derive("Folder", ["filesystem"], |ctx| {
//!     Ok(vec![format!("/home/{}/files", ctx.get("filesystem").unwrap_or_default())])
//! });
//! registry.derive("File", ["folder"], |ctx| {
//!     Ok(vec![format!("{}/readme.md", ctx.get("folder").unwrap_or_default())])
//! });
//!
//! let folders = registry
//!     .open_set("FolderSet", Context::from([("filesystem", "ourfs")]))
//!     .unwrap();
//! assert_eq!(folders.items(), &["/home/ourfs/files".to_string()]);
//!
//! let folder = folders.lookup("/home/ourfs/files").unwrap();
//! let files = folder.traverse("my_files").unwrap();
//! assert_eq!(files.items(), &["/home/ourfs/files/readme.md".to_string()]);
//! assert_eq!(files.context().get("filesystem"), Some("ourfs"));
//! ```

pub mod catalog;
pub mod category;
pub mod context;
pub mod derivation;
pub mod error;
pub mod registry;
pub mod traversal;

// Re-export main types
pub use catalog::{CatalogLoader, CatalogManifest, TemplateAccessor};
pub use category::{
    make_set_type, Attributes, Category, CategoryDirectory, CategoryItem, CategorySet,
    CategoryType, IntoIdentity, Provenance, SetType,
};
pub use context::{Context, LOOKUP_NAME_KEY};
pub use derivation::{
    Accessor, AccessorResult, ContextFn, Derivation, DerivationRegistry, LookupFn, MatchTier,
    Selection,
};
pub use error::{AccessorError, CatsError, ErrorCategory, ErrorDetail, ErrorResponse, Result};
pub use registry::Registry;
pub use traversal::{ItemTraversal, Link, Navigated, TargetIdentity, Traversal};

/// Catalog format version understood by this crate
pub const CATALOG_VERSION: &str = catalog::VERSION;
