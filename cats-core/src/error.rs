//! Error types for category resolution and navigation
//!
//! Every failure in the engine is immediate and local to the call that
//! triggered it. Nothing is retried and nothing is recovered; resilience
//! around data sources belongs to the accessor functions supplied by the
//! embedding application.
//!
//! # Error Codes
//!
//! Each variant has a stable error code (e.g. `NO_MATCHING_RULE`) usable for
//! client-side handling and for aggregating failures in logs.
//!
//! # Example
//!
//! ```rust
//! use cats_core::{CatsError, ErrorCategory, Registry};
//!
//! let registry = Registry::new();
//! let err = registry.set_type("Nowhere").unwrap_err();
//!
//! assert_eq!(err.category(), ErrorCategory::NotFound);
//! assert_eq!(err.error_code(), "UNKNOWN_CATEGORY");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, CatsError>;

/// Error raised by user-supplied accessors and load hooks.
///
/// The engine never inspects it; it travels to the caller untouched.
pub type AccessorError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// A category, link, rule or identity could not be found
    NotFound,
    /// Input (catalog, link usage) was malformed
    Validation,
    /// Failure inside an accessor or while reading a catalog
    External,
}

/// Errors that can occur while declaring, resolving or navigating categories
#[derive(Error, Debug)]
pub enum CatsError {
    // ═══════════════════════════════════════════════════════════════════════
    // Resolution errors
    // ═══════════════════════════════════════════════════════════════════════

    /// No derivation for the category matched at any tier
    #[error("No derivation matches category '{category}'. Register one with derive() or derive_identity().")]
    NoMatchingRule { category: String },

    /// Category (or set) name was never declared
    #[error("Unknown category: '{name}'. Declare it before navigating to it.")]
    UnknownCategory { name: String },

    /// Identity lookup on a set whose items do not contain it
    #[error("Identity '{identity}' is not in {set}.")]
    IdentityNotInSet { set: String, identity: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Navigation errors
    // ═══════════════════════════════════════════════════════════════════════

    /// Category has no navigation link with this name
    #[error("Category '{category}' has no link named '{link}'.")]
    UnknownLink { category: String, link: String },

    /// Link exists but leads to the other kind of target
    #[error("Link '{link}' on '{category}' leads to {actual}, not {expected}.")]
    WrongLinkKind {
        category: String,
        link: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A context-derived identity or template named an absent key
    #[error("Context has no key '{key}'.")]
    MissingContextKey { key: String },

    /// Error raised inside an accessor or load hook, passed through as-is
    #[error(transparent)]
    Accessor(AccessorError),

    // ═══════════════════════════════════════════════════════════════════════
    // Catalog errors
    // ═══════════════════════════════════════════════════════════════════════

    /// Catalog manifest is malformed
    #[error("Invalid catalog: {reason}")]
    InvalidCatalog { reason: String },

    /// Catalog file could not be read
    #[error("Failed to load catalog from '{path}': {reason}")]
    CatalogLoadError { path: String, reason: String },

    /// JSON serialization or deserialization failed
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CatsError {
    /// Returns the error category for grouping
    pub fn category(&self) -> ErrorCategory {
        match self {
            CatsError::NoMatchingRule { .. }
            | CatsError::UnknownCategory { .. }
            | CatsError::IdentityNotInSet { .. }
            | CatsError::UnknownLink { .. }
            | CatsError::MissingContextKey { .. } => ErrorCategory::NotFound,

            CatsError::WrongLinkKind { .. } | CatsError::InvalidCatalog { .. } => {
                ErrorCategory::Validation
            }

            CatsError::Accessor(_)
            | CatsError::CatalogLoadError { .. }
            | CatsError::JsonError(_) => ErrorCategory::External,
        }
    }

    /// Returns the stable error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            CatsError::NoMatchingRule { .. } => "NO_MATCHING_RULE",
            CatsError::UnknownCategory { .. } => "UNKNOWN_CATEGORY",
            CatsError::IdentityNotInSet { .. } => "IDENTITY_NOT_IN_SET",
            CatsError::UnknownLink { .. } => "UNKNOWN_LINK",
            CatsError::WrongLinkKind { .. } => "WRONG_LINK_KIND",
            CatsError::MissingContextKey { .. } => "MISSING_CONTEXT_KEY",
            CatsError::Accessor(_) => "ACCESSOR_ERROR",
            CatsError::InvalidCatalog { .. } => "INVALID_CATALOG",
            CatsError::CatalogLoadError { .. } => "CATALOG_LOAD_ERROR",
            CatsError::JsonError(_) => "JSON_ERROR",
        }
    }

    /// Returns the accessor's own error if this is an accessor failure
    pub fn into_accessor_error(self) -> Option<AccessorError> {
        match self {
            CatsError::Accessor(inner) => Some(inner),
            _ => None,
        }
    }

    /// Converts this error to a JSON-serializable response object
    ///
    /// ```json
    /// {
    ///   "error": {
    ///     "code": "UNKNOWN_CATEGORY",
    ///     "message": "Unknown category: 'Team'...",
    ///     "category": "not_found"
    ///   }
    /// }
    /// ```
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                category: self.category(),
            },
        }
    }
}

/// JSON-serializable error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
}

/// Error detail for JSON responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable error code (e.g., "NO_MATCHING_RULE")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Error category
    pub category: ErrorCategory,
}
