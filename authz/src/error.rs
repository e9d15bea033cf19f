//! Error types for the access-control core.
//!
//! Evaluation itself never fails: every lookup is total over the registry and
//! an absent user is an ordinary input. Errors only arise while a registry is
//! being built or loaded from configuration.

use thiserror::Error;

/// Errors raised while constructing or loading a permission registry.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// A role name did not match `superuser`, `teacher` or `student`.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// A role row or route referenced a code missing from the catalog.
    #[error("Permission code {code} used by {used_by} is not declared")]
    UndeclaredPermission { code: String, used_by: String },

    /// A permission code was empty or contained whitespace.
    #[error("Invalid permission code: {0:?}")]
    InvalidPermission(String),

    /// The same route was registered twice.
    #[error("Route registered more than once: {0}")]
    DuplicateRoute(String),

    /// A route identifier did not start with `/`.
    #[error("Invalid route: {0:?}")]
    InvalidRoute(String),

    /// The superuser row is derived from the catalog and cannot be written.
    #[error("Superuser permissions are derived from the catalog and cannot be assigned")]
    SuperuserRowAssigned,

    /// The policy document could not be parsed.
    #[error("Policy parsing failed: {0}")]
    PolicyParse(String),

    /// The policy file could not be read.
    #[error("Failed to read policy file: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for registry operations.
pub type Result<T> = std::result::Result<T, AuthzError>;
