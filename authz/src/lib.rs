//! Role-based access control for the campus CRM.
//!
//! The crate has three parts:
//!
//! - [`registry`]: the permission catalog, the default grants for each role,
//!   and the route table that says which code (if any) gates each
//!   application route.
//! - [`evaluator`]: pure functions of a borrowed [`User`] and a shared
//!   [`Registry`] that answer permission, role and route questions.
//! - [`guard`]: adapters for conditional rendering and navigation gating.
//!
//! # Decisions
//!
//! - The superuser is granted every permission code, including codes that
//!   appear in no table, and satisfies every role check. No other role
//!   inherits this.
//! - Absent or unauthenticated users are denied everything except routes
//!   marked public.
//! - Routes with no registry entry are denied by default (fail-closed) for
//!   every user, superuser included, unless the registry was built with
//!   [`UnregisteredRoutePolicy::Allow`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use authz::{codes, AccessEvaluator, Registry, Role, User};
//!
//! let registry = Arc::new(Registry::school_default().unwrap());
//! let evaluator = AccessEvaluator::new(registry);
//!
//! let teacher = User::new("amina", Role::Teacher).with_permissions([codes::VIEW_REPORTS]);
//! assert!(evaluator.can_access(Some(&teacher), codes::CRUD_STUDENT));
//! assert!(evaluator.can_access(Some(&teacher), codes::VIEW_REPORTS));
//! assert!(!evaluator.can_access(Some(&teacher), codes::CRUD_PAYMENT));
//! assert!(!evaluator.can_access_route(Some(&teacher), "/unknown-feature"));
//! ```

pub mod codes;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod guard;
pub mod registry;
pub mod types;

pub use config::{load_registry, PolicyConfig};
pub use error::{AuthzError, Result};
pub use evaluator::{AccessEvaluator, Capabilities};
pub use guard::{GuardRequirement, NavigationDecision, NavigationGate};
pub use registry::{Registry, RouteAccess, RouteRequirement, UnregisteredRoutePolicy};
pub use types::{PermissionCode, Role, User};
