//! YAML policy documents.
//!
//! A policy file describes the same tables as [`Registry::school_default`] and
//! lets a deployment (or a test) substitute its own:
//!
//! ```yaml
//! unregistered_routes: deny
//! permissions: [CRUD_STUDENT, VIEW_REPORTS]
//! roles:
//!   teacher: [CRUD_STUDENT]
//! routes:
//!   - route: /login
//!     public: true
//!   - route: /dashboard
//!   - route: /reports
//!     permission: VIEW_REPORTS
//! ```
//!
//! A route with neither `public` nor `permission` is open to any
//! authenticated user.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::error::{AuthzError, Result};
use crate::registry::{Registry, RouteAccess, UnregisteredRoutePolicy};
use crate::types::{PermissionCode, Role};

/// Serializable form of a [`Registry`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub unregistered_routes: UnregisteredRoutePolicy,
    #[serde(default)]
    pub permissions: Vec<PermissionCode>,
    #[serde(default)]
    pub roles: BTreeMap<String, Vec<PermissionCode>>,
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

/// One row of the route table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub route: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<PermissionCode>,
}

impl PolicyConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| AuthzError::PolicyParse(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)?;
        info!("Loaded policy from {}", path.display());
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| AuthzError::PolicyParse(e.to_string()))
    }

    /// Validates the document and builds the registry it describes.
    pub fn into_registry(self) -> Result<Registry> {
        let mut builder = Registry::builder()
            .permissions(self.permissions)
            .unregistered_routes(self.unregistered_routes);

        for (name, codes) in self.roles {
            let role: Role = name.parse()?;
            builder = builder.grant(role, codes);
        }

        for entry in self.routes {
            let access = match (entry.public, entry.permission) {
                (true, Some(code)) => {
                    return Err(AuthzError::PolicyParse(format!(
                        "route {} is public but also requires {}",
                        entry.route, code
                    )))
                }
                (true, None) => RouteAccess::Public,
                (false, Some(code)) => RouteAccess::Requires(code),
                (false, None) => RouteAccess::Authenticated,
            };
            builder = builder.route(entry.route, access);
        }

        builder.build()
    }
}

impl From<&Registry> for PolicyConfig {
    fn from(registry: &Registry) -> Self {
        let roles: BTreeMap<String, Vec<PermissionCode>> = [Role::Teacher, Role::Student]
            .into_iter()
            .filter_map(|role| {
                let codes = registry.permissions_for_role(role);
                (!codes.is_empty())
                    .then(|| (role.to_string(), codes.iter().cloned().collect::<Vec<_>>()))
            })
            .collect();

        let routes = registry
            .routes()
            .map(|(route, access)| RouteEntry {
                route: route.to_string(),
                public: matches!(access, RouteAccess::Public),
                permission: match access {
                    RouteAccess::Requires(code) => Some(code.clone()),
                    _ => None,
                },
            })
            .collect();

        Self {
            unregistered_routes: registry.unregistered_routes(),
            permissions: registry.known_permissions().to_vec(),
            roles,
            routes,
        }
    }
}

/// Loads the registry from `path`, or the built-in table when no path is given.
pub fn load_registry(path: Option<&Path>) -> Result<Registry> {
    match path {
        Some(path) => PolicyConfig::from_file(path)?.into_registry(),
        None => {
            info!("No policy file configured, using built-in registry");
            Registry::school_default()
        }
    }
}
