//! The permission registry: which codes exist, what each role is granted by
//! default, and which code (if any) guards each application route.
//!
//! A [`Registry`] is immutable once built. Construct it through
//! [`RegistryBuilder`] (or [`Registry::school_default`] / a
//! [`PolicyConfig`](crate::config::PolicyConfig)) and share it as
//! `Arc<Registry>`; nothing in this crate keeps a global copy.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

use crate::codes;
use crate::error::{AuthzError, Result};
use crate::types::{PermissionCode, Role};

/// How a registered route is gated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RouteAccess {
    /// Reachable without a session (login and error pages).
    Public,
    /// Any authenticated user.
    Authenticated,
    /// Gated on a single permission code.
    Requires(PermissionCode),
}

/// Result of looking a route up in the registry.
///
/// `Unregistered` is kept distinct from the open variants so callers decide
/// the default for missing entries deliberately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRequirement<'a> {
    Public,
    Authenticated,
    Gated(&'a PermissionCode),
    Unregistered,
}

/// Decision applied to routes with no registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnregisteredRoutePolicy {
    #[default]
    Deny,
    Allow,
}

/// Immutable role and route permission tables.
#[derive(Debug, Clone)]
pub struct Registry {
    catalog: Vec<PermissionCode>,
    /// The catalog as a set; doubles as the superuser row.
    universe: BTreeSet<PermissionCode>,
    roles: HashMap<Role, BTreeSet<PermissionCode>>,
    empty: BTreeSet<PermissionCode>,
    routes: Vec<(String, RouteAccess)>,
    route_index: HashMap<String, usize>,
    unregistered_routes: UnregisteredRoutePolicy,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The built-in tables for the education center CRM.
    pub fn school_default() -> Result<Self> {
        Self::builder()
            .permissions(codes::ALL.iter().copied())
            .grant(
                Role::Teacher,
                [
                    codes::CRUD_STUDENT,
                    codes::CRUD_CLASS,
                    codes::CRUD_GRADE,
                    codes::CRUD_ATTENDANCE,
                    codes::CRUD_ASSIGNMENT,
                ],
            )
            .grant(
                Role::Student,
                [
                    codes::VIEW_OWN_GRADES,
                    codes::VIEW_OWN_ATTENDANCE,
                    codes::VIEW_OWN_ASSIGNMENTS,
                    codes::VIEW_OWN_PAYMENTS,
                    codes::SUBMIT_ASSIGNMENT,
                ],
            )
            .public_route("/login")
            .public_route("/unauthorized")
            .authenticated_route("/dashboard")
            .authenticated_route("/profile")
            .gated_route("/students", codes::CRUD_STUDENT)
            .gated_route("/teachers", codes::CRUD_TEACHER)
            .gated_route("/classes", codes::CRUD_CLASS)
            .gated_route("/subjects", codes::CRUD_SUBJECT)
            .gated_route("/grades", codes::CRUD_GRADE)
            .gated_route("/attendance", codes::CRUD_ATTENDANCE)
            .gated_route("/assignments", codes::CRUD_ASSIGNMENT)
            .gated_route("/payments", codes::CRUD_PAYMENT)
            .gated_route("/debts", codes::CRUD_DEBT)
            .gated_route("/reports", codes::VIEW_REPORTS)
            .gated_route("/centers", codes::CRUD_CENTER)
            .gated_route("/superusers", codes::CRUD_SUPERUSER)
            .gated_route("/permissions", codes::MANAGE_PERMISSIONS)
            .gated_route("/my/grades", codes::VIEW_OWN_GRADES)
            .gated_route("/my/attendance", codes::VIEW_OWN_ATTENDANCE)
            .gated_route("/my/assignments", codes::VIEW_OWN_ASSIGNMENTS)
            .gated_route("/my/payments", codes::VIEW_OWN_PAYMENTS)
            .build()
    }

    /// Default grants for `role`. For the superuser this is the whole catalog.
    pub fn permissions_for_role(&self, role: Role) -> &BTreeSet<PermissionCode> {
        match role {
            Role::Superuser => &self.universe,
            other => self.roles.get(&other).unwrap_or(&self.empty),
        }
    }

    /// Looks up the gate for `route`. Query strings, fragments and a trailing
    /// slash are ignored.
    pub fn required_permission_for_route(&self, route: &str) -> RouteRequirement<'_> {
        let key = normalize_route(route);
        match self.route_index.get(key).map(|&i| &self.routes[i].1) {
            Some(RouteAccess::Public) => RouteRequirement::Public,
            Some(RouteAccess::Authenticated) => RouteRequirement::Authenticated,
            Some(RouteAccess::Requires(code)) => RouteRequirement::Gated(code),
            None => RouteRequirement::Unregistered,
        }
    }

    /// Registered routes in declaration order.
    pub fn routes(&self) -> impl Iterator<Item = (&str, &RouteAccess)> {
        self.routes.iter().map(|(route, access)| (route.as_str(), access))
    }

    /// Every declared permission code, in declaration order.
    pub fn known_permissions(&self) -> &[PermissionCode] {
        &self.catalog
    }

    pub fn is_known_permission(&self, code: &PermissionCode) -> bool {
        self.universe.contains(code)
    }

    pub fn unregistered_routes(&self) -> UnregisteredRoutePolicy {
        self.unregistered_routes
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }
}

/// Strips query, fragment and trailing slashes; the root stays `/`.
pub fn normalize_route(route: &str) -> &str {
    let end = route.find(['?', '#']).unwrap_or(route.len());
    let trimmed = route[..end].trim_end_matches('/');
    if trimmed.is_empty() && route.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}

/// Validating builder for [`Registry`].
#[derive(Debug, Default, Clone)]
pub struct RegistryBuilder {
    catalog: Vec<PermissionCode>,
    grants: Vec<(Role, Vec<PermissionCode>)>,
    routes: Vec<(String, RouteAccess)>,
    unregistered_routes: UnregisteredRoutePolicy,
}

impl RegistryBuilder {
    /// Declares a permission code.
    pub fn permission(mut self, code: impl Into<PermissionCode>) -> Self {
        self.catalog.push(code.into());
        self
    }

    pub fn permissions<I, P>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PermissionCode>,
    {
        self.catalog.extend(codes.into_iter().map(Into::into));
        self
    }

    /// Adds default grants for a role. Repeated calls accumulate.
    pub fn grant<I, P>(mut self, role: Role, codes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PermissionCode>,
    {
        self.grants
            .push((role, codes.into_iter().map(Into::into).collect()));
        self
    }

    pub fn route(mut self, route: impl Into<String>, access: RouteAccess) -> Self {
        self.routes.push((route.into(), access));
        self
    }

    pub fn public_route(self, route: impl Into<String>) -> Self {
        self.route(route, RouteAccess::Public)
    }

    pub fn authenticated_route(self, route: impl Into<String>) -> Self {
        self.route(route, RouteAccess::Authenticated)
    }

    pub fn gated_route(self, route: impl Into<String>, code: impl Into<PermissionCode>) -> Self {
        self.route(route, RouteAccess::Requires(code.into()))
    }

    pub fn unregistered_routes(mut self, policy: UnregisteredRoutePolicy) -> Self {
        self.unregistered_routes = policy;
        self
    }

    pub fn build(self) -> Result<Registry> {
        let mut catalog = Vec::with_capacity(self.catalog.len());
        let mut universe = BTreeSet::new();
        for code in self.catalog {
            if !code.is_well_formed() {
                return Err(AuthzError::InvalidPermission(code.to_string()));
            }
            if universe.insert(code.clone()) {
                catalog.push(code);
            }
        }

        let mut roles: HashMap<Role, BTreeSet<PermissionCode>> = HashMap::new();
        for (role, codes) in self.grants {
            if role == Role::Superuser {
                return Err(AuthzError::SuperuserRowAssigned);
            }
            for code in codes {
                if !universe.contains(&code) {
                    return Err(AuthzError::UndeclaredPermission {
                        code: code.to_string(),
                        used_by: format!("role {}", role),
                    });
                }
                roles.entry(role).or_default().insert(code);
            }
        }

        let mut routes = Vec::with_capacity(self.routes.len());
        let mut route_index = HashMap::new();
        let mut seen = HashSet::new();
        for (route, access) in self.routes {
            if !route.starts_with('/') {
                return Err(AuthzError::InvalidRoute(route));
            }
            let key = normalize_route(&route).to_string();
            if !seen.insert(key.clone()) {
                return Err(AuthzError::DuplicateRoute(key));
            }
            if let RouteAccess::Requires(code) = &access {
                if !universe.contains(code) {
                    return Err(AuthzError::UndeclaredPermission {
                        code: code.to_string(),
                        used_by: format!("route {}", key),
                    });
                }
            }
            route_index.insert(key.clone(), routes.len());
            routes.push((key, access));
        }

        debug!(
            "Built permission registry: {} codes, {} routes, unregistered routes {:?}",
            catalog.len(),
            routes.len(),
            self.unregistered_routes
        );

        Ok(Registry {
            catalog,
            universe,
            roles,
            empty: BTreeSet::new(),
            routes,
            route_index,
            unregistered_routes: self.unregistered_routes,
        })
    }
}
