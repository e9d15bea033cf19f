//! The access evaluator: answers permission, role and route questions for a
//! borrowed [`User`] snapshot against a shared [`Registry`].
//!
//! Every permission check funnels through [`AccessEvaluator::capabilities`],
//! the one place where the superuser bypass is decided. Absent and
//! unauthenticated users resolve to [`Capabilities::None`] and are denied
//! everything except public routes.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use crate::registry::{Registry, RouteAccess, RouteRequirement, UnregisteredRoutePolicy};
use crate::types::{PermissionCode, Role, User};

/// A user's resolved permission set.
#[derive(Debug, Clone, Copy)]
pub enum Capabilities<'a> {
    /// No authenticated user.
    None,
    /// Superuser: every code, declared or not.
    Unrestricted,
    /// Role defaults plus explicit grants.
    Granted {
        defaults: &'a BTreeSet<PermissionCode>,
        explicit: &'a BTreeSet<PermissionCode>,
    },
}

impl Capabilities<'_> {
    pub fn contains(&self, code: &str) -> bool {
        match self {
            Capabilities::None => false,
            Capabilities::Unrestricted => true,
            Capabilities::Granted { defaults, explicit } => {
                defaults.contains(code) || explicit.contains(code)
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Capabilities::None)
    }
}

/// Stateless access evaluator. Cheap to clone and safe to share across tasks.
#[derive(Debug, Clone)]
pub struct AccessEvaluator {
    registry: Arc<Registry>,
}

impl AccessEvaluator {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Resolves what `user` may do.
    pub fn capabilities<'a>(&'a self, user: Option<&'a User>) -> Capabilities<'a> {
        match user {
            Some(user) if user.authenticated => match user.role {
                Role::Superuser => Capabilities::Unrestricted,
                role => Capabilities::Granted {
                    defaults: self.registry.permissions_for_role(role),
                    explicit: &user.permissions,
                },
            },
            _ => Capabilities::None,
        }
    }

    /// True when `user` holds `permission` through its role or an explicit grant.
    pub fn can_access(&self, user: Option<&User>, permission: &str) -> bool {
        let allowed = self.capabilities(user).contains(permission);
        if !allowed {
            debug!(
                "Permission {} denied for {}",
                permission,
                describe(user)
            );
        }
        allowed
    }

    /// Legacy single-permission lookup, kept for older call sites.
    #[deprecated(note = "use `can_access`, which also honours explicit grants")]
    pub fn has_permission(&self, user: Option<&User>, permission: &str) -> bool {
        self.can_access(user, permission)
    }

    /// Role check. A superuser satisfies every role name; a teacher also
    /// satisfies each of its sub-roles. A sub-role spelled like a base role
    /// is ignored, so no account can pick up `superuser` that way.
    pub fn has_role(&self, user: Option<&User>, role: &str) -> bool {
        let Some(user) = user.filter(|u| u.authenticated) else {
            debug!("Role {} denied for {}", role, describe(user));
            return false;
        };

        let matched = match user.role {
            Role::Superuser => true,
            Role::Teacher => {
                user.role.as_str().eq_ignore_ascii_case(role)
                    || user
                        .sub_roles
                        .iter()
                        .filter(|r| r.parse::<Role>().is_err())
                        .any(|r| r.eq_ignore_ascii_case(role))
            }
            other => other.as_str().eq_ignore_ascii_case(role),
        };

        if !matched {
            debug!("Role {} denied for {}", role, describe(Some(user)));
        }
        matched
    }

    /// True when at least one code is held. An empty list is never satisfied.
    pub fn has_any_permission<I, S>(&self, user: Option<&User>, codes: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let capabilities = self.capabilities(user);
        let allowed = codes
            .into_iter()
            .any(|code| capabilities.contains(code.as_ref()));
        if !allowed {
            debug!("No listed permission held by {}", describe(user));
        }
        allowed
    }

    /// True when every code is held. An empty list is vacuously satisfied
    /// for any authenticated user.
    pub fn has_all_permissions<I, S>(&self, user: Option<&User>, codes: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let capabilities = self.capabilities(user);
        let allowed = capabilities.is_authenticated()
            && codes
                .into_iter()
                .all(|code| capabilities.contains(code.as_ref()));
        if !allowed {
            debug!("Not every listed permission held by {}", describe(user));
        }
        allowed
    }

    /// Route gate. Unregistered routes follow the registry's
    /// [`UnregisteredRoutePolicy`], with no superuser exception.
    pub fn can_access_route(&self, user: Option<&User>, route: &str) -> bool {
        let capabilities = self.capabilities(user);
        let allowed = match self.registry.required_permission_for_route(route) {
            RouteRequirement::Public => true,
            RouteRequirement::Authenticated => capabilities.is_authenticated(),
            RouteRequirement::Gated(code) => capabilities.contains(code.as_str()),
            RouteRequirement::Unregistered => {
                self.unregistered_allowed(&capabilities, route)
            }
        };

        if !allowed {
            debug!("Route {} denied for {}", route, describe(user));
        }
        allowed
    }

    /// Routes `user` may open, in registry order.
    pub fn accessible_routes(&self, user: Option<&User>) -> Vec<String> {
        let capabilities = self.capabilities(user);
        self.registry
            .routes()
            .filter(|(_, access)| match access {
                RouteAccess::Public => true,
                RouteAccess::Authenticated => capabilities.is_authenticated(),
                RouteAccess::Requires(code) => capabilities.contains(code.as_str()),
            })
            .map(|(route, _)| route.to_string())
            .collect()
    }

    /// The concrete permission set `user` holds. A superuser gets the whole
    /// catalog.
    pub fn effective_permissions(&self, user: Option<&User>) -> BTreeSet<PermissionCode> {
        match self.capabilities(user) {
            Capabilities::None => BTreeSet::new(),
            Capabilities::Unrestricted => self
                .registry
                .permissions_for_role(Role::Superuser)
                .clone(),
            Capabilities::Granted { defaults, explicit } => {
                defaults.union(explicit).cloned().collect()
            }
        }
    }

    fn unregistered_allowed(&self, capabilities: &Capabilities<'_>, route: &str) -> bool {
        match self.registry.unregistered_routes() {
            UnregisteredRoutePolicy::Deny => {
                debug!("Route {} has no registry entry, denying", route);
                false
            }
            UnregisteredRoutePolicy::Allow => capabilities.is_authenticated(),
        }
    }
}

fn describe(user: Option<&User>) -> String {
    match user {
        Some(user) if user.authenticated => format!("{} ({})", user.username, user.role),
        Some(user) => format!("{} (unauthenticated)", user.username),
        None => "anonymous".to_string(),
    }
}
