use authz::{GuardRequirement, PermissionCode, Registry, Role, RouteAccess, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use utoipa::ToSchema;

/// Login credentials
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Public view of a session user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserView {
    pub username: String,
    pub role: String,
    #[serde(default)]
    pub sub_roles: Vec<String>,
    /// Explicit grants on top of the role defaults.
    #[serde(default)]
    pub grants: Vec<String>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            role: user.role.to_string(),
            sub_roles: user.sub_roles.clone(),
            grants: codes_to_strings(&user.permissions),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub user: UserView,
    /// Resolved permission set (role defaults plus grants).
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub user: UserView,
    pub permissions: Vec<String>,
    pub routes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoutesResponse {
    pub routes: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckParams {
    pub permission: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckResponse {
    pub permission: String,
    pub allowed: bool,
}

/// Requirement attached to a guarded UI element.
///
/// Wire form of [`GuardRequirement`] for the OpenAPI document. `authz` does
/// not depend on utoipa, so the schema lives here and the field names must
/// stay in step with the `authz` type.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuardRequest {
    pub permission: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub require_all: bool,
    pub role: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl From<GuardRequest> for GuardRequirement {
    fn from(req: GuardRequest) -> Self {
        GuardRequirement {
            permission: req.permission.map(PermissionCode::from),
            permissions: req.permissions.into_iter().map(PermissionCode::from).collect(),
            require_all: req.require_all,
            role: req.role,
            roles: req.roles,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GuardResponse {
    pub render: bool,
}

#[derive(Debug, Deserialize)]
pub struct NavigateParams {
    pub to: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NavigateResponse {
    pub allowed: bool,
    pub target: String,
}

/// One row of the route table
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RouteView {
    pub route: String,
    /// `public`, `authenticated` or `permission`
    pub access: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
}

/// Full dump of the active registry
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegistryResponse {
    pub unregistered_routes: String,
    pub permissions: Vec<String>,
    pub roles: BTreeMap<String, Vec<String>>,
    pub routes: Vec<RouteView>,
}

impl From<&Registry> for RegistryResponse {
    fn from(registry: &Registry) -> Self {
        let roles = Role::ALL
            .iter()
            .map(|role| {
                (
                    role.to_string(),
                    codes_to_strings(registry.permissions_for_role(*role)),
                )
            })
            .collect();

        let routes = registry
            .routes()
            .map(|(route, access)| {
                let (access, permission) = match access {
                    RouteAccess::Public => ("public", None),
                    RouteAccess::Authenticated => ("authenticated", None),
                    RouteAccess::Requires(code) => ("permission", Some(code.to_string())),
                };
                RouteView {
                    route: route.to_string(),
                    access: access.to_string(),
                    permission,
                }
            })
            .collect();

        let unregistered_routes = match registry.unregistered_routes() {
            authz::UnregisteredRoutePolicy::Deny => "deny",
            authz::UnregisteredRoutePolicy::Allow => "allow",
        };

        Self {
            unregistered_routes: unregistered_routes.to_string(),
            permissions: registry
                .known_permissions()
                .iter()
                .map(|code| code.to_string())
                .collect(),
            roles,
            routes,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub registry: RegistryHealth,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegistryHealth {
    pub permissions: usize,
    pub routes: usize,
    pub accounts: usize,
}

/// Generic success response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

pub fn codes_to_strings(codes: &BTreeSet<PermissionCode>) -> Vec<String> {
    codes.iter().map(|code| code.to_string()).collect()
}
