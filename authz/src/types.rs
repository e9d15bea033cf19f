//! Core value types: roles, permission codes and the authenticated user.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::AuthzError;

/// Coarse-grained principal category that determines default permissions.
///
/// The set is closed. `Superuser` is granted every permission and satisfies
/// every role check; no other role inherits that bypass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Superuser,
    Teacher,
    Student,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 3] = [Role::Superuser, Role::Teacher, Role::Student];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superuser => "superuser",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "superuser" => Ok(Role::Superuser),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            other => Err(AuthzError::UnknownRole(other.to_string())),
        }
    }
}

/// Opaque identifier naming one grantable capability, e.g. `CRUD_STUDENT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionCode(String);

impl PermissionCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A usable code is non-empty and free of whitespace.
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty() && !self.0.chars().any(char::is_whitespace)
    }
}

impl fmt::Display for PermissionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PermissionCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for PermissionCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

// Lets sets of codes be queried with plain `&str`.
impl Borrow<str> for PermissionCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PermissionCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The authenticated principal.
///
/// Built once per session by the authentication layer. The evaluator only
/// ever borrows it; explicit `permissions` are grants on top of the role
/// defaults, never revocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub permissions: BTreeSet<PermissionCode>,
    /// Additional role names a teacher may hold (e.g. `head_teacher`).
    /// Ignored for other roles.
    #[serde(default)]
    pub sub_roles: Vec<String>,
    #[serde(default = "default_authenticated")]
    pub authenticated: bool,
}

fn default_authenticated() -> bool {
    true
}

impl User {
    /// Creates an authenticated user with no explicit grants.
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
            permissions: BTreeSet::new(),
            sub_roles: Vec::new(),
            authenticated: true,
        }
    }

    /// Adds explicit grants beyond the role defaults.
    pub fn with_permissions<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PermissionCode>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    pub fn with_sub_roles<I, S>(mut self, sub_roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub_roles.extend(sub_roles.into_iter().map(Into::into));
        self
    }

    /// Marks the snapshot as no longer authenticated.
    pub fn unauthenticated(mut self) -> Self {
        self.authenticated = false;
        self
    }
}
