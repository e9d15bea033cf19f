//! Guard adapters over the evaluator: conditional rendering and navigation
//! gating. Both are thin; the HTTP bindings live in the `api` crate.

use serde::{Deserialize, Serialize};

use crate::evaluator::AccessEvaluator;
use crate::types::{PermissionCode, User};

/// What a guarded element requires. Every populated field must pass; an
/// empty requirement admits any authenticated user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardRequirement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<PermissionCode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<PermissionCode>,
    /// With `permissions`: all of them (true) or any of them (false).
    #[serde(default)]
    pub require_all: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Any one of these roles is enough.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

impl GuardRequirement {
    pub fn permission(code: impl Into<PermissionCode>) -> Self {
        Self {
            permission: Some(code.into()),
            ..Self::default()
        }
    }

    pub fn any_of<I, P>(codes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PermissionCode>,
    {
        Self {
            permissions: codes.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn all_of<I, P>(codes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PermissionCode>,
    {
        Self {
            require_all: true,
            ..Self::any_of(codes)
        }
    }

    pub fn role(role: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            ..Self::default()
        }
    }

    pub fn evaluate(&self, evaluator: &AccessEvaluator, user: Option<&User>) -> bool {
        if !evaluator.capabilities(user).is_authenticated() {
            return false;
        }

        if let Some(code) = &self.permission {
            if !evaluator.can_access(user, code.as_str()) {
                return false;
            }
        }

        if !self.permissions.is_empty() {
            let satisfied = if self.require_all {
                evaluator.has_all_permissions(user, &self.permissions)
            } else {
                evaluator.has_any_permission(user, &self.permissions)
            };
            if !satisfied {
                return false;
            }
        }

        if let Some(role) = &self.role {
            if !evaluator.has_role(user, role) {
                return false;
            }
        }

        self.roles.is_empty() || self.roles.iter().any(|r| evaluator.has_role(user, r))
    }

    /// Picks `children` when the requirement passes, `fallback` otherwise.
    pub fn select<T>(
        &self,
        evaluator: &AccessEvaluator,
        user: Option<&User>,
        children: T,
        fallback: T,
    ) -> T {
        if self.evaluate(evaluator, user) {
            children
        } else {
            fallback
        }
    }
}

/// Outcome of a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "location", rename_all = "lowercase")]
pub enum NavigationDecision {
    Allow,
    Redirect(String),
}

/// Route-level gate: allow the target, or redirect to login (no session) or
/// to the forbidden page (session without access).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationGate {
    pub login_route: String,
    pub forbidden_route: String,
}

impl Default for NavigationGate {
    fn default() -> Self {
        Self {
            login_route: "/login".to_string(),
            forbidden_route: "/unauthorized".to_string(),
        }
    }
}

impl NavigationGate {
    pub fn new(login_route: impl Into<String>, forbidden_route: impl Into<String>) -> Self {
        Self {
            login_route: login_route.into(),
            forbidden_route: forbidden_route.into(),
        }
    }

    pub fn decide(
        &self,
        evaluator: &AccessEvaluator,
        user: Option<&User>,
        target: &str,
    ) -> NavigationDecision {
        if evaluator.can_access_route(user, target) {
            NavigationDecision::Allow
        } else if evaluator.capabilities(user).is_authenticated() {
            NavigationDecision::Redirect(self.forbidden_route.clone())
        } else {
            NavigationDecision::Redirect(self.login_route.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes;
    use crate::registry::Registry;
    use crate::types::Role;
    use std::sync::Arc;

    fn evaluator() -> AccessEvaluator {
        AccessEvaluator::new(Arc::new(Registry::school_default().unwrap()))
    }

    #[test]
    fn test_empty_requirement_needs_session() {
        let evaluator = evaluator();
        let guard = GuardRequirement::default();
        let student = User::new("sam", Role::Student);

        assert!(guard.evaluate(&evaluator, Some(&student)));
        assert!(!guard.evaluate(&evaluator, None));
    }

    #[test]
    fn test_single_permission() {
        let evaluator = evaluator();
        let guard = GuardRequirement::permission(codes::CRUD_STUDENT);

        assert!(guard.evaluate(&evaluator, Some(&User::new("amina", Role::Teacher))));
        assert!(!guard.evaluate(&evaluator, Some(&User::new("sam", Role::Student))));
    }

    #[test]
    fn test_any_versus_all() {
        let evaluator = evaluator();
        let teacher = User::new("amina", Role::Teacher);

        let any = GuardRequirement::any_of([codes::CRUD_PAYMENT, codes::CRUD_GRADE]);
        let all = GuardRequirement::all_of([codes::CRUD_PAYMENT, codes::CRUD_GRADE]);

        assert!(any.evaluate(&evaluator, Some(&teacher)));
        assert!(!all.evaluate(&evaluator, Some(&teacher)));
    }

    #[test]
    fn test_roles() {
        let evaluator = evaluator();
        let student = User::new("sam", Role::Student);

        assert!(!GuardRequirement::role("teacher").evaluate(&evaluator, Some(&student)));

        let either = GuardRequirement {
            roles: vec!["teacher".to_string(), "student".to_string()],
            ..GuardRequirement::default()
        };
        assert!(either.evaluate(&evaluator, Some(&student)));

        let root = User::new("root", Role::Superuser);
        assert!(GuardRequirement::role("teacher").evaluate(&evaluator, Some(&root)));
    }

    #[test]
    fn test_superuser_sub_role_does_not_pass_role_guard() {
        let evaluator = evaluator();
        let teacher = User::new("amina", Role::Teacher).with_sub_roles(["superuser"]);

        assert!(!GuardRequirement::role("superuser").evaluate(&evaluator, Some(&teacher)));
    }

    #[test]
    fn test_combined_fields_all_must_pass() {
        let evaluator = evaluator();
        let teacher = User::new("amina", Role::Teacher);

        let guard = GuardRequirement {
            permission: Some(codes::CRUD_GRADE.into()),
            role: Some("student".to_string()),
            ..GuardRequirement::default()
        };
        assert!(!guard.evaluate(&evaluator, Some(&teacher)));
    }

    #[test]
    fn test_select_renders_fallback() {
        let evaluator = evaluator();
        let guard = GuardRequirement::permission(codes::VIEW_REPORTS);
        let student = User::new("sam", Role::Student);

        assert_eq!(guard.select(&evaluator, Some(&student), "report", "hidden"), "hidden");
        let root = User::new("root", Role::Superuser);
        assert_eq!(guard.select(&evaluator, Some(&root), "report", "hidden"), "report");
    }

    #[test]
    fn test_requirement_deserializes_camel_case() {
        let guard: GuardRequirement = serde_json::from_str(
            r#"{"permissions":["CRUD_PAYMENT","CRUD_DEBT"],"requireAll":true,"roles":["teacher"]}"#,
        )
        .unwrap();

        assert!(guard.require_all);
        assert_eq!(guard.permissions.len(), 2);
        assert_eq!(guard.roles, vec!["teacher".to_string()]);
        assert!(guard.permission.is_none());
    }

    #[test]
    fn test_navigation_gate() {
        let evaluator = evaluator();
        let gate = NavigationGate::default();
        let student = User::new("sam", Role::Student);

        assert_eq!(
            gate.decide(&evaluator, Some(&student), "/dashboard"),
            NavigationDecision::Allow
        );
        assert_eq!(
            gate.decide(&evaluator, Some(&student), "/reports"),
            NavigationDecision::Redirect("/unauthorized".to_string())
        );
        assert_eq!(
            gate.decide(&evaluator, None, "/reports"),
            NavigationDecision::Redirect("/login".to_string())
        );
        assert_eq!(gate.decide(&evaluator, None, "/login"), NavigationDecision::Allow);
    }

    #[test]
    fn test_navigation_decision_serializes() {
        let json = serde_json::to_value(NavigationDecision::Redirect("/login".into())).unwrap();
        assert_eq!(json["decision"], "redirect");
        assert_eq!(json["location"], "/login");
    }
}
