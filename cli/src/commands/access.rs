//! Offline access evaluation against a registry, for checking a policy
//! before deploying it.

use anyhow::Result;
use authz::{AccessEvaluator, NavigationDecision, NavigationGate, Registry, Role, User};
use colored::*;
use serde_json::json;
use std::sync::Arc;

/// Who the question is asked about. No role means an anonymous visitor.
pub struct Subject {
    pub role: Option<Role>,
    pub grants: Vec<String>,
    pub sub_roles: Vec<String>,
}

impl Subject {
    pub fn to_user(&self) -> Option<User> {
        self.role.map(|role| {
            User::new("cli", role)
                .with_permissions(self.grants.iter().map(String::as_str))
                .with_sub_roles(self.sub_roles.iter().cloned())
        })
    }

    fn label(&self) -> String {
        match self.role {
            Some(role) if self.grants.is_empty() => role.to_string(),
            Some(role) => format!("{} + {}", role, self.grants.join(", ")),
            None => "anonymous".to_string(),
        }
    }
}

fn evaluator(registry: Registry) -> AccessEvaluator {
    AccessEvaluator::new(Arc::new(registry))
}

/// Lists the routes the subject may open
pub fn routes(registry: Registry, subject: &Subject, format: &str) -> Result<()> {
    let user = subject.to_user();
    let routes = evaluator(registry).accessible_routes(user.as_ref());

    match format {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "subject": subject.label(), "routes": routes }))?
        ),
        _ => {
            println!("{} {}", "Accessible routes for".bold(), subject.label().cyan());
            for route in &routes {
                println!("  {}", route);
            }
            println!("{} {}", "Total:".bold(), routes.len());
        }
    }
    Ok(())
}

/// Evaluates one or more permission codes. Several codes are combined
/// with any-of semantics unless `require_all` is set.
pub fn check(
    registry: Registry,
    subject: &Subject,
    permissions: &[String],
    require_all: bool,
    format: &str,
) -> Result<bool> {
    let user = subject.to_user();
    let evaluator = evaluator(registry);

    let allowed = match permissions {
        [single] => evaluator.can_access(user.as_ref(), single),
        codes if require_all => evaluator.has_all_permissions(user.as_ref(), codes),
        codes => evaluator.has_any_permission(user.as_ref(), codes),
    };

    match format {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "subject": subject.label(),
                "permissions": permissions,
                "require_all": require_all,
                "allowed": allowed,
            }))?
        ),
        _ => {
            let verdict = if allowed {
                "ALLOWED".green().bold()
            } else {
                "DENIED".red().bold()
            };
            println!("{} {} for {}", verdict, permissions.join(", "), subject.label());
        }
    }
    Ok(allowed)
}

/// Runs the navigation gate for a target route
pub fn navigate(
    registry: Registry,
    subject: &Subject,
    target: &str,
    gate: &NavigationGate,
    format: &str,
) -> Result<NavigationDecision> {
    let user = subject.to_user();
    let decision = gate.decide(&evaluator(registry), user.as_ref(), target);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&decision)?),
        _ => match &decision {
            NavigationDecision::Allow => {
                println!("{} {}", "ALLOW".green().bold(), target)
            }
            NavigationDecision::Redirect(location) => println!(
                "{} {} -> {}",
                "REDIRECT".yellow().bold(),
                target,
                location
            ),
        },
    }
    Ok(decision)
}
