use anyhow::{Context, Result};
use authz::{PolicyConfig, Registry, Role, RouteAccess};
use colored::*;
use std::path::Path;

/// Print the active registry
pub fn show(registry: &Registry, format: &str) -> Result<()> {
    match format {
        "yaml" => print!("{}", PolicyConfig::from(registry).to_yaml()?),
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&PolicyConfig::from(registry))?
        ),
        _ => print_registry_text(registry),
    }
    Ok(())
}

fn print_registry_text(registry: &Registry) {
    println!("{}", "=== Permission Registry ===".bold());
    println!();
    println!(
        "{} ({})",
        "Permissions".bold(),
        registry.known_permissions().len()
    );
    for code in registry.known_permissions() {
        println!("  {}", code);
    }

    println!();
    println!("{}", "Roles".bold());
    for role in Role::ALL {
        let codes = registry.permissions_for_role(role);
        let note = if role == Role::Superuser {
            " (all permissions)".dimmed().to_string()
        } else {
            String::new()
        };
        println!("  {}{}: {}", role.to_string().cyan(), note, codes.len());
        if role != Role::Superuser {
            for code in codes {
                println!("    {}", code);
            }
        }
    }

    println!();
    println!("{} ({})", "Routes".bold(), registry.route_count());
    for (route, access) in registry.routes() {
        let access = match access {
            RouteAccess::Public => "public".green().to_string(),
            RouteAccess::Authenticated => "authenticated".yellow().to_string(),
            RouteAccess::Requires(code) => code.to_string(),
        };
        println!("  {:<20} {}", route, access);
    }
}

/// Validate a policy file without starting the server
pub fn validate(path: &Path) -> Result<()> {
    let registry = PolicyConfig::from_file(path)
        .and_then(PolicyConfig::into_registry)
        .with_context(|| format!("Invalid policy file {}", path.display()))?;

    println!(
        "{} {}: {} permissions, {} routes",
        "OK".green().bold(),
        path.display(),
        registry.known_permissions().len(),
        registry.route_count()
    );
    Ok(())
}
