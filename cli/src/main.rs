use anyhow::{Context, Result};
use authz::{NavigationDecision, NavigationGate, Registry, Role};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

const MAX_SESSION_TTL: i64 = user::MAX_SESSION_TTL_MINUTES as i64;

mod commands;
mod logging;

use commands::{access, password, registry, serve};

/// Campus CLI - role-based access control for the campus CRM
#[derive(Parser)]
#[command(name = "campus")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// YAML policy file (defaults to the built-in school registry)
    #[arg(long, global = true, env = "POLICY_PATH")]
    policy: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = 3030)]
        port: u16,

        /// YAML accounts file
        #[arg(long, env = "ACCOUNTS_PATH")]
        accounts: Option<PathBuf>,

        /// Session inactivity timeout in minutes
        #[arg(
            long,
            env = "SESSION_TTL_MINUTES",
            default_value_t = 30,
            value_parser = clap::value_parser!(u32).range(1..=MAX_SESSION_TTL)
        )]
        session_ttl: u32,

        /// Directory for daily-rolling log files
        #[arg(long, env = "LOG_DIR")]
        log_dir: Option<PathBuf>,
    },

    /// List the routes a role may open
    Routes {
        #[command(flatten)]
        subject: SubjectArgs,

        /// Output format (json, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check permission codes for a role
    Check {
        #[command(flatten)]
        subject: SubjectArgs,

        /// Permission codes; several are combined with any-of
        #[arg(required = true)]
        permissions: Vec<String>,

        /// Require every listed code instead of any one
        #[arg(long)]
        all: bool,

        /// Output format (json, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Run the navigation gate for a route
    Navigate {
        #[command(flatten)]
        subject: SubjectArgs,

        /// Target application route
        target: String,

        #[arg(long, env = "LOGIN_ROUTE", default_value = "/login")]
        login_route: String,

        #[arg(long, env = "FORBIDDEN_ROUTE", default_value = "/unauthorized")]
        forbidden_route: String,

        /// Output format (json, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Registry inspection commands
    Registry {
        #[command(subcommand)]
        action: RegistryAction,
    },

    /// Hash a password for the accounts file
    HashPassword {
        /// Password to hash; read from stdin when omitted
        password: Option<String>,
    },
}

#[derive(clap::Args)]
struct SubjectArgs {
    /// Role of the user; omit for an anonymous visitor
    #[arg(short, long)]
    role: Option<Role>,

    /// Extra permission codes granted to the user
    #[arg(short, long = "grant")]
    grants: Vec<String>,

    /// Teacher sub-roles
    #[arg(long = "sub-role")]
    sub_roles: Vec<String>,
}

impl From<SubjectArgs> for access::Subject {
    fn from(args: SubjectArgs) -> Self {
        Self {
            role: args.role,
            grants: args.grants,
            sub_roles: args.sub_roles,
        }
    }
}

#[derive(Subcommand)]
enum RegistryAction {
    /// Print the active registry
    Show {
        /// Output format (json, yaml, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Validate a policy file
    Validate {
        /// Policy file to validate
        file: PathBuf,
    },
}

fn load_registry(policy: Option<&PathBuf>) -> Result<Registry> {
    authz::load_registry(policy.map(PathBuf::as_path)).context("Failed to load policy")
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    let (default_level, log_dir) = match &cli.command {
        Commands::Serve { log_dir, .. } => {
            (if cli.verbose { "debug" } else { "info" }, log_dir.clone())
        }
        _ => (if cli.verbose { "debug" } else { "warn" }, None),
    };
    let _guard = logging::init_logging(default_level, log_dir.as_deref())?;

    let policy = cli.policy.as_ref();

    // Execute the command
    match cli.command {
        Commands::Serve {
            port,
            accounts,
            session_ttl,
            ..
        } => {
            let mut config = api::ApiConfig::from_env()
                .with_port(port)
                .with_session_ttl(session_ttl);
            if let Some(policy) = policy {
                config = config.with_policy(policy);
            }
            if let Some(accounts) = accounts {
                config = config.with_accounts(accounts);
            }
            serve::execute(config).await?;
        }
        Commands::Routes { subject, format } => {
            access::routes(load_registry(policy)?, &subject.into(), &format)?;
        }
        Commands::Check {
            subject,
            permissions,
            all,
            format,
        } => {
            let allowed = access::check(
                load_registry(policy)?,
                &subject.into(),
                &permissions,
                all,
                &format,
            )?;
            if !allowed {
                std::process::exit(2);
            }
        }
        Commands::Navigate {
            subject,
            target,
            login_route,
            forbidden_route,
            format,
        } => {
            let gate = NavigationGate::new(login_route, forbidden_route);
            let decision = access::navigate(
                load_registry(policy)?,
                &subject.into(),
                &target,
                &gate,
                &format,
            )?;
            if decision != NavigationDecision::Allow {
                std::process::exit(2);
            }
        }
        Commands::Registry { action } => match action {
            RegistryAction::Show { format } => {
                registry::show(&load_registry(policy)?, &format)?;
            }
            RegistryAction::Validate { file } => {
                if let Err(e) = registry::validate(&file) {
                    eprintln!("{} {:#}", "Error:".red().bold(), e);
                    std::process::exit(1);
                }
            }
        },
        Commands::HashPassword { password: plain } => {
            password::hash(plain)?;
        }
    }

    Ok(())
}
