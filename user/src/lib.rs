//! Authentication for the campus service: the account directory, argon2
//! password checks, and the session binding that produces the
//! [`authz::User`] snapshot the access evaluator consumes.

pub mod directory;
pub mod error;
pub mod password;
pub mod session;

use std::path::Path;
use std::sync::Arc;
use tracing::info;

use authz::User;
pub use directory::{Account, AccountDirectory};
pub use session::{
    CurrentUser, RequiredUser, SessionConfig, SessionData, SessionManager, MAX_SESSION_TTL_MINUTES,
};

/// Verifies credentials against the account directory.
#[derive(Debug, Clone)]
pub struct UserManager {
    directory: Arc<AccountDirectory>,
}

impl UserManager {
    pub fn new(directory: AccountDirectory) -> Self {
        info!("User manager ready with {} accounts", directory.len());
        Self {
            directory: Arc::new(directory),
        }
    }

    /// Loads accounts from `path`, or starts with no accounts when `None`.
    pub fn from_path(path: Option<&Path>) -> error::Result<Self> {
        let directory = match path {
            Some(path) => AccountDirectory::from_file(path)?,
            None => {
                tracing::warn!("No accounts file configured, all logins will fail");
                AccountDirectory::default()
            }
        };
        Ok(Self::new(directory))
    }

    pub fn directory(&self) -> &AccountDirectory {
        &self.directory
    }

    pub fn authenticate(&self, username: &str, password: &str) -> error::Result<User> {
        let user = self.directory.verify(username, password)?;
        info!("User {} authenticated as {}", user.username, user.role);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authz::Role;

    #[test]
    fn test_authenticate() {
        let hash = password::hash_password("pw").unwrap();
        let directory = AccountDirectory::new(vec![Account {
            username: "sam".to_string(),
            password_hash: hash,
            role: Role::Student,
            permissions: Default::default(),
            sub_roles: Vec::new(),
        }])
        .unwrap();
        let manager = UserManager::new(directory);

        assert_eq!(manager.authenticate("sam", "pw").unwrap().role, Role::Student);
        assert!(manager.authenticate("sam", "nope").is_err());
    }

    #[test]
    fn test_without_accounts_file() {
        let manager = UserManager::from_path(None).unwrap();
        assert!(manager.directory().is_empty());
        assert!(manager.authenticate("admin", "admin").is_err());
    }
}
