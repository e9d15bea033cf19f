//! Account directory loaded from a YAML file.
//!
//! ```yaml
//! accounts:
//!   - username: admin
//!     password_hash: "$argon2id$v=19$..."
//!     role: superuser
//!   - username: amina
//!     password_hash: "$argon2id$v=19$..."
//!     role: teacher
//!     permissions: [VIEW_REPORTS]
//!     sub_roles: [head_teacher]
//! ```

use authz::{PermissionCode, Registry, Role, User};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{Result, UserError};
use crate::password::verify_password;

/// A stored account. Only the argon2 hash of the password is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    #[serde(default)]
    pub permissions: BTreeSet<PermissionCode>,
    #[serde(default)]
    pub sub_roles: Vec<String>,
}

impl Account {
    /// Session snapshot for this account.
    pub fn to_user(&self) -> User {
        User::new(self.username.clone(), self.role)
            .with_permissions(self.permissions.iter().cloned())
            .with_sub_roles(self.sub_roles.iter().cloned())
    }
}

#[derive(Debug, Deserialize)]
struct AccountFile {
    #[serde(default)]
    accounts: Vec<Account>,
}

/// Accounts keyed by lower-cased username.
#[derive(Debug, Clone, Default)]
pub struct AccountDirectory {
    accounts: HashMap<String, Account>,
}

impl AccountDirectory {
    pub fn new(accounts: Vec<Account>) -> Result<Self> {
        let mut map = HashMap::with_capacity(accounts.len());
        for account in accounts {
            let key = account.username.to_lowercase();
            if map.contains_key(&key) {
                return Err(UserError::DuplicateAccount(account.username));
            }
            let base_role = account.sub_roles.iter().find(|r| r.parse::<Role>().is_ok());
            if let Some(sub_role) = base_role {
                return Err(UserError::InvalidSubRole {
                    username: account.username.clone(),
                    sub_role: sub_role.clone(),
                });
            }
            map.insert(key, account);
        }
        Ok(Self { accounts: map })
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let file: AccountFile =
            serde_yaml::from_str(content).map_err(|e| UserError::AccountFile(e.to_string()))?;
        Self::new(file.accounts)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let directory = Self::from_yaml(&content)?;
        info!(
            "Loaded {} accounts from {}",
            directory.len(),
            path.display()
        );
        Ok(directory)
    }

    /// Checks a username/password pair and returns the session snapshot.
    /// Unknown users and wrong passwords are indistinguishable to the caller.
    pub fn verify(&self, username: &str, password: &str) -> Result<User> {
        let Some(account) = self.accounts.get(&username.trim().to_lowercase()) else {
            debug!("Login attempt for unknown account {}", username);
            return Err(UserError::InvalidCredentials);
        };

        if !verify_password(&account.password_hash, password) {
            debug!("Wrong password for account {}", account.username);
            return Err(UserError::InvalidCredentials);
        }

        Ok(account.to_user())
    }

    pub fn get(&self, username: &str) -> Option<&Account> {
        self.accounts.get(&username.to_lowercase())
    }

    /// Explicit grants naming codes the registry does not declare. They are
    /// harmless (never matched by a gate) but usually indicate a typo.
    pub fn undeclared_grants(&self, registry: &Registry) -> Vec<(String, PermissionCode)> {
        let mut found: Vec<(String, PermissionCode)> = self
            .accounts
            .values()
            .flat_map(move |account| {
                account
                    .permissions
                    .iter()
                    .filter(move |code| !registry.is_known_permission(code))
                    .map(move |code| (account.username.clone(), code.clone()))
            })
            .collect();
        found.sort();

        for (username, code) in &found {
            warn!("Account {} is granted undeclared permission {}", username, code);
        }
        found
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
