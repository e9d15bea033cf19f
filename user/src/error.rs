use thiserror::Error;

#[derive(Error, Debug)]
pub enum UserError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Account file error: {0}")]
    AccountFile(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Duplicate account: {0}")]
    DuplicateAccount(String),

    #[error("Account {username} has sub-role {sub_role}, which names a base role")]
    InvalidSubRole { username: String, sub_role: String },

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error(
        "Session TTL must be between 1 and {max} minutes, got {0}",
        max = crate::session::MAX_SESSION_TTL_MINUTES
    )]
    InvalidSessionTtl(u32),
}

pub type Result<T> = std::result::Result<T, UserError>;
