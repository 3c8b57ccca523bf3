//! Password hashing and signed bearer tokens.

mod password;
mod token;

use thiserror::Error;

pub use self::password::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH, hash_password, validate_password, verify_password};
pub use self::token::{Claims, TokenService};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Access token required")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken(String),

    #[error("Token expired")]
    Expired,

    /// The token is valid but its user is gone or deactivated.
    #[error("Invalid token")]
    UnknownUser,

    #[error("Admin access required")]
    Forbidden,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    WeakPassword(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token signing failed: {0}")]
    Signing(String),
}

pub type AuthResult<T> = Result<T, AuthError>;
