use thiserror::Error;

use crate::types::db::Role;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is inactive: {user_id}")]
    AccountInactive { user_id: String },

    #[error("Invalid token: {token_type} - {reason}")]
    InvalidToken {
        token_type: String,
        reason: String,
    },

    #[error("Expired token: {0}")]
    ExpiredToken(String),

    /// The token verified but no live session is bound to it
    #[error("Session revoked for token {token_id}")]
    SessionRevoked { token_id: String },

    #[error("Missing bearer token")]
    MissingToken,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Role {actual:?} is not permitted, requires one of {required:?}")]
    InsufficientRole { required: Vec<Role>, actual: Role },

    #[error("Password hashing failed: {0}")]
    PasswordHashingFailed(String),
}

impl CredentialError {
    pub fn invalid_token(token_type: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidToken {
            token_type: token_type.into(),
            reason: reason.into(),
        }
    }
}
