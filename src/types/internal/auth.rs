use serde::{Deserialize, Serialize};

use crate::types::db::{active_session, user};

/// JWT Claims structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user_id)
    pub sub: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Token id, bound 1:1 to an active session row
    pub jti: String,
}

/// Credential handed to the client at login or refresh
pub struct IssuedToken {
    pub token: String,
    pub token_id: String,
    /// Seconds until expiry
    pub expires_in: i64,
}

impl std::fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"<redacted>")
            .field("token_id", &self.token_id)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Caller identity established by the authentication gate
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub user: user::Model,
    pub session: active_session::Model,
    pub claims: Claims,
}

impl AuthenticatedSession {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    pub fn token_id(&self) -> &str {
        &self.claims.jti
    }
}
