use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::config::SecretManager;
use crate::errors::InternalError;
use crate::errors::internal::{CredentialError, CryptoError};
use crate::types::internal::auth::{Claims, IssuedToken};

/// Issues and verifies HS256 bearer tokens
///
/// Every token carries a fresh `jti` which is stored as the session's
/// `token_id`. Revocation happens by deleting or rebinding that session row;
/// the token itself stays cryptographically valid until `exp`.
pub struct TokenProvider {
    secret_manager: Arc<SecretManager>,
    jwt_expiration_minutes: i64,
}

impl TokenProvider {
    pub fn new(secret_manager: Arc<SecretManager>, jwt_expiration_minutes: u32) -> Self {
        Self {
            secret_manager,
            jwt_expiration_minutes: i64::from(jwt_expiration_minutes),
        }
    }

    /// Lifetime of issued tokens in seconds
    pub fn expires_in(&self) -> i64 {
        self.jwt_expiration_minutes * 60
    }

    /// Generate a token for `user_id` with a new token id
    pub fn issue(&self, user_id: &str) -> Result<IssuedToken, InternalError> {
        let now = Utc::now().timestamp();
        let token_id = Uuid::new_v4().to_string();

        let claims = Claims {
            sub: user_id.to_string(),
            exp: now + self.expires_in(),
            iat: now,
            jti: token_id.clone(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret_manager.jwt_secret().as_bytes()),
        )
        .map_err(|e| CryptoError::encode_jwt("token_provider", e))?;

        Ok(IssuedToken {
            token,
            token_id,
            expires_in: self.expires_in(),
        })
    }

    /// Verify signature and expiry, returning the claims
    ///
    /// Does not consult the session store; callers must still check that the
    /// `jti` is bound to a live session.
    pub fn validate(&self, token: &str) -> Result<Claims, InternalError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret_manager.jwt_secret().as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => {
                InternalError::from(CredentialError::ExpiredToken("jwt".to_string()))
            }
            _ => {
                tracing::debug!("Rejected bearer token: {}", e);
                InternalError::from(CredentialError::invalid_token(
                    "jwt",
                    "invalid signature or malformed",
                ))
            }
        })
    }
}

impl fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenProvider")
            .field("secret_manager", &"<redacted>")
            .field("jwt_expiration_minutes", &self.jwt_expiration_minutes)
            .finish()
    }
}

impl fmt::Display for TokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TokenProvider {{ jwt_expiration: {}min }}",
            self.jwt_expiration_minutes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::{TEST_JWT_SECRET, test_secret_manager};

    fn create_test_token_provider() -> TokenProvider {
        TokenProvider::new(test_secret_manager(), 15)
    }

    #[test]
    fn test_issue_then_validate_round_trips_claims() {
        let provider = create_test_token_provider();
        let issued = provider.issue("user-1").unwrap();

        let claims = provider.validate(&issued.token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.jti, issued.token_id);
        assert_eq!(claims.exp - claims.iat, 900);
        assert_eq!(issued.expires_in, 900);
    }

    #[test]
    fn test_each_issue_gets_a_new_token_id() {
        let provider = create_test_token_provider();
        let first = provider.issue("user-1").unwrap();
        let second = provider.issue("user-1").unwrap();
        assert_ne!(first.token_id, second.token_id);
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let provider = create_test_token_provider();
        let issued = provider.issue("user-1").unwrap();
        let tampered = format!("{}x", issued.token);

        match provider.validate(&tampered) {
            Err(InternalError::Credential(CredentialError::InvalidToken { .. })) => {}
            other => panic!("Expected InvalidToken, got {:?}", other),
        }
    }

    #[test]
    fn test_token_minted_with_other_secret_is_rejected() {
        let provider = create_test_token_provider();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "user-1".to_string(),
            exp: now + 600,
            iat: now,
            jti: "forged".to_string(),
        };
        let forged = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"some-other-secret-with-at-least-32-chars"),
        )
        .unwrap();

        assert!(provider.validate(&forged).is_err());
    }

    #[test]
    fn test_expired_token_reports_expiry() {
        let provider = create_test_token_provider();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "user-1".to_string(),
            exp: now - 120,
            iat: now - 1000,
            jti: "old".to_string(),
        };
        let expired = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
        )
        .unwrap();

        match provider.validate(&expired) {
            Err(InternalError::Credential(CredentialError::ExpiredToken(_))) => {}
            other => panic!("Expected ExpiredToken, got {:?}", other),
        }
    }

    #[test]
    fn test_debug_does_not_expose_secrets() {
        let provider = create_test_token_provider();
        let debug_output = format!("{:?}", provider);
        assert!(debug_output.contains("<redacted>"));
        assert!(!debug_output.contains(TEST_JWT_SECRET));
    }
}
