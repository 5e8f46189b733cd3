use std::fmt;
use std::sync::Arc;

use crate::config::{EnvironmentProvider, SystemEnvironment};

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("Required secret '{secret_name}' is missing")]
    Missing { secret_name: String },

    #[error("Secret '{secret_name}' must be at least {expected} characters, got {actual}")]
    InvalidLength { secret_name: String, expected: usize, actual: usize },
}

/// Environment variable holding a secret and its minimum length
struct SecretRule {
    name: &'static str,
    min_length: usize,
}

const JWT_SECRET: SecretRule = SecretRule { name: "JWT_SECRET", min_length: 32 };
const PASSWORD_PEPPER: SecretRule = SecretRule { name: "PASSWORD_PEPPER", min_length: 16 };
const OTP_SECRET: SecretRule = SecretRule { name: "OTP_SECRET", min_length: 32 };

/// Centralized manager for application secrets
pub struct SecretManager {
    jwt_secret: String,
    password_pepper: String,
    otp_secret: String,
}

impl SecretManager {
    /// Load secrets from the process environment
    pub fn init() -> Result<Self, SecretError> {
        Self::from_env_provider(Arc::new(SystemEnvironment))
    }

    /// Load and validate all secrets from the given provider
    ///
    /// # Errors
    /// Returns `SecretError` if any required secret is missing or too short
    pub fn from_env_provider(
        env_provider: Arc<dyn EnvironmentProvider + Send + Sync>,
    ) -> Result<Self, SecretError> {
        let env = env_provider.as_ref();
        Ok(Self {
            jwt_secret: Self::load_secret(env, &JWT_SECRET)?,
            password_pepper: Self::load_secret(env, &PASSWORD_PEPPER)?,
            otp_secret: Self::load_secret(env, &OTP_SECRET)?,
        })
    }

    /// Key for signing bearer tokens
    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    /// Argon2 secret parameter for password hashing
    pub fn password_pepper(&self) -> &str {
        &self.password_pepper
    }

    /// HMAC key for OTP digests
    pub fn otp_secret(&self) -> &str {
        &self.otp_secret
    }

    fn load_secret(
        env: &(dyn EnvironmentProvider + Send + Sync),
        rule: &SecretRule,
    ) -> Result<String, SecretError> {
        let value = env.get_var(rule.name).ok_or_else(|| SecretError::Missing {
            secret_name: rule.name.to_string(),
        })?;

        if value.len() < rule.min_length {
            return Err(SecretError::InvalidLength {
                secret_name: rule.name.to_string(),
                expected: rule.min_length,
                actual: value.len(),
            });
        }

        Ok(value)
    }
}

impl fmt::Debug for SecretManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretManager")
            .field("jwt_secret", &"<redacted>")
            .field("password_pepper", &"<redacted>")
            .field("otp_secret", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for SecretManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretManager {{ secrets_loaded: 3 }}")
    }
}
