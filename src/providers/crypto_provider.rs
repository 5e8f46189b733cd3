use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

use crate::config::SecretManager;
use crate::errors::InternalError;
use crate::errors::internal::{CredentialError, CryptoError};

type HmacSha256 = Hmac<Sha256>;

pub const OTP_LENGTH: usize = 6;

/// Password hashing and OTP digests
///
/// Passwords are hashed with Argon2id using the pepper as the Argon2 secret
/// parameter. OTP codes are stored only as HMAC-SHA256 digests keyed by the
/// OTP secret.
pub struct CryptoProvider {
    secret_manager: Arc<SecretManager>,
}

impl CryptoProvider {
    pub fn new(secret_manager: Arc<SecretManager>) -> Self {
        Self { secret_manager }
    }

    fn argon2(&self) -> Result<Argon2<'_>, InternalError> {
        Argon2::new_with_secret(
            self.secret_manager.password_pepper().as_bytes(),
            Algorithm::Argon2id,
            Version::V0x13,
            Params::default(),
        )
        .map_err(|e| {
            InternalError::from(CryptoError::other_from_string(
                "crypto_provider",
                "init_argon2",
                e.to_string(),
            ))
        })
    }

    /// Hash a plaintext password into a PHC string
    pub fn hash_password(&self, password: &str) -> Result<String, InternalError> {
        let salt = SaltString::generate(&mut rand_core::OsRng);
        let hash = self
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CredentialError::PasswordHashingFailed(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Check a plaintext password against a stored digest
    ///
    /// An unparsable digest verifies as `false`.
    pub fn verify_password(&self, password: &str, digest: &str) -> Result<bool, InternalError> {
        let Ok(parsed) = PasswordHash::new(digest) else {
            tracing::warn!("Stored password digest could not be parsed");
            return Ok(false);
        };
        Ok(self
            .argon2()?
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Compute HMAC-SHA256 and return it as a hexadecimal string
    pub fn hmac_sha256_token(&self, key: &str, token: &str) -> Result<String, InternalError> {
        let mut mac = HmacSha256::new_from_slice(key.as_bytes()).map_err(|e| {
            CryptoError::other_from_string("crypto_provider", "hmac_init", e.to_string())
        })?;
        mac.update(token.as_bytes());
        Ok(format!("{:x}", mac.finalize().into_bytes()))
    }

    /// Digest of an OTP code as stored in `password_reset_otps.otp_hash`
    pub fn otp_digest(&self, otp: &str) -> Result<String, InternalError> {
        self.hmac_sha256_token(self.secret_manager.otp_secret(), otp)
    }

    /// Six random ASCII digits
    pub fn generate_otp(&self) -> String {
        let mut rng = rand::rng();
        (0..OTP_LENGTH)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect()
    }
}
