use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::DatabaseConnection;

use crate::app_data::AppData;
use crate::config::{begin_transaction, commit_transaction};
use crate::errors::InternalError;
use crate::errors::internal::CredentialError;
use crate::providers::email_provider::PASSWORD_RESET_OTP_TEMPLATE;
use crate::providers::validation_provider::validate_request;
use crate::providers::{CryptoProvider, EmailSender};
use crate::stores::{PasswordResetStore, SessionStore, UserChanges, UserStore};
use crate::types::dto::auth::{
    RequestPasswordResetRequest, ResetPasswordRequest, VerifyPasswordResetRequest,
};

const INVALID_OTP: &str = "The OTP is invalid or has expired.";
const UNKNOWN_EMAIL: &str = "The selected email is invalid.";

/// OTP-gated password reset: request, verify, reset
///
/// A code is usable for verification while `is_verified = false` and
/// `expires_at > now`. Reset consumes a verified, unexpired code and removes
/// every code issued for the email.
pub struct PasswordResetCoordinator {
    db: DatabaseConnection,
    crypto_provider: Arc<CryptoProvider>,
    email_sender: Arc<dyn EmailSender>,
    user_store: Arc<UserStore>,
    session_store: Arc<SessionStore>,
    password_reset_store: Arc<PasswordResetStore>,
    otp_ttl_minutes: u32,
}

impl PasswordResetCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            db: app_data.db.clone(),
            crypto_provider: app_data.crypto_provider.clone(),
            email_sender: app_data.email_sender.clone(),
            user_store: app_data.user_store.clone(),
            session_store: app_data.session_store.clone(),
            password_reset_store: app_data.password_reset_store.clone(),
            otp_ttl_minutes: app_data.settings.otp_ttl_minutes(),
        }
    }

    /// Issue a code and mail it
    ///
    /// Coordinates the sequence of operations:
    /// 1. Validate the email and require an account for it
    /// 2. Store the code digest (committed before any network call)
    /// 3. Send the mail; on delivery failure delete the stored row
    pub async fn request(&self, request: RequestPasswordResetRequest) -> Result<(), InternalError> {
        validate_request(&request)?;
        let email = request.email.trim();

        // Step 1: Account must exist
        let user = self
            .user_store
            .find_by_email(&self.db, email)
            .await?
            .ok_or_else(|| InternalError::validation("email", UNKNOWN_EMAIL))?;

        // Step 2: Store digest; no transaction stays open across delivery
        let otp = self.crypto_provider.generate_otp();
        let otp_hash = self.crypto_provider.otp_digest(&otp)?;
        let expires_at = Utc::now().timestamp() + i64::from(self.otp_ttl_minutes) * 60;

        let record = self
            .password_reset_store
            .insert(&self.db, email, &otp_hash, expires_at)
            .await?;

        // Step 3: Deliver
        let variables = HashMap::from([
            ("name".to_string(), user.name.clone()),
            ("otp".to_string(), otp),
            ("expires_in_minutes".to_string(), self.otp_ttl_minutes.to_string()),
        ]);
        if let Err(err) = self
            .email_sender
            .send(PASSWORD_RESET_OTP_TEMPLATE, email, &variables)
            .await
        {
            if let Err(cleanup) = self.password_reset_store.delete(&self.db, record.id).await {
                tracing::error!(
                    "Failed to remove undelivered reset code {}: {}",
                    record.id,
                    cleanup
                );
            }
            return Err(err);
        }

        tracing::info!("Password reset code issued for user {}", user.id);
        Ok(())
    }

    /// Mark a live code as verified; a code verifies exactly once
    pub async fn verify(&self, request: VerifyPasswordResetRequest) -> Result<(), InternalError> {
        validate_request(&request)?;
        let email = request.email.trim();
        let otp_hash = self.crypto_provider.otp_digest(request.otp.trim())?;
        let now = Utc::now().timestamp();

        let record = self
            .password_reset_store
            .find_live(&self.db, email, &otp_hash, false, now)
            .await?
            .ok_or_else(|| InternalError::validation("otp", INVALID_OTP))?;

        if self.password_reset_store.mark_verified(&self.db, record.id).await? == 0 {
            tracing::debug!("Password reset code {} was verified concurrently", record.id);
            return Err(InternalError::validation("otp", INVALID_OTP));
        }

        tracing::info!("Password reset code verified for {}", email);
        Ok(())
    }

    /// Set a new password using a verified code
    ///
    /// Coordinates the sequence of operations:
    /// 1. Validate and hash the new password
    /// 2. In a transaction, require a verified unexpired code
    /// 3. Store the hash, delete all codes for the email, end the user's session
    pub async fn reset(&self, request: ResetPasswordRequest) -> Result<(), InternalError> {
        // Step 1: Validate and hash outside the transaction
        validate_request(&request)?;
        let email = request.email.trim();
        let otp_hash = self.crypto_provider.otp_digest(request.otp.trim())?;
        let password_hash = self.crypto_provider.hash_password(&request.password)?;
        let now = Utc::now().timestamp();

        // Step 2: Verified code
        let txn = begin_transaction(&self.db, "reset_password").await?;
        self.password_reset_store
            .find_live(&txn, email, &otp_hash, true, now)
            .await?
            .ok_or_else(|| InternalError::validation("otp", INVALID_OTP))?;

        let user = self
            .user_store
            .find_by_email(&txn, email)
            .await?
            .ok_or_else(|| CredentialError::UserNotFound(email.to_string()))?;

        // Step 3: Apply
        self.user_store
            .update(
                &txn,
                &user.id,
                UserChanges {
                    password_hash: Some(password_hash),
                    ..Default::default()
                },
            )
            .await?;
        let removed_codes = self.password_reset_store.delete_for_email(&txn, email).await?;
        let removed_sessions = self.session_store.delete_by_user(&txn, &user.id).await?;

        commit_transaction(txn, "reset_password").await?;

        tracing::info!(
            "Password reset completed for user {} ({} codes removed, {} sessions ended)",
            user.id,
            removed_codes,
            removed_sessions
        );
        Ok(())
    }
}
