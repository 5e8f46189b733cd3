use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::errors::InternalError;
use crate::types::db::password_reset_otp;

/// Data access for `password_reset_otps`
///
/// Codes are only ever looked up by their digest.
pub struct PasswordResetStore {}

impl PasswordResetStore {
    pub fn new() -> Self {
        Self {}
    }

    pub async fn insert(
        &self,
        conn: &impl ConnectionTrait,
        email: &str,
        otp_hash: &str,
        expires_at: i64,
    ) -> Result<password_reset_otp::Model, InternalError> {
        password_reset_otp::ActiveModel {
            email: Set(email.to_owned()),
            otp_hash: Set(otp_hash.to_owned()),
            expires_at: Set(expires_at),
            is_verified: Set(false),
            created_at: Set(Utc::now().timestamp()),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(|e| InternalError::database("insert_password_reset_otp", e))
    }

    /// Newest unexpired row for `email` and digest with the given verified flag
    pub async fn find_live(
        &self,
        conn: &impl ConnectionTrait,
        email: &str,
        otp_hash: &str,
        is_verified: bool,
        now: i64,
    ) -> Result<Option<password_reset_otp::Model>, InternalError> {
        password_reset_otp::Entity::find()
            .filter(password_reset_otp::Column::Email.eq(email))
            .filter(password_reset_otp::Column::OtpHash.eq(otp_hash))
            .filter(password_reset_otp::Column::IsVerified.eq(is_verified))
            .filter(password_reset_otp::Column::ExpiresAt.gt(now))
            .order_by_desc(password_reset_otp::Column::Id)
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_password_reset_otp", e))
    }

    /// Flip `is_verified` on an unverified row; returns affected rows
    pub async fn mark_verified(
        &self,
        conn: &impl ConnectionTrait,
        otp_id: i32,
    ) -> Result<u64, InternalError> {
        let result = password_reset_otp::Entity::update_many()
            .set(password_reset_otp::ActiveModel {
                is_verified: Set(true),
                ..Default::default()
            })
            .filter(password_reset_otp::Column::Id.eq(otp_id))
            .filter(password_reset_otp::Column::IsVerified.eq(false))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("mark_password_reset_otp_verified", e))?;
        Ok(result.rows_affected)
    }

    pub async fn delete(&self, conn: &impl ConnectionTrait, otp_id: i32) -> Result<u64, InternalError> {
        let result = password_reset_otp::Entity::delete_by_id(otp_id)
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("delete_password_reset_otp", e))?;
        Ok(result.rows_affected)
    }

    pub async fn delete_for_email(
        &self,
        conn: &impl ConnectionTrait,
        email: &str,
    ) -> Result<u64, InternalError> {
        let result = password_reset_otp::Entity::delete_many()
            .filter(password_reset_otp::Column::Email.eq(email))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("delete_password_reset_otps", e))?;
        Ok(result.rows_affected)
    }

    pub async fn list_for_email(
        &self,
        conn: &impl ConnectionTrait,
        email: &str,
    ) -> Result<Vec<password_reset_otp::Model>, InternalError> {
        password_reset_otp::Entity::find()
            .filter(password_reset_otp::Column::Email.eq(email))
            .order_by_asc(password_reset_otp::Column::Id)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("list_password_reset_otps", e))
    }
}

impl Default for PasswordResetStore {
    fn default() -> Self {
        Self::new()
    }
}
