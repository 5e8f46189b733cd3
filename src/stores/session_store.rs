use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, SqlErr};

use crate::errors::InternalError;
use crate::errors::internal::SessionError;
use crate::types::db::active_session;

/// Device details recorded with a new session
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: String,
    pub token_id: String,
    pub device_name: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Data access for `active_sessions`
///
/// The table has a unique index on `user_id`; `insert` surfaces a lost race
/// on that index as `SessionError::ConcurrentInsert` instead of a database
/// failure.
pub struct SessionStore {}

impl SessionStore {
    pub fn new() -> Self {
        Self {}
    }

    pub async fn find_by_user(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
    ) -> Result<Option<active_session::Model>, InternalError> {
        active_session::Entity::find()
            .filter(active_session::Column::UserId.eq(user_id))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_session_by_user", e))
    }

    pub async fn insert(
        &self,
        conn: &impl ConnectionTrait,
        session: NewSession,
    ) -> Result<active_session::Model, InternalError> {
        let now = Utc::now().timestamp();
        let user_id = session.user_id.clone();

        active_session::ActiveModel {
            user_id: Set(session.user_id),
            token_id: Set(session.token_id),
            device_name: Set(session.device_name),
            ip_address: Set(session.ip_address),
            user_agent: Set(session.user_agent),
            last_activity: Set(now),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                InternalError::from(SessionError::ConcurrentInsert { user_id })
            }
            _ => InternalError::database("insert_session", e),
        })
    }

    pub async fn delete_by_user(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
    ) -> Result<u64, InternalError> {
        let result = active_session::Entity::delete_many()
            .filter(active_session::Column::UserId.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("delete_session_by_user", e))?;
        Ok(result.rows_affected)
    }

    /// Revoke exactly the session bound to `token_id`
    pub async fn delete_by_token(
        &self,
        conn: &impl ConnectionTrait,
        token_id: &str,
    ) -> Result<u64, InternalError> {
        let result = active_session::Entity::delete_many()
            .filter(active_session::Column::TokenId.eq(token_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("delete_session_by_token", e))?;
        Ok(result.rows_affected)
    }

    /// Swap the bound token id and bump `last_activity`
    ///
    /// Only applies while the row still carries `current_token_id`, so a
    /// concurrent refresh or takeover makes this a no-op (0 rows).
    pub async fn rebind_token(
        &self,
        conn: &impl ConnectionTrait,
        session_id: i32,
        current_token_id: &str,
        new_token_id: &str,
    ) -> Result<u64, InternalError> {
        let result = active_session::Entity::update_many()
            .set(active_session::ActiveModel {
                token_id: Set(new_token_id.to_owned()),
                last_activity: Set(Utc::now().timestamp()),
                ..Default::default()
            })
            .filter(active_session::Column::Id.eq(session_id))
            .filter(active_session::Column::TokenId.eq(current_token_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("rebind_session_token", e))?;
        Ok(result.rows_affected)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
