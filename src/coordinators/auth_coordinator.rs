use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::app_data::AppData;
use crate::config::{begin_transaction, commit_transaction};
use crate::errors::InternalError;
use crate::errors::internal::{CredentialError, ExistingSession, SessionError};
use crate::providers::{CryptoProvider, TokenProvider};
use crate::stores::{NewSession, SessionStore, UnitStore, UserStore};
use crate::types::db::{Role, active_session, unit, user};
use crate::types::internal::auth::{AuthenticatedSession, IssuedToken};
use crate::types::internal::context::RequestContext;

/// How many times a login re-runs the conflict check after losing the
/// insert race on the per-user session index
const MAX_SESSION_ATTEMPTS: u32 = 3;

const UNKNOWN_DEVICE: &str = "Unknown Device";

/// Credentials and device details for a login attempt
#[derive(Debug, Clone)]
pub struct LoginAttempt {
    /// Email address or username
    pub identifier: String,
    pub password: String,
    pub device_name: Option<String>,
    pub force_logout: bool,
}

/// Result of a successful login
#[derive(Debug)]
pub struct LoginOutcome {
    pub user: user::Model,
    pub unit: Option<unit::Model>,
    pub token: IssuedToken,
    pub session: active_session::Model,
    /// True when another device's session was terminated
    pub took_over: bool,
}

/// Read-only view of the caller's session state
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    /// The presented token is bound to the user's live session
    pub active: bool,
    /// The user's live session, whichever device holds it
    pub session: Option<active_session::Model>,
}

impl SessionStatus {
    fn inactive() -> Self {
        Self {
            active: false,
            session: None,
        }
    }
}

/// Session authority: login, takeover, refresh, logout and the bearer gate
///
/// At most one `active_sessions` row exists per user. Login serializes on the
/// unique index over `user_id`; a bearer is only honoured while its `jti` is
/// the `token_id` of that row.
pub struct AuthCoordinator {
    db: DatabaseConnection,
    token_provider: Arc<TokenProvider>,
    crypto_provider: Arc<CryptoProvider>,
    user_store: Arc<UserStore>,
    unit_store: Arc<UnitStore>,
    session_store: Arc<SessionStore>,
}

impl AuthCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            db: app_data.db.clone(),
            token_provider: app_data.token_provider.clone(),
            crypto_provider: app_data.crypto_provider.clone(),
            user_store: app_data.user_store.clone(),
            unit_store: app_data.unit_store.clone(),
            session_store: app_data.session_store.clone(),
        }
    }

    /// Orchestrate login with single-session enforcement
    ///
    /// 1. Verify credentials and that the account is active
    /// 2. In a transaction, look up the user's current session
    /// 3. Existing session without `force_logout` → `SessionError::Conflict`, nothing written
    /// 4. Otherwise delete the existing session, issue a token and insert the new row
    /// 5. Losing the insert race rolls back and restarts from step 2
    pub async fn login(
        &self,
        ctx: &RequestContext,
        attempt: LoginAttempt,
    ) -> Result<LoginOutcome, InternalError> {
        // Step 1: Verify credentials
        let user = self
            .user_store
            .find_by_login(&self.db, attempt.identifier.trim())
            .await?
            .ok_or(CredentialError::InvalidCredentials)?;

        if !self
            .crypto_provider
            .verify_password(&attempt.password, &user.password_hash)?
        {
            tracing::debug!("Login rejected for user {}: wrong password", user.id);
            return Err(CredentialError::InvalidCredentials.into());
        }

        if !user.is_active {
            tracing::debug!("Login rejected for user {}: account inactive", user.id);
            return Err(CredentialError::AccountInactive { user_id: user.id }.into());
        }

        let device_name = attempt
            .device_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .or(ctx.user_agent.as_deref())
            .unwrap_or(UNKNOWN_DEVICE)
            .to_string();

        for attempt_number in 1..=MAX_SESSION_ATTEMPTS {
            // Step 2: Check for an existing session
            let txn = begin_transaction(&self.db, "login").await?;
            let existing = self.session_store.find_by_user(&txn, &user.id).await?;

            // Step 3: Surface the conflict unless the caller confirmed takeover
            let took_over = match existing {
                Some(existing) if !attempt.force_logout => {
                    tracing::debug!(
                        "Login for user {} blocked by session on {}",
                        user.id,
                        existing.device_name
                    );
                    return Err(SessionError::Conflict {
                        user_id: user.id.clone(),
                        existing: ExistingSession {
                            device_name: existing.device_name,
                            ip_address: existing.ip_address,
                            last_activity: existing.last_activity,
                        },
                    }
                    .into());
                }
                Some(_) => {
                    self.session_store.delete_by_user(&txn, &user.id).await?;
                    true
                }
                None => false,
            };

            // Step 4: Issue the credential and bind it to a new session row
            let token = self.token_provider.issue(&user.id)?;
            let new_session = NewSession {
                user_id: user.id.clone(),
                token_id: token.token_id.clone(),
                device_name: device_name.clone(),
                ip_address: ctx.ip_address.map(|ip| ip.to_string()),
                user_agent: ctx.user_agent.clone(),
            };

            match self.session_store.insert(&txn, new_session).await {
                Ok(session) => {
                    commit_transaction(txn, "login").await?;
                    if took_over {
                        tracing::info!(
                            "User {} logged in on {} and terminated the previous session",
                            user.id,
                            session.device_name
                        );
                    } else {
                        tracing::info!("User {} logged in on {}", user.id, session.device_name);
                    }

                    let unit = self.unit_of(&user).await?;
                    return Ok(LoginOutcome {
                        user,
                        unit,
                        token,
                        session,
                        took_over,
                    });
                }
                // Step 5: Another login won the race; re-run the conflict check
                Err(InternalError::Session(SessionError::ConcurrentInsert { .. })) => {
                    drop(txn);
                    tracing::debug!(
                        "Concurrent session insert for user {} (attempt {})",
                        user.id,
                        attempt_number
                    );
                }
                Err(e) => return Err(e),
            }
        }

        tracing::warn!("Session takeover for user {} did not settle", user.id);
        Err(SessionError::TakeoverExhausted {
            user_id: user.id,
            attempts: MAX_SESSION_ATTEMPTS,
        }
        .into())
    }

    /// Authentication gate for bearer-protected endpoints
    ///
    /// Accepts the bearer only if its signature and expiry verify, the user's
    /// session row carries its `jti`, and the account is active.
    pub async fn authenticate(&self, ctx: &RequestContext) -> Result<AuthenticatedSession, InternalError> {
        let bearer = ctx.bearer.as_deref().ok_or(CredentialError::MissingToken)?;
        let claims = self.token_provider.validate(bearer)?;

        let session = self
            .session_store
            .find_by_user(&self.db, &claims.sub)
            .await?
            .filter(|session| session.token_id == claims.jti)
            .ok_or_else(|| CredentialError::SessionRevoked {
                token_id: claims.jti.clone(),
            })?;

        let user = self
            .user_store
            .find_by_id(&self.db, &claims.sub)
            .await?
            .ok_or_else(|| CredentialError::SessionRevoked {
                token_id: claims.jti.clone(),
            })?;

        if !user.is_active {
            return Err(CredentialError::AccountInactive { user_id: user.id }.into());
        }

        Ok(AuthenticatedSession {
            user,
            session,
            claims,
        })
    }

    /// Fail with `InsufficientRole` unless the caller holds one of `allowed`
    pub fn require_role(&self, auth: &AuthenticatedSession, allowed: &[Role]) -> Result<(), InternalError> {
        if allowed.contains(&auth.user.role) {
            return Ok(());
        }
        tracing::debug!(
            "User {} with role {} denied, requires {:?}",
            auth.user_id(),
            auth.user.role.as_str(),
            allowed
        );
        Err(CredentialError::InsufficientRole {
            required: allowed.to_vec(),
            actual: auth.user.role,
        }
        .into())
    }

    /// Delete the caller's session; the presented token stops working immediately
    pub async fn logout(&self, auth: &AuthenticatedSession) -> Result<(), InternalError> {
        let removed = self
            .session_store
            .delete_by_token(&self.db, auth.token_id())
            .await?;
        tracing::info!("User {} logged out ({} session removed)", auth.user_id(), removed);
        Ok(())
    }

    /// Rebind the caller's session to a fresh token
    ///
    /// The session row keeps its identity; only `token_id` and
    /// `last_activity` change. The previous token is rejected afterwards.
    pub async fn refresh(&self, auth: &AuthenticatedSession) -> Result<IssuedToken, InternalError> {
        let token = self.token_provider.issue(auth.user_id())?;

        let updated = self
            .session_store
            .rebind_token(&self.db, auth.session.id, auth.token_id(), &token.token_id)
            .await?;

        if updated == 0 {
            tracing::debug!("Refresh lost to a concurrent session change for user {}", auth.user_id());
            return Err(CredentialError::SessionRevoked {
                token_id: auth.token_id().to_string(),
            }
            .into());
        }

        tracing::info!("User {} refreshed their session token", auth.user_id());
        Ok(token)
    }

    /// Probe whether the presented bearer still owns the user's session
    ///
    /// Never writes. A missing, malformed or expired bearer is simply inactive.
    pub async fn check_session(&self, ctx: &RequestContext) -> Result<SessionStatus, InternalError> {
        let Some(bearer) = ctx.bearer.as_deref() else {
            return Ok(SessionStatus::inactive());
        };
        let claims = match self.token_provider.validate(bearer) {
            Ok(claims) => claims,
            Err(InternalError::Credential(_)) => return Ok(SessionStatus::inactive()),
            Err(e) => return Err(e),
        };

        let Some(session) = self.session_store.find_by_user(&self.db, &claims.sub).await? else {
            return Ok(SessionStatus::inactive());
        };

        let user_active = self
            .user_store
            .find_by_id(&self.db, &claims.sub)
            .await?
            .is_some_and(|user| user.is_active);

        Ok(SessionStatus {
            active: user_active && session.token_id == claims.jti,
            session: Some(session),
        })
    }

    /// The caller's profile together with their unit
    pub async fn me(&self, auth: &AuthenticatedSession) -> Result<(user::Model, Option<unit::Model>), InternalError> {
        let unit = self.unit_of(&auth.user).await?;
        Ok((auth.user.clone(), unit))
    }

    /// The unit a user is assigned to, if any
    pub async fn unit_of(&self, user: &user::Model) -> Result<Option<unit::Model>, InternalError> {
        match user.unit_id {
            Some(unit_id) => self.unit_store.find_by_id(&self.db, unit_id).await,
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::{TEST_PASSWORD, create_test_user_with_password, setup_test_app};

    fn attempt(email: &str, force_logout: bool, device: &str) -> LoginAttempt {
        LoginAttempt {
            identifier: email.to_string(),
            password: TEST_PASSWORD.to_string(),
            device_name: Some(device.to_string()),
            force_logout,
        }
    }

    async fn session_count(app: &crate::test::utils::TestApp, user_id: &str) -> usize {
        use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
        active_session::Entity::find()
            .filter(active_session::Column::UserId.eq(user_id))
            .all(app.db())
            .await
            .unwrap()
            .len()
    }

    #[tokio::test]
    async fn test_login_creates_single_session() {
        let app = setup_test_app().await;
        let user = create_test_user_with_password(app.db(), "ayu@example.com", Role::Sdm).await;
        let coordinator = AuthCoordinator::new(app.app_data.clone());

        let outcome = coordinator
            .login(&RequestContext::for_system(), attempt("ayu@example.com", false, "laptop"))
            .await
            .unwrap();

        assert_eq!(outcome.user.id, user.id);
        assert!(!outcome.took_over);
        assert_eq!(outcome.session.token_id, outcome.token.token_id);
        assert_eq!(session_count(&app, &user.id).await, 1);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_are_invalid_credentials() {
        let app = setup_test_app().await;
        create_test_user_with_password(app.db(), "ayu@example.com", Role::Sdm).await;
        let coordinator = AuthCoordinator::new(app.app_data.clone());
        let ctx = RequestContext::for_system();

        let mut wrong = attempt("ayu@example.com", false, "laptop");
        wrong.password = "Wrong1!pass".to_string();
        assert!(matches!(
            coordinator.login(&ctx, wrong).await,
            Err(InternalError::Credential(CredentialError::InvalidCredentials))
        ));
        assert!(matches!(
            coordinator.login(&ctx, attempt("nobody@example.com", false, "laptop")).await,
            Err(InternalError::Credential(CredentialError::InvalidCredentials))
        ));
    }

    #[tokio::test]
    async fn test_inactive_account_is_rejected() {
        let app = setup_test_app().await;
        let user = create_test_user_with_password(app.db(), "ayu@example.com", Role::Sdm).await;
        app.app_data
            .user_store
            .update(
                app.db(),
                &user.id,
                crate::stores::UserChanges {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let coordinator = AuthCoordinator::new(app.app_data.clone());

        assert!(matches!(
            coordinator
                .login(&RequestContext::for_system(), attempt("ayu@example.com", false, "laptop"))
                .await,
            Err(InternalError::Credential(CredentialError::AccountInactive { .. }))
        ));
    }

    #[tokio::test]
    async fn test_takeover_flow() {
        let app = setup_test_app().await;
        let user = create_test_user_with_password(app.db(), "ayu@example.com", Role::Sdm).await;
        let coordinator = AuthCoordinator::new(app.app_data.clone());
        let ctx = RequestContext::for_system();

        let first = coordinator.login(&ctx, attempt("ayu@example.com", false, "device-1")).await.unwrap();

        match coordinator.login(&ctx, attempt("ayu@example.com", false, "device-2")).await {
            Err(InternalError::Session(SessionError::Conflict { existing, .. })) => {
                assert_eq!(existing.device_name, "device-1");
            }
            other => panic!("Expected Conflict, got {:?}", other.map(|o| o.session)),
        }
        let still_first = app.app_data.session_store.find_by_user(app.db(), &user.id).await.unwrap().unwrap();
        assert_eq!(still_first.token_id, first.token.token_id);

        let second = coordinator.login(&ctx, attempt("ayu@example.com", true, "device-2")).await.unwrap();
        assert!(second.took_over);
        assert_eq!(session_count(&app, &user.id).await, 1);
        let current = app.app_data.session_store.find_by_user(app.db(), &user.id).await.unwrap().unwrap();
        assert_eq!(current.device_name, "device-2");

        let stale = RequestContext::for_system().with_bearer(first.token.token.clone());
        assert!(matches!(
            coordinator.authenticate(&stale).await,
            Err(InternalError::Credential(CredentialError::SessionRevoked { .. }))
        ));
    }

    #[tokio::test]
    async fn test_refresh_rebinds_same_session_and_revokes_old_token() {
        let app = setup_test_app().await;
        create_test_user_with_password(app.db(), "ayu@example.com", Role::Sdm).await;
        let coordinator = AuthCoordinator::new(app.app_data.clone());

        let login = coordinator
            .login(&RequestContext::for_system(), attempt("ayu@example.com", false, "laptop"))
            .await
            .unwrap();
        let old_ctx = RequestContext::for_system().with_bearer(login.token.token.clone());
        let auth = coordinator.authenticate(&old_ctx).await.unwrap();

        let refreshed = coordinator.refresh(&auth).await.unwrap();

        let new_ctx = RequestContext::for_system().with_bearer(refreshed.token.clone());
        let new_auth = coordinator.authenticate(&new_ctx).await.unwrap();
        assert_eq!(new_auth.session.id, login.session.id);
        assert!(coordinator.authenticate(&old_ctx).await.is_err());
    }

    #[tokio::test]
    async fn test_logout_then_gate_rejects_token() {
        let app = setup_test_app().await;
        let user = create_test_user_with_password(app.db(), "ayu@example.com", Role::Sdm).await;
        let coordinator = AuthCoordinator::new(app.app_data.clone());

        let login = coordinator
            .login(&RequestContext::for_system(), attempt("ayu@example.com", false, "laptop"))
            .await
            .unwrap();
        let ctx = RequestContext::for_system().with_bearer(login.token.token.clone());
        let auth = coordinator.authenticate(&ctx).await.unwrap();

        coordinator.logout(&auth).await.unwrap();

        assert_eq!(session_count(&app, &user.id).await, 0);
        assert!(coordinator.authenticate(&ctx).await.is_err());
    }

    #[tokio::test]
    async fn test_check_session_reports_without_mutating() {
        let app = setup_test_app().await;
        create_test_user_with_password(app.db(), "ayu@example.com", Role::Sdm).await;
        let coordinator = AuthCoordinator::new(app.app_data.clone());
        let ctx = RequestContext::for_system();

        assert_eq!(coordinator.check_session(&ctx).await.unwrap(), SessionStatus::inactive());

        let first = coordinator.login(&ctx, attempt("ayu@example.com", false, "device-1")).await.unwrap();
        let first_ctx = RequestContext::for_system().with_bearer(first.token.token.clone());
        let status = coordinator.check_session(&first_ctx).await.unwrap();
        assert!(status.active);

        coordinator.login(&ctx, attempt("ayu@example.com", true, "device-2")).await.unwrap();
        let status = coordinator.check_session(&first_ctx).await.unwrap();
        assert!(!status.active);
        assert_eq!(status.session.map(|s| s.device_name).as_deref(), Some("device-2"));

        let garbage = RequestContext::for_system().with_bearer("not-a-token");
        assert!(!coordinator.check_session(&garbage).await.unwrap().active);
    }

    #[tokio::test]
    async fn test_require_role() {
        let app = setup_test_app().await;
        create_test_user_with_password(app.db(), "ayu@example.com", Role::Sdm).await;
        let coordinator = AuthCoordinator::new(app.app_data.clone());
        let login = coordinator
            .login(&RequestContext::for_system(), attempt("ayu@example.com", false, "laptop"))
            .await
            .unwrap();
        let auth = coordinator
            .authenticate(&RequestContext::for_system().with_bearer(login.token.token))
            .await
            .unwrap();

        assert!(coordinator.require_role(&auth, &[Role::Sdm, Role::Unit]).is_ok());
        assert!(matches!(
            coordinator.require_role(&auth, &[Role::Admin]),
            Err(InternalError::Credential(CredentialError::InsufficientRole { actual: Role::Sdm, .. }))
        ));
    }
}
