use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::app_data::AppData;
use crate::errors::InternalError;
use crate::errors::internal::CredentialError;
use crate::providers::avatar_provider::{avatar_path, validate_avatar};
use crate::providers::validation_provider::{collect_request_errors, normalize_optional};
use crate::providers::{CryptoProvider, FileStorage};
use crate::stores::{UniqueFields, UserChanges, UserStore};
use crate::types::db::user;
use crate::types::dto::auth::{ChangePasswordRequest, UpdateProfileRequest};
use crate::types::internal::FieldErrors;
use crate::types::internal::auth::AuthenticatedSession;

/// Self-service profile mutations under an authenticated session
pub struct ProfileCoordinator {
    db: DatabaseConnection,
    crypto_provider: Arc<CryptoProvider>,
    file_storage: Arc<dyn FileStorage>,
    user_store: Arc<UserStore>,
}

impl ProfileCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            db: app_data.db.clone(),
            crypto_provider: app_data.crypto_provider.clone(),
            file_storage: app_data.file_storage.clone(),
            user_store: app_data.user_store.clone(),
        }
    }

    /// Edit name, username, email and phone
    ///
    /// An absent field is left untouched. An empty `username` or `phone`
    /// clears the column.
    pub async fn update_profile(
        &self,
        auth: &AuthenticatedSession,
        request: UpdateProfileRequest,
    ) -> Result<user::Model, InternalError> {
        let user_id = auth.user_id();

        // Empty nullable fields mean "clear", so they skip the length rules
        let username = request.username.map(|u| normalize_optional(Some(u)));
        let phone = request.phone.map(|p| normalize_optional(Some(p)));
        let checked = UpdateProfileRequest {
            name: request.name.map(|n| n.trim().to_string()),
            username: username.clone().flatten(),
            email: request.email.map(|e| e.trim().to_string()),
            phone: phone.clone().flatten(),
        };

        let mut errors = FieldErrors::new();
        collect_request_errors(&checked, &mut errors);
        self.user_store
            .collect_uniqueness_errors(
                &self.db,
                UniqueFields {
                    email: checked.email.as_deref(),
                    username: checked.username.as_deref(),
                    employee_id: None,
                },
                Some(user_id),
                &mut errors,
            )
            .await?;
        errors.into_result()?;

        let updated = self
            .user_store
            .update(
                &self.db,
                user_id,
                UserChanges {
                    name: checked.name,
                    username,
                    email: checked.email,
                    phone,
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!("User {} updated their profile", user_id);
        Ok(updated)
    }

    /// Replace the password after confirming the current one
    pub async fn change_password(
        &self,
        auth: &AuthenticatedSession,
        request: ChangePasswordRequest,
    ) -> Result<(), InternalError> {
        let mut errors = FieldErrors::new();
        collect_request_errors(&request, &mut errors);

        if !self
            .crypto_provider
            .verify_password(&request.current_password, &auth.user.password_hash)?
        {
            errors.add("current_password", "The current password is incorrect.");
        }
        errors.into_result()?;

        let password_hash = self.crypto_provider.hash_password(&request.new_password)?;
        self.user_store
            .update(
                &self.db,
                auth.user_id(),
                UserChanges {
                    password_hash: Some(password_hash),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!("User {} changed their password", auth.user_id());
        Ok(())
    }

    /// Store a new avatar and drop the previous file
    ///
    /// Coordinates the sequence of operations:
    /// 1. Validate size, type and dimensions
    /// 2. Write the new file under a fresh path
    /// 3. Point the user row at it; on failure remove the new file again
    /// 4. Delete the previous file, which no row references any more
    pub async fn upload_avatar(
        &self,
        auth: &AuthenticatedSession,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<user::Model, InternalError> {
        let user_id = auth.user_id();

        // Step 1: Validate
        let avatar = validate_avatar(content_type, bytes)?;

        // Step 2: Store
        let path = avatar_path(user_id, avatar.extension);
        self.file_storage.put(&path, &avatar.bytes).await?;

        // Step 3: Reference
        let previous = self
            .user_store
            .find_by_id(&self.db, user_id)
            .await?
            .and_then(|u| u.avatar);
        let updated = match self.user_store.set_avatar(&self.db, user_id, Some(path.clone())).await {
            Ok(updated) => updated,
            Err(e) => {
                if let Err(cleanup) = self.file_storage.delete(&path).await {
                    tracing::warn!("Failed to remove orphaned avatar {}: {}", path, cleanup);
                }
                return Err(e);
            }
        };

        // Step 4: Release the old file
        if let Some(previous) = previous.filter(|p| *p != path) {
            if let Err(e) = self.file_storage.delete(&previous).await {
                tracing::warn!("Failed to delete previous avatar {}: {}", previous, e);
            }
        }

        tracing::info!(
            "User {} uploaded a {}x{} avatar",
            user_id,
            avatar.width,
            avatar.height
        );
        Ok(updated)
    }

    /// Clear the avatar; succeeds when none is set
    pub async fn delete_avatar(&self, auth: &AuthenticatedSession) -> Result<user::Model, InternalError> {
        let user_id = auth.user_id();
        let current = self
            .user_store
            .find_by_id(&self.db, user_id)
            .await?
            .ok_or_else(|| CredentialError::UserNotFound(user_id.to_string()))?;

        let Some(path) = current.avatar.clone() else {
            return Ok(current);
        };

        let updated = self.user_store.set_avatar(&self.db, user_id, None).await?;
        if let Err(e) = self.file_storage.delete(&path).await {
            tracing::warn!("Failed to delete avatar {}: {}", path, e);
        }

        tracing::info!("User {} removed their avatar", user_id);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::avatar_provider::tests::png_bytes;
    use crate::test::utils::{
        TEST_PASSWORD, TestApp, create_test_user, create_test_user_with_password, setup_test_app,
    };
    use crate::types::db::Role;
    use crate::types::db::active_session;
    use crate::types::internal::auth::Claims;

    async fn session_for(app: &TestApp, email: &str) -> AuthenticatedSession {
        let user = app
            .app_data
            .user_store
            .find_by_email(app.db(), email)
            .await
            .unwrap()
            .unwrap();
        AuthenticatedSession {
            user: user.clone(),
            session: active_session::Model {
                id: 1,
                user_id: user.id.clone(),
                token_id: "test-token".to_string(),
                device_name: "test".to_string(),
                ip_address: None,
                user_agent: None,
                last_activity: 0,
                created_at: 0,
            },
            claims: Claims {
                sub: user.id.clone(),
                exp: 0,
                iat: 0,
                jti: "test-token".to_string(),
            },
        }
    }

    fn profile(name: Option<&str>, username: Option<&str>, email: Option<&str>, phone: Option<&str>) -> UpdateProfileRequest {
        UpdateProfileRequest {
            name: name.map(str::to_string),
            username: username.map(str::to_string),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_update_profile_partial_and_clearing() {
        let app = setup_test_app().await;
        create_test_user(app.db(), "ayu@example.com", Some("ayu"), Role::Sdm).await;
        let auth = session_for(&app, "ayu@example.com").await;
        let coordinator = ProfileCoordinator::new(app.app_data.clone());

        let updated = coordinator
            .update_profile(&auth, profile(Some("Ayu Lestari"), None, None, Some("0812")))
            .await
            .unwrap();
        assert_eq!(updated.name, "Ayu Lestari");
        assert_eq!(updated.username.as_deref(), Some("ayu"));
        assert_eq!(updated.phone.as_deref(), Some("0812"));

        let cleared = coordinator
            .update_profile(&auth, profile(None, Some(""), None, Some("  ")))
            .await
            .unwrap();
        assert_eq!(cleared.username, None);
        assert_eq!(cleared.phone, None);
        assert_eq!(cleared.name, "Ayu Lestari");
    }

    #[tokio::test]
    async fn test_update_profile_rejects_taken_email_but_allows_own() {
        let app = setup_test_app().await;
        create_test_user(app.db(), "ayu@example.com", None, Role::Sdm).await;
        create_test_user(app.db(), "budi@example.com", None, Role::Sdm).await;
        let auth = session_for(&app, "ayu@example.com").await;
        let coordinator = ProfileCoordinator::new(app.app_data.clone());

        assert!(coordinator
            .update_profile(&auth, profile(None, None, Some("ayu@example.com"), None))
            .await
            .is_ok());

        match coordinator
            .update_profile(&auth, profile(None, None, Some("budi@example.com"), None))
            .await
        {
            Err(InternalError::Validation(errors)) => assert!(errors.contains("email")),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_change_password_requires_current_password() {
        let app = setup_test_app().await;
        create_test_user_with_password(app.db(), "ayu@example.com", Role::Sdm).await;
        let auth = session_for(&app, "ayu@example.com").await;
        let coordinator = ProfileCoordinator::new(app.app_data.clone());

        let wrong = ChangePasswordRequest {
            current_password: "Nope1234!".to_string(),
            new_password: "Fresh123!".to_string(),
            new_password_confirmation: "Fresh123!".to_string(),
        };
        match coordinator.change_password(&auth, wrong).await {
            Err(InternalError::Validation(errors)) => {
                assert_eq!(errors.into_map()["current_password"], vec!["The current password is incorrect."]);
            }
            other => panic!("Expected validation error, got {:?}", other),
        }

        let right = ChangePasswordRequest {
            current_password: TEST_PASSWORD.to_string(),
            new_password: "Fresh123!".to_string(),
            new_password_confirmation: "Fresh123!".to_string(),
        };
        coordinator.change_password(&auth, right).await.unwrap();

        let stored = app.app_data.user_store.find_by_id(app.db(), auth.user_id()).await.unwrap().unwrap();
        assert!(app.app_data.crypto_provider.verify_password("Fresh123!", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_avatar_replace_removes_previous_file() {
        let app = setup_test_app().await;
        create_test_user(app.db(), "ayu@example.com", None, Role::Sdm).await;
        let auth = session_for(&app, "ayu@example.com").await;
        let coordinator = ProfileCoordinator::new(app.app_data.clone());

        let first = coordinator
            .upload_avatar(&auth, Some("image/png"), png_bytes(10, 10))
            .await
            .unwrap();
        let first_path = first.avatar.clone().unwrap();
        assert!(app.files.contains(&first_path));

        let second = coordinator
            .upload_avatar(&auth, Some("image/png"), png_bytes(20, 20))
            .await
            .unwrap();
        let second_path = second.avatar.unwrap();
        assert_ne!(first_path, second_path);
        assert!(!app.files.contains(&first_path));
        assert_eq!(app.files.paths(), vec![second_path]);
    }

    #[tokio::test]
    async fn test_avatar_rejects_bad_upload_without_storing() {
        let app = setup_test_app().await;
        create_test_user(app.db(), "ayu@example.com", None, Role::Sdm).await;
        let auth = session_for(&app, "ayu@example.com").await;
        let coordinator = ProfileCoordinator::new(app.app_data.clone());

        let result = coordinator
            .upload_avatar(&auth, Some("text/plain"), b"hello".to_vec())
            .await;
        assert!(matches!(result, Err(InternalError::Validation(_))));
        assert!(app.files.paths().is_empty());
    }

    #[tokio::test]
    async fn test_delete_avatar_is_idempotent() {
        let app = setup_test_app().await;
        create_test_user(app.db(), "ayu@example.com", None, Role::Sdm).await;
        let auth = session_for(&app, "ayu@example.com").await;
        let coordinator = ProfileCoordinator::new(app.app_data.clone());

        assert_eq!(coordinator.delete_avatar(&auth).await.unwrap().avatar, None);

        coordinator
            .upload_avatar(&auth, Some("image/png"), png_bytes(8, 8))
            .await
            .unwrap();
        let cleared = coordinator.delete_avatar(&auth).await.unwrap();
        assert_eq!(cleared.avatar, None);
        assert!(app.files.paths().is_empty());

        assert!(coordinator.delete_avatar(&auth).await.is_ok());
    }
}
