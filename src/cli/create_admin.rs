use validator::Validate;

use crate::app_data::AppData;
use crate::errors::InternalError;
use crate::providers::validation_provider::{collect_request_errors, normalize_optional};
use crate::stores::{NewUser, UniqueFields};
use crate::types::db::{Role, user};
use crate::types::internal::FieldErrors;

/// Admin accounts exist only through this command
#[derive(Debug, Validate)]
pub struct AdminAccount {
    #[validate(length(min = 1, max = 255, message = "The name field is required and may not exceed 255 characters."))]
    pub name: String,

    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,

    #[validate(
        length(min = 8, message = "The password must be at least 8 characters."),
        custom(function = "crate::providers::validation_provider::validate_password_strength")
    )]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "The username may not exceed 100 characters."))]
    pub username: Option<String>,
}

pub async fn create_admin(app_data: &AppData, account: AdminAccount) -> Result<user::Model, InternalError> {
    let AdminAccount {
        name,
        email,
        password,
        username,
    } = account;
    let account = AdminAccount {
        name: name.trim().to_string(),
        email: email.trim().to_string(),
        password,
        username: normalize_optional(username),
    };

    let mut errors = FieldErrors::new();
    collect_request_errors(&account, &mut errors);
    app_data
        .user_store
        .collect_uniqueness_errors(
            &app_data.db,
            UniqueFields {
                email: Some(&account.email),
                username: account.username.as_deref(),
                employee_id: None,
            },
            None,
            &mut errors,
        )
        .await?;
    errors.into_result()?;

    let password_hash = app_data.crypto_provider.hash_password(&account.password)?;
    let admin = app_data
        .user_store
        .insert(
            &app_data.db,
            NewUser {
                id: uuid::Uuid::new_v4().to_string(),
                name: account.name,
                username: account.username,
                email: account.email,
                phone: None,
                password_hash,
                role: Role::Admin,
                employee_id: None,
            },
        )
        .await?;

    tracing::info!("Admin account {} created from CLI", admin.id);
    Ok(admin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::setup_test_app;

    fn account(email: &str, password: &str) -> AdminAccount {
        AdminAccount {
            name: "Administrator".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            username: Some("admin".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_admin_sets_admin_role() {
        let app = setup_test_app().await;

        let admin = create_admin(&app.app_data, account("admin@example.com", "Admin123!"))
            .await
            .unwrap();

        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.unit_id, None);
        assert!(app.app_data.crypto_provider.verify_password("Admin123!", &admin.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_create_admin_rejects_weak_password_and_duplicates() {
        let app = setup_test_app().await;
        create_admin(&app.app_data, account("admin@example.com", "Admin123!"))
            .await
            .unwrap();

        match create_admin(&app.app_data, account("admin@example.com", "weak")).await {
            Err(InternalError::Validation(errors)) => {
                assert!(errors.contains("password"));
                assert!(errors.contains("email"));
                assert!(errors.contains("username"));
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }
}
