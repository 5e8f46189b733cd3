use std::sync::Arc;

use sea_orm::{ConnectionTrait, DatabaseConnection};

use crate::app_data::AppData;
use crate::config::{begin_transaction, commit_transaction};
use crate::errors::InternalError;
use crate::errors::internal::OrgChartError;
use crate::providers::org_tree_provider::{ancestor_ids, build_chart};
use crate::providers::validation_provider::{collect_request_errors, normalize_optional};
use crate::providers::{CryptoProvider, FileStorage};
use crate::stores::{
    NewUser, SessionStore, UniqueFields, UnitFields, UnitStore, UserChanges, UserStore,
};
use crate::types::db::{Role, unit, user};
use crate::types::dto::org_chart::{
    AssignUserRequest, ChartUser, CreateUserRequest, OrgChartData, UnitRequest, UpdateUserRequest,
};
use crate::types::internal::FieldErrors;

/// Maintains the unit tree and the unit-derived role of every user
///
/// A user's role equals the role of their unit, or `sdm` when unassigned.
/// Assignment, unit role edits and unit deletion are the only writers of
/// that relationship and each runs in one transaction.
pub struct OrgChartCoordinator {
    db: DatabaseConnection,
    crypto_provider: Arc<CryptoProvider>,
    file_storage: Arc<dyn FileStorage>,
    user_store: Arc<UserStore>,
    unit_store: Arc<UnitStore>,
    session_store: Arc<SessionStore>,
    public_base: String,
}

impl OrgChartCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            db: app_data.db.clone(),
            crypto_provider: app_data.crypto_provider.clone(),
            file_storage: app_data.file_storage.clone(),
            user_store: app_data.user_store.clone(),
            unit_store: app_data.unit_store.clone(),
            session_store: app_data.session_store.clone(),
            public_base: app_data.settings.storage_public_url().to_string(),
        }
    }

    /// Active unit forest with members, plus the unassigned pool
    pub async fn index(&self) -> Result<OrgChartData, InternalError> {
        let units = self.unit_store.list_active_ordered(&self.db).await?;
        let members = self.user_store.list_assigned(&self.db).await?;
        let unassigned = self.user_store.list_unassigned(&self.db).await?;

        Ok(OrgChartData {
            units: build_chart(&units, &members, &self.public_base),
            unassigned_users: unassigned
                .iter()
                .map(|u| ChartUser::from_model(u, &self.public_base))
                .collect(),
        })
    }

    pub async fn find_unit(&self, unit_id: i32) -> Result<unit::Model, InternalError> {
        self.unit_store
            .find_by_id(&self.db, unit_id)
            .await?
            .ok_or_else(|| OrgChartError::UnitNotFound(unit_id).into())
    }

    pub async fn create_unit(&self, request: UnitRequest) -> Result<unit::Model, InternalError> {
        self.check_unit_request(&request, None).await?;

        let unit = self
            .unit_store
            .insert(&self.db, unit_fields(request, true))
            .await?;

        tracing::info!("Unit {} ({}) created", unit.id, unit.code);
        Ok(unit)
    }

    /// Edit a unit and carry a role change over to its members
    ///
    /// Coordinates the sequence of operations:
    /// 1. Validate code uniqueness and the proposed parent
    /// 2. In a transaction, update the unit
    /// 3. If the role changed, bulk-set the role of every member
    pub async fn update_unit(
        &self,
        unit_id: i32,
        request: UnitRequest,
    ) -> Result<unit::Model, InternalError> {
        let current = self.find_unit(unit_id).await?;

        // Step 1: Validate before any write
        self.check_unit_request(&request, Some(unit_id)).await?;

        let new_role = request.role;
        let fields = unit_fields(request, current.is_active);

        // Step 2: Update
        let txn = begin_transaction(&self.db, "update_unit").await?;
        let updated = self.unit_store.update(&txn, unit_id, fields).await?;

        // Step 3: Propagate
        if current.role != new_role {
            let affected = self
                .user_store
                .set_role_for_unit_members(&txn, unit_id, new_role)
                .await?;
            commit_transaction(txn, "update_unit").await?;
            tracing::info!(
                "Unit {} role changed from {} to {}, {} member(s) updated",
                unit_id,
                current.role.as_str(),
                new_role.as_str(),
                affected
            );
        } else {
            commit_transaction(txn, "update_unit").await?;
            tracing::info!("Unit {} updated", unit_id);
        }

        Ok(updated)
    }

    /// Remove a childless unit after unassigning its members
    pub async fn delete_unit(&self, unit_id: i32) -> Result<(), InternalError> {
        let txn = begin_transaction(&self.db, "delete_unit").await?;

        let unit = self
            .unit_store
            .find_by_id(&txn, unit_id)
            .await?
            .ok_or(OrgChartError::UnitNotFound(unit_id))?;

        let child_count = self.unit_store.count_children(&txn, unit_id).await?;
        if child_count > 0 {
            tracing::debug!("Unit {} not deleted: {} child unit(s)", unit_id, child_count);
            return Err(OrgChartError::HasChildren {
                unit_id,
                child_count,
            }
            .into());
        }

        let detached = self.user_store.detach_unit_members(&txn, unit_id).await?;
        self.unit_store.delete(&txn, unit_id).await?;
        commit_transaction(txn, "delete_unit").await?;

        tracing::info!(
            "Unit {} ({}) deleted, {} member(s) unassigned",
            unit_id,
            unit.code,
            detached
        );
        Ok(())
    }

    pub async fn find_user(&self, user_id: &str) -> Result<user::Model, InternalError> {
        self.user_store
            .find_by_id(&self.db, user_id)
            .await?
            .ok_or_else(|| OrgChartError::UserNotFound(user_id.to_string()).into())
    }

    /// Create an unassigned, active `sdm` account
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<user::Model, InternalError> {
        let request = CreateUserRequest {
            name: request.name.trim().to_string(),
            username: normalize_optional(request.username),
            email: request.email.trim().to_string(),
            phone: normalize_optional(request.phone),
            employee_id: normalize_optional(request.employee_id),
            ..request
        };

        let mut errors = FieldErrors::new();
        collect_request_errors(&request, &mut errors);
        self.user_store
            .collect_uniqueness_errors(
                &self.db,
                UniqueFields {
                    email: Some(&request.email),
                    username: request.username.as_deref(),
                    employee_id: request.employee_id.as_deref(),
                },
                None,
                &mut errors,
            )
            .await?;
        errors.into_result()?;

        let password_hash = self.crypto_provider.hash_password(&request.password)?;
        let user = self
            .user_store
            .insert(
                &self.db,
                NewUser {
                    id: uuid::Uuid::new_v4().to_string(),
                    name: request.name,
                    username: request.username,
                    email: request.email,
                    phone: request.phone,
                    password_hash,
                    role: Role::UNASSIGNED,
                    employee_id: request.employee_id,
                },
            )
            .await?;

        tracing::info!("User {} created", user.id);
        Ok(user)
    }

    /// Edit a non-admin account; an empty password keeps the stored hash
    pub async fn update_user(
        &self,
        user_id: &str,
        request: UpdateUserRequest,
    ) -> Result<user::Model, InternalError> {
        let current = self.find_user(user_id).await?;
        ensure_not_admin(&current, "modified")?;

        let password = normalize_optional(request.password.clone());
        let request = UpdateUserRequest {
            name: request.name.trim().to_string(),
            username: normalize_optional(request.username),
            email: request.email.trim().to_string(),
            phone: normalize_optional(request.phone),
            employee_id: normalize_optional(request.employee_id),
            ..request
        };

        let mut errors = FieldErrors::new();
        collect_request_errors(&request, &mut errors);
        if let Some(password) = password.as_deref() {
            if password.chars().count() < 8 {
                errors.add("password", "The password must be at least 8 characters.");
            }
            if request.password_confirmation.as_deref() != Some(password) {
                errors.add("password", "The password confirmation does not match.");
            }
        }
        self.user_store
            .collect_uniqueness_errors(
                &self.db,
                UniqueFields {
                    email: Some(&request.email),
                    username: request.username.as_deref(),
                    employee_id: request.employee_id.as_deref(),
                },
                Some(user_id),
                &mut errors,
            )
            .await?;
        errors.into_result()?;

        let password_hash = match password {
            Some(password) => Some(self.crypto_provider.hash_password(&password)?),
            None => None,
        };

        let updated = self
            .user_store
            .update(
                &self.db,
                user_id,
                UserChanges {
                    name: Some(request.name),
                    username: Some(request.username),
                    email: Some(request.email),
                    phone: Some(request.phone),
                    employee_id: Some(request.employee_id),
                    is_active: request.is_active,
                    password_hash,
                },
            )
            .await?;

        tracing::info!("User {} updated", user_id);
        Ok(updated)
    }

    /// Place a user in a unit or back into the unassigned pool
    ///
    /// The user takes the unit's role; unassigning resets it to `sdm`.
    /// Optional coordinates are saved on the target unit.
    pub async fn assign_user(
        &self,
        user_id: &str,
        request: AssignUserRequest,
    ) -> Result<user::Model, InternalError> {
        let txn = begin_transaction(&self.db, "assign_user").await?;

        let current = self.user_in(&txn, user_id).await?;
        ensure_not_admin(&current, "assigned")?;

        let updated = match request.unit_id {
            Some(unit_id) => {
                let unit = self
                    .unit_store
                    .find_by_id(&txn, unit_id)
                    .await?
                    .ok_or_else(|| {
                        InternalError::validation("unit_id", "The selected unit id is invalid.")
                    })?;

                let updated = self
                    .user_store
                    .assign(&txn, user_id, Some((unit.id, unit.role)))
                    .await?;

                if request.position_x.is_some() || request.position_y.is_some() {
                    self.unit_store
                        .set_position(
                            &txn,
                            unit.id,
                            request.position_x.or(unit.position_x),
                            request.position_y.or(unit.position_y),
                        )
                        .await?;
                }
                updated
            }
            None => self.user_store.assign(&txn, user_id, None).await?,
        };

        commit_transaction(txn, "assign_user").await?;

        match updated.unit_id {
            Some(unit_id) => tracing::info!(
                "User {} assigned to unit {} as {}",
                user_id,
                unit_id,
                updated.role.as_str()
            ),
            None => tracing::info!("User {} unassigned", user_id),
        }
        Ok(updated)
    }

    /// Remove a non-admin account and its avatar file
    ///
    /// Coordinates the sequence of operations:
    /// 1. In a transaction, refuse admins and clear the unit assignment
    /// 2. Delete the session and the user row, then commit
    /// 3. Delete the avatar file; a storage failure is only logged
    pub async fn delete_user(&self, user_id: &str) -> Result<(), InternalError> {
        // Step 1: Detach
        let txn = begin_transaction(&self.db, "delete_user").await?;
        let current = self.user_in(&txn, user_id).await?;
        ensure_not_admin(&current, "deleted")?;
        self.user_store.assign(&txn, user_id, None).await?;

        // Step 2: Remove
        self.session_store.delete_by_user(&txn, user_id).await?;
        self.user_store.delete(&txn, user_id).await?;
        commit_transaction(txn, "delete_user").await?;

        // Step 3: Storage cleanup
        if let Some(avatar) = current.avatar {
            if let Err(e) = self.file_storage.delete(&avatar).await {
                tracing::warn!("Failed to delete avatar {} of removed user {}: {}", avatar, user_id, e);
            }
        }

        tracing::info!("User {} deleted", user_id);
        Ok(())
    }

    async fn user_in(&self, conn: &impl ConnectionTrait, user_id: &str) -> Result<user::Model, InternalError> {
        self.user_store
            .find_by_id(conn, user_id)
            .await?
            .ok_or_else(|| OrgChartError::UserNotFound(user_id.to_string()).into())
    }

    /// Field checks shared by create and update; `unit_id` is the unit being edited
    async fn check_unit_request(
        &self,
        request: &UnitRequest,
        unit_id: Option<i32>,
    ) -> Result<(), InternalError> {
        let mut errors = FieldErrors::new();
        collect_request_errors(request, &mut errors);

        let code = request.code.trim();
        if !code.is_empty() && self.unit_store.is_code_taken(&self.db, code, unit_id).await? {
            errors.add("code", "The code has already been taken.");
        }

        if let Some(parent_id) = request.parent_unit_id {
            if Some(parent_id) == unit_id {
                errors.add("parent_unit_id", "A unit cannot be its own parent.");
            } else if self.unit_store.find_by_id(&self.db, parent_id).await?.is_none() {
                errors.add("parent_unit_id", "The selected parent unit id is invalid.");
            } else if let Some(unit_id) = unit_id {
                let units = self.unit_store.list_all(&self.db).await?;
                if ancestor_ids(&units, parent_id).contains(&unit_id) {
                    errors.add(
                        "parent_unit_id",
                        "A unit cannot be moved under one of its own descendants.",
                    );
                }
            }
        }

        Ok(errors.into_result()?)
    }
}

fn unit_fields(request: UnitRequest, default_active: bool) -> UnitFields {
    UnitFields {
        code: request.code.trim().to_string(),
        name: request.name.trim().to_string(),
        unit_type: request.unit_type,
        parent_unit_id: request.parent_unit_id,
        role: request.role,
        description: normalize_optional(request.description),
        position_x: request.position_x,
        position_y: request.position_y,
        is_active: request.is_active.unwrap_or(default_active),
    }
}

fn ensure_not_admin(user: &user::Model, action: &'static str) -> Result<(), InternalError> {
    if user.role == Role::Admin {
        tracing::warn!("Admin account {} cannot be {}", user.id, action);
        return Err(OrgChartError::ProtectedAdmin {
            user_id: user.id.clone(),
            action,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::{TestApp, create_test_unit, create_test_user, setup_test_app};
    use crate::types::db::UnitType;

    fn unit_request(code: &str, role: Role, parent_unit_id: Option<i32>) -> UnitRequest {
        UnitRequest {
            code: code.to_string(),
            name: format!("Unit {}", code),
            unit_type: UnitType::Unit,
            parent_unit_id,
            role,
            description: None,
            position_x: None,
            position_y: None,
            is_active: None,
        }
    }

    fn update_user_request(user: &user::Model) -> UpdateUserRequest {
        UpdateUserRequest {
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            password: None,
            password_confirmation: None,
            employee_id: user.employee_id.clone(),
            is_active: None,
        }
    }

    fn assign_to(unit_id: Option<i32>) -> AssignUserRequest {
        AssignUserRequest {
            unit_id,
            position_x: None,
            position_y: None,
        }
    }

    async fn reload(app: &TestApp, user_id: &str) -> user::Model {
        app.app_data.user_store.find_by_id(app.db(), user_id).await.unwrap().unwrap()
    }

    fn field_errors(result: Result<impl std::fmt::Debug, InternalError>) -> FieldErrors {
        match result {
            Err(InternalError::Validation(errors)) => errors,
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_assign_and_unassign_derive_role() {
        let app = setup_test_app().await;
        let unit = create_test_unit(app.db(), "U1", Role::Wadek, None).await;
        let user = create_test_user(app.db(), "ayu@example.com", None, Role::Sdm).await;
        let coordinator = OrgChartCoordinator::new(app.app_data.clone());

        let assigned = coordinator.assign_user(&user.id, assign_to(Some(unit.id))).await.unwrap();
        assert_eq!(assigned.unit_id, Some(unit.id));
        assert_eq!(assigned.role, Role::Wadek);
        assert!(assigned.assigned_at.is_some());

        let unassigned = coordinator.assign_user(&user.id, assign_to(None)).await.unwrap();
        assert_eq!(unassigned.unit_id, None);
        assert_eq!(unassigned.role, Role::Sdm);
        assert_eq!(unassigned.assigned_at, None);
    }

    #[tokio::test]
    async fn test_assign_saves_unit_position() {
        let app = setup_test_app().await;
        let unit = create_test_unit(app.db(), "U1", Role::Unit, None).await;
        let user = create_test_user(app.db(), "ayu@example.com", None, Role::Sdm).await;
        let coordinator = OrgChartCoordinator::new(app.app_data.clone());

        coordinator
            .assign_user(
                &user.id,
                AssignUserRequest {
                    unit_id: Some(unit.id),
                    position_x: Some(120),
                    position_y: None,
                },
            )
            .await
            .unwrap();

        let stored = coordinator.find_unit(unit.id).await.unwrap();
        assert_eq!(stored.position_x, Some(120));
        assert_eq!(stored.position_y, None);
    }

    #[tokio::test]
    async fn test_assign_to_missing_unit_is_validation_error() {
        let app = setup_test_app().await;
        let user = create_test_user(app.db(), "ayu@example.com", None, Role::Sdm).await;
        let coordinator = OrgChartCoordinator::new(app.app_data.clone());

        let errors = field_errors(coordinator.assign_user(&user.id, assign_to(Some(999))).await);
        assert!(errors.contains("unit_id"));
        assert_eq!(reload(&app, &user.id).await.unit_id, None);
    }

    #[tokio::test]
    async fn test_admin_accounts_are_immutable() {
        let app = setup_test_app().await;
        let unit = create_test_unit(app.db(), "U1", Role::Unit, None).await;
        let admin = create_test_user(app.db(), "admin@example.com", None, Role::Admin).await;
        let coordinator = OrgChartCoordinator::new(app.app_data.clone());

        assert!(matches!(
            coordinator.assign_user(&admin.id, assign_to(Some(unit.id))).await,
            Err(InternalError::OrgChart(OrgChartError::ProtectedAdmin { .. }))
        ));
        let mut edit = update_user_request(&admin);
        edit.name = "Renamed".to_string();
        assert!(matches!(
            coordinator.update_user(&admin.id, edit).await,
            Err(InternalError::OrgChart(OrgChartError::ProtectedAdmin { .. }))
        ));
        assert!(matches!(
            coordinator.delete_user(&admin.id).await,
            Err(InternalError::OrgChart(OrgChartError::ProtectedAdmin { .. }))
        ));

        assert_eq!(reload(&app, &admin.id).await, admin);
    }

    #[tokio::test]
    async fn test_unit_role_change_propagates_to_members_only() {
        let app = setup_test_app().await;
        let unit = create_test_unit(app.db(), "U1", Role::Unit, None).await;
        let other = create_test_unit(app.db(), "U2", Role::Unit, None).await;
        let a = create_test_user(app.db(), "a@example.com", None, Role::Sdm).await;
        let b = create_test_user(app.db(), "b@example.com", None, Role::Sdm).await;
        let c = create_test_user(app.db(), "c@example.com", None, Role::Sdm).await;
        let coordinator = OrgChartCoordinator::new(app.app_data.clone());
        coordinator.assign_user(&a.id, assign_to(Some(unit.id))).await.unwrap();
        coordinator.assign_user(&b.id, assign_to(Some(unit.id))).await.unwrap();
        coordinator.assign_user(&c.id, assign_to(Some(other.id))).await.unwrap();

        coordinator
            .update_unit(unit.id, unit_request("U1", Role::Wadek, None))
            .await
            .unwrap();

        assert_eq!(reload(&app, &a.id).await.role, Role::Wadek);
        assert_eq!(reload(&app, &b.id).await.role, Role::Wadek);
        assert_eq!(reload(&app, &c.id).await.role, Role::Unit);
    }

    #[tokio::test]
    async fn test_self_parent_and_descendant_parent_are_rejected() {
        let app = setup_test_app().await;
        let root = create_test_unit(app.db(), "ROOT", Role::Dekan, None).await;
        let child = create_test_unit(app.db(), "CHILD", Role::Unit, Some(root.id)).await;
        let coordinator = OrgChartCoordinator::new(app.app_data.clone());

        let errors = field_errors(
            coordinator
                .update_unit(root.id, unit_request("ROOT", Role::Dekan, Some(root.id)))
                .await,
        );
        assert!(errors.contains("parent_unit_id"));

        let errors = field_errors(
            coordinator
                .update_unit(root.id, unit_request("ROOT", Role::Dekan, Some(child.id)))
                .await,
        );
        assert!(errors.contains("parent_unit_id"));

        assert_eq!(coordinator.find_unit(root.id).await.unwrap().parent_unit_id, None);
    }

    #[tokio::test]
    async fn test_unit_code_must_be_unique_except_for_itself() {
        let app = setup_test_app().await;
        let first = create_test_unit(app.db(), "U1", Role::Unit, None).await;
        create_test_unit(app.db(), "U2", Role::Unit, None).await;
        let coordinator = OrgChartCoordinator::new(app.app_data.clone());

        assert!(coordinator.update_unit(first.id, unit_request("U1", Role::Unit, None)).await.is_ok());
        let errors = field_errors(coordinator.create_unit(unit_request("U2", Role::Unit, None)).await);
        assert!(errors.contains("code"));
        let errors = field_errors(coordinator.create_unit(unit_request("U3", Role::Unit, Some(404))).await);
        assert!(errors.contains("parent_unit_id"));
    }

    #[tokio::test]
    async fn test_delete_unit_cascade_and_children_guard() {
        let app = setup_test_app().await;
        let parent = create_test_unit(app.db(), "P", Role::Dekan, None).await;
        let child = create_test_unit(app.db(), "C", Role::Unit, Some(parent.id)).await;
        let a = create_test_user(app.db(), "a@example.com", None, Role::Sdm).await;
        let b = create_test_user(app.db(), "b@example.com", None, Role::Sdm).await;
        let coordinator = OrgChartCoordinator::new(app.app_data.clone());
        coordinator.assign_user(&a.id, assign_to(Some(child.id))).await.unwrap();
        coordinator.assign_user(&b.id, assign_to(Some(child.id))).await.unwrap();

        assert!(matches!(
            coordinator.delete_unit(parent.id).await,
            Err(InternalError::OrgChart(OrgChartError::HasChildren { child_count: 1, .. }))
        ));
        assert!(coordinator.find_unit(parent.id).await.is_ok());

        coordinator.delete_unit(child.id).await.unwrap();
        for id in [&a.id, &b.id] {
            let user = reload(&app, id).await;
            assert_eq!(user.unit_id, None);
            assert_eq!(user.role, Role::Sdm);
            assert_eq!(user.assigned_at, None);
        }
        assert!(matches!(
            coordinator.find_unit(child.id).await,
            Err(InternalError::OrgChart(OrgChartError::UnitNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_update_user_keeps_hash_on_empty_password() {
        let app = setup_test_app().await;
        let user = create_test_user(app.db(), "ayu@example.com", Some("ayu"), Role::Sdm).await;
        create_test_user(app.db(), "budi@example.com", Some("budi"), Role::Sdm).await;
        let coordinator = OrgChartCoordinator::new(app.app_data.clone());

        let mut edit = update_user_request(&user);
        edit.password = Some(String::new());
        edit.phone = Some("0812".to_string());
        let updated = coordinator.update_user(&user.id, edit).await.unwrap();
        assert_eq!(updated.password_hash, user.password_hash);
        assert_eq!(updated.phone.as_deref(), Some("0812"));

        let mut edit = update_user_request(&user);
        edit.username = Some("budi".to_string());
        edit.password = Some("short".to_string());
        edit.password_confirmation = Some("other".to_string());
        let errors = field_errors(coordinator.update_user(&user.id, edit).await);
        assert!(errors.contains("username"));
        assert!(errors.contains("password"));
    }

    #[tokio::test]
    async fn test_create_user_defaults_and_uniqueness() {
        let app = setup_test_app().await;
        create_test_user(app.db(), "taken@example.com", None, Role::Sdm).await;
        let coordinator = OrgChartCoordinator::new(app.app_data.clone());

        let request = |email: &str| CreateUserRequest {
            name: "Citra".to_string(),
            username: Some("  ".to_string()),
            email: email.to_string(),
            phone: None,
            password: "Password1!".to_string(),
            password_confirmation: "Password1!".to_string(),
            employee_id: Some("EMP-1".to_string()),
        };

        let created = coordinator.create_user(request("citra@example.com")).await.unwrap();
        assert_eq!(created.role, Role::Sdm);
        assert_eq!(created.unit_id, None);
        assert_eq!(created.username, None);
        assert!(created.is_active);
        assert!(app.app_data.crypto_provider.verify_password("Password1!", &created.password_hash).unwrap());

        let errors = field_errors(coordinator.create_user(request("taken@example.com")).await);
        assert!(errors.contains("email"));
        assert!(errors.contains("employee_id"));
    }

    #[tokio::test]
    async fn test_delete_user_removes_row_and_avatar() {
        let app = setup_test_app().await;
        let user = create_test_user(app.db(), "ayu@example.com", None, Role::Sdm).await;
        app.app_data.file_storage.put("avatars/ayu.png", b"png").await.unwrap();
        app.app_data
            .user_store
            .set_avatar(app.db(), &user.id, Some("avatars/ayu.png".to_string()))
            .await
            .unwrap();
        let coordinator = OrgChartCoordinator::new(app.app_data.clone());

        coordinator.delete_user(&user.id).await.unwrap();

        assert!(app.app_data.user_store.find_by_id(app.db(), &user.id).await.unwrap().is_none());
        assert!(!app.files.contains("avatars/ayu.png"));
    }

    #[tokio::test]
    async fn test_index_builds_forest_and_unassigned_pool() {
        let app = setup_test_app().await;
        let root = create_test_unit(app.db(), "ROOT", Role::Dekan, None).await;
        let child = create_test_unit(app.db(), "CHILD", Role::Unit, Some(root.id)).await;
        let member = create_test_user(app.db(), "member@example.com", None, Role::Sdm).await;
        create_test_user(app.db(), "free@example.com", None, Role::Sdm).await;
        create_test_user(app.db(), "admin@example.com", None, Role::Admin).await;
        let coordinator = OrgChartCoordinator::new(app.app_data.clone());
        coordinator.assign_user(&member.id, assign_to(Some(child.id))).await.unwrap();

        let chart = coordinator.index().await.unwrap();

        assert_eq!(chart.units.len(), 1);
        assert_eq!(chart.units[0].id, root.id);
        assert_eq!(chart.units[0].children[0].id, child.id);
        assert_eq!(chart.units[0].children[0].users[0].id, member.id);
        let unassigned: Vec<&str> = chart.unassigned_users.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(unassigned, vec!["free@example.com"]);
    }
}
