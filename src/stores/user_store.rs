use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};

use crate::errors::InternalError;
use crate::types::db::{Role, user};
use crate::types::internal::FieldErrors;

/// Fields for a new account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub name: String,
    pub username: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub employee_id: Option<String>,
}

/// Partial update; `None` leaves the column untouched
///
/// Nullable columns use a nested option so they can be cleared.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub username: Option<Option<String>>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub employee_id: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub password_hash: Option<String>,
}

/// Values checked against the unique indexes on users
#[derive(Debug, Clone, Copy)]
pub struct UniqueFields<'a> {
    pub email: Option<&'a str>,
    pub username: Option<&'a str>,
    pub employee_id: Option<&'a str>,
}

pub struct UserStore {}

impl UserStore {
    pub fn new() -> Self {
        Self {}
    }

    pub async fn find_by_id(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
    ) -> Result<Option<user::Model>, InternalError> {
        user::Entity::find_by_id(user_id.to_owned())
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_user_by_id", e))
    }

    pub async fn find_by_email(
        &self,
        conn: &impl ConnectionTrait,
        email: &str,
    ) -> Result<Option<user::Model>, InternalError> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_user_by_email", e))
    }

    /// Match the login identifier against email first, then username
    pub async fn find_by_login(
        &self,
        conn: &impl ConnectionTrait,
        identifier: &str,
    ) -> Result<Option<user::Model>, InternalError> {
        if let Some(found) = self.find_by_email(conn, identifier).await? {
            return Ok(Some(found));
        }
        user::Entity::find()
            .filter(user::Column::Username.eq(identifier))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_user_by_username", e))
    }

    async fn is_taken(
        &self,
        conn: &impl ConnectionTrait,
        column: user::Column,
        value: &str,
        exclude_id: Option<&str>,
    ) -> Result<bool, InternalError> {
        let mut query = user::Entity::find().filter(column.eq(value));
        if let Some(exclude_id) = exclude_id {
            query = query.filter(user::Column::Id.ne(exclude_id));
        }
        let count = query
            .count(conn)
            .await
            .map_err(|e| InternalError::database("check_user_uniqueness", e))?;
        Ok(count > 0)
    }

    /// Record a field error for every value already used by another account
    pub async fn collect_uniqueness_errors(
        &self,
        conn: &impl ConnectionTrait,
        fields: UniqueFields<'_>,
        exclude_id: Option<&str>,
        errors: &mut FieldErrors,
    ) -> Result<(), InternalError> {
        let checks = [
            ("email", user::Column::Email, fields.email),
            ("username", user::Column::Username, fields.username),
            ("employee_id", user::Column::EmployeeId, fields.employee_id),
        ];
        for (field, column, value) in checks {
            let Some(value) = value else { continue };
            if self.is_taken(conn, column, value, exclude_id).await? {
                errors.add(field, format!("The {} has already been taken.", field.replace('_', " ")));
            }
        }
        Ok(())
    }

    pub async fn insert(
        &self,
        conn: &impl ConnectionTrait,
        new_user: NewUser,
    ) -> Result<user::Model, InternalError> {
        let now = Utc::now().timestamp();
        user::ActiveModel {
            id: Set(new_user.id),
            name: Set(new_user.name),
            username: Set(new_user.username),
            email: Set(new_user.email),
            phone: Set(new_user.phone),
            avatar: Set(None),
            password_hash: Set(new_user.password_hash),
            role: Set(new_user.role),
            employee_id: Set(new_user.employee_id),
            unit_id: Set(None),
            assigned_at: Set(None),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await
        .map_err(|e| InternalError::database("insert_user", e))
    }

    pub async fn update(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        changes: UserChanges,
    ) -> Result<user::Model, InternalError> {
        let set_or_skip = |value: Option<String>| value.map_or(NotSet, Set);
        let set_or_skip_nullable = |value: Option<Option<String>>| value.map_or(NotSet, Set);

        user::ActiveModel {
            id: Set(user_id.to_owned()),
            name: set_or_skip(changes.name),
            username: set_or_skip_nullable(changes.username),
            email: set_or_skip(changes.email),
            phone: set_or_skip_nullable(changes.phone),
            employee_id: set_or_skip_nullable(changes.employee_id),
            is_active: changes.is_active.map_or(NotSet, Set),
            password_hash: set_or_skip(changes.password_hash),
            updated_at: Set(Utc::now().timestamp()),
            ..Default::default()
        }
        .update(conn)
        .await
        .map_err(|e| InternalError::database("update_user", e))
    }

    pub async fn set_avatar(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        avatar: Option<String>,
    ) -> Result<user::Model, InternalError> {
        user::ActiveModel {
            id: Set(user_id.to_owned()),
            avatar: Set(avatar),
            updated_at: Set(Utc::now().timestamp()),
            ..Default::default()
        }
        .update(conn)
        .await
        .map_err(|e| InternalError::database("set_user_avatar", e))
    }

    /// Place a user in a unit, taking the unit's role, or unassign with `None`
    pub async fn assign(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        target: Option<(i32, Role)>,
    ) -> Result<user::Model, InternalError> {
        let now = Utc::now().timestamp();
        let (unit_id, role, assigned_at) = match target {
            Some((unit_id, role)) => (Some(unit_id), role, Some(now)),
            None => (None, Role::UNASSIGNED, None),
        };

        user::ActiveModel {
            id: Set(user_id.to_owned()),
            unit_id: Set(unit_id),
            role: Set(role),
            assigned_at: Set(assigned_at),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(conn)
        .await
        .map_err(|e| InternalError::database("assign_user", e))
    }

    /// Bulk role update for everyone in a unit; returns affected rows
    pub async fn set_role_for_unit_members(
        &self,
        conn: &impl ConnectionTrait,
        unit_id: i32,
        role: Role,
    ) -> Result<u64, InternalError> {
        let result = user::Entity::update_many()
            .set(user::ActiveModel {
                role: Set(role),
                updated_at: Set(Utc::now().timestamp()),
                ..Default::default()
            })
            .filter(user::Column::UnitId.eq(unit_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("set_role_for_unit_members", e))?;
        Ok(result.rows_affected)
    }

    /// Unassign every member of a unit; returns affected rows
    pub async fn detach_unit_members(
        &self,
        conn: &impl ConnectionTrait,
        unit_id: i32,
    ) -> Result<u64, InternalError> {
        let result = user::Entity::update_many()
            .set(user::ActiveModel {
                unit_id: Set(None),
                assigned_at: Set(None),
                role: Set(Role::UNASSIGNED),
                updated_at: Set(Utc::now().timestamp()),
                ..Default::default()
            })
            .filter(user::Column::UnitId.eq(unit_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("detach_unit_members", e))?;
        Ok(result.rows_affected)
    }

    pub async fn delete(&self, conn: &impl ConnectionTrait, user_id: &str) -> Result<u64, InternalError> {
        let result = user::Entity::delete_by_id(user_id.to_owned())
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("delete_user", e))?;
        Ok(result.rows_affected)
    }

    /// Users with a unit, ordered by name
    pub async fn list_assigned(
        &self,
        conn: &impl ConnectionTrait,
    ) -> Result<Vec<user::Model>, InternalError> {
        user::Entity::find()
            .filter(user::Column::UnitId.is_not_null())
            .order_by_asc(user::Column::Name)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("list_assigned_users", e))
    }

    /// Active non-admin users without a unit
    pub async fn list_unassigned(
        &self,
        conn: &impl ConnectionTrait,
    ) -> Result<Vec<user::Model>, InternalError> {
        user::Entity::find()
            .filter(
                Condition::all()
                    .add(user::Column::UnitId.is_null())
                    .add(user::Column::IsActive.eq(true))
                    .add(user::Column::Role.ne(Role::Admin)),
            )
            .order_by_asc(user::Column::Name)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("list_unassigned_users", e))
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}
