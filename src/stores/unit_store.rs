use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

use crate::errors::InternalError;
use crate::types::db::{Role, UnitType, unit};

/// Complete set of editable unit columns
#[derive(Debug, Clone)]
pub struct UnitFields {
    pub code: String,
    pub name: String,
    pub unit_type: UnitType,
    pub parent_unit_id: Option<i32>,
    pub role: Role,
    pub description: Option<String>,
    pub position_x: Option<i32>,
    pub position_y: Option<i32>,
    pub is_active: bool,
}

pub struct UnitStore {}

impl UnitStore {
    pub fn new() -> Self {
        Self {}
    }

    pub async fn find_by_id(
        &self,
        conn: &impl ConnectionTrait,
        unit_id: i32,
    ) -> Result<Option<unit::Model>, InternalError> {
        unit::Entity::find_by_id(unit_id)
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_unit_by_id", e))
    }

    pub async fn find_by_code(
        &self,
        conn: &impl ConnectionTrait,
        code: &str,
    ) -> Result<Option<unit::Model>, InternalError> {
        unit::Entity::find()
            .filter(unit::Column::Code.eq(code))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_unit_by_code", e))
    }

    /// Active units for the chart, ordered by type then name
    pub async fn list_active_ordered(
        &self,
        conn: &impl ConnectionTrait,
    ) -> Result<Vec<unit::Model>, InternalError> {
        unit::Entity::find()
            .filter(unit::Column::IsActive.eq(true))
            .order_by_asc(unit::Column::UnitType)
            .order_by_asc(unit::Column::Name)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("list_active_units", e))
    }

    /// Every unit regardless of status, for hierarchy walks
    pub async fn list_all(&self, conn: &impl ConnectionTrait) -> Result<Vec<unit::Model>, InternalError> {
        unit::Entity::find()
            .order_by_asc(unit::Column::Id)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("list_units", e))
    }

    pub async fn is_code_taken(
        &self,
        conn: &impl ConnectionTrait,
        code: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, InternalError> {
        let mut query = unit::Entity::find().filter(unit::Column::Code.eq(code));
        if let Some(exclude_id) = exclude_id {
            query = query.filter(unit::Column::Id.ne(exclude_id));
        }
        let count = query
            .count(conn)
            .await
            .map_err(|e| InternalError::database("check_unit_code", e))?;
        Ok(count > 0)
    }

    pub async fn count_children(
        &self,
        conn: &impl ConnectionTrait,
        unit_id: i32,
    ) -> Result<u64, InternalError> {
        unit::Entity::find()
            .filter(unit::Column::ParentUnitId.eq(unit_id))
            .count(conn)
            .await
            .map_err(|e| InternalError::database("count_child_units", e))
    }

    pub async fn insert(
        &self,
        conn: &impl ConnectionTrait,
        fields: UnitFields,
    ) -> Result<unit::Model, InternalError> {
        let now = Utc::now().timestamp();
        unit::ActiveModel {
            code: Set(fields.code),
            name: Set(fields.name),
            unit_type: Set(fields.unit_type),
            parent_unit_id: Set(fields.parent_unit_id),
            role: Set(fields.role),
            description: Set(fields.description),
            position_x: Set(fields.position_x),
            position_y: Set(fields.position_y),
            is_active: Set(fields.is_active),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(|e| InternalError::database("insert_unit", e))
    }

    pub async fn update(
        &self,
        conn: &impl ConnectionTrait,
        unit_id: i32,
        fields: UnitFields,
    ) -> Result<unit::Model, InternalError> {
        unit::ActiveModel {
            id: Set(unit_id),
            code: Set(fields.code),
            name: Set(fields.name),
            unit_type: Set(fields.unit_type),
            parent_unit_id: Set(fields.parent_unit_id),
            role: Set(fields.role),
            description: Set(fields.description),
            position_x: Set(fields.position_x),
            position_y: Set(fields.position_y),
            is_active: Set(fields.is_active),
            updated_at: Set(Utc::now().timestamp()),
            ..Default::default()
        }
        .update(conn)
        .await
        .map_err(|e| InternalError::database("update_unit", e))
    }

    /// Persist chart coordinates only
    pub async fn set_position(
        &self,
        conn: &impl ConnectionTrait,
        unit_id: i32,
        position_x: Option<i32>,
        position_y: Option<i32>,
    ) -> Result<unit::Model, InternalError> {
        unit::ActiveModel {
            id: Set(unit_id),
            position_x: Set(position_x),
            position_y: Set(position_y),
            updated_at: Set(Utc::now().timestamp()),
            ..Default::default()
        }
        .update(conn)
        .await
        .map_err(|e| InternalError::database("set_unit_position", e))
    }

    pub async fn delete(&self, conn: &impl ConnectionTrait, unit_id: i32) -> Result<u64, InternalError> {
        let result = unit::Entity::delete_by_id(unit_id)
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("delete_unit", e))?;
        Ok(result.rows_affected)
    }
}

impl Default for UnitStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::{create_test_unit, setup_test_db};

    #[tokio::test]
    async fn test_code_uniqueness_excludes_self() {
        let db = setup_test_db().await;
        let store = UnitStore::new();
        let unit = create_test_unit(&db, "BAK", Role::Unit, None).await;

        assert!(store.is_code_taken(&db, "BAK", None).await.unwrap());
        assert!(!store.is_code_taken(&db, "BAK", Some(unit.id)).await.unwrap());
        assert!(!store.is_code_taken(&db, "OTHER", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_count_children() {
        let db = setup_test_db().await;
        let store = UnitStore::new();
        let root = create_test_unit(&db, "ROOT", Role::Dekan, None).await;
        create_test_unit(&db, "A", Role::Unit, Some(root.id)).await;
        create_test_unit(&db, "B", Role::Unit, Some(root.id)).await;

        assert_eq!(store.count_children(&db, root.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_active_units_are_ordered_by_type_then_name() {
        let db = setup_test_db().await;
        let store = UnitStore::new();
        let fields = |code: &str, name: &str, unit_type: UnitType, is_active: bool| UnitFields {
            code: code.to_string(),
            name: name.to_string(),
            unit_type,
            parent_unit_id: None,
            role: Role::Unit,
            description: None,
            position_x: None,
            position_y: None,
            is_active,
        };
        store.insert(&db, fields("Z", "Zeta", UnitType::Unit, true)).await.unwrap();
        store.insert(&db, fields("A", "Alpha", UnitType::Unit, true)).await.unwrap();
        store.insert(&db, fields("S", "Staff", UnitType::Sdm, true)).await.unwrap();
        store.insert(&db, fields("X", "Hidden", UnitType::Unit, false)).await.unwrap();

        let codes: Vec<String> = store
            .list_active_ordered(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.code)
            .collect();
        assert_eq!(codes, vec!["S", "A", "Z"]);
    }
}
