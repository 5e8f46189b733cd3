use poem_openapi::Object;

use crate::types::db::{Role, UnitType, unit, user};

use super::common::format_timestamp;

/// Minimal unit reference embedded in user payloads
#[derive(Object, Debug, Clone)]
pub struct UnitSummary {
    pub id: i32,
    pub code: String,
    pub name: String,
    #[oai(rename = "type")]
    pub unit_type: UnitType,
    pub role: Role,
}

impl From<&unit::Model> for UnitSummary {
    fn from(u: &unit::Model) -> Self {
        Self {
            id: u.id,
            code: u.code.clone(),
            name: u.name.clone(),
            unit_type: u.unit_type,
            role: u.role,
        }
    }
}

/// Public profile of a user
#[derive(Object, Debug, Clone)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub username: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub employee_id: Option<String>,
    pub unit_id: Option<i32>,
    pub assigned_at: Option<String>,
    pub is_active: bool,
    pub unit: Option<UnitSummary>,
}

impl UserProfile {
    /// Build the profile; `public_base` prefixes the stored avatar path
    pub fn from_model(model: &user::Model, unit: Option<&unit::Model>, public_base: &str) -> Self {
        Self {
            id: model.id.clone(),
            name: model.name.clone(),
            username: model.username.clone(),
            email: model.email.clone(),
            phone: model.phone.clone(),
            avatar: model.avatar.clone(),
            avatar_url: model.avatar.as_deref().map(|path| avatar_url(public_base, path)),
            role: model.role,
            employee_id: model.employee_id.clone(),
            unit_id: model.unit_id,
            assigned_at: model.assigned_at.map(format_timestamp),
            is_active: model.is_active,
            unit: unit.map(UnitSummary::from),
        }
    }
}

pub fn avatar_url(public_base: &str, path: &str) -> String {
    format!("{}/{}", public_base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Wrapped single-user response
#[derive(Object, Debug)]
pub struct UserResponse {
    pub success: bool,
    pub message: String,
    pub data: UserProfile,
}

impl UserResponse {
    pub fn ok(message: impl Into<String>, data: UserProfile) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}
