use poem_openapi::{ApiResponse, Object, payload::Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::db::{Role, UnitType, unit, user};

use super::user::{UnitSummary, avatar_url};

/// Fields accepted when creating or updating a unit
#[derive(Object, Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UnitRequest {
    #[validate(length(min = 1, max = 100, message = "The code field is required and may not exceed 100 characters."))]
    pub code: String,

    #[validate(length(min = 1, max = 255, message = "The name field is required and may not exceed 255 characters."))]
    pub name: String,

    #[oai(rename = "type")]
    #[serde(rename = "type")]
    pub unit_type: UnitType,

    pub parent_unit_id: Option<i32>,

    pub role: Role,

    #[validate(length(max = 1000, message = "The description may not exceed 1000 characters."))]
    pub description: Option<String>,

    pub position_x: Option<i32>,

    pub position_y: Option<i32>,

    pub is_active: Option<bool>,
}

/// Member of a unit as shown on the chart
#[derive(Object, Debug, Clone)]
pub struct ChartUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    pub employee_id: Option<String>,
    pub role: Role,
    pub avatar_url: Option<String>,
}

impl ChartUser {
    pub fn from_model(model: &user::Model, public_base: &str) -> Self {
        Self {
            id: model.id.clone(),
            name: model.name.clone(),
            email: model.email.clone(),
            username: model.username.clone(),
            employee_id: model.employee_id.clone(),
            role: model.role,
            avatar_url: model.avatar.as_deref().map(|path| avatar_url(public_base, path)),
        }
    }
}

/// A unit with its nested children and members
#[derive(Object, Debug, Clone)]
pub struct UnitNode {
    pub id: i32,
    pub code: String,
    pub name: String,
    #[oai(rename = "type")]
    pub unit_type: UnitType,
    pub role: Role,
    pub parent_unit_id: Option<i32>,
    pub description: Option<String>,
    pub position_x: Option<i32>,
    pub position_y: Option<i32>,
    pub is_active: bool,
    pub parent: Option<UnitSummary>,
    pub users: Vec<ChartUser>,
    pub children: Vec<UnitNode>,
}

impl UnitNode {
    /// Leaf node without members or children attached yet
    pub fn bare(model: &unit::Model) -> Self {
        Self {
            id: model.id,
            code: model.code.clone(),
            name: model.name.clone(),
            unit_type: model.unit_type,
            role: model.role,
            parent_unit_id: model.parent_unit_id,
            description: model.description.clone(),
            position_x: model.position_x,
            position_y: model.position_y,
            is_active: model.is_active,
            parent: None,
            users: Vec::new(),
            children: Vec::new(),
        }
    }
}

#[derive(Object, Debug)]
pub struct UnitResponse {
    pub success: bool,
    pub message: String,
    pub data: UnitNode,
}

impl UnitResponse {
    pub fn ok(message: impl Into<String>, data: UnitNode) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

/// 201 wrapper for unit creation
#[derive(ApiResponse, Debug)]
pub enum UnitCreatedResponse {
    #[oai(status = 201)]
    Created(Json<UnitResponse>),
}

#[derive(Object, Debug)]
pub struct OrgChartData {
    /// Root units, each with its subtree
    pub units: Vec<UnitNode>,
    pub unassigned_users: Vec<ChartUser>,
}

#[derive(Object, Debug)]
pub struct OrgChartResponse {
    pub success: bool,
    pub message: String,
    pub data: OrgChartData,
}

#[derive(Object, Debug, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 255, message = "The name field is required and may not exceed 255 characters."))]
    pub name: String,

    #[validate(length(min = 1, max = 100, message = "The username may not exceed 100 characters."))]
    pub username: Option<String>,

    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,

    #[validate(length(max = 20, message = "The phone may not exceed 20 characters."))]
    pub phone: Option<String>,

    #[validate(
        length(min = 8, message = "The password must be at least 8 characters."),
        must_match(other = "password_confirmation", message = "The password confirmation does not match.")
    )]
    pub password: String,

    pub password_confirmation: String,

    #[validate(length(min = 1, max = 50, message = "The employee id may not exceed 50 characters."))]
    pub employee_id: Option<String>,
}

/// Admin edit of a user; an empty password leaves the stored hash untouched
#[derive(Object, Debug, Serialize, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 255, message = "The name field is required and may not exceed 255 characters."))]
    pub name: String,

    #[validate(length(min = 1, max = 100, message = "The username may not exceed 100 characters."))]
    pub username: Option<String>,

    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,

    #[validate(length(max = 20, message = "The phone may not exceed 20 characters."))]
    pub phone: Option<String>,

    pub password: Option<String>,

    pub password_confirmation: Option<String>,

    #[validate(length(min = 1, max = 50, message = "The employee id may not exceed 50 characters."))]
    pub employee_id: Option<String>,

    pub is_active: Option<bool>,
}

/// 201 wrapper for user creation
#[derive(ApiResponse, Debug)]
pub enum UserCreatedResponse {
    #[oai(status = 201)]
    Created(Json<super::user::UserResponse>),
}

#[derive(Object, Debug, Serialize, Deserialize)]
pub struct AssignUserRequest {
    /// Target unit, or null to unassign
    pub unit_id: Option<i32>,
    pub position_x: Option<i32>,
    pub position_y: Option<i32>,
}
