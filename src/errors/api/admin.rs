use poem_openapi::{ApiResponse, payload::Json};
use std::fmt;

use super::{
    forbidden_body, internal_body, log_infrastructure, unauthenticated_body, validation_body,
};
use crate::errors::internal::{CredentialError, InternalError, OrgChartError};
use crate::types::dto::common::ErrorResponse;

/// Organizational chart error types
#[derive(ApiResponse, Debug)]
pub enum AdminError {
    /// Missing, invalid or revoked bearer token
    #[oai(status = 401)]
    Unauthorized(Json<ErrorResponse>),

    /// Admin role required
    #[oai(status = 403)]
    Forbidden(Json<ErrorResponse>),

    /// Unit or user not found
    #[oai(status = 404)]
    NotFound(Json<ErrorResponse>),

    /// Validation failure, unit with children, or protected admin account
    #[oai(status = 422)]
    UnprocessableEntity(Json<ErrorResponse>),

    /// Internal server error
    #[oai(status = 500)]
    InternalError(Json<ErrorResponse>),
}

impl AdminError {
    pub fn unauthenticated() -> Self {
        AdminError::Unauthorized(Json(unauthenticated_body()))
    }

    pub fn forbidden() -> Self {
        AdminError::Forbidden(Json(forbidden_body()))
    }

    pub fn unit_not_found() -> Self {
        AdminError::NotFound(Json(ErrorResponse::new("not_found", "Unit not found.")))
    }

    pub fn user_not_found() -> Self {
        AdminError::NotFound(Json(ErrorResponse::new("not_found", "User not found.")))
    }

    pub fn has_children() -> Self {
        AdminError::UnprocessableEntity(Json(ErrorResponse::new(
            "has_children",
            "Cannot delete a unit that still has child units.",
        )))
    }

    pub fn protected_admin(action: &str) -> Self {
        AdminError::UnprocessableEntity(Json(ErrorResponse::new(
            "forbidden",
            format!("Admin accounts cannot be {}.", action),
        )))
    }

    fn internal_server_error() -> Self {
        AdminError::InternalError(Json(internal_body()))
    }

    /// Convert InternalError to AdminError
    ///
    /// This is the explicit conversion point from internal errors to API errors.
    /// Internal error details are logged but not exposed to clients.
    pub fn from_internal_error(err: InternalError) -> Self {
        match &err {
            InternalError::Credential(CredentialError::InsufficientRole { .. })
            | InternalError::Credential(CredentialError::AccountInactive { .. }) => {
                tracing::debug!("Org chart access denied: {}", err);
                Self::forbidden()
            }
            InternalError::Credential(_) => {
                tracing::debug!("Bearer rejected: {}", err);
                Self::unauthenticated()
            }
            InternalError::OrgChart(OrgChartError::UnitNotFound(_)) => Self::unit_not_found(),
            InternalError::OrgChart(OrgChartError::UserNotFound(_)) => Self::user_not_found(),
            InternalError::OrgChart(OrgChartError::HasChildren { .. }) => Self::has_children(),
            InternalError::OrgChart(OrgChartError::ProtectedAdmin { action, .. }) => {
                Self::protected_admin(action)
            }
            InternalError::Validation(errors) => {
                AdminError::UnprocessableEntity(Json(validation_body(errors)))
            }
            _ => {
                log_infrastructure("org chart", &err);
                Self::internal_server_error()
            }
        }
    }

    /// Get the error message from the error variant
    pub fn message(&self) -> String {
        match self {
            AdminError::Unauthorized(json)
            | AdminError::Forbidden(json)
            | AdminError::NotFound(json)
            | AdminError::UnprocessableEntity(json)
            | AdminError::InternalError(json) => json.0.message.clone(),
        }
    }

    /// Get the HTTP status code from the error variant
    pub fn status_code(&self) -> u16 {
        match self {
            AdminError::Unauthorized(_) => 401,
            AdminError::Forbidden(_) => 403,
            AdminError::NotFound(_) => 404,
            AdminError::UnprocessableEntity(_) => 422,
            AdminError::InternalError(_) => 500,
        }
    }
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::api::FORBIDDEN_MESSAGE;
    use crate::errors::internal::StorageError;
    use crate::types::db::Role;

    #[test]
    fn test_role_failure_is_403() {
        let err = AdminError::from_internal_error(
            CredentialError::InsufficientRole {
                required: vec![Role::Admin],
                actual: Role::Unit,
            }
            .into(),
        );
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.message(), FORBIDDEN_MESSAGE);
    }

    #[test]
    fn test_missing_token_is_401() {
        let err = AdminError::from_internal_error(CredentialError::MissingToken.into());
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn test_business_rejections_are_422() {
        let has_children = AdminError::from_internal_error(
            OrgChartError::HasChildren {
                unit_id: 1,
                child_count: 2,
            }
            .into(),
        );
        assert_eq!(has_children.status_code(), 422);

        let protected = AdminError::from_internal_error(
            OrgChartError::ProtectedAdmin {
                user_id: "u1".to_string(),
                action: "deleted",
            }
            .into(),
        );
        assert_eq!(protected.status_code(), 422);
        assert_eq!(protected.message(), "Admin accounts cannot be deleted.");
    }

    #[test]
    fn test_not_found_is_404() {
        let err = AdminError::from_internal_error(OrgChartError::UnitNotFound(9).into());
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_storage_failure_is_generic_500() {
        let err = AdminError::from_internal_error(StorageError::InvalidPath("../x".to_string()).into());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), "An internal error occurred");
    }
}
