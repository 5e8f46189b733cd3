use poem_openapi::{ApiResponse, payload::Json};
use std::fmt;

use super::{
    forbidden_body, internal_body, log_infrastructure, unauthenticated_body, validation_body,
};
use crate::errors::internal::{CredentialError, InternalError, SessionError};
use crate::types::dto::auth::{ExistingSessionInfo, SessionConflictResponse};
use crate::types::dto::common::{ErrorResponse, format_timestamp};

/// Authentication and profile error types
#[derive(ApiResponse, Debug)]
pub enum AuthError {
    /// Bad credentials or missing, invalid or revoked bearer token
    #[oai(status = 401)]
    Unauthorized(Json<ErrorResponse>),

    /// Account inactive or role not permitted
    #[oai(status = 403)]
    Forbidden(Json<ErrorResponse>),

    /// Another device holds the session; retry with `force_logout`
    #[oai(status = 409)]
    SessionConflict(Json<SessionConflictResponse>),

    /// Field-keyed validation failure
    #[oai(status = 422)]
    ValidationFailed(Json<ErrorResponse>),

    /// Rate limit exhausted
    #[oai(status = 429)]
    TooManyRequests(Json<ErrorResponse>),

    /// Internal server error
    #[oai(status = 500)]
    InternalError(Json<ErrorResponse>),
}

impl AuthError {
    pub fn invalid_credentials() -> Self {
        AuthError::Unauthorized(Json(ErrorResponse::new(
            "invalid_credentials",
            "The provided credentials are incorrect.",
        )))
    }

    pub fn unauthenticated() -> Self {
        AuthError::Unauthorized(Json(unauthenticated_body()))
    }

    pub fn account_inactive() -> Self {
        AuthError::Forbidden(Json(ErrorResponse::new(
            "account_inactive",
            "Your account is inactive. Please contact the administrator.",
        )))
    }

    pub fn forbidden() -> Self {
        AuthError::Forbidden(Json(forbidden_body()))
    }

    pub fn session_conflict(existing: ExistingSessionInfo) -> Self {
        AuthError::SessionConflict(Json(SessionConflictResponse {
            success: false,
            message: "This account is already logged in on another device.".to_string(),
            error: "session_conflict".to_string(),
            requires_force_logout: true,
            existing_session: existing,
        }))
    }

    pub fn rate_limited() -> Self {
        AuthError::TooManyRequests(Json(ErrorResponse::new(
            "rate_limited",
            "Too many attempts. Please try again later.",
        )))
    }

    fn internal_server_error() -> Self {
        AuthError::InternalError(Json(internal_body()))
    }

    /// Convert InternalError to AuthError
    ///
    /// This is the explicit conversion point from internal errors to API errors.
    /// Internal error details are logged but not exposed to clients.
    pub fn from_internal_error(err: InternalError) -> Self {
        match &err {
            InternalError::Credential(CredentialError::InvalidCredentials) => {
                Self::invalid_credentials()
            }
            InternalError::Credential(CredentialError::AccountInactive { user_id }) => {
                tracing::debug!("Inactive account {} rejected", user_id);
                Self::account_inactive()
            }
            InternalError::Credential(CredentialError::InsufficientRole { .. }) => {
                tracing::debug!("{}", err);
                Self::forbidden()
            }
            InternalError::Credential(
                CredentialError::MissingToken
                | CredentialError::InvalidToken { .. }
                | CredentialError::ExpiredToken(_)
                | CredentialError::SessionRevoked { .. }
                | CredentialError::UserNotFound(_),
            ) => {
                tracing::debug!("Bearer rejected: {}", err);
                Self::unauthenticated()
            }
            InternalError::Session(SessionError::Conflict { existing, .. }) => {
                Self::session_conflict(ExistingSessionInfo {
                    device_name: existing.device_name.clone(),
                    ip_address: existing.ip_address.clone(),
                    last_activity: format_timestamp(existing.last_activity),
                })
            }
            InternalError::Validation(errors) => {
                AuthError::ValidationFailed(Json(validation_body(errors)))
            }
            InternalError::RateLimit(_) => {
                tracing::warn!("{}", err);
                Self::rate_limited()
            }
            _ => {
                log_infrastructure("auth", &err);
                Self::internal_server_error()
            }
        }
    }

    /// Get the error message from the error variant
    pub fn message(&self) -> String {
        match self {
            AuthError::Unauthorized(json) => json.0.message.clone(),
            AuthError::Forbidden(json) => json.0.message.clone(),
            AuthError::SessionConflict(json) => json.0.message.clone(),
            AuthError::ValidationFailed(json) => json.0.message.clone(),
            AuthError::TooManyRequests(json) => json.0.message.clone(),
            AuthError::InternalError(json) => json.0.message.clone(),
        }
    }

    /// Get the HTTP status code from the error variant
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::Unauthorized(_) => 401,
            AuthError::Forbidden(_) => 403,
            AuthError::SessionConflict(_) => 409,
            AuthError::ValidationFailed(_) => 422,
            AuthError::TooManyRequests(_) => 429,
            AuthError::InternalError(_) => 500,
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
