// API-facing error types
pub mod admin;
pub mod auth;

// Re-exports for convenience
pub use admin::AdminError;
pub use auth::AuthError;

use crate::errors::internal::InternalError;
use crate::types::dto::common::ErrorResponse;
use crate::types::internal::FieldErrors;

pub(crate) const UNAUTHENTICATED_MESSAGE: &str = "Unauthorized. Please login first.";
pub(crate) const FORBIDDEN_MESSAGE: &str =
    "Forbidden. You do not have permission to access this resource.";
pub(crate) const VALIDATION_MESSAGE: &str = "The given data was invalid.";
pub(crate) const INTERNAL_MESSAGE: &str = "An internal error occurred";

fn unauthenticated_body() -> ErrorResponse {
    ErrorResponse::new("unauthenticated", UNAUTHENTICATED_MESSAGE)
}

fn forbidden_body() -> ErrorResponse {
    ErrorResponse::new("forbidden", FORBIDDEN_MESSAGE)
}

fn validation_body(errors: &FieldErrors) -> ErrorResponse {
    ErrorResponse::new("validation_error", VALIDATION_MESSAGE).with_errors(errors.clone().into_map())
}

fn internal_body() -> ErrorResponse {
    ErrorResponse::new("internal_error", INTERNAL_MESSAGE)
}

/// Log an error that will surface as a generic 500
///
/// Detail stays in the log; the client only sees `INTERNAL_MESSAGE`.
fn log_infrastructure(context: &str, err: &InternalError) {
    match err {
        InternalError::Database(_) => tracing::error!("Database error in {} operation: {}", context, err),
        InternalError::Crypto(_) => tracing::error!("Crypto error in {} operation: {}", context, err),
        InternalError::Parse { value_type, .. } => {
            tracing::error!("Parse error for {} in {} operation: {}", value_type, context, err)
        }
        InternalError::Email(_) => tracing::error!("Mail delivery failed in {} operation: {}", context, err),
        InternalError::Storage(_) => tracing::error!("File storage failed in {} operation: {}", context, err),
        _ => tracing::error!("Unexpected error in {} operation: {}", context, err),
    }
}
