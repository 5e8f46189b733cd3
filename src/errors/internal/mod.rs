use thiserror::Error;

pub mod credential;
pub mod crypto;
pub mod database;
pub mod delivery;
pub mod org_chart;
pub mod session;

pub use credential::CredentialError;
pub use crypto::CryptoError;
pub use database::DatabaseError;
pub use delivery::{EmailError, RateLimitError, StorageError};
pub use org_chart::OrgChartError;
pub use session::{ExistingSession, SessionError};

use crate::types::internal::validation::FieldErrors;

/// Internal error type for store, provider and coordinator operations
///
/// Infrastructure errors (database, crypto, parse) are shared; domain errors
/// are grouped per concern. Not exposed via API - endpoints convert to
/// AuthError or AdminError.
#[derive(Error, Debug)]
pub enum InternalError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Parse error: failed to parse {value_type}: {message}")]
    Parse {
        value_type: String,
        message: String,
    },

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    OrgChart(#[from] OrgChartError),

    #[error("Validation failed: {0}")]
    Validation(#[from] FieldErrors),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Email(#[from] EmailError),

    #[error(transparent)]
    RateLimit(#[from] RateLimitError),
}

impl InternalError {
    pub fn database(operation: &'static str, source: sea_orm::DbErr) -> InternalError {
        InternalError::Database(DatabaseError::Operation { operation, source })
    }

    pub fn parse(value_type: impl Into<String>, message: impl Into<String>) -> InternalError {
        InternalError::Parse {
            value_type: value_type.into(),
            message: message.into(),
        }
    }

    pub fn validation(field: &str, message: impl Into<String>) -> InternalError {
        InternalError::Validation(FieldErrors::single(field, message))
    }
}
