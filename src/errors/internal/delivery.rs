use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage {operation} failed for {path}: {source}")]
    Io {
        operation: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage path rejected: {0}")]
    InvalidPath(String),
}

#[derive(Error, Debug)]
pub enum EmailError {
    #[error("Invalid mail address {address}: {reason}")]
    Address { address: String, reason: String },

    #[error("Unknown email template: {0}")]
    UnknownTemplate(String),

    #[error("Building message failed: {0}")]
    Build(String),

    #[error("Mail transport failed: {0}")]
    Transport(String),
}

#[derive(Error, Debug)]
pub enum RateLimitError {
    #[error("Rate limit exceeded on {route} for {client}")]
    Exceeded { route: &'static str, client: String },
}
