use thiserror::Error;

/// Snapshot of the session that blocks a new login
#[derive(Debug, Clone, PartialEq)]
pub struct ExistingSession {
    pub device_name: String,
    pub ip_address: Option<String>,
    pub last_activity: i64,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("User {user_id} already has an active session on {}", .existing.device_name)]
    Conflict {
        user_id: String,
        existing: ExistingSession,
    },

    /// Lost the race on the per-user unique index
    #[error("Concurrent session insert for user {user_id}")]
    ConcurrentInsert { user_id: String },

    #[error("Session takeover for user {user_id} did not settle after {attempts} attempts")]
    TakeoverExhausted { user_id: String, attempts: u32 },
}
