use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrgChartError {
    #[error("Unit not found: {0}")]
    UnitNotFound(i32),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Unit {unit_id} still has {child_count} child unit(s)")]
    HasChildren { unit_id: i32, child_count: u64 },

    /// Admin accounts are not reachable through org chart mutations
    #[error("User {user_id} is an admin and cannot be {action}")]
    ProtectedAdmin {
        user_id: String,
        action: &'static str,
    },
}
