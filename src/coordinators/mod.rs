// Coordinators layer - Workflow orchestration
//
// Coordinators compose stores and providers for specific API endpoints and
// own the transaction boundaries. They decide the sequence of operations;
// rules that need no database live in providers.

pub mod auth_coordinator;
pub mod org_chart_coordinator;
pub mod password_reset_coordinator;
pub mod profile_coordinator;

pub use auth_coordinator::{AuthCoordinator, LoginAttempt, LoginOutcome, SessionStatus};
pub use org_chart_coordinator::OrgChartCoordinator;
pub use password_reset_coordinator::PasswordResetCoordinator;
pub use profile_coordinator::ProfileCoordinator;
