// Database entities - SeaORM models
pub mod active_session;
pub mod password_reset_otp;
pub mod role;
pub mod unit;
pub mod user;

pub use role::{Role, UnitType};
