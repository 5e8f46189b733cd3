// Stores layer - Data access
//
// Stores are stateless; every method takes the connection or transaction to
// run on so coordinators own the transaction boundary.
pub mod password_reset_store;
pub mod session_store;
pub mod unit_store;
pub mod user_store;

pub use password_reset_store::PasswordResetStore;
pub use session_store::{NewSession, SessionStore};
pub use unit_store::{UnitFields, UnitStore};
pub use user_store::{NewUser, UniqueFields, UserChanges, UserStore};
