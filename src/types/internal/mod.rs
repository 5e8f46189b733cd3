pub mod auth;
pub mod context;
pub mod validation;

pub use validation::FieldErrors;
