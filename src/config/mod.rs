mod bootstrap_settings;
mod config_spec;
mod database;
mod env_provider;
mod errors;
mod logging;
mod secret_manager;

pub use bootstrap_settings::{BootstrapSettings, RateLimitSettings, SmtpSettings};
pub use config_spec::ConfigSpec;
pub use database::{begin_transaction, commit_transaction, init_database, migrate_database};
#[cfg(test)]
pub use env_provider::MockEnvironment;
pub use env_provider::{EnvironmentProvider, SystemEnvironment};
pub use errors::ApplicationError;
pub use logging::{LoggingError, init_logging};
pub use secret_manager::{SecretError, SecretManager};
