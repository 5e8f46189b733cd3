// Providers layer - Work performers and business logic
//
// Providers contain business logic and the external collaborators that
// coordinators orchestrate: hashing, tokens, mail, file storage, throttling,
// avatar checks and org tree assembly.

pub mod avatar_provider;
pub mod crypto_provider;
pub mod email_provider;
pub mod file_storage_provider;
pub mod org_tree_provider;
pub mod rate_limit_provider;
pub mod token_provider;
pub mod validation_provider;

pub use crypto_provider::CryptoProvider;
pub use email_provider::{EmailSender, LogEmailSender, SmtpEmailSender};
pub use file_storage_provider::{FileStorage, LocalFileStorage};
pub use rate_limit_provider::{LimitedRoute, RateLimitProvider};
pub use token_provider::TokenProvider;
