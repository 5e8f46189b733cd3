use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::{BootstrapSettings, SecretManager};
use crate::errors::InternalError;
use crate::providers::{
    CryptoProvider, EmailSender, FileStorage, LocalFileStorage, LogEmailSender, RateLimitProvider,
    SmtpEmailSender, TokenProvider,
};
use crate::stores::{PasswordResetStore, SessionStore, UnitStore, UserStore};

/// Centralized application data following the main-owned stores pattern
///
/// All dependencies are created once in main.rs and shared across coordinators.
///
/// ```text
/// main.rs
///   ↓
/// AppData::init()
///   ↓ creates once
///   ├─ db (DatabaseConnection)
///   ├─ settings, secret_manager
///   ├─ providers (token, crypto, rate limiter)
///   ├─ collaborators (email sender, file storage)
///   └─ stores (user, unit, session, password reset)
///   ↓ wrapped in Arc<AppData>
///   ├─ AuthCoordinator::new(app_data)
///   ├─ PasswordResetCoordinator::new(app_data)
///   ├─ ProfileCoordinator::new(app_data)
///   └─ OrgChartCoordinator::new(app_data)
/// ```
pub struct AppData {
    pub db: DatabaseConnection,
    pub settings: Arc<BootstrapSettings>,
    pub secret_manager: Arc<SecretManager>,
    pub token_provider: Arc<TokenProvider>,
    pub crypto_provider: Arc<CryptoProvider>,
    pub rate_limiter: Arc<RateLimitProvider>,
    pub email_sender: Arc<dyn EmailSender>,
    pub file_storage: Arc<dyn FileStorage>,
    pub user_store: Arc<UserStore>,
    pub unit_store: Arc<UnitStore>,
    pub session_store: Arc<SessionStore>,
    pub password_reset_store: Arc<PasswordResetStore>,
}

impl AppData {
    /// Build production collaborators from settings
    ///
    /// Mail goes through SMTP when `SMTP_HOST` is set, otherwise it is only
    /// logged. Avatars are stored under `STORAGE_DIR`.
    pub fn init(
        db: DatabaseConnection,
        settings: BootstrapSettings,
        secret_manager: SecretManager,
    ) -> Result<Self, InternalError> {
        tracing::info!("Initializing AppData...");

        let email_sender: Arc<dyn EmailSender> = match settings.smtp() {
            Some(smtp) => {
                tracing::info!("Using SMTP relay {}:{}", smtp.host, smtp.port);
                Arc::new(SmtpEmailSender::new(smtp, settings.mail_from())?)
            }
            None => {
                tracing::warn!("SMTP_HOST not set; outgoing mail will only be logged");
                Arc::new(LogEmailSender)
            }
        };
        let file_storage: Arc<dyn FileStorage> =
            Arc::new(LocalFileStorage::new(settings.storage_dir().clone()));

        let app_data = Self::with_collaborators(
            db,
            settings,
            Arc::new(secret_manager),
            email_sender,
            file_storage,
        );

        tracing::info!("AppData initialized");
        Ok(app_data)
    }

    /// Assemble with explicit mail and storage collaborators
    pub fn with_collaborators(
        db: DatabaseConnection,
        settings: BootstrapSettings,
        secret_manager: Arc<SecretManager>,
        email_sender: Arc<dyn EmailSender>,
        file_storage: Arc<dyn FileStorage>,
    ) -> Self {
        let token_provider = Arc::new(TokenProvider::new(
            secret_manager.clone(),
            settings.jwt_ttl_minutes(),
        ));
        let crypto_provider = Arc::new(CryptoProvider::new(secret_manager.clone()));
        let rate_limiter = Arc::new(RateLimitProvider::new(&settings.rate_limits()));

        Self {
            db,
            settings: Arc::new(settings),
            secret_manager,
            token_provider,
            crypto_provider,
            rate_limiter,
            email_sender,
            file_storage,
            user_store: Arc::new(UserStore::new()),
            unit_store: Arc::new(UnitStore::new()),
            session_store: Arc::new(SessionStore::new()),
            password_reset_store: Arc::new(PasswordResetStore::new()),
        }
    }
}
