// Test utilities shared across unit tests
// Only compiled when running tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};

use crate::app_data::AppData;
use crate::config::{BootstrapSettings, MockEnvironment, SecretManager};
use crate::errors::InternalError;
use crate::errors::internal::{EmailError, StorageError};
use crate::providers::email_provider::render_template;
use crate::providers::{CryptoProvider, EmailSender, FileStorage};
use crate::stores::{NewUser, UnitFields, UnitStore, UserStore};
use crate::types::db::{Role, UnitType, unit, user};

pub const TEST_JWT_SECRET: &str = "test-secret-key-minimum-32-characters-long";
pub const TEST_PASSWORD_PEPPER: &str = "test-pepper-for-unit-tests";
pub const TEST_OTP_SECRET: &str = "test-otp-secret-minimum-32-characters-long";
pub const TEST_PASSWORD: &str = "Password1!";

/// Creates an in-memory database with all migrations applied
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

pub fn test_secret_manager() -> Arc<SecretManager> {
    let env = MockEnvironment::empty().with_vars(&[
        ("JWT_SECRET", TEST_JWT_SECRET),
        ("PASSWORD_PEPPER", TEST_PASSWORD_PEPPER),
        ("OTP_SECRET", TEST_OTP_SECRET),
    ]);
    Arc::new(SecretManager::from_env_provider(Arc::new(env)).expect("Failed to load test secrets"))
}

pub fn test_settings() -> BootstrapSettings {
    let env = MockEnvironment::empty().with_vars(&[
        ("DATABASE_URL", "sqlite::memory:"),
        ("STORAGE_PUBLIC_URL", "/storage"),
        ("JWT_TTL_MINUTES", "60"),
        ("RATE_LIMIT_LOGIN", "1000"),
        ("RATE_LIMIT_CHECK_SESSION", "1000"),
        ("RATE_LIMIT_RESET_REQUEST", "1000"),
        ("RATE_LIMIT_RESET_VERIFY", "1000"),
        ("RATE_LIMIT_RESET", "1000"),
    ]);
    BootstrapSettings::from_env_provider(Arc::new(env)).expect("Failed to load test settings")
}

/// Everything a coordinator test needs, with observable collaborators
pub struct TestApp {
    pub app_data: Arc<AppData>,
    pub emails: Arc<RecordingEmailSender>,
    pub files: Arc<InMemoryFileStorage>,
}

impl TestApp {
    pub fn db(&self) -> &DatabaseConnection {
        &self.app_data.db
    }
}

pub async fn setup_test_app() -> TestApp {
    let db = setup_test_db().await;
    let emails = Arc::new(RecordingEmailSender::default());
    let files = Arc::new(InMemoryFileStorage::default());
    let app_data = AppData::with_collaborators(
        db,
        test_settings(),
        test_secret_manager(),
        emails.clone(),
        files.clone(),
    );
    TestApp {
        app_data: Arc::new(app_data),
        emails,
        files,
    }
}

/// Insert a user whose password hash never verifies
pub async fn create_test_user(
    db: &DatabaseConnection,
    email: &str,
    username: Option<&str>,
    role: Role,
) -> user::Model {
    insert_user(db, email, username, role, "not-a-password-hash".to_string()).await
}

/// Insert a user that can log in with `TEST_PASSWORD`
pub async fn create_test_user_with_password(
    db: &DatabaseConnection,
    email: &str,
    role: Role,
) -> user::Model {
    let hash = CryptoProvider::new(test_secret_manager())
        .hash_password(TEST_PASSWORD)
        .expect("Failed to hash test password");
    insert_user(db, email, None, role, hash).await
}

async fn insert_user(
    db: &DatabaseConnection,
    email: &str,
    username: Option<&str>,
    role: Role,
    password_hash: String,
) -> user::Model {
    UserStore::new()
        .insert(
            db,
            NewUser {
                id: uuid::Uuid::new_v4().to_string(),
                name: email.split('@').next().unwrap_or(email).to_string(),
                username: username.map(str::to_string),
                email: email.to_string(),
                phone: None,
                password_hash,
                role,
                employee_id: None,
            },
        )
        .await
        .expect("Failed to create test user")
}

pub async fn create_test_unit(
    db: &DatabaseConnection,
    code: &str,
    role: Role,
    parent_unit_id: Option<i32>,
) -> unit::Model {
    UnitStore::new()
        .insert(
            db,
            UnitFields {
                code: code.to_string(),
                name: format!("Unit {}", code),
                unit_type: UnitType::Unit,
                parent_unit_id,
                role,
                description: None,
                position_x: None,
                position_y: None,
                is_active: true,
            },
        )
        .await
        .expect("Failed to create test unit")
}

/// One captured outgoing mail
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub template: String,
    pub recipient: String,
    pub variables: HashMap<String, String>,
}

/// Email collaborator that records instead of sending
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<SentEmail>>,
    fail: Mutex<bool>,
}

impl RecordingEmailSender {
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_next_sends(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(
        &self,
        template: &str,
        recipient: &str,
        variables: &HashMap<String, String>,
    ) -> Result<(), InternalError> {
        render_template(template, variables)?;
        if *self.fail.lock().unwrap() {
            return Err(EmailError::Transport("simulated outage".to_string()).into());
        }
        self.sent.lock().unwrap().push(SentEmail {
            template: template.to_string(),
            recipient: recipient.to_string(),
            variables: variables.clone(),
        });
        Ok(())
    }
}

/// File storage collaborator backed by a map
#[derive(Default)]
pub struct InMemoryFileStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
    fail_deletes: Mutex<bool>,
}

impl InMemoryFileStorage {
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    pub fn fail_deletes(&self, fail: bool) {
        *self.fail_deletes.lock().unwrap() = fail;
    }
}

#[async_trait]
impl FileStorage for InMemoryFileStorage {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), InternalError> {
        self.files.lock().unwrap().insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), InternalError> {
        if *self.fail_deletes.lock().unwrap() {
            return Err(StorageError::Io {
                operation: "delete",
                path: path.to_string(),
                source: std::io::Error::other("simulated failure"),
            }
            .into());
        }
        self.files.lock().unwrap().remove(path);
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool, InternalError> {
        Ok(self.contains(path))
    }
}

/// Helper to manage environment variables in tests
///
/// Cleans up specified environment variables on creation and drop,
/// ensuring test isolation when dealing with global environment state.
pub struct EnvGuard {
    vars: Vec<String>,
}

impl EnvGuard {
    pub fn new(vars: Vec<&str>) -> Self {
        for var in &vars {
            unsafe {
                std::env::remove_var(var);
            }
        }
        Self {
            vars: vars.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for var in &self.vars {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }
}

/// Global mutex to serialize tests that touch process environment variables
pub static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());
