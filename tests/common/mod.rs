// Common test utilities for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use migration::{Migrator, MigratorTrait};
use poem::endpoint::BoxEndpoint;
use poem::test::{TestClient, TestResponse};
use poem::EndpointExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tempfile::TempDir;

use orgchart_backend::api::build_app;
use orgchart_backend::app_data::AppData;
use orgchart_backend::config::{BootstrapSettings, EnvironmentProvider, SecretManager};
use orgchart_backend::errors::InternalError;
use orgchart_backend::providers::{EmailSender, LocalFileStorage};
use orgchart_backend::stores::{NewUser, UnitFields};
use orgchart_backend::types::db::{Role, UnitType, unit, user};

pub const PASSWORD: &str = "Password1!";

/// Environment provider backed by a fixed map
pub struct StaticEnvironment {
    vars: HashMap<String, String>,
}

impl StaticEnvironment {
    pub fn new(vars: &[(&str, &str)]) -> Self {
        Self {
            vars: vars
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }
}

impl EnvironmentProvider for StaticEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Captures outgoing mail so tests can read the OTP
#[derive(Default)]
pub struct CapturingEmailSender {
    sent: Mutex<Vec<(String, HashMap<String, String>)>>,
}

impl CapturingEmailSender {
    pub fn last_otp_for(&self, recipient: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == recipient)
            .and_then(|(_, variables)| variables.get("otp").cloned())
    }
}

#[async_trait]
impl EmailSender for CapturingEmailSender {
    async fn send(
        &self,
        _template: &str,
        recipient: &str,
        variables: &HashMap<String, String>,
    ) -> Result<(), InternalError> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), variables.clone()));
        Ok(())
    }
}

pub struct TestServer {
    pub client: TestClient<BoxEndpoint<'static>>,
    pub app_data: Arc<AppData>,
    pub emails: Arc<CapturingEmailSender>,
    pub storage: TempDir,
}

/// Full HTTP stack over an in-memory database and a temporary storage root
pub async fn spawn_server() -> TestServer {
    spawn_server_with(&[]).await
}

pub async fn spawn_server_with(overrides: &[(&str, &str)]) -> TestServer {
    spawn_server_on("sqlite::memory:", overrides).await
}

/// Full HTTP stack over the given database; the caller owns any file it names
pub async fn spawn_server_on(database_url: &str, overrides: &[(&str, &str)]) -> TestServer {
    let storage = TempDir::new().expect("Failed to create storage dir");
    let storage_dir = storage.path().to_string_lossy().to_string();

    let mut vars = vec![
        ("DATABASE_URL", database_url),
        ("STORAGE_DIR", storage_dir.as_str()),
        ("STORAGE_PUBLIC_URL", "/storage"),
        ("JWT_SECRET", "integration-secret-minimum-32-characters"),
        ("PASSWORD_PEPPER", "integration-pepper"),
        ("OTP_SECRET", "integration-otp-secret-minimum-32-chars"),
        ("RATE_LIMIT_LOGIN", "1000"),
        ("RATE_LIMIT_CHECK_SESSION", "1000"),
        ("RATE_LIMIT_RESET_REQUEST", "1000"),
        ("RATE_LIMIT_RESET_VERIFY", "1000"),
        ("RATE_LIMIT_RESET", "1000"),
    ];
    for (key, value) in overrides {
        vars.retain(|(existing, _)| existing != key);
        vars.push((*key, *value));
    }
    let env = Arc::new(StaticEnvironment::new(&vars));

    let settings = BootstrapSettings::from_env_provider(env.clone()).expect("Failed to load settings");
    let secrets = SecretManager::from_env_provider(env).expect("Failed to load secrets");

    let db = Database::connect(database_url)
        .await
        .expect("Failed to create test database");
    Migrator::up(&db, None).await.expect("Failed to run migrations");

    let emails = Arc::new(CapturingEmailSender::default());
    let app_data = Arc::new(AppData::with_collaborators(
        db,
        settings,
        Arc::new(secrets),
        emails.clone(),
        Arc::new(LocalFileStorage::new(storage.path())),
    ));

    let endpoint = build_app(app_data.clone()).map_to_response().boxed();

    TestServer {
        client: TestClient::new(endpoint),
        app_data,
        emails,
        storage,
    }
}

impl TestServer {
    pub async fn create_user(&self, email: &str, role: Role) -> user::Model {
        let password_hash = self
            .app_data
            .crypto_provider
            .hash_password(PASSWORD)
            .expect("Failed to hash password");
        self.app_data
            .user_store
            .insert(
                &self.app_data.db,
                NewUser {
                    id: uuid::Uuid::new_v4().to_string(),
                    name: email.split('@').next().unwrap_or(email).to_string(),
                    username: None,
                    email: email.to_string(),
                    phone: None,
                    password_hash,
                    role,
                    employee_id: None,
                },
            )
            .await
            .expect("Failed to create user")
    }

    pub async fn create_unit(&self, code: &str, role: Role, parent_unit_id: Option<i32>) -> unit::Model {
        self.app_data
            .unit_store
            .insert(
                &self.app_data.db,
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
            .expect("Failed to create unit")
    }

    pub async fn login(&self, email: &str, device: &str, force_logout: bool) -> TestResponse {
        self.client
            .post("/api/auth/login")
            .body_json(&json!({
                "email": email,
                "password": PASSWORD,
                "device_name": device,
                "force_logout": force_logout,
            }))
            .send()
            .await
    }

    /// Log in and return the bearer token
    pub async fn token_for(&self, email: &str) -> String {
        let resp = self.login(email, "Test Device", false).await;
        resp.assert_status_is_ok();
        let body = body_json(resp).await;
        body["data"]["token"]
            .as_str()
            .expect("token missing")
            .to_string()
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub async fn body_json(resp: TestResponse) -> Value {
    resp.0
        .into_body()
        .into_json()
        .await
        .expect("Response body is not JSON")
}
