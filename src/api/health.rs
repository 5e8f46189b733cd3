use std::sync::Arc;

use chrono::Utc;
use poem_openapi::{OpenApi, Tags, payload::Json};
use sea_orm::DatabaseConnection;

use crate::app_data::AppData;
use crate::types::dto::common::HealthResponse;

/// Liveness and database reachability
pub struct HealthApi {
    db: DatabaseConnection,
}

#[derive(Tags)]
enum HealthTags {
    Health,
}

impl HealthApi {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            db: app_data.db.clone(),
        }
    }
}

#[OpenApi]
impl HealthApi {
    /// Service status; `database` is "unreachable" when a ping fails
    #[oai(path = "/health", method = "get", tag = "HealthTags::Health")]
    async fn health(&self) -> Json<HealthResponse> {
        let database = match self.db.ping().await {
            Ok(()) => "ok",
            Err(e) => {
                tracing::warn!("Health check database ping failed: {}", e);
                "unreachable"
            }
        };

        Json(HealthResponse {
            status: "healthy".to_string(),
            database: database.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        })
    }
}
