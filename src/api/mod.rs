// API layer - HTTP endpoints
pub mod auth;
pub mod body_limit;
pub mod health;
pub mod org_chart;

use std::sync::Arc;

use poem::endpoint::StaticFilesEndpoint;
use poem::middleware::{Cors, SetHeader};
use poem::{Endpoint, EndpointExt, Route};
use poem_openapi::OpenApiService;

pub use auth::AuthApi;
pub use body_limit::BodyLimit;
pub use health::HealthApi;
pub use org_chart::OrgChartApi;

use crate::app_data::AppData;
use crate::providers::avatar_provider::MAX_AVATAR_BYTES;

const DEFAULT_STORAGE_MOUNT: &str = "/storage";

/// Largest accepted API request body: one avatar plus multipart framing
pub const MAX_REQUEST_BYTES: usize = MAX_AVATAR_BYTES + 64 * 1024;

/// Compose the full HTTP surface
///
/// - `/api` OpenAPI service (health, auth, organizational chart), bodies
///   capped at `MAX_REQUEST_BYTES`
/// - `/swagger` Swagger UI
/// - stored avatars under the public storage path
///
/// Every response carries the security headers; CORS follows
/// `CORS_ALLOWED_ORIGINS` (empty allows any origin).
pub fn build_app(app_data: Arc<AppData>) -> impl Endpoint {
    let settings = app_data.settings.clone();

    let api_service = OpenApiService::new(
        (
            HealthApi::new(app_data.clone()),
            AuthApi::new(app_data.clone()),
            OrgChartApi::new(app_data.clone()),
        ),
        "Organizational Chart API",
        env!("CARGO_PKG_VERSION"),
    )
    .server(format!("http://{}/api", settings.server_address()));

    let ui = api_service.swagger_ui();

    let storage_mount = if settings.storage_public_url().starts_with('/') {
        settings.storage_public_url().trim_end_matches('/').to_string()
    } else {
        DEFAULT_STORAGE_MOUNT.to_string()
    };

    let mut cors = Cors::new();
    for origin in settings.cors_allowed_origins() {
        cors = cors.allow_origin(origin.as_str());
    }

    Route::new()
        .nest("/api", api_service.with(BodyLimit::new(MAX_REQUEST_BYTES)))
        .nest("/swagger", ui)
        .nest(storage_mount, StaticFilesEndpoint::new(settings.storage_dir()))
        .with(
            SetHeader::new()
                .overriding("X-Content-Type-Options", "nosniff")
                .overriding("X-XSS-Protection", "1; mode=block")
                .overriding("Referrer-Policy", "strict-origin-when-cross-origin")
                .overriding(
                    "Permissions-Policy",
                    "camera=(), microphone=(), geolocation=(), payment=()",
                ),
        )
        .with(cors)
}
