//! HTTP surface of the content backend.

mod admin;
mod auth;
mod contact;
mod error;
mod extract;
mod insights;
mod services;
mod settings;
mod team;
mod uploads;

use std::{sync::Arc, time::Instant};

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Request, State},
    http::{HeaderName, HeaderValue, Method, header},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use log::{debug, warn};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;

use crate::{
    auth::TokenService,
    config::{AppConfig, ConfigError},
    media::MediaStore,
    repository::Repo,
    store::DocumentStore,
    types::Document,
};

pub use self::error::ApiError;
pub use self::extract::{AdminOnly, CurrentUser, JsonBody};

/// Multipart framing allowance on top of the per-file limit.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Shared handles cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub media: Arc<dyn MediaStore>,
    pub tokens: TokenService,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>, media: Arc<dyn MediaStore>) -> Self {
        let tokens = TokenService::new(&config.auth.jwt_secret, config.auth.token_ttl_hours);
        Self {
            store,
            media,
            tokens,
            config: Arc::new(config),
        }
    }

    pub fn repo<T: Document>(&self) -> Repo<T> {
        Repo::new(Arc::clone(&self.store))
    }
}

pub fn router(state: AppState) -> Result<Router, ConfigError> {
    let cors = cors_layer(&state.config.server.cors_origin)?;
    let body_limit = state.config.server.max_upload_bytes + MULTIPART_OVERHEAD;

    Ok(Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/team", team::router())
        .nest("/api/insights", insights::router())
        .nest("/api/services", services::router())
        .nest("/api/contact", contact::router())
        .nest("/api/settings", settings::router())
        .nest("/api/admin", admin::router())
        .nest("/api/auth", auth::router())
        .merge(uploads::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(log_request))
        .layer(cors)
        .with_state(state))
}

fn cors_layer(origin: &str) -> Result<CorsLayer, ConfigError> {
    let origin = HeaderValue::from_str(origin).map_err(|_| ConfigError::InvalidValue {
        key: "CORS_ORIGIN",
        value: origin.to_string(),
    })?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .allow_credentials(true))
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();
    let response = next.run(request).await;
    debug!("{method} {uri} -> {} ({:?})", response.status(), started.elapsed());
    response
}

async fn root() -> &'static str {
    "Lagerfield Capital Backend is running!"
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.store.ping().await.map_err(|err| {
        warn!("health check failed: {err}");
        ApiError::Unavailable(err.to_string())
    })?;
    Ok(Json(json!({ "status": "ok" })))
}
