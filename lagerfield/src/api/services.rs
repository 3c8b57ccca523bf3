use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde_json::Value;

use super::{AdminOnly, ApiError, AppState, JsonBody};
use crate::{errors::RepoError, id::is_document_id, models::Service};

const NOT_FOUND: &str = "Service not found";
const DUPLICATE_SLUG: &str = "Service slug must be unique";

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(show).put(update).delete(remove))
}

fn write_error(err: RepoError) -> ApiError {
    match err {
        RepoError::NotFound { .. } => ApiError::not_found(NOT_FOUND),
        RepoError::UniqueConstraintViolation { .. } => ApiError::bad_request(DUPLICATE_SLUG),
        other => ApiError::from(other),
    }
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Service>>, ApiError> {
    let mut services = state.repo::<Service>().list().await?;
    services.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(Json(services))
}

/// Looks up by id when the segment is id-shaped, falling back to the slug.
async fn show(State(state): State<AppState>, Path(id_or_slug): Path<String>) -> Result<Json<Service>, ApiError> {
    let repo = state.repo::<Service>();
    let mut service = None;
    if is_document_id(&id_or_slug) {
        service = repo.get(&id_or_slug).await?;
    }
    if service.is_none() {
        service = repo.find_by_unique("slug", &id_or_slug).await?;
    }
    service.map(Json).ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

async fn create(
    State(state): State<AppState>,
    _admin: AdminOnly,
    JsonBody(input): JsonBody<Value>,
) -> Result<(StatusCode, Json<Service>), ApiError> {
    if let Some(message) = Service::missing_required(&input) {
        return Err(ApiError::bad_request(message));
    }
    let service = state.repo::<Service>().create(input).await.map_err(write_error)?;
    Ok((StatusCode::CREATED, Json(service)))
}

async fn update(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<Value>,
) -> Result<Json<Service>, ApiError> {
    let service = state.repo::<Service>().patch(&id, input).await.map_err(write_error)?;
    Ok(Json(service))
}

async fn remove(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.repo::<Service>().delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(NOT_FOUND))
    }
}
