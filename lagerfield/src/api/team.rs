use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde_json::Value;

use super::{AdminOnly, ApiError, AppState, JsonBody};
use crate::models::TeamMember;

const NOT_FOUND: &str = "Team member not found";

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(show).put(update).delete(remove))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<TeamMember>>, ApiError> {
    let mut members = state.repo::<TeamMember>().list().await?;
    members.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(Json(members))
}

async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<TeamMember>, ApiError> {
    state
        .repo::<TeamMember>()
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

async fn create(
    State(state): State<AppState>,
    _admin: AdminOnly,
    JsonBody(input): JsonBody<Value>,
) -> Result<(StatusCode, Json<TeamMember>), ApiError> {
    let member = state.repo::<TeamMember>().create(input).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

async fn update(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<Value>,
) -> Result<Json<TeamMember>, ApiError> {
    let member = state
        .repo::<TeamMember>()
        .patch(&id, input)
        .await
        .map_err(ApiError::or_missing(NOT_FOUND))?;
    Ok(Json(member))
}

async fn remove(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.repo::<TeamMember>().delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(NOT_FOUND))
    }
}
