use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde_json::Value;

use super::{AdminOnly, ApiError, AppState, JsonBody};
use crate::models::Insight;

const NOT_FOUND: &str = "Insight not found";

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(show).put(update).delete(remove))
}

/// Newest first by publication date.
pub(super) async fn sorted_insights(state: &AppState) -> Result<Vec<Insight>, ApiError> {
    let mut insights = state.repo::<Insight>().list().await?;
    insights.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(insights)
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Insight>>, ApiError> {
    Ok(Json(sorted_insights(&state).await?))
}

async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Insight>, ApiError> {
    state
        .repo::<Insight>()
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

async fn create(
    State(state): State<AppState>,
    _admin: AdminOnly,
    JsonBody(mut input): JsonBody<Value>,
) -> Result<(StatusCode, Json<Insight>), ApiError> {
    Insight::accept_content_alias(&mut input);
    let insight = state.repo::<Insight>().create(input).await?;
    Ok((StatusCode::CREATED, Json(insight)))
}

async fn update(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Path(id): Path<String>,
    JsonBody(mut input): JsonBody<Value>,
) -> Result<Json<Insight>, ApiError> {
    Insight::accept_content_alias(&mut input);
    let insight = state
        .repo::<Insight>()
        .patch(&id, input)
        .await
        .map_err(ApiError::or_missing(NOT_FOUND))?;
    Ok(Json(insight))
}

async fn remove(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.repo::<Insight>().delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(NOT_FOUND))
    }
}
