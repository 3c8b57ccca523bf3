use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Serialize;
use serde_json::Value;

use super::{AdminOnly, ApiError, AppState, JsonBody};
use crate::models::ContactSubmission;

const NOT_FOUND: &str = "Contact submission not found";

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(submit))
        .route("/:id", get(show).delete(remove))
}

#[derive(Serialize)]
struct Submitted {
    message: &'static str,
    contact: ContactSubmission,
}

/// Newest first.
pub(super) async fn recent_submissions(state: &AppState) -> Result<Vec<ContactSubmission>, ApiError> {
    let mut submissions = state.repo::<ContactSubmission>().list().await?;
    submissions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(submissions)
}

async fn submit(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<Value>,
) -> Result<(StatusCode, Json<Submitted>), ApiError> {
    if !ContactSubmission::is_complete(&input) {
        return Err(ApiError::bad_request("All fields are required."));
    }
    let contact = state.repo::<ContactSubmission>().create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(Submitted {
            message: "Contact form submitted successfully!",
            contact,
        }),
    ))
}

async fn list(State(state): State<AppState>, _admin: AdminOnly) -> Result<Json<Vec<ContactSubmission>>, ApiError> {
    Ok(Json(recent_submissions(&state).await?))
}

async fn show(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Path(id): Path<String>,
) -> Result<Json<ContactSubmission>, ApiError> {
    state
        .repo::<ContactSubmission>()
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

async fn remove(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.repo::<ContactSubmission>().delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(NOT_FOUND))
    }
}
