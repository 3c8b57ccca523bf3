use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{
    AdminOnly, ApiError, AppState, CurrentUser, JsonBody,
    auth::{ChangePassword, change_password},
    uploads::read_image,
};
use crate::models::{AdminUser, SiteSettings, UserView};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(show).put(update))
        .route("/upload-profile-image", post(upload_profile_image))
        .route("/profile", get(profile).put(update_profile))
        .route("/change-password", put(change_own_password))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileImage {
    image_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileUpdate {
    username: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

async fn show(State(state): State<AppState>, _admin: AdminOnly) -> Result<Json<SiteSettings>, ApiError> {
    Ok(Json(SiteSettings::load(&state.repo()).await?))
}

async fn update(
    State(state): State<AppState>,
    _admin: AdminOnly,
    JsonBody(changes): JsonBody<Value>,
) -> Result<Json<SiteSettings>, ApiError> {
    Ok(Json(SiteSettings::update(&state.repo(), changes).await?))
}

async fn upload_profile_image(
    State(state): State<AppState>,
    _admin: AdminOnly,
    mut multipart: Multipart,
) -> Result<Json<ProfileImage>, ApiError> {
    let folder = format!("{}/settings", state.config.media.folder_root);
    let upload = read_image(
        &mut multipart,
        "profileImage",
        state.config.server.max_upload_bytes,
        Some(folder),
    )
    .await?;
    let image_url = state.media.store(upload).await?;
    SiteSettings::update(&state.repo(), json!({ "profileImageUrl": image_url })).await?;
    Ok(Json(ProfileImage { image_url }))
}

async fn profile(CurrentUser(user): CurrentUser) -> Json<UserView> {
    Json(user.view())
}

async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> Result<Json<UserView>, ApiError> {
    let mut changes = Map::new();
    if let Some(username) = update.username {
        changes.insert("username".to_string(), Value::String(username));
    }
    if let Some(email) = update.email {
        changes.insert("email".to_string(), Value::String(email));
    }
    if let Some(avatar_url) = update.avatar_url {
        changes.insert("avatarUrl".to_string(), Value::String(avatar_url));
    }
    let updated = state
        .repo::<AdminUser>()
        .patch(&user.id, Value::Object(changes))
        .await
        .map_err(ApiError::or_duplicate("Username or email already exists"))?;
    Ok(Json(updated.view()))
}

async fn change_own_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(request): JsonBody<ChangePassword>,
) -> Result<Json<Value>, ApiError> {
    change_password(&state, user, request).await
}
