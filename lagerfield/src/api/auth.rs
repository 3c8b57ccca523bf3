use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{ApiError, AppState, CurrentUser, JsonBody};
use crate::{
    auth::{AuthError, hash_password, validate_password, verify_password},
    id::generate_document_id,
    models::{AdminUser, Role, UserView},
    types::Document,
};

const ADMIN_EXISTS: &str = "Admin user already exists. Use login instead.";

/// Unique claim held by the registration that created the first admin.
const FIRST_ADMIN_FIELD: &str = "registration";
const FIRST_ADMIN_VALUE: &str = "first-admin";

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", get(profile))
        .route("/logout", post(logout))
        .route("/change-password", put(change_own_password))
}

#[derive(Debug, Deserialize)]
struct Registration {
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
struct Credentials {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChangePassword {
    #[serde(default)]
    current_password: String,
    #[serde(default)]
    new_password: String,
}

#[derive(Debug, Serialize)]
struct Session {
    message: &'static str,
    token: String,
    user: UserView,
}

async fn register(
    State(state): State<AppState>,
    JsonBody(registration): JsonBody<Registration>,
) -> Result<(StatusCode, Json<Session>), ApiError> {
    let users = state.repo::<AdminUser>();
    if users.find_first(|user| user.role == Role::Admin).await?.is_some() {
        return Err(ApiError::bad_request(ADMIN_EXISTS));
    }
    validate_password(&registration.password)?;

    let id = generate_document_id();
    let claimed_by = state
        .store
        .claim_unique(AdminUser::COLLECTION, FIRST_ADMIN_FIELD, FIRST_ADMIN_VALUE, &id)
        .await?;
    if claimed_by.is_some() {
        return Err(ApiError::bad_request(ADMIN_EXISTS));
    }
    let created = create_admin(&state, id.clone(), registration).await;
    if created.is_err() {
        state
            .store
            .release_unique(AdminUser::COLLECTION, FIRST_ADMIN_FIELD, FIRST_ADMIN_VALUE, &id)
            .await?;
    }
    let user = created?;
    info!("registered admin user {}", user.username);
    let token = state.tokens.issue(&user)?;
    Ok((
        StatusCode::CREATED,
        Json(Session {
            message: "Admin user created successfully",
            token,
            user: user.view(),
        }),
    ))
}

async fn create_admin(state: &AppState, id: String, registration: Registration) -> Result<AdminUser, ApiError> {
    let password_hash = hash_password(&registration.password, state.config.auth.bcrypt_cost).await?;
    let mut user = AdminUser::new(registration.username, registration.email, password_hash, Role::Admin);
    user.id = id;
    state
        .repo::<AdminUser>()
        .insert(user)
        .await
        .map_err(ApiError::or_duplicate("Username or email already exists"))
}

async fn login(
    State(state): State<AppState>,
    JsonBody(credentials): JsonBody<Credentials>,
) -> Result<Json<Session>, ApiError> {
    let users = state.repo::<AdminUser>();
    let email = credentials.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(AuthError::InvalidCredentials.into());
    }
    let mut user = users
        .find_by_unique("email", &email)
        .await?
        .filter(|user| user.is_active)
        .ok_or(AuthError::InvalidCredentials)?;
    if !verify_password(&credentials.password, &user.password_hash).await? {
        return Err(AuthError::InvalidCredentials.into());
    }
    user.last_login = Some(Utc::now());
    let user = users.save(&user).await?;
    let token = state.tokens.issue(&user)?;
    Ok(Json(Session {
        message: "Login successful",
        token,
        user: user.view(),
    }))
}

async fn profile(CurrentUser(user): CurrentUser) -> Json<UserView> {
    Json(user.view())
}

async fn logout(_user: CurrentUser) -> Json<Value> {
    Json(json!({ "message": "Logged out successfully" }))
}

async fn change_own_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(request): JsonBody<ChangePassword>,
) -> Result<Json<Value>, ApiError> {
    change_password(&state, user, request).await
}

pub(super) async fn change_password(
    state: &AppState,
    mut user: AdminUser,
    request: ChangePassword,
) -> Result<Json<Value>, ApiError> {
    if !verify_password(&request.current_password, &user.password_hash).await? {
        return Err(ApiError::bad_request("Current password is incorrect"));
    }
    validate_password(&request.new_password)?;
    user.password_hash = hash_password(&request.new_password, state.config.auth.bcrypt_cost).await?;
    state.repo::<AdminUser>().save(&user).await?;
    Ok(Json(json!({ "message": "Password changed successfully" })))
}
