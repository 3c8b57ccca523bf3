use axum::{
    Json, async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
};
use serde::de::DeserializeOwned;

use super::{ApiError, AppState};
use crate::{
    auth::{AuthError, TokenService},
    models::{AdminUser, Role},
};

/// The active user behind a valid bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AdminUser);

/// A [`CurrentUser`] with the admin role.
#[derive(Debug, Clone)]
pub struct AdminOnly(pub AdminUser);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::MissingToken)?;
        let token = TokenService::bearer(header)?;
        let claims = state.tokens.validate(token)?;
        let user = state
            .repo::<AdminUser>()
            .get(&claims.sub)
            .await?
            .filter(|user| user.is_active)
            .ok_or(AuthError::UnknownUser)?;
        Ok(Self(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(AuthError::Forbidden.into());
        }
        Ok(Self(user))
    }
}

/// `Json<T>` whose rejections render as `{"message": ...}`.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}
