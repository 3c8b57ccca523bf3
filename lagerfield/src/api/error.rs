use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::error;
use serde_json::json;

use crate::{auth::AuthError, errors::RepoError, media::MediaError};

/// Error returned by handlers; renders as `{"message": ...}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Unavailable(String),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Repository error mapper that reports a missing document with `message`.
    pub fn or_missing(message: &'static str) -> impl Fn(RepoError) -> ApiError {
        move |err| match err {
            RepoError::NotFound { .. } => ApiError::NotFound(message.to_string()),
            other => ApiError::from(other),
        }
    }

    /// Repository error mapper that reports unique violations with `message`.
    pub fn or_duplicate(message: &'static str) -> impl Fn(RepoError) -> ApiError {
        move |err| match err {
            RepoError::UniqueConstraintViolation { .. } => ApiError::BadRequest(message.to_string()),
            other => ApiError::from(other),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Internal(detail) => {
                error!("internal error: {detail}");
                "Internal server error".to_string()
            }
            ApiError::BadRequest(message)
            | ApiError::Unauthorized(message)
            | ApiError::Forbidden(message)
            | ApiError::NotFound(message)
            | ApiError::Unavailable(message) => message,
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Validation(validation) => ApiError::BadRequest(validation.to_string()),
            RepoError::UniqueConstraintViolation { field, .. } => {
                ApiError::BadRequest(format!("{field} already exists"))
            }
            RepoError::NotFound { .. } => ApiError::NotFound("Not found".to_string()),
            RepoError::InvalidRequest { message } => ApiError::BadRequest(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken
            | AuthError::InvalidToken(_)
            | AuthError::Expired
            | AuthError::UnknownUser
            | AuthError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AuthError::Forbidden => ApiError::Forbidden(err.to_string()),
            AuthError::WeakPassword(message) => ApiError::BadRequest(message),
            AuthError::Hashing(_) | AuthError::Signing(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::UnsupportedType { .. } | MediaError::TooLarge { .. } | MediaError::MissingFile => {
                ApiError::BadRequest(err.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}
