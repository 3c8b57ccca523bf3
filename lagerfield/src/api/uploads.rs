use std::path::Path as FsPath;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, Request, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use super::{AdminOnly, ApiError, AppState};
use crate::media::{MediaError, MediaUpload, check_image};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/uploads", post(upload))
        .route("/api/uploads/*file", get(serve))
}

#[derive(Debug, Deserialize)]
struct UploadQuery {
    folder: Option<String>,
}

#[derive(Debug, Serialize)]
struct Uploaded {
    url: String,
}

/// Read the image in multipart field `field_name`, enforcing type and size limits.
pub(super) async fn read_image(
    multipart: &mut Multipart,
    field_name: &str,
    limit: usize,
    folder: Option<String>,
) -> Result<MediaUpload, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(field_name) {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        check_image(&content_type, 0, limit)?;
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field.bytes().await?;
        check_image(&content_type, bytes.len(), limit)?;
        return Ok(MediaUpload {
            field_name: field_name.to_string(),
            file_name,
            content_type,
            bytes: bytes.to_vec(),
            folder,
        });
    }
    Err(MediaError::MissingFile.into())
}

async fn upload(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<Json<Uploaded>, ApiError> {
    let root = &state.config.media.folder_root;
    let folder = match query.folder.as_deref().map(str::trim) {
        Some(folder) if !folder.is_empty() => format!("{root}/{}", folder.trim_matches('/')),
        _ => root.clone(),
    };
    let upload = read_image(&mut multipart, "file", state.config.server.max_upload_bytes, Some(folder)).await?;
    let url = state.media.store(upload).await?;
    Ok(Json(Uploaded { url }))
}

async fn serve(State(state): State<AppState>, Path(file): Path<String>, request: Request) -> Response {
    let Some(name) = FsPath::new(&file).file_name() else {
        return ApiError::not_found("File not found").into_response();
    };
    let path = state.config.media.upload_dir.join(name);
    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}
