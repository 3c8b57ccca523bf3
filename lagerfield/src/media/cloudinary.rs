use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};

use super::{MediaError, MediaStore, MediaUpload};

pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com";

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_base: String,
}

impl CloudinaryConfig {
    /// Build from optional settings, naming the first missing credential.
    pub fn from_parts(
        cloud_name: Option<String>,
        api_key: Option<String>,
        api_secret: Option<String>,
        api_base: Option<String>,
    ) -> Result<Self, MediaError> {
        let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Ok(Self {
            cloud_name: present(cloud_name).ok_or(MediaError::MissingCredentials("CLOUDINARY_CLOUD_NAME"))?,
            api_key: present(api_key).ok_or(MediaError::MissingCredentials("CLOUDINARY_API_KEY"))?,
            api_secret: present(api_secret).ok_or(MediaError::MissingCredentials("CLOUDINARY_API_SECRET"))?,
            api_base: present(api_base).unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        })
    }

    fn upload_endpoint(&self) -> String {
        format!(
            "{}/v1_1/{}/image/upload",
            self.api_base.trim_end_matches('/'),
            self.cloud_name
        )
    }
}

/// Signature over the signed upload parameters, sorted by name.
pub fn sign_upload(folder: Option<&str>, timestamp: i64, api_secret: &str) -> String {
    let mut params = Vec::new();
    if let Some(folder) = folder {
        params.push(format!("folder={folder}"));
    }
    params.push(format!("timestamp={timestamp}"));
    let payload = format!("{}{api_secret}", params.join("&"));
    hex::encode(Sha1::digest(payload.as_bytes()))
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Signed uploads to a Cloudinary-compatible image host.
#[derive(Debug, Clone)]
pub struct CloudinaryMediaStore {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryMediaStore {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl MediaStore for CloudinaryMediaStore {
    async fn store(&self, upload: MediaUpload) -> Result<String, MediaError> {
        let timestamp = Utc::now().timestamp();
        let folder = upload.folder.as_deref().filter(|folder| !folder.is_empty());
        let signature = sign_upload(folder, timestamp, &self.config.api_secret);

        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)?;
        let mut form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature", signature);
        if let Some(folder) = folder {
            form = form.text("folder", folder.to_string());
        }

        let endpoint = self.config.upload_endpoint();
        debug!("uploading {} to {endpoint}", upload.file_name);
        let response = self.client.post(&endpoint).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|err| err.error.message)
                .unwrap_or(body);
            return Err(MediaError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        let uploaded: UploadResponse = response.json().await?;
        info!("uploaded {} to {}", upload.file_name, uploaded.secure_url);
        Ok(uploaded.secure_url)
    }
}
