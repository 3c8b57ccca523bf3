//! Where uploaded images end up.
//!
//! [`LocalMediaStore`] writes into the upload directory served under
//! `/api/uploads`; [`CloudinaryMediaStore`] pushes to the cloud image host.

mod cloudinary;
mod local;

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use crate::id::random_digits;

pub use self::cloudinary::{CloudinaryConfig, CloudinaryMediaStore, sign_upload};
pub use self::local::LocalMediaStore;

/// Public path prefix of files kept in the local upload directory.
pub const LOCAL_UPLOAD_PREFIX: &str = "/api/uploads/";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Only image files are allowed!")]
    UnsupportedType { content_type: String },

    #[error("File too large: {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    #[error("No file uploaded")]
    MissingFile,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image host request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("image host rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("image host configuration incomplete: {0} is not set")]
    MissingCredentials(&'static str),
}

/// A file handed to a [`MediaStore`].
#[derive(Debug, Clone)]
pub struct MediaUpload {
    /// Form field the file arrived in; prefixes generated local file names.
    pub field_name: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    /// Destination folder on the cloud host. Ignored by local storage.
    pub folder: Option<String>,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persist the upload and return the URL clients should reference.
    async fn store(&self, upload: MediaUpload) -> Result<String, MediaError>;
}

/// Reject anything that is not an image or exceeds `limit` bytes.
pub fn check_image(content_type: &str, size: usize, limit: usize) -> Result<(), MediaError> {
    if !content_type.starts_with("image/") {
        return Err(MediaError::UnsupportedType {
            content_type: content_type.to_string(),
        });
    }
    if size > limit {
        return Err(MediaError::TooLarge { size, limit });
    }
    Ok(())
}

/// `<field>-<unix-millis>-<9 digits><ext>`, keeping the original extension.
pub fn upload_file_name(field_name: &str, original: &str) -> String {
    let extension = Path::new(original)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    format!(
        "{field_name}-{}-{}{extension}",
        Utc::now().timestamp_millis(),
        random_digits(9)
    )
}

/// Best-effort content type from a file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        "bmp" => "image/bmp",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_images_within_limit_pass() {
        assert!(check_image("image/png", 10, 100).is_ok());
        assert!(matches!(
            check_image("application/pdf", 10, 100),
            Err(MediaError::UnsupportedType { .. })
        ));
        assert!(matches!(check_image("image/png", 101, 100), Err(MediaError::TooLarge { .. })));
    }

    #[test]
    fn generated_names_keep_field_and_extension() {
        let name = upload_file_name("profileImage", "me.final.JPG");
        assert!(name.starts_with("profileImage-"));
        assert!(name.ends_with(".JPG"));
        let parts: Vec<_> = name.trim_end_matches(".JPG").split('-').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 9);

        assert!(!upload_file_name("file", "noext").contains('.'));
    }

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type_for(Path::new("/tmp/a.JPeG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("b.png")), "image/png");
        assert_eq!(content_type_for(Path::new("c")), "application/octet-stream");
    }
}
