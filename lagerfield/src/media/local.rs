use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;

use super::{LOCAL_UPLOAD_PREFIX, MediaError, MediaStore, MediaUpload, upload_file_name};

/// Stores uploads as files under one directory.
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn store(&self, upload: MediaUpload) -> Result<String, MediaError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let file_name = upload_file_name(&upload.field_name, &upload.file_name);
        let path = self.root.join(&file_name);
        tokio::fs::write(&path, &upload.bytes).await?;
        debug!("stored {} bytes at {}", upload.bytes.len(), path.display());
        Ok(format!("{LOCAL_UPLOAD_PREFIX}{file_name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_file_and_returns_public_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(dir.path().join("uploads"));
        let url = store
            .store(MediaUpload {
                field_name: "file".to_string(),
                file_name: "logo.png".to_string(),
                content_type: "image/png".to_string(),
                bytes: b"png".to_vec(),
                folder: Some("ignored".to_string()),
            })
            .await
            .unwrap();
        let file_name = url.strip_prefix(LOCAL_UPLOAD_PREFIX).unwrap();
        assert!(file_name.starts_with("file-") && file_name.ends_with(".png"));
        let written = std::fs::read(store.root().join(file_name)).unwrap();
        assert_eq!(written, b"png");
    }
}
