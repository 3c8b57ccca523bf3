use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use log::debug;

use super::MigrationError;
use crate::{
    media::{MediaStore, MediaUpload, content_type_for},
    validators::is_external_url,
};

/// Outcome of a successful relocation.
#[derive(Debug, Clone)]
pub struct Relocated {
    pub url: String,
    /// Local file that may be removed once the new URL is persisted.
    pub local_path: PathBuf,
}

/// Moves files from the local upload directory to a remote [`MediaStore`].
#[derive(Clone)]
pub struct BlobRelocator {
    upload_dir: PathBuf,
    remote: Arc<dyn MediaStore>,
}

impl BlobRelocator {
    pub fn new(upload_dir: impl Into<PathBuf>, remote: Arc<dyn MediaStore>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            remote,
        }
    }

    /// Resolve a stored reference to a path inside the upload directory.
    ///
    /// Only the basename is used, so references cannot escape the directory.
    pub fn local_path(&self, reference: &str) -> Option<PathBuf> {
        let name = Path::new(reference).file_name()?;
        Some(self.upload_dir.join(name))
    }

    /// Upload the file behind `reference` into `folder`.
    ///
    /// Returns `Ok(None)` when the file is not on disk.
    pub async fn relocate(&self, reference: &str, folder: &str) -> Result<Option<Relocated>, MigrationError> {
        let Some(local_path) = self.local_path(reference) else {
            return Ok(None);
        };
        let present = tokio::fs::try_exists(&local_path)
            .await
            .map_err(|source| MigrationError::Read {
                path: local_path.display().to_string(),
                source,
            })?;
        if !present {
            return Ok(None);
        }
        let bytes = tokio::fs::read(&local_path)
            .await
            .map_err(|source| MigrationError::Read {
                path: local_path.display().to_string(),
                source,
            })?;
        let file_name = local_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!("uploading {} ({} bytes) to {folder}", local_path.display(), bytes.len());
        let url = self
            .remote
            .store(MediaUpload {
                field_name: "file".to_string(),
                file_name,
                content_type: content_type_for(&local_path).to_string(),
                bytes,
                folder: Some(folder.to_string()),
            })
            .await
            .map_err(|source| MigrationError::Upload {
                path: local_path.display().to_string(),
                source,
            })?;
        if !is_external_url(&url) {
            return Err(MigrationError::NotExternal {
                path: local_path.display().to_string(),
                url,
            });
        }
        Ok(Some(Relocated { url, local_path }))
    }

    pub async fn discard(&self, relocated: &Relocated) -> std::io::Result<()> {
        tokio::fs::remove_file(&relocated.local_path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::LocalMediaStore;

    #[test]
    fn references_resolve_by_basename() {
        let relocator = BlobRelocator::new("/srv/uploads", Arc::new(LocalMediaStore::new("/tmp")));
        assert_eq!(
            relocator.local_path("/api/uploads/photo.jpg"),
            Some(PathBuf::from("/srv/uploads/photo.jpg"))
        );
        assert_eq!(
            relocator.local_path("/api/uploads/../../etc/passwd"),
            Some(PathBuf::from("/srv/uploads/passwd"))
        );
    }

    #[tokio::test]
    async fn missing_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let relocator = BlobRelocator::new(dir.path(), Arc::new(LocalMediaStore::new(dir.path().join("remote"))));
        let outcome = relocator.relocate("/api/uploads/missing.jpg", "lagerfield/team").await.unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn unreadable_upload_dir_is_an_error_not_a_skip() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("uploads");
        std::fs::write(&not_a_dir, b"plain file").unwrap();
        let relocator = BlobRelocator::new(not_a_dir.clone(), Arc::new(LocalMediaStore::new(dir.path().join("remote"))));
        let err = relocator.relocate("/api/uploads/photo.jpg", "lagerfield/team").await.unwrap_err();
        assert!(matches!(err, MigrationError::Read { .. }));
    }

    #[tokio::test]
    async fn local_urls_from_the_remote_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("photo.jpg"), b"jpg").unwrap();
        let relocator = BlobRelocator::new(dir.path(), Arc::new(LocalMediaStore::new(dir.path())));
        let err = relocator.relocate("/api/uploads/photo.jpg", "lagerfield/team").await.unwrap_err();
        assert!(matches!(err, MigrationError::NotExternal { ref url, .. } if url.starts_with("/api/uploads/")));
        assert!(dir.path().join("photo.jpg").exists());
    }
}
