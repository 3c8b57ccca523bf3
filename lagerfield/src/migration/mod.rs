//! Relocation of locally stored uploads to the cloud image host.
//!
//! For every [`MigrationTarget`] the [`ReferenceScanner`] finds records whose
//! media field still points at `/api/uploads/`, the [`BlobRelocator`] pushes
//! the file to a [`MediaStore`](crate::media::MediaStore), the
//! [`RecordRewriter`] persists the new URL and the local file is removed.
//! A failing record never stops the batch.

mod orchestrator;
mod relocator;
mod report;
mod rewriter;
mod scanner;

use thiserror::Error;

use crate::{errors::RepoError, media::MediaError, types::Document};

pub use self::orchestrator::{ImageMigration, MigrationTarget, default_targets};
pub use self::relocator::{BlobRelocator, Relocated};
pub use self::report::{MigrationReport, RecordFailure, TargetReport};
pub use self::rewriter::RecordRewriter;
pub use self::scanner::{LOCAL_REFERENCE_PATTERN, ReferenceScanner};

/// A document whose media fields can be read and rewritten by name.
///
/// Generated by `#[derive(Document)]` for structs with `#[document(media)]` fields.
pub trait MigratableRecord: Document {
    fn media_reference(&self, field: &str) -> Option<&str>;

    /// Returns `false` when `field` is not a media field of this document.
    fn set_media_reference(&mut self, field: &str, url: String) -> bool;
}

/// Field shapes that can hold a media URL.
pub trait MediaSlot {
    fn reference(&self) -> Option<&str>;

    fn replace(&mut self, url: String);
}

impl MediaSlot for String {
    fn reference(&self) -> Option<&str> {
        Some(self.as_str()).filter(|value| !value.is_empty())
    }

    fn replace(&mut self, url: String) {
        *self = url;
    }
}

impl MediaSlot for Option<String> {
    fn reference(&self) -> Option<&str> {
        self.as_deref().filter(|value| !value.is_empty())
    }

    fn replace(&mut self, url: String) {
        *self = Some(url);
    }
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("document store unavailable: {0}")]
    Store(#[source] RepoError),

    #[error("image host unavailable: {0}")]
    MediaHost(#[source] MediaError),

    #[error("failed to scan {collection}: {source}")]
    Scan {
        collection: String,
        #[source]
        source: RepoError,
    },

    #[error("failed to decode record {id}: {source}")]
    Decode {
        id: String,
        #[source]
        source: RepoError,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to upload {path}: {source}")]
    Upload {
        path: String,
        #[source]
        source: MediaError,
    },

    #[error("image host returned {url} for {path}, which is not an external URL")]
    NotExternal { path: String, url: String },

    #[error("failed to persist record {id}: {source}")]
    Persist {
        id: String,
        #[source]
        source: RepoError,
    },

    #[error("{collection} has no media field `{field}`")]
    UnknownField { collection: String, field: String },
}
