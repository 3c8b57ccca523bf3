//! Storage seam for JSON documents.
//!
//! Repositories talk to a [`DocumentStore`]; the server and the migration
//! executable pick a backend at startup and pass it down explicitly.

mod memory;
mod redis_store;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::RepoError;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, RepoError>;

    /// Insert or fully replace a document.
    async fn put(&self, collection: &str, id: &str, document: &Value) -> Result<(), RepoError>;

    /// Returns `true` when a document was removed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, RepoError>;

    /// Every document of a collection, in no particular order.
    async fn scan(&self, collection: &str) -> Result<Vec<Value>, RepoError>;

    async fn count(&self, collection: &str) -> Result<u64, RepoError>;

    /// Claim `value` of a unique field for document `id`.
    ///
    /// Returns `Some(owner)` when another document already holds the value.
    async fn claim_unique(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        id: &str,
    ) -> Result<Option<String>, RepoError>;

    /// Release a claim, but only if `id` still owns it.
    async fn release_unique(&self, collection: &str, field: &str, value: &str, id: &str) -> Result<(), RepoError>;

    async fn lookup_unique(&self, collection: &str, field: &str, value: &str) -> Result<Option<String>, RepoError>;

    /// Connectivity check used by `/health` and at startup.
    async fn ping(&self) -> Result<(), RepoError>;
}
