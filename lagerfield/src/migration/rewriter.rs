use super::{MigratableRecord, MigrationError};
use crate::repository::Repo;

/// Persists a relocated URL into a record through its repository.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordRewriter;

impl RecordRewriter {
    pub async fn rewrite<T>(&self, repo: &Repo<T>, mut record: T, field: &str, url: String) -> Result<T, MigrationError>
    where
        T: MigratableRecord,
    {
        if !record.set_media_reference(field, url) {
            return Err(MigrationError::UnknownField {
                collection: T::COLLECTION.to_string(),
                field: field.to_string(),
            });
        }
        repo.save(&record).await.map_err(|source| MigrationError::Persist {
            id: record.id().to_string(),
            source,
        })
    }
}
