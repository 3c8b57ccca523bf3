use std::sync::Arc;

use futures::future::BoxFuture;
use log::{error, info, warn};

use super::{
    BlobRelocator, MigratableRecord, MigrationError, MigrationReport, RecordFailure, RecordRewriter, ReferenceScanner,
    TargetReport,
};
use crate::{
    models::{Insight, Service, SiteSettings, TeamMember},
    repository::Repo,
    store::DocumentStore,
};

type RunTarget =
    for<'a> fn(&'a ImageMigration, &'a MigrationTarget) -> BoxFuture<'a, Result<TargetReport, MigrationError>>;

/// One (collection, field, destination folder) triple to migrate.
#[derive(Clone)]
pub struct MigrationTarget {
    pub collection: &'static str,
    pub field: String,
    pub folder: String,
    run: RunTarget,
}

impl std::fmt::Debug for MigrationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationTarget")
            .field("collection", &self.collection)
            .field("field", &self.field)
            .field("folder", &self.folder)
            .finish()
    }
}

impl MigrationTarget {
    pub fn of<T>(field: impl Into<String>, folder: impl Into<String>) -> Self
    where
        T: MigratableRecord,
    {
        Self {
            collection: T::COLLECTION,
            field: field.into(),
            folder: folder.into(),
            run: run_target::<T>,
        }
    }
}

fn run_target<'a, T>(
    migration: &'a ImageMigration,
    target: &'a MigrationTarget,
) -> BoxFuture<'a, Result<TargetReport, MigrationError>>
where
    T: MigratableRecord,
{
    Box::pin(migration.migrate_collection::<T>(target))
}

/// Every media field that may still reference local uploads.
pub fn default_targets(folder_root: &str) -> Vec<MigrationTarget> {
    let root = folder_root.trim_end_matches('/');
    vec![
        MigrationTarget::of::<TeamMember>("imageUrl", format!("{root}/team")),
        MigrationTarget::of::<Insight>("imageUrl", format!("{root}/insights")),
        MigrationTarget::of::<SiteSettings>("profileImageUrl", format!("{root}/settings")),
        MigrationTarget::of::<Service>("imageUrl", format!("{root}/services")),
    ]
}

enum RecordOutcome {
    Migrated,
    MissingFile,
}

/// Drives scanner, relocator and rewriter across a list of targets.
///
/// Records are processed one at a time; only store-level failures end a run early.
pub struct ImageMigration {
    store: Arc<dyn DocumentStore>,
    scanner: ReferenceScanner,
    relocator: BlobRelocator,
    rewriter: RecordRewriter,
}

impl ImageMigration {
    pub fn new(store: Arc<dyn DocumentStore>, relocator: BlobRelocator) -> Self {
        Self {
            store,
            scanner: ReferenceScanner::default(),
            relocator,
            rewriter: RecordRewriter,
        }
    }

    pub async fn run(&self, targets: &[MigrationTarget]) -> Result<MigrationReport, MigrationError> {
        self.store.ping().await.map_err(MigrationError::Store)?;
        let mut report = MigrationReport::default();
        for target in targets {
            info!(
                "migrating {}.{} into {}",
                target.collection, target.field, target.folder
            );
            let target_report = (target.run)(self, target).await?;
            info!(
                "{}.{}: {} matched, {} migrated, {} missing, {} failed",
                target.collection,
                target.field,
                target_report.matched,
                target_report.migrated,
                target_report.skipped_missing,
                target_report.failures.len()
            );
            report.targets.push(target_report);
        }
        Ok(report)
    }

    async fn migrate_collection<T>(&self, target: &MigrationTarget) -> Result<TargetReport, MigrationError>
    where
        T: MigratableRecord,
    {
        let repo = Repo::<T>::new(Arc::clone(&self.store));
        let records = self
            .scanner
            .scan(&repo, &target.field)
            .await
            .map_err(|source| MigrationError::Scan {
                collection: target.collection.to_string(),
                source,
            })?;

        let mut report = TargetReport {
            collection: target.collection.to_string(),
            field: target.field.clone(),
            folder: target.folder.clone(),
            matched: records.len(),
            ..TargetReport::default()
        };

        for value in records {
            let id = repo.stored_id(&value).unwrap_or("<unknown>").to_string();
            let outcome = match repo.decode(value) {
                Ok(record) => self.migrate_record(&repo, record, target).await,
                Err(source) => Err(MigrationError::Decode { id: id.clone(), source }),
            };
            match outcome {
                Ok(RecordOutcome::Migrated) => report.migrated += 1,
                Ok(RecordOutcome::MissingFile) => report.skipped_missing += 1,
                Err(err) => {
                    error!("{}/{id}: {err}", target.collection);
                    report.failures.push(RecordFailure {
                        id,
                        error: err.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    async fn migrate_record<T>(
        &self,
        repo: &Repo<T>,
        record: T,
        target: &MigrationTarget,
    ) -> Result<RecordOutcome, MigrationError>
    where
        T: MigratableRecord,
    {
        let Some(reference) = record.media_reference(&target.field).map(str::to_string) else {
            return Ok(RecordOutcome::MissingFile);
        };
        let Some(relocated) = self.relocator.relocate(&reference, &target.folder).await? else {
            info!(
                "{}/{}: local file for {reference} not found, skipping",
                target.collection,
                record.id()
            );
            return Ok(RecordOutcome::MissingFile);
        };
        let saved = self
            .rewriter
            .rewrite(repo, record, &target.field, relocated.url.clone())
            .await?;
        info!("{}/{}: {reference} -> {}", target.collection, saved.id(), relocated.url);
        if let Err(err) = self.relocator.discard(&relocated).await {
            warn!("could not remove {}: {err}", relocated.local_path.display());
        }
        Ok(RecordOutcome::Migrated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_cover_every_media_collection() {
        let targets = default_targets("lagerfield/");
        let summary: Vec<_> = targets
            .iter()
            .map(|t| (t.collection, t.field.as_str(), t.folder.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("team_members", "imageUrl", "lagerfield/team"),
                ("insights", "imageUrl", "lagerfield/insights"),
                ("settings", "profileImageUrl", "lagerfield/settings"),
                ("services", "imageUrl", "lagerfield/services"),
            ]
        );
    }
}
