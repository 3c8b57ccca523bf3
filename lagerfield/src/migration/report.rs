use serde::Serialize;

/// Result of one migration run, per target in run order.
#[derive(Debug, Default, Clone, Serialize)]
pub struct MigrationReport {
    pub targets: Vec<TargetReport>,
}

#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetReport {
    pub collection: String,
    pub field: String,
    pub folder: String,
    /// Records whose field held a local reference.
    pub matched: usize,
    pub migrated: usize,
    /// Records left alone because their local file was gone.
    pub skipped_missing: usize,
    pub failures: Vec<RecordFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordFailure {
    pub id: String,
    pub error: String,
}

impl MigrationReport {
    pub fn total_matched(&self) -> usize {
        self.targets.iter().map(|target| target.matched).sum()
    }

    pub fn total_migrated(&self) -> usize {
        self.targets.iter().map(|target| target.migrated).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.targets.iter().map(|target| target.skipped_missing).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.targets.iter().map(|target| target.failures.len()).sum()
    }

    pub fn has_failures(&self) -> bool {
        self.total_failed() > 0
    }
}
