use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::MigratableRecord;
use crate::{errors::RepoError, repository::Repo};

/// Values that still point at the local upload directory.
pub const LOCAL_REFERENCE_PATTERN: &str = "^/api/uploads/";

static LOCAL_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(LOCAL_REFERENCE_PATTERN).expect("local reference pattern compiles"));

/// Finds records whose media field holds a local upload reference.
#[derive(Debug, Clone)]
pub struct ReferenceScanner {
    pattern: Regex,
}

impl Default for ReferenceScanner {
    fn default() -> Self {
        Self::with_pattern(LOCAL_REFERENCE.clone())
    }
}

impl ReferenceScanner {
    pub fn with_pattern(pattern: Regex) -> Self {
        Self { pattern }
    }

    pub fn is_local(&self, value: &str) -> bool {
        self.pattern.is_match(value)
    }

    /// Raw stored values of matching records; decoding is left to the caller.
    pub async fn scan<T>(&self, repo: &Repo<T>, field: &str) -> Result<Vec<Value>, RepoError>
    where
        T: MigratableRecord,
    {
        repo.find_matching(field, &self.pattern).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_upload_paths_are_local() {
        let scanner = ReferenceScanner::default();
        assert!(scanner.is_local("/api/uploads/photo.jpg"));
        assert!(!scanner.is_local("https://res.cloudinary.com/demo/photo.jpg"));
        assert!(!scanner.is_local("/static/api/uploads/photo.jpg"));
    }
}
