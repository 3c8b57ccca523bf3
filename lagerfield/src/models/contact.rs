use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Document;

#[derive(Document, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[document(collection = "contact_submissions", rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    #[document(id)]
    #[serde(default)]
    pub id: String,
    #[document(required, trim)]
    pub name: String,
    #[document(required, trim, email)]
    pub email: String,
    #[document(required, trim)]
    pub subject: String,
    #[document(required, trim)]
    pub message: String,
    #[document(created_at)]
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl ContactSubmission {
    pub const REQUIRED_FIELDS: [&'static str; 4] = ["name", "email", "subject", "message"];

    /// Whether every required field carries a non-blank string.
    pub fn is_complete(input: &serde_json::Value) -> bool {
        Self::REQUIRED_FIELDS.iter().all(|key| {
            input
                .get(*key)
                .and_then(serde_json::Value::as_str)
                .is_some_and(|value| !value.trim().is_empty())
        })
    }
}
