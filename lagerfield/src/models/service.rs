use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Document;

#[derive(Document, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[document(collection = "services", rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[document(id)]
    #[serde(default)]
    pub id: String,
    #[document(required, trim)]
    pub name: String,
    #[document(required)]
    pub description: String,
    #[document(required, unique, trim, lowercase)]
    pub slug: String,
    #[document(trim)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[document(trim, media)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[document(created_at)]
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Service {
    /// First required field missing from a create payload, in the order clients are told about them.
    pub fn missing_required(input: &serde_json::Value) -> Option<&'static str> {
        let present = |key: &str| {
            input
                .get(key)
                .and_then(serde_json::Value::as_str)
                .is_some_and(|value| !value.trim().is_empty())
        };
        if !present("name") {
            Some("Service name is required.")
        } else if !present("description") {
            Some("Service description is required.")
        } else if !present("slug") {
            Some("Service slug is required.")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reports_first_missing_field() {
        assert_eq!(Service::missing_required(&json!({})), Some("Service name is required."));
        assert_eq!(
            Service::missing_required(&json!({"name": "Advisory", "slug": "advisory"})),
            Some("Service description is required.")
        );
        assert_eq!(
            Service::missing_required(&json!({"name": "Advisory", "description": "x", "slug": "  "})),
            Some("Service slug is required.")
        );
        assert_eq!(
            Service::missing_required(&json!({"name": "Advisory", "description": "x", "slug": "advisory"})),
            None
        );
    }
}
