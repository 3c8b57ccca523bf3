use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_json::Value;

use crate::Document;

#[derive(Document, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[document(collection = "insights", rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    #[document(id)]
    #[serde(default)]
    pub id: String,
    #[document(required, trim)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[document(required, trim)]
    pub author: String,
    #[serde(default = "Utc::now", deserialize_with = "calendar_or_instant")]
    pub date: DateTime<Utc>,
    #[document(trim)]
    #[serde(default)]
    pub tags: Vec<String>,
    #[document(trim)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[document(trim)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[document(trim, media)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[document(trim, media)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

impl Insight {
    /// Editors post the article text as `content`; it is stored as `body`.
    pub fn accept_content_alias(input: &mut Value) {
        if let Value::Object(map) = input
            && let Some(content) = map.remove("content")
        {
            map.entry("body").or_insert(content);
        }
    }
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
fn calendar_or_instant<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(instant) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| D::Error::custom(format!("invalid date `{raw}`")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_alias_fills_body() {
        let mut input = json!({"title": "Rates", "content": "Text"});
        Insight::accept_content_alias(&mut input);
        assert_eq!(input["body"], "Text");
        assert!(input.get("content").is_none());

        let mut both = json!({"body": "kept", "content": "dropped"});
        Insight::accept_content_alias(&mut both);
        assert_eq!(both["body"], "kept");
    }

    #[test]
    fn dates_accept_calendar_form() {
        let insight: Insight = serde_json::from_value(json!({
            "title": "Rates",
            "author": "Ada",
            "date": "2024-03-05"
        }))
        .unwrap();
        assert_eq!(insight.date.to_rfc3339(), "2024-03-05T00:00:00+00:00");

        let insight: Insight = serde_json::from_value(json!({
            "title": "Rates",
            "author": "Ada",
            "date": "2024-03-05T10:30:00Z"
        }))
        .unwrap();
        assert_eq!(insight.date.to_rfc3339(), "2024-03-05T10:30:00+00:00");
        assert!(insight.tags.is_empty());
    }
}
