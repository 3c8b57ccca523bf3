use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Document;

#[derive(Document, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[document(collection = "team_members", rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    #[document(id)]
    #[serde(default)]
    pub id: String,
    #[document(required, trim)]
    pub name: String,
    #[document(required, trim)]
    pub title: String,
    #[document(trim, email)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[document(trim)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[document(trim, media)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub social_links: BTreeMap<String, String>,
    #[document(created_at)]
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_marks_image_as_media() {
        let descriptor = TeamMember::descriptor();
        assert_eq!(descriptor.collection, "team_members");
        let image = descriptor.field("imageUrl").expect("imageUrl field");
        assert!(image.media && image.trim && image.writable);
        assert!(!descriptor.is_writable("createdAt"));
        assert!(!descriptor.is_writable("id"));
    }

    #[test]
    fn social_links_default_to_empty() {
        let member: TeamMember = serde_json::from_value(serde_json::json!({
            "name": "Ada",
            "title": "Partner"
        }))
        .unwrap();
        assert!(member.social_links.is_empty());
        assert!(member.image_url.is_none());
    }
}
