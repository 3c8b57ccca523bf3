use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Document, errors::RepoError, repository::Repo};

#[derive(Document, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[document(collection = "settings", rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    #[document(id)]
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub company_info: CompanyInfo,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub security: SecuritySettings,
    #[serde(default)]
    pub system: SystemSettings,
    #[document(trim, media)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    #[document(updated_at)]
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyInfo {
    pub name: String,
    pub description: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

impl Default for CompanyInfo {
    fn default() -> Self {
        Self {
            name: "Lagerfield Capital".to_string(),
            description: String::new(),
            address: String::new(),
            phone: String::new(),
            email: String::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    pub email_notifications: bool,
    pub contact_form_alerts: bool,
    pub system_updates: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email_notifications: true,
            contact_form_alerts: true,
            system_updates: false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PasswordPolicy {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SecuritySettings {
    /// Minutes of inactivity before an admin session expires.
    pub session_timeout: u32,
    pub password_policy: PasswordPolicy,
    pub two_factor_auth: bool,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            session_timeout: 30,
            password_policy: PasswordPolicy::default(),
            two_factor_auth: false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemSettings {
    pub maintenance_mode: bool,
    pub debug_mode: bool,
    pub api_rate_limit: u32,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            maintenance_mode: false,
            debug_mode: false,
            api_rate_limit: 1000,
        }
    }
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            id: Self::SINGLETON_ID.to_string(),
            company_info: CompanyInfo::default(),
            notifications: NotificationSettings::default(),
            security: SecuritySettings::default(),
            system: SystemSettings::default(),
            profile_image_url: None,
            updated_at: Utc::now(),
        }
    }
}

impl SiteSettings {
    pub const SINGLETON_ID: &'static str = "site";

    /// Fetch the settings document, creating it with defaults on first access.
    pub async fn load(repo: &Repo<SiteSettings>) -> Result<SiteSettings, RepoError> {
        if let Some(settings) = repo.get(Self::SINGLETON_ID).await? {
            return Ok(settings);
        }
        match repo.insert(SiteSettings::default()).await {
            Ok(settings) => Ok(settings),
            // another request created it first
            Err(RepoError::InvalidRequest { .. }) => repo.require(Self::SINGLETON_ID).await,
            Err(err) => Err(err),
        }
    }

    /// Deep-merge `changes` into the settings document.
    pub async fn update(repo: &Repo<SiteSettings>, changes: serde_json::Value) -> Result<SiteSettings, RepoError> {
        Self::load(repo).await?;
        repo.merge(Self::SINGLETON_ID, changes).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn repo() -> Repo<SiteSettings> {
        Repo::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn first_load_creates_defaults() {
        let repo = repo();
        let settings = SiteSettings::load(&repo).await.unwrap();
        assert_eq!(settings.id, "site");
        assert_eq!(settings.company_info.name, "Lagerfield Capital");
        assert!(settings.notifications.email_notifications);
        assert_eq!(settings.security.session_timeout, 30);
        assert_eq!(settings.system.api_rate_limit, 1000);
        assert_eq!(repo.count().await.unwrap(), 1);

        SiteSettings::load(&repo).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_merges_nested_sections() {
        let repo = repo();
        let before = SiteSettings::load(&repo).await.unwrap();
        let updated = SiteSettings::update(
            &repo,
            json!({"companyInfo": {"phone": "555-0100"}, "security": {"passwordPolicy": "high"}}),
        )
        .await
        .unwrap();
        assert_eq!(updated.company_info.name, "Lagerfield Capital");
        assert_eq!(updated.company_info.phone, "555-0100");
        assert_eq!(updated.security.password_policy, PasswordPolicy::High);
        assert_eq!(updated.security.session_timeout, 30);
        assert!(updated.updated_at >= before.updated_at);
    }

    #[tokio::test]
    async fn unknown_password_policy_is_rejected() {
        let repo = repo();
        let err = SiteSettings::update(&repo, json!({"security": {"passwordPolicy": "none"}}))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }
}
