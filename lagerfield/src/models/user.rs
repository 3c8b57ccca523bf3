use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Document;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Admin,
    Editor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
        }
    }
}

/// Stored account. Never returned to clients directly; see [`UserView`].
#[derive(Document, Serialize, Deserialize, Debug, Clone)]
#[document(collection = "users", rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    #[document(id)]
    #[serde(default)]
    pub id: String,
    #[document(required, unique, trim, min_length = 3, max_length = 64)]
    pub username: String,
    #[document(required, unique, trim, lowercase, email)]
    pub email: String,
    #[document(required, readonly)]
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    #[document(trim)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    #[document(created_at)]
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn active_by_default() -> bool {
    true
}

impl AdminUser {
    pub fn new(username: impl Into<String>, email: impl Into<String>, password_hash: String, role: Role) -> Self {
        Self {
            id: String::new(),
            username: username.into(),
            email: email.into(),
            password_hash,
            role,
            is_active: true,
            avatar_url: None,
            last_login: None,
            created_at: Utc::now(),
        }
    }

    pub fn view(&self) -> UserView {
        UserView::from(self)
    }
}

/// Client-facing projection of [`AdminUser`] without credentials.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&AdminUser> for UserView {
    fn from(user: &AdminUser) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            is_active: user.is_active,
            avatar_url: user.avatar_url.clone(),
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}
