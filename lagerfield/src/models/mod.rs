//! Documents stored by the content backend.

mod contact;
mod insight;
mod service;
mod settings;
mod team_member;
mod user;

pub use contact::ContactSubmission;
pub use insight::Insight;
pub use service::Service;
pub use settings::{
    CompanyInfo, NotificationSettings, PasswordPolicy, SecuritySettings, SiteSettings, SystemSettings,
};
pub use team_member::TeamMember;
pub use user::{AdminUser, Role, UserView};
