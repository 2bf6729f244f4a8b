//! Domain records as stored in the document store and returned by the API.
//!
//! Every business-owned record carries a mandatory `business_id`; the
//! tenancy layer ([`crate::tenancy`]) stamps and filters it, handlers never
//! set it from client input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Closed role set. Anything outside these two values is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub name: String,
    /// Unique lookup key, matched case-sensitively.
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    /// Set at registration; absent only transiently.
    pub business_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Public projection of a user. Never exposes the password hash.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub business_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        UserView {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            business_id: user.business_id.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Business {
    pub id: String,
    pub business_name: String,
    pub category: String,
    pub description: String,
    pub target_audience: String,
    pub primary_goal: String,
    pub brand_tone: String,
    pub offerings: String,
    pub location: Option<String>,
    #[serde(default)]
    pub brand_colors: Vec<String>,
    pub preferred_style: Option<String>,
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Product {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Website {
    pub id: String,
    pub business_id: String,
    pub template: String,
    #[serde(default)]
    pub content_json: serde_json::Value,
    pub project_name: Option<String>,
    pub published_url: Option<String>,
    /// Starts at 1, incremented on every patch.
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Sent,
    Scheduled,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default)]
pub struct CampaignAnalytics {
    pub sent: u64,
    pub opened: u64,
    pub clicked: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Campaign {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub sender_name: String,
    pub reply_to: Option<String>,
    pub status: CampaignStatus,
    pub analytics: CampaignAnalytics,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Poster {
    pub id: String,
    pub business_id: String,
    pub title: String,
    pub prompt_used: Option<String>,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Customer {
    pub id: String,
    pub business_id: String,
    pub name: String,
    /// Unique within the owning business.
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatLog {
    pub id: String,
    pub business_id: String,
    pub user_email: String,
    pub message: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Folder,
    Note,
    File,
    Image,
}

/// Brand-vault entry. Folders nest through `parent_folder_id`; `None`
/// means root level.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Asset {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub kind: AssetKind,
    pub parent_folder_id: Option<String>,
    /// Body text, used by notes.
    pub content: Option<String>,
    /// Hosted location, used by files and images.
    pub file_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
    }

    #[test]
    fn user_view_hides_password_hash() {
        let user = User {
            id: new_id(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password_hash: "$2b$12$secret".into(),
            role: Role::User,
            business_id: Some(new_id()),
            created_at: Utc::now(),
        };
        let view = serde_json::to_value(UserView::from(&user)).unwrap();
        assert!(view.get("password_hash").is_none());
        assert_eq!(view["email"], "ana@example.com");
    }

    #[test]
    fn campaign_status_defaults_to_draft() {
        assert_eq!(CampaignStatus::default(), CampaignStatus::Draft);
        assert_eq!(
            serde_json::from_str::<CampaignStatus>("\"scheduled\"").unwrap(),
            CampaignStatus::Scheduled
        );
    }
}
