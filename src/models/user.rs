use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::NotifyBy;

/// The authenticated principal plus the notification preferences the
/// scheduler needs. Account mechanics (registration, password flow) are
/// owned by the surrounding system; this service only resolves a bearer
/// token to a row and reads the delivery fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub whatsapp_number: Option<String>,
    pub push_token: Option<String>,
    pub notify_by: NotifyBy,
    pub notifications_enabled: bool,
    /// SHA-256 hex of the API bearer token; never the token itself.
    #[serde(skip_serializing)]
    pub api_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// First name, used in notification copy.
    pub fn given_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}
