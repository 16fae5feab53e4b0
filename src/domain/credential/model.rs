use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Credential {
    pub id: Uuid,
    pub user_id: Uuid,
    pub key: String,
    pub name: String,
    pub is_active: bool,
    pub quota_remaining: Option<i64>,
    pub last_used: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    /// A credential is usable when active and not known to be out of quota.
    pub fn is_usable(&self) -> bool {
        self.is_active && self.quota_remaining.map_or(true, |q| q > 0)
    }

    /// Masked form of the secret for listing surfaces: last four characters.
    pub fn masked_key(&self) -> String {
        let suffix: String = self
            .key
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("\u{2022}\u{2022}\u{2022}\u{2022}{}", suffix)
    }
}

/// Listing/response form. The raw key never leaves the server after creation.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialResponse {
    pub id: Uuid,
    pub name: String,
    pub key_preview: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota_remaining: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Credential> for CredentialResponse {
    fn from(c: Credential) -> Self {
        let key_preview = c.masked_key();
        Self {
            id: c.id,
            name: c.name,
            key_preview,
            is_active: c.is_active,
            quota_remaining: c.quota_remaining,
            last_used: c.last_used,
            created_at: c.created_at,
        }
    }
}
