use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub script: Option<String>,
    pub selected_hosts: Vec<String>,
    pub selected_template: Option<String>,
    pub selected_language: String,
    pub status: ProjectStatus,
    pub error_message: Option<String>,
    pub lease_token: Option<Uuid>,
    pub lease_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Authoritative project status enumeration. Deletion removes the row, so
/// there is no `deleted` variant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "text")]
#[sqlx(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[serde(rename = "draft")]
    Draft,
    #[serde(rename = "processing")]
    Processing,
    #[serde(rename = "completed")]
    Completed,
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectStatus::Draft => write!(f, "draft"),
            ProjectStatus::Processing => write!(f, "processing"),
            ProjectStatus::Completed => write!(f, "completed"),
        }
    }
}

impl ProjectStatus {
    /// Whether a generation attempt may claim a project in this status.
    /// Completed projects may be regenerated; both uploads are upserts.
    pub fn can_start_generation(self) -> bool {
        matches!(self, ProjectStatus::Draft | ProjectStatus::Completed)
    }

    /// Valid transitions of the status machine.
    pub fn can_transition_to(self, next: ProjectStatus) -> bool {
        use ProjectStatus::*;
        matches!(
            (self, next),
            (Draft, Processing)
                | (Completed, Processing)
                | (Processing, Completed)
                | (Processing, Draft)
                | (Completed, Draft)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::ProjectStatus::*;

    #[test]
    fn test_generation_claimable_from_draft_and_completed() {
        assert!(Draft.can_start_generation());
        assert!(Completed.can_start_generation());
        assert!(!Processing.can_start_generation());
    }

    #[test]
    fn test_transition_table() {
        assert!(Draft.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Draft));
        assert!(Completed.can_transition_to(Draft));
        assert!(Completed.can_transition_to(Processing));

        assert!(!Draft.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Completed));
        assert!(!Draft.can_transition_to(Draft));
    }
}
