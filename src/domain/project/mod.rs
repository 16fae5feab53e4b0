pub mod error;
pub mod model;
pub mod service;

pub use error::ProjectServiceError;
pub use model::{Project, ProjectStatus};
pub use service::{ProjectService, ProjectServiceApi};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response for project endpoints
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    pub selected_hosts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_template: Option<String>,
    pub selected_language: String,
    pub status: ProjectStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new project
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub title: String,
    pub description: Option<String>,
    pub script: Option<String>,
    #[serde(default)]
    pub selected_hosts: Vec<String>,
    pub selected_template: Option<String>,
    pub selected_language: Option<String>,
}

/// Request to set a project's script from one of the three source modalities
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScriptRequest {
    pub text: Option<String>,
    pub url: Option<String>,
    pub file_url: Option<String>,
    pub mime_type: Option<String>,
}
