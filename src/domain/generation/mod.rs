pub mod error;
pub mod service;

pub use error::GenerationError;
pub use service::{GenerationService, GenerationSettings};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request for POST /api/podcasts/generate
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub project_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_controls: Option<serde_json::Value>,
}

/// Immediate acknowledgement: generation continues in the background and the
/// result lands on the status channel.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub message: String,
    pub project_id: Uuid,
}

/// Storage key for a project's audio artifact.
pub fn audio_key(project_id: Uuid) -> String {
    format!("{}/audio.mp3", project_id)
}

/// Storage key for a project's video artifact.
pub fn video_key(project_id: Uuid) -> String {
    format!("{}/video.mp4", project_id)
}

pub const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";
