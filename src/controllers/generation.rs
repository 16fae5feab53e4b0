use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use uuid::Uuid;

use crate::domain::generation::{GenerateRequest, GenerateResponse, GenerationService};
use crate::domain::project::{ProjectService, ProjectServiceApi, ProjectStatus};
use crate::domain::status::StatusChannel;
use crate::{error::AppResult, infrastructure::auth::AuthUser};
use chrono::{DateTime, Utc};

/// Response for GET /api/projects/{id}/status - the UI's fallback poll
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub project_id: Uuid,
    pub status: ProjectStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

pub struct GenerationController {
    generation_service: Arc<GenerationService>,
    project_service: Arc<ProjectService>,
    channel: Arc<StatusChannel>,
}

impl GenerationController {
    pub fn new(
        generation_service: Arc<GenerationService>,
        project_service: Arc<ProjectService>,
        channel: Arc<StatusChannel>,
    ) -> Self {
        Self {
            generation_service,
            project_service,
            channel,
        }
    }

    /// POST /api/podcasts/generate - Start a generation attempt.
    ///
    /// Responds as soon as the project is in processing; the attempt itself
    /// runs in the background and reports through the status channel.
    pub async fn generate(
        State(controller): State<Arc<GenerationController>>,
        Extension(auth_user): Extension<AuthUser>,
        Json(request): Json<GenerateRequest>,
    ) -> AppResult<Json<GenerateResponse>> {
        controller
            .generation_service
            .start_generation(
                auth_user.user_id,
                request.project_id,
                request.character_controls,
            )
            .await?;

        Ok(Json(GenerateResponse {
            message: "Podcast generation started".to_string(),
            project_id: request.project_id,
        }))
    }

    /// GET /api/projects/{projectId}/status - Poll the current status
    pub async fn get_status(
        State(controller): State<Arc<GenerationController>>,
        Extension(auth_user): Extension<AuthUser>,
        Path(project_id): Path<Uuid>,
    ) -> AppResult<Json<StatusResponse>> {
        let project = controller
            .project_service
            .get_project(auth_user.user_id, project_id)
            .await?;

        Ok(Json(StatusResponse {
            project_id: project.id,
            status: project.status,
            error_message: project.error_message,
            audio_url: project.audio_url,
            video_url: project.video_url,
            updated_at: project.updated_at,
        }))
    }

    /// GET /api/projects/{projectId}/events - Push status transitions (SSE).
    ///
    /// Push and poll are redundant on purpose; consumers must tolerate the
    /// same transition arriving through both.
    pub async fn events(
        State(controller): State<Arc<GenerationController>>,
        Extension(auth_user): Extension<AuthUser>,
        Path(project_id): Path<Uuid>,
    ) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
        // Ownership check before handing out a subscription.
        controller
            .project_service
            .get_project(auth_user.user_id, project_id)
            .await?;

        let stream = BroadcastStream::new(controller.channel.subscribe()).filter_map(
            move |event| match event {
                Ok(event) if event.project_id == project_id => Event::default()
                    .event("status")
                    .json_data(&event)
                    .ok()
                    .map(Ok),
                // Other projects' events, or a lagging receiver: skip. The
                // poll endpoint covers anything dropped here.
                _ => None,
            },
        );

        Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
    }
}
