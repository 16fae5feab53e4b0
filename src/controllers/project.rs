use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::content::ScriptOrigin;
use crate::domain::project::{
    CreateProjectRequest, ProjectResponse, ProjectService, ProjectServiceApi, UpdateScriptRequest,
};
use crate::{error::AppResult, infrastructure::auth::AuthUser};

/// Response for PUT /api/projects/{id}/script: the stored project plus how
/// the script text was obtained.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptResponse {
    pub project: ProjectResponse,
    pub origin: ScriptOrigin,
}

pub struct ProjectController {
    project_service: Arc<ProjectService>,
}

impl ProjectController {
    pub fn new(project_service: Arc<ProjectService>) -> Self {
        Self { project_service }
    }

    /// GET /api/projects - List user's projects
    pub async fn list_projects(
        State(controller): State<Arc<ProjectController>>,
        Extension(auth_user): Extension<AuthUser>,
    ) -> AppResult<Json<Vec<ProjectResponse>>> {
        let projects = controller
            .project_service
            .list_projects(auth_user.user_id)
            .await?;
        Ok(Json(projects))
    }

    /// POST /api/projects - Create new project
    pub async fn create_project(
        State(controller): State<Arc<ProjectController>>,
        Extension(auth_user): Extension<AuthUser>,
        Json(request): Json<CreateProjectRequest>,
    ) -> AppResult<(StatusCode, Json<ProjectResponse>)> {
        let project = controller
            .project_service
            .create_project(auth_user.user_id, request)
            .await?;
        Ok((StatusCode::CREATED, Json(project)))
    }

    /// GET /api/projects/{projectId}
    pub async fn get_project(
        State(controller): State<Arc<ProjectController>>,
        Extension(auth_user): Extension<AuthUser>,
        Path(project_id): Path<Uuid>,
    ) -> AppResult<Json<ProjectResponse>> {
        let project = controller
            .project_service
            .get_project(auth_user.user_id, project_id)
            .await?;
        Ok(Json(project))
    }

    /// PUT /api/projects/{projectId}/script - Set script from text/url/file
    pub async fn update_script(
        State(controller): State<Arc<ProjectController>>,
        Extension(auth_user): Extension<AuthUser>,
        Path(project_id): Path<Uuid>,
        Json(request): Json<UpdateScriptRequest>,
    ) -> AppResult<Json<ScriptResponse>> {
        let (project, normalized) = controller
            .project_service
            .update_script(auth_user.user_id, project_id, request)
            .await?;
        Ok(Json(ScriptResponse {
            project,
            origin: normalized.origin,
        }))
    }

    /// POST /api/projects/{projectId}/reset - Delete media, back to draft
    pub async fn reset_project(
        State(controller): State<Arc<ProjectController>>,
        Extension(auth_user): Extension<AuthUser>,
        Path(project_id): Path<Uuid>,
    ) -> AppResult<Json<ProjectResponse>> {
        let project = controller
            .project_service
            .reset_project(auth_user.user_id, project_id)
            .await?;
        Ok(Json(project))
    }

    /// DELETE /api/projects/{projectId}
    pub async fn delete_project(
        State(controller): State<Arc<ProjectController>>,
        Extension(auth_user): Extension<AuthUser>,
        Path(project_id): Path<Uuid>,
    ) -> AppResult<StatusCode> {
        controller
            .project_service
            .delete_project(auth_user.user_id, project_id)
            .await?;
        Ok(StatusCode::NO_CONTENT)
    }
}
