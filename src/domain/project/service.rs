use super::error::ProjectServiceError;
use super::model::{Project, ProjectStatus};
use super::{CreateProjectRequest, ProjectResponse, UpdateScriptRequest};
use crate::domain::content::{ContentNormalizer, NormalizedScript, ScriptSource};
use crate::domain::generation::{audio_key, video_key};
use crate::infrastructure::repositories::{MediaStorage, NewProject, ProjectRepository};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

const DEFAULT_LANGUAGE: &str = "en";

pub struct ProjectService {
    project_repo: Arc<dyn ProjectRepository>,
    storage: Arc<dyn MediaStorage>,
    normalizer: Arc<ContentNormalizer>,
}

impl ProjectService {
    pub fn new(
        project_repo: Arc<dyn ProjectRepository>,
        storage: Arc<dyn MediaStorage>,
        normalizer: Arc<ContentNormalizer>,
    ) -> Self {
        Self {
            project_repo,
            storage,
            normalizer,
        }
    }
}

#[async_trait]
pub trait ProjectServiceApi: Send + Sync {
    async fn create_project(
        &self,
        user_id: Uuid,
        request: CreateProjectRequest,
    ) -> Result<ProjectResponse, ProjectServiceError>;

    async fn get_project(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<ProjectResponse, ProjectServiceError>;

    async fn list_projects(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ProjectResponse>, ProjectServiceError>;

    /// Normalize one of the three source modalities into the project script.
    /// Returns the stored project plus the origin tag of the normalization.
    async fn update_script(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        request: UpdateScriptRequest,
    ) -> Result<(ProjectResponse, NormalizedScript), ProjectServiceError>;

    /// "Delete podcast": remove both media objects, project back to draft.
    async fn reset_project(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<ProjectResponse, ProjectServiceError>;

    /// Remove the project row and its media.
    async fn delete_project(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<(), ProjectServiceError>;
}

#[async_trait]
impl ProjectServiceApi for ProjectService {
    async fn create_project(
        &self,
        user_id: Uuid,
        request: CreateProjectRequest,
    ) -> Result<ProjectResponse, ProjectServiceError> {
        if request.title.trim().is_empty() {
            return Err(ProjectServiceError::Invalid(
                "Title cannot be empty".to_string(),
            ));
        }

        let project = self
            .project_repo
            .create(NewProject {
                user_id,
                title: request.title.trim().to_string(),
                description: request.description,
                script: request.script,
                selected_hosts: request.selected_hosts,
                selected_template: request.selected_template,
                selected_language: request
                    .selected_language
                    .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            })
            .await
            .map_err(|e| ProjectServiceError::Dependency(e.to_string()))?;

        tracing::info!(user_id = %user_id, project_id = %project.id, "Project created");

        Ok(self.to_response(project))
    }

    async fn get_project(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<ProjectResponse, ProjectServiceError> {
        let project = self.verify_ownership(project_id, user_id).await?;
        Ok(self.to_response(project))
    }

    async fn list_projects(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ProjectResponse>, ProjectServiceError> {
        let projects = self
            .project_repo
            .find_by_user(user_id)
            .await
            .map_err(|e| ProjectServiceError::Dependency(e.to_string()))?;

        Ok(projects.into_iter().map(|p| self.to_response(p)).collect())
    }

    async fn update_script(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        request: UpdateScriptRequest,
    ) -> Result<(ProjectResponse, NormalizedScript), ProjectServiceError> {
        self.verify_ownership(project_id, user_id).await?;

        let source = Self::source_from_request(request)?;
        let normalized = self.normalizer.normalize(source).await;

        let project = self
            .project_repo
            .update_script(project_id, &normalized.text)
            .await
            .map_err(|e| ProjectServiceError::Dependency(e.to_string()))?;

        Ok((self.to_response(project), normalized))
    }

    async fn reset_project(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<ProjectResponse, ProjectServiceError> {
        self.verify_ownership(project_id, user_id).await?;

        self.delete_media(project_id).await?;

        let project = self
            .project_repo
            .reset(project_id)
            .await
            .map_err(|e| ProjectServiceError::Dependency(e.to_string()))?;

        tracing::info!(project_id = %project_id, "Project media deleted, back to draft");

        Ok(self.to_response(project))
    }

    async fn delete_project(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<(), ProjectServiceError> {
        self.verify_ownership(project_id, user_id).await?;

        self.delete_media(project_id).await?;

        self.project_repo
            .delete(project_id)
            .await
            .map_err(|e| ProjectServiceError::Dependency(e.to_string()))?;

        Ok(())
    }
}

impl ProjectService {
    async fn verify_ownership(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Project, ProjectServiceError> {
        let project = self
            .project_repo
            .find_by_id(project_id)
            .await
            .map_err(|e| ProjectServiceError::Dependency(e.to_string()))?
            .ok_or(ProjectServiceError::NotFound)?;

        if project.user_id != user_id {
            return Err(ProjectServiceError::NotFound);
        }

        Ok(project)
    }

    async fn delete_media(&self, project_id: Uuid) -> Result<(), ProjectServiceError> {
        self.storage
            .delete(&audio_key(project_id))
            .await
            .map_err(|e| ProjectServiceError::Dependency(e.to_string()))?;
        self.storage
            .delete(&video_key(project_id))
            .await
            .map_err(|e| ProjectServiceError::Dependency(e.to_string()))?;
        Ok(())
    }

    fn source_from_request(
        request: UpdateScriptRequest,
    ) -> Result<ScriptSource, ProjectServiceError> {
        match (request.text, request.url, request.file_url) {
            (Some(text), None, None) => Ok(ScriptSource::Text(text)),
            (None, Some(url), None) => Ok(ScriptSource::Url(url)),
            (None, None, Some(file_url)) => Ok(ScriptSource::File {
                url: file_url,
                mime_type: request
                    .mime_type
                    .unwrap_or_else(|| "text/plain".to_string()),
            }),
            _ => Err(ProjectServiceError::Invalid(
                "Provide exactly one of text, url or fileUrl".to_string(),
            )),
        }
    }

    fn to_response(&self, project: Project) -> ProjectResponse {
        let (audio_url, video_url) = if project.status == ProjectStatus::Completed {
            (
                Some(self.storage.public_url(&audio_key(project.id))),
                Some(self.storage.public_url(&video_key(project.id))),
            )
        } else {
            (None, None)
        };

        ProjectResponse {
            id: project.id,
            title: project.title,
            description: project.description,
            script: project.script,
            selected_hosts: project.selected_hosts,
            selected_template: project.selected_template,
            selected_language: project.selected_language,
            status: project.status,
            error_message: project.error_message,
            audio_url,
            video_url,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_requires_exactly_one_modality() {
        let both = UpdateScriptRequest {
            text: Some("a".to_string()),
            url: Some("https://x".to_string()),
            file_url: None,
            mime_type: None,
        };
        assert!(ProjectService::source_from_request(both).is_err());

        let none = UpdateScriptRequest {
            text: None,
            url: None,
            file_url: None,
            mime_type: None,
        };
        assert!(ProjectService::source_from_request(none).is_err());
    }

    #[test]
    fn test_file_source_defaults_mime_type() {
        let request = UpdateScriptRequest {
            text: None,
            url: None,
            file_url: Some("https://bucket/f.txt".to_string()),
            mime_type: None,
        };
        match ProjectService::source_from_request(request).unwrap() {
            ScriptSource::File { mime_type, .. } => assert_eq!(mime_type, "text/plain"),
            other => panic!("unexpected source: {:?}", other),
        }
    }
}
