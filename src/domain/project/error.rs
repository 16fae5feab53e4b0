use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum ProjectServiceError {
    #[error("dependency error: {0}")]
    Dependency(String),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("project not found")]
    NotFound,
    #[error("generation already in progress")]
    InProgress,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ProjectServiceError> for AppError {
    fn from(err: ProjectServiceError) -> Self {
        match err {
            ProjectServiceError::Invalid(msg) => AppError::BadRequest(msg),
            ProjectServiceError::NotFound => AppError::NotFound("Project not found".to_string()),
            ProjectServiceError::InProgress => {
                AppError::Conflict("Generation already in progress".to_string())
            }
            ProjectServiceError::Dependency(msg) => AppError::ExternalService(msg),
            ProjectServiceError::Other(e) => AppError::Internal(e.to_string()),
        }
    }
}
