use crate::domain::credential::CredentialServiceError;
use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("project not found")]
    NotFound,
    #[error("project belongs to another user")]
    Forbidden,
    #[error("generation already in progress")]
    AlreadyRunning,
    #[error(transparent)]
    Credentials(#[from] CredentialServiceError),
    #[error("{0}")]
    Provider(String),
    #[error("{0}")]
    Storage(String),
    #[error("dependency error: {0}")]
    Dependency(String),
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::NotFound => AppError::NotFound("Project not found".to_string()),
            GenerationError::Forbidden => {
                AppError::Forbidden("Project belongs to another user".to_string())
            }
            GenerationError::AlreadyRunning => {
                AppError::Conflict("Generation already in progress".to_string())
            }
            GenerationError::Credentials(e) => e.into(),
            GenerationError::Provider(msg) => AppError::ExternalService(msg),
            GenerationError::Storage(msg) => AppError::ExternalService(msg),
            GenerationError::Dependency(msg) => AppError::ExternalService(msg),
        }
    }
}
