use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum CredentialServiceError {
    #[error("no credentials configured")]
    NoCredentials,
    #[error("all credentials exhausted")]
    AllExhausted,
    #[error("credential not found")]
    NotFound,
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("dependency error: {0}")]
    Dependency(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<CredentialServiceError> for AppError {
    fn from(err: CredentialServiceError) -> Self {
        match err {
            CredentialServiceError::NoCredentials => {
                AppError::BadRequest("No credentials configured. Add a provider API key first.".to_string())
            }
            CredentialServiceError::AllExhausted => {
                AppError::QuotaExhausted("All credentials exhausted".to_string())
            }
            CredentialServiceError::NotFound => {
                AppError::NotFound("Credential not found".to_string())
            }
            CredentialServiceError::Invalid(msg) => AppError::BadRequest(msg),
            CredentialServiceError::Dependency(msg) => AppError::ExternalService(msg),
            CredentialServiceError::Other(e) => AppError::Internal(e.to_string()),
        }
    }
}
