use super::error::CredentialServiceError;
use super::model::{Credential, CredentialResponse};
use super::CreateCredentialRequest;
use crate::infrastructure::repositories::{CredentialRepository, VoiceProvider};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

pub struct CredentialService {
    credential_repo: Arc<dyn CredentialRepository>,
    provider: Arc<dyn VoiceProvider>,
}

impl CredentialService {
    pub fn new(
        credential_repo: Arc<dyn CredentialRepository>,
        provider: Arc<dyn VoiceProvider>,
    ) -> Self {
        Self {
            credential_repo,
            provider,
        }
    }
}

#[async_trait]
pub trait CredentialServiceApi: Send + Sync {
    /// Validate a submitted key against the provider and persist it with the
    /// reported quota. Keys that fail validation are rejected, not stored.
    async fn create_credential(
        &self,
        user_id: Uuid,
        request: CreateCredentialRequest,
    ) -> Result<CredentialResponse, CredentialServiceError>;

    /// List the user's credentials, secret material masked.
    async fn list_credentials(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<CredentialResponse>, CredentialServiceError>;

    async fn set_active(
        &self,
        user_id: Uuid,
        credential_id: Uuid,
        is_active: bool,
    ) -> Result<CredentialResponse, CredentialServiceError>;

    async fn delete_credential(
        &self,
        user_id: Uuid,
        credential_id: Uuid,
    ) -> Result<(), CredentialServiceError>;
}

#[async_trait]
impl CredentialServiceApi for CredentialService {
    async fn create_credential(
        &self,
        user_id: Uuid,
        request: CreateCredentialRequest,
    ) -> Result<CredentialResponse, CredentialServiceError> {
        let key = request.key.trim();
        if key.is_empty() {
            return Err(CredentialServiceError::Invalid(
                "API key cannot be empty".to_string(),
            ));
        }
        if request.name.trim().is_empty() {
            return Err(CredentialServiceError::Invalid(
                "Credential name cannot be empty".to_string(),
            ));
        }

        let quota = self
            .provider
            .validate_key(key)
            .await
            .map_err(|e| CredentialServiceError::Invalid(format!("Key validation failed: {}", e)))?;

        let credential = self
            .credential_repo
            .create(user_id, key, request.name.trim(), Some(quota))
            .await
            .map_err(|e| CredentialServiceError::Dependency(e.to_string()))?;

        tracing::info!(
            user_id = %user_id,
            credential_id = %credential.id,
            quota_remaining = quota,
            "Credential registered"
        );

        Ok(credential.into())
    }

    async fn list_credentials(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<CredentialResponse>, CredentialServiceError> {
        let credentials = self
            .credential_repo
            .list_for_user(user_id)
            .await
            .map_err(|e| CredentialServiceError::Dependency(e.to_string()))?;

        Ok(credentials.into_iter().map(CredentialResponse::from).collect())
    }

    async fn set_active(
        &self,
        user_id: Uuid,
        credential_id: Uuid,
        is_active: bool,
    ) -> Result<CredentialResponse, CredentialServiceError> {
        self.verify_ownership(credential_id, user_id).await?;

        let credential = self
            .credential_repo
            .set_active(credential_id, is_active)
            .await
            .map_err(|e| CredentialServiceError::Dependency(e.to_string()))?;

        Ok(credential.into())
    }

    async fn delete_credential(
        &self,
        user_id: Uuid,
        credential_id: Uuid,
    ) -> Result<(), CredentialServiceError> {
        self.verify_ownership(credential_id, user_id).await?;

        self.credential_repo
            .delete(credential_id)
            .await
            .map_err(|e| CredentialServiceError::Dependency(e.to_string()))?;

        Ok(())
    }
}

impl CredentialService {
    async fn verify_ownership(
        &self,
        credential_id: Uuid,
        user_id: Uuid,
    ) -> Result<Credential, CredentialServiceError> {
        let credential = self
            .credential_repo
            .find_by_id(credential_id)
            .await
            .map_err(|e| CredentialServiceError::Dependency(e.to_string()))?
            .ok_or(CredentialServiceError::NotFound)?;

        if credential.user_id != user_id {
            return Err(CredentialServiceError::NotFound);
        }

        Ok(credential)
    }
}
