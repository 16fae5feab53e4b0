use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::credential::{
    CreateCredentialRequest, CredentialResponse, CredentialService, CredentialServiceApi,
    UpdateCredentialRequest,
};
use crate::{error::AppResult, infrastructure::auth::AuthUser};

pub struct CredentialController {
    credential_service: Arc<CredentialService>,
}

impl CredentialController {
    pub fn new(credential_service: Arc<CredentialService>) -> Self {
        Self { credential_service }
    }

    /// GET /api/credentials - List credentials (keys masked)
    pub async fn list_credentials(
        State(controller): State<Arc<CredentialController>>,
        Extension(auth_user): Extension<AuthUser>,
    ) -> AppResult<Json<Vec<CredentialResponse>>> {
        let credentials = controller
            .credential_service
            .list_credentials(auth_user.user_id)
            .await?;
        Ok(Json(credentials))
    }

    /// POST /api/credentials - Register a provider API key
    pub async fn create_credential(
        State(controller): State<Arc<CredentialController>>,
        Extension(auth_user): Extension<AuthUser>,
        Json(request): Json<CreateCredentialRequest>,
    ) -> AppResult<(StatusCode, Json<CredentialResponse>)> {
        let credential = controller
            .credential_service
            .create_credential(auth_user.user_id, request)
            .await?;
        Ok((StatusCode::CREATED, Json(credential)))
    }

    /// PATCH /api/credentials/{credentialId} - Toggle active flag
    pub async fn update_credential(
        State(controller): State<Arc<CredentialController>>,
        Extension(auth_user): Extension<AuthUser>,
        Path(credential_id): Path<Uuid>,
        Json(request): Json<UpdateCredentialRequest>,
    ) -> AppResult<Json<CredentialResponse>> {
        let credential = controller
            .credential_service
            .set_active(auth_user.user_id, credential_id, request.is_active)
            .await?;
        Ok(Json(credential))
    }

    /// DELETE /api/credentials/{credentialId}
    pub async fn delete_credential(
        State(controller): State<Arc<CredentialController>>,
        Extension(auth_user): Extension<AuthUser>,
        Path(credential_id): Path<Uuid>,
    ) -> AppResult<StatusCode> {
        controller
            .credential_service
            .delete_credential(auth_user.user_id, credential_id)
            .await?;
        Ok(StatusCode::NO_CONTENT)
    }
}
