pub mod error;
pub mod model;
pub mod selector;
pub mod service;

pub use error::CredentialServiceError;
pub use model::{Credential, CredentialResponse};
pub use selector::KeySelector;
pub use service::{CredentialService, CredentialServiceApi};

use serde::{Deserialize, Serialize};

/// Request to register a new provider API key
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCredentialRequest {
    pub key: String,
    pub name: String,
}

/// Request to toggle a credential's active flag
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateCredentialRequest {
    pub is_active: bool,
}
