pub mod bucket_media_storage;
pub mod content_extractor;
pub mod credential_repository;
pub mod http_content_extractor;
pub mod http_voice_provider;
pub mod media_storage;
pub mod project_repository;
pub mod voice_provider;

pub use bucket_media_storage::BucketMediaStorage;
pub use content_extractor::{ContentExtractor, ExtractionError};
pub use credential_repository::{CredentialRepository, PgCredentialRepository};
pub use http_content_extractor::HttpContentExtractor;
pub use http_voice_provider::HttpVoiceProvider;
pub use media_storage::{MediaStorage, StorageError};
pub use project_repository::{NewProject, PgProjectRepository, ProjectRepository};
pub use voice_provider::{ConversionState, ProviderError, VoiceProvider};
