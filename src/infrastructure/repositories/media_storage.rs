use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage error: {0}")]
    Failed(String),
}

/// Seam over the object storage bucket holding generated media.
///
/// Uploads are upserts: re-running generation for the same project replaces
/// both artifacts byte for byte under the same keys.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Public URL for a stored object (bucket public path + key).
    fn public_url(&self, key: &str) -> String;
}
