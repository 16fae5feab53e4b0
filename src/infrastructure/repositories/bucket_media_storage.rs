use super::media_storage::{MediaStorage, StorageError};
use async_trait::async_trait;

/// Object storage client for the hosted bucket API.
///
/// Writes go to `/object/{bucket}/{key}` with `x-upsert: true`, matching the
/// orchestrator's idempotent-retry contract; reads use the public object path.
pub struct BucketMediaStorage {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    service_key: String,
}

impl BucketMediaStorage {
    pub fn new(base_url: String, bucket: String, service_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket,
            service_key,
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/object/{}/{}", self.base_url, self.bucket, key)
    }
}

#[async_trait]
impl MediaStorage for BucketMediaStorage {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let size = bytes.len();

        let response = self
            .client
            .put(self.object_url(key))
            .bearer_auth(&self.service_key)
            .header("content-type", content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::Failed(format!("upload request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Failed(format!(
                "upload of {} returned {}: {}",
                key, status, body
            )));
        }

        tracing::info!(key = key, size_bytes = size, "Media object stored");

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let response = self
            .client
            .delete(self.object_url(key))
            .bearer_auth(&self.service_key)
            .send()
            .await
            .map_err(|e| StorageError::Failed(format!("delete request failed: {}", e)))?;

        // Missing objects are fine: reset must be idempotent.
        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            let status = response.status();
            return Err(StorageError::Failed(format!(
                "delete of {} returned {}",
                key, status
            )));
        }

        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/object/public/{}/{}", self.base_url, self.bucket, key)
    }
}
