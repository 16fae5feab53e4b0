use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("unsupported content type: {0}")]
    Unsupported(String),
    #[error("no readable text found")]
    Empty,
}

/// Seam for turning a remote source (page URL or uploaded file) into plain
/// text. The Content Normalizer owns the never-fail policy; implementations
/// here report failures honestly.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract_url(&self, url: &str) -> Result<String, ExtractionError>;

    async fn extract_file(&self, file_url: &str, mime_type: &str)
        -> Result<String, ExtractionError>;
}
