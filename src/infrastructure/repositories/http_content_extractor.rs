use super::content_extractor::{ContentExtractor, ExtractionError};
use async_trait::async_trait;
use html2text::from_read;

/// Fetches remote sources over HTTP and reduces them to plain text.
pub struct HttpContentExtractor {
    client: reqwest::Client,
}

impl HttpContentExtractor {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn fetch(&self, url: &str) -> Result<(String, String), ExtractionError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ExtractionError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ExtractionError::Fetch(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        let body = response
            .text()
            .await
            .map_err(|e| ExtractionError::Fetch(e.to_string()))?;

        Ok((body, content_type))
    }

    fn to_text(body: &str, mime_type: &str) -> Result<String, ExtractionError> {
        let text = if mime_type.contains("html") {
            from_read(body.as_bytes(), usize::MAX)
        } else if mime_type.starts_with("text/") {
            body.to_string()
        } else {
            return Err(ExtractionError::Unsupported(mime_type.to_string()));
        };

        if text.trim().is_empty() {
            return Err(ExtractionError::Empty);
        }

        Ok(text)
    }
}

impl Default for HttpContentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for HttpContentExtractor {
    async fn extract_url(&self, url: &str) -> Result<String, ExtractionError> {
        let (body, content_type) = self.fetch(url).await?;
        Self::to_text(&body, &content_type)
    }

    async fn extract_file(
        &self,
        file_url: &str,
        mime_type: &str,
    ) -> Result<String, ExtractionError> {
        let (body, _) = self.fetch(file_url).await?;
        // Trust the declared MIME type over whatever the bucket reports.
        Self::to_text(&body, mime_type)
    }
}
