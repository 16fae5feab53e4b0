use super::model::{NormalizedScript, ScriptOrigin, ScriptSource};
use crate::infrastructure::repositories::ContentExtractor;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Reduces any of the three script input modalities to plain text suitable
/// for speech synthesis.
///
/// This component never fails: extraction problems degrade to a placeholder
/// script tagged `ScriptOrigin::Placeholder`, so downstream generation is
/// never blocked on a bad source.
pub struct ContentNormalizer {
    extractor: Arc<dyn ContentExtractor>,
    cache: Option<Cache<String, NormalizedScript>>,
}

impl ContentNormalizer {
    pub fn new(extractor: Arc<dyn ContentExtractor>, cache_enabled: bool) -> Self {
        let cache = if cache_enabled {
            Some(
                Cache::builder()
                    .max_capacity(100)
                    .time_to_idle(Duration::from_secs(30 * 60)) // 30 minutes, refreshes on access
                    .build(),
            )
        } else {
            None
        };

        Self { extractor, cache }
    }

    pub async fn normalize(&self, source: ScriptSource) -> NormalizedScript {
        match source {
            ScriptSource::Text(text) => NormalizedScript {
                text: text.trim().to_string(),
                origin: ScriptOrigin::Verbatim,
            },
            ScriptSource::Url(url) => {
                if let Some(cache) = &self.cache {
                    if let Some(hit) = cache.get(&url).await {
                        tracing::debug!(url = %url, "Extraction cache hit");
                        return hit;
                    }
                }

                let result = match self.extractor.extract_url(&url).await {
                    Ok(raw) => NormalizedScript {
                        text: Self::clean_text(&raw),
                        origin: ScriptOrigin::Extracted,
                    },
                    Err(e) => {
                        tracing::warn!(url = %url, error = %e, "URL extraction failed, degrading to placeholder");
                        Self::placeholder(&url)
                    }
                };

                if let Some(cache) = &self.cache {
                    if result.origin == ScriptOrigin::Extracted {
                        cache.insert(url, result.clone()).await;
                    }
                }

                result
            }
            ScriptSource::File { url, mime_type } => {
                match self.extractor.extract_file(&url, &mime_type).await {
                    Ok(raw) => NormalizedScript {
                        text: Self::clean_text(&raw),
                        origin: ScriptOrigin::Extracted,
                    },
                    Err(e) => {
                        tracing::warn!(
                            file_url = %url,
                            mime_type = %mime_type,
                            error = %e,
                            "File extraction failed, degrading to placeholder"
                        );
                        Self::placeholder(&url)
                    }
                }
            }
        }
    }

    fn placeholder(source: &str) -> NormalizedScript {
        NormalizedScript {
            text: format!(
                "We could not read the content from {}. \
                 Please paste your script text directly.",
                source
            ),
            origin: ScriptOrigin::Placeholder,
        }
    }

    /// Strip leftover URLs and normalize whitespace in extracted text.
    fn clean_text(text: &str) -> String {
        let url_pattern = regex::Regex::new(r"https?://[^\s]+").unwrap();
        let without_urls = url_pattern.replace_all(text, "");

        let whitespace_pattern = regex::Regex::new(r"\s+").unwrap();
        let normalized = whitespace_pattern.replace_all(&without_urls, " ");

        normalized.trim().to_string()
    }
}
