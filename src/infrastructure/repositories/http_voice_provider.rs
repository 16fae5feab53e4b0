use super::voice_provider::{ConversionState, ProviderError, VoiceProvider};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

const API_KEY_HEADER: &str = "x-api-key";

/// HTTP client for the voice/video vendor API.
///
/// Workflow: one-shot speech synthesis, then a three-call lip-sync session
/// (create, attach audio, start) polled by the orchestrator.
pub struct HttpVoiceProvider {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct QuotaResponse {
    quota_remaining: i64,
}

#[derive(Debug, Deserialize)]
struct CreateConversionResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ConversionStatusResponse {
    status: String,
    video_url: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    code: Option<String>,
    message: Option<String>,
}

impl HttpVoiceProvider {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Decode a non-2xx response into a ProviderError, distinguishing quota
    /// exhaustion (HTTP 402/429 or a quota error code in the body).
    async fn decode_error(response: reqwest::Response) -> ProviderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status == StatusCode::PAYMENT_REQUIRED || status == StatusCode::TOO_MANY_REQUESTS {
            return ProviderError::QuotaExceeded;
        }

        if let Ok(parsed) = serde_json::from_str::<ProviderErrorBody>(&body) {
            if matches!(
                parsed.code.as_deref(),
                Some("quota_exceeded") | Some("rate_limited")
            ) {
                return ProviderError::QuotaExceeded;
            }
            if let Some(message) = parsed.message {
                return ProviderError::Failed(format!("{} ({})", message, status));
            }
        }

        ProviderError::Failed(format!("provider returned {}: {}", status, body))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::decode_error(response).await)
        }
    }
}

#[async_trait]
impl VoiceProvider for HttpVoiceProvider {
    async fn validate_key(&self, key: &str) -> Result<i64, ProviderError> {
        let response = self
            .client
            .get(self.url("/v1/account/quota"))
            .header(API_KEY_HEADER, key)
            .send()
            .await
            .map_err(|e| ProviderError::Failed(format!("quota check failed: {}", e)))?;

        let response = Self::check(response).await?;
        let quota: QuotaResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Failed(format!("malformed quota response: {}", e)))?;

        Ok(quota.quota_remaining)
    }

    async fn synthesize_speech(
        &self,
        key: &str,
        text: &str,
        voice_id: &str,
    ) -> Result<Vec<u8>, ProviderError> {
        let start_time = std::time::Instant::now();

        tracing::info!(
            voice_id = voice_id,
            text_length = text.len(),
            "Calling provider TTS endpoint"
        );

        let response = self
            .client
            .post(self.url("/v1/tts"))
            .header(API_KEY_HEADER, key)
            .json(&serde_json::json!({
                "text": text,
                "voice_id": voice_id,
                "format": "mp3",
            }))
            .send()
            .await
            .map_err(|e| ProviderError::Failed(format!("TTS request failed: {}", e)))?;

        let response = Self::check(response).await?;
        let audio = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Failed(format!("failed to read audio body: {}", e)))?
            .to_vec();

        tracing::info!(
            voice_id = voice_id,
            latency_ms = start_time.elapsed().as_millis(),
            audio_size_bytes = audio.len(),
            "TTS synthesis completed"
        );

        Ok(audio)
    }

    async fn create_conversion(
        &self,
        key: &str,
        avatar_id: &str,
    ) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(self.url("/v1/conversions"))
            .header(API_KEY_HEADER, key)
            .json(&serde_json::json!({ "avatar_id": avatar_id }))
            .send()
            .await
            .map_err(|e| ProviderError::Failed(format!("create conversion failed: {}", e)))?;

        let response = Self::check(response).await?;
        let created: CreateConversionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Failed(format!("malformed conversion response: {}", e)))?;

        tracing::debug!(session_id = %created.id, "Conversion session created");

        Ok(created.id)
    }

    async fn upload_conversion_audio(
        &self,
        key: &str,
        session_id: &str,
        audio: &[u8],
    ) -> Result<(), ProviderError> {
        let response = self
            .client
            .put(self.url(&format!("/v1/conversions/{}/audio", session_id)))
            .header(API_KEY_HEADER, key)
            .header("content-type", "audio/mpeg")
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| ProviderError::Failed(format!("audio upload failed: {}", e)))?;

        Self::check(response).await?;
        Ok(())
    }

    async fn start_conversion(&self, key: &str, session_id: &str) -> Result<(), ProviderError> {
        let response = self
            .client
            .post(self.url(&format!("/v1/conversions/{}/start", session_id)))
            .header(API_KEY_HEADER, key)
            .send()
            .await
            .map_err(|e| ProviderError::Failed(format!("start conversion failed: {}", e)))?;

        Self::check(response).await?;
        Ok(())
    }

    async fn conversion_state(
        &self,
        key: &str,
        session_id: &str,
    ) -> Result<ConversionState, ProviderError> {
        let response = self
            .client
            .get(self.url(&format!("/v1/conversions/{}", session_id)))
            .header(API_KEY_HEADER, key)
            .send()
            .await
            .map_err(|e| ProviderError::Failed(format!("status poll failed: {}", e)))?;

        let response = Self::check(response).await?;
        let status: ConversionStatusResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Failed(format!("malformed status response: {}", e)))?;

        match status.status.as_str() {
            "completed" => {
                let video_url = status.video_url.ok_or_else(|| {
                    ProviderError::Failed("completed conversion has no video URL".to_string())
                })?;
                Ok(ConversionState::Completed { video_url })
            }
            "failed" => Ok(ConversionState::Failed {
                reason: status
                    .error
                    .unwrap_or_else(|| "conversion failed".to_string()),
            }),
            _ => Ok(ConversionState::Pending),
        }
    }

    async fn download_video(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::Failed(format!("video download failed: {}", e)))?;

        let response = Self::check(response).await?;
        let video = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Failed(format!("failed to read video body: {}", e)))?
            .to_vec();

        Ok(video)
    }
}
