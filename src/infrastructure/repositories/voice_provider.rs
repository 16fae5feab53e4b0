use async_trait::async_trait;

/// Errors from the voice/video provider. Quota exhaustion is its own variant
/// because the orchestrator recovers from it by credential fallback, while
/// everything else is fatal for the current attempt.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider quota exhausted")]
    QuotaExceeded,
    #[error("provider error: {0}")]
    Failed(String),
}

/// Where a lip-sync conversion session currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionState {
    Pending,
    Completed { video_url: String },
    Failed { reason: String },
}

/// Seam over the external text-to-speech / lip-sync video vendor.
///
/// Implementations handle endpoint paths, authentication headers and error
/// body decoding; callers see only the six workflow operations.
#[async_trait]
pub trait VoiceProvider: Send + Sync {
    /// Validate an API key and return the remaining quota it reports.
    async fn validate_key(&self, key: &str) -> Result<i64, ProviderError>;

    /// Synthesize MP3 speech for a script with the given voice.
    async fn synthesize_speech(
        &self,
        key: &str,
        text: &str,
        voice_id: &str,
    ) -> Result<Vec<u8>, ProviderError>;

    /// Open a lip-sync conversion session for an avatar. Returns session id.
    async fn create_conversion(&self, key: &str, avatar_id: &str)
        -> Result<String, ProviderError>;

    /// Attach the synthesized audio to the session.
    async fn upload_conversion_audio(
        &self,
        key: &str,
        session_id: &str,
        audio: &[u8],
    ) -> Result<(), ProviderError>;

    /// Kick off the conversion.
    async fn start_conversion(&self, key: &str, session_id: &str) -> Result<(), ProviderError>;

    /// Poll the conversion once.
    async fn conversion_state(
        &self,
        key: &str,
        session_id: &str,
    ) -> Result<ConversionState, ProviderError>;

    /// Fetch the finished video from the provider's result URL.
    async fn download_video(&self, url: &str) -> Result<Vec<u8>, ProviderError>;
}
