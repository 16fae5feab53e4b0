use super::error::GenerationError;
use super::{audio_key, video_key, AUDIO_CONTENT_TYPE, VIDEO_CONTENT_TYPE};
use crate::domain::credential::{Credential, CredentialServiceError, KeySelector};
use crate::domain::project::{Project, ProjectStatus};
use crate::domain::status::StatusChannel;
use crate::infrastructure::repositories::{
    ConversionState, MediaStorage, ProjectRepository, ProviderError, VoiceProvider,
};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Spoken when a project has no script at all.
const DEFAULT_SCRIPT: &str =
    "Welcome to this episode. The script for this podcast has not been written yet, \
     so enjoy this short placeholder narration.";

const DEFAULT_VOICE: &str = "narrator-1";

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    /// Credential fallback budget per provider step.
    pub credential_attempts: u32,
    /// Fixed interval between conversion status polls.
    pub poll_interval: Duration,
    /// Bounded number of polls before the attempt is abandoned.
    pub poll_max_attempts: u32,
    /// How long a generation lease stays valid. An evicted worker's lease
    /// expires and the next trigger can reclaim the project.
    pub lease_ttl: chrono::Duration,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            credential_attempts: 3,
            poll_interval: Duration::from_secs(10),
            poll_max_attempts: 30,
            lease_ttl: chrono::Duration::minutes(10),
        }
    }
}

/// Drives a project from draft (or completed, on regeneration) through
/// synthesis, conversion and upload to completed, or rolls it back to draft.
///
/// The caller gets an acknowledgement as soon as the lease is claimed; the
/// attempt itself runs as a detached task and reports through the status
/// channel and the project row.
pub struct GenerationService {
    project_repo: Arc<dyn ProjectRepository>,
    selector: Arc<KeySelector>,
    provider: Arc<dyn VoiceProvider>,
    storage: Arc<dyn MediaStorage>,
    channel: Arc<StatusChannel>,
    settings: GenerationSettings,
}

impl GenerationService {
    pub fn new(
        project_repo: Arc<dyn ProjectRepository>,
        selector: Arc<KeySelector>,
        provider: Arc<dyn VoiceProvider>,
        storage: Arc<dyn MediaStorage>,
        channel: Arc<StatusChannel>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            project_repo,
            selector,
            provider,
            storage,
            channel,
            settings,
        }
    }

    /// Validate ownership, claim the generation lease and spawn the attempt.
    /// Returns once the project is in processing; the attempt continues in
    /// the background.
    pub async fn start_generation(
        self: &Arc<Self>,
        user_id: Uuid,
        project_id: Uuid,
        character_controls: Option<serde_json::Value>,
    ) -> Result<(), GenerationError> {
        let project = self
            .project_repo
            .find_by_id(project_id)
            .await
            .map_err(|e| GenerationError::Dependency(e.to_string()))?
            .ok_or(GenerationError::NotFound)?;

        if project.user_id != user_id {
            return Err(GenerationError::Forbidden);
        }

        let lease = Uuid::new_v4();
        let expires_at = Utc::now() + self.settings.lease_ttl;

        let claimed = self
            .project_repo
            .begin_generation(project_id, lease, expires_at)
            .await
            .map_err(|e| GenerationError::Dependency(e.to_string()))?
            .ok_or(GenerationError::AlreadyRunning)?;

        tracing::info!(
            project_id = %project_id,
            user_id = %user_id,
            lease = %lease,
            "Generation attempt claimed"
        );

        self.channel
            .publish(project_id, ProjectStatus::Processing, None);

        let service = Arc::clone(self);
        tokio::spawn(async move {
            service.run_attempt(claimed, lease, character_controls).await;
        });

        Ok(())
    }

    /// Run the generation attempt to Complete or Fail and persist the outcome.
    pub async fn run_attempt(
        &self,
        project: Project,
        lease: Uuid,
        character_controls: Option<serde_json::Value>,
    ) {
        let project_id = project.id;
        let result = self.run_pipeline(&project, character_controls).await;

        match result {
            Ok(()) => match self.project_repo.complete_generation(project_id, lease).await {
                Ok(true) => {
                    tracing::info!(project_id = %project_id, "Generation completed");
                    self.channel
                        .publish(project_id, ProjectStatus::Completed, None);
                }
                Ok(false) => {
                    // A newer attempt reclaimed the lease; let it own the outcome.
                    tracing::warn!(
                        project_id = %project_id,
                        lease = %lease,
                        "Lease superseded before completion, dropping result"
                    );
                }
                Err(e) => {
                    tracing::error!(project_id = %project_id, error = %e, "Failed to persist completion");
                }
            },
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(project_id = %project_id, error = %message, "Generation failed, rolling back to draft");

                match self
                    .project_repo
                    .fail_generation(project_id, lease, &message)
                    .await
                {
                    Ok(true) => {
                        self.channel
                            .publish(project_id, ProjectStatus::Draft, Some(message));
                    }
                    Ok(false) => {
                        tracing::warn!(
                            project_id = %project_id,
                            lease = %lease,
                            "Lease superseded before rollback"
                        );
                    }
                    Err(persist_err) => {
                        tracing::error!(
                            project_id = %project_id,
                            error = %persist_err,
                            "Failed to persist rollback"
                        );
                    }
                }
            }
        }
    }

    async fn run_pipeline(
        &self,
        project: &Project,
        character_controls: Option<serde_json::Value>,
    ) -> Result<(), GenerationError> {
        let script = project
            .script
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SCRIPT)
            .to_string();

        let avatar_id = project
            .selected_hosts
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_VOICE.to_string());

        let voice_id = character_controls
            .as_ref()
            .and_then(|c| c.get("voiceId"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| avatar_id.clone());

        // Synthesize audio, rotating credentials on quota errors.
        let audio = {
            let provider = self.provider.clone();
            let script = script.clone();
            let voice_id = voice_id.clone();
            self.with_credential_fallback(project.user_id, "synthesize_audio", move |cred| {
                let provider = provider.clone();
                let script = script.clone();
                let voice_id = voice_id.clone();
                async move {
                    provider
                        .synthesize_speech(&cred.key, &script, &voice_id)
                        .await
                }
            })
            .await?
        };

        self.storage
            .upload(&audio_key(project.id), audio.clone(), AUDIO_CONTENT_TYPE)
            .await
            .map_err(|e| GenerationError::Storage(e.to_string()))?;

        // The conversion workflow gets its own fallback budget: the audio
        // step may already have rotated away from the credential it used.
        let video = {
            let audio = Arc::new(audio);
            self.with_credential_fallback(project.user_id, "convert_video", move |cred| {
                let audio = Arc::clone(&audio);
                let avatar_id = avatar_id.clone();
                let this = self;
                async move { this.convert_video(&cred.key, &avatar_id, &audio).await }
            })
            .await?
        };

        self.storage
            .upload(&video_key(project.id), video, VIDEO_CONTENT_TYPE)
            .await
            .map_err(|e| GenerationError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Three-call conversion workflow plus the bounded status poll.
    async fn convert_video(
        &self,
        key: &str,
        avatar_id: &str,
        audio: &[u8],
    ) -> Result<Vec<u8>, ProviderError> {
        let session_id = self.provider.create_conversion(key, avatar_id).await?;
        self.provider
            .upload_conversion_audio(key, &session_id, audio)
            .await?;
        self.provider.start_conversion(key, &session_id).await?;

        for poll in 1..=self.settings.poll_max_attempts {
            match self.provider.conversion_state(key, &session_id).await? {
                ConversionState::Completed { video_url } => {
                    let video = self.provider.download_video(&video_url).await?;
                    if video.is_empty() {
                        return Err(ProviderError::Failed(
                            "provider returned an empty video payload".to_string(),
                        ));
                    }
                    return Ok(video);
                }
                ConversionState::Failed { reason } => {
                    return Err(ProviderError::Failed(format!(
                        "conversion failed: {}",
                        reason
                    )));
                }
                ConversionState::Pending => {
                    tracing::debug!(
                        session_id = %session_id,
                        poll = poll,
                        "Conversion still pending"
                    );
                    if poll < self.settings.poll_max_attempts {
                        tokio::time::sleep(self.settings.poll_interval).await;
                    }
                }
            }
        }

        Err(ProviderError::Failed(format!(
            "conversion did not complete within {} polls",
            self.settings.poll_max_attempts
        )))
    }

    /// Run one provider step with credential rotation: a quota response
    /// exhausts the current credential and moves on to the next, up to the
    /// configured budget. Any other provider error is fatal for the attempt.
    async fn with_credential_fallback<T, F, Fut>(
        &self,
        user_id: Uuid,
        step: &str,
        op: F,
    ) -> Result<T, GenerationError>
    where
        F: Fn(Credential) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        for attempt in 1..=self.settings.credential_attempts {
            let credential = self.selector.select_key(user_id).await?;

            match op(credential.clone()).await {
                Ok(value) => return Ok(value),
                Err(ProviderError::QuotaExceeded) => {
                    tracing::warn!(
                        step = step,
                        attempt = attempt,
                        credential_id = %credential.id,
                        "Provider reported quota exhaustion, rotating credential"
                    );
                    self.selector.mark_exhausted(credential.id).await?;
                }
                Err(ProviderError::Failed(message)) => {
                    return Err(GenerationError::Provider(message));
                }
            }
        }

        Err(GenerationError::Credentials(
            CredentialServiceError::AllExhausted,
        ))
    }
}
