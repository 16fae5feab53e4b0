//! In-memory implementations of the persistence and provider seams, plus a
//! scripted provider for driving the orchestrator through failure paths.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use uuid::Uuid;

use voicesync_backend::domain::credential::Credential;
use voicesync_backend::domain::project::{Project, ProjectStatus};
use voicesync_backend::error::AppResult;
use voicesync_backend::infrastructure::repositories::{
    ConversionState, CredentialRepository, MediaStorage, NewProject, ProjectRepository,
    ProviderError, StorageError, VoiceProvider,
};

// ---------------------------------------------------------------------------
// Projects

pub struct InMemoryProjects {
    rows: Mutex<HashMap<Uuid, Project>>,
}

impl InMemoryProjects {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, project: Project) {
        self.rows.lock().insert(project.id, project);
    }

    pub fn get(&self, id: Uuid) -> Project {
        self.rows.lock().get(&id).cloned().expect("project exists")
    }
}

#[async_trait]
impl ProjectRepository for InMemoryProjects {
    async fn create(&self, new: NewProject) -> AppResult<Project> {
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            title: new.title,
            description: new.description,
            script: new.script,
            selected_hosts: new.selected_hosts,
            selected_template: new.selected_template,
            selected_language: new.selected_language,
            status: ProjectStatus::Draft,
            error_message: None,
            lease_token: None,
            lease_expires_at: None,
            created_at: now,
            updated_at: now,
        };
        self.insert(project.clone());
        Ok(project)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Project>> {
        Ok(self.rows.lock().get(&id).cloned())
    }

    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<Project>> {
        Ok(self
            .rows
            .lock()
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_script(&self, id: Uuid, script: &str) -> AppResult<Project> {
        let mut rows = self.rows.lock();
        let project = rows.get_mut(&id).expect("project exists");
        project.script = Some(script.to_string());
        project.updated_at = Utc::now();
        Ok(project.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.rows.lock().remove(&id);
        Ok(())
    }

    async fn begin_generation(
        &self,
        id: Uuid,
        lease: Uuid,
        expires_at: DateTime<Utc>,
    ) -> AppResult<Option<Project>> {
        let mut rows = self.rows.lock();
        let Some(project) = rows.get_mut(&id) else {
            return Ok(None);
        };

        let now = Utc::now();
        let claimable = project.status.can_start_generation()
            || (project.status == ProjectStatus::Processing
                && project.lease_expires_at.map_or(false, |e| e < now));

        if !claimable {
            return Ok(None);
        }

        project.status = ProjectStatus::Processing;
        project.lease_token = Some(lease);
        project.lease_expires_at = Some(expires_at);
        project.error_message = None;
        project.updated_at = now;
        Ok(Some(project.clone()))
    }

    async fn complete_generation(&self, id: Uuid, lease: Uuid) -> AppResult<bool> {
        let mut rows = self.rows.lock();
        let Some(project) = rows.get_mut(&id) else {
            return Ok(false);
        };
        if project.status != ProjectStatus::Processing || project.lease_token != Some(lease) {
            return Ok(false);
        }
        project.status = ProjectStatus::Completed;
        project.lease_token = None;
        project.lease_expires_at = None;
        project.error_message = None;
        project.updated_at = Utc::now();
        Ok(true)
    }

    async fn fail_generation(&self, id: Uuid, lease: Uuid, error: &str) -> AppResult<bool> {
        let mut rows = self.rows.lock();
        let Some(project) = rows.get_mut(&id) else {
            return Ok(false);
        };
        if project.status != ProjectStatus::Processing || project.lease_token != Some(lease) {
            return Ok(false);
        }
        project.status = ProjectStatus::Draft;
        project.lease_token = None;
        project.lease_expires_at = None;
        project.error_message = Some(error.to_string());
        project.updated_at = Utc::now();
        Ok(true)
    }

    async fn reset(&self, id: Uuid) -> AppResult<Project> {
        let mut rows = self.rows.lock();
        let project = rows.get_mut(&id).expect("project exists");
        project.status = ProjectStatus::Draft;
        project.lease_token = None;
        project.lease_expires_at = None;
        project.error_message = None;
        project.updated_at = Utc::now();
        Ok(project.clone())
    }
}

// ---------------------------------------------------------------------------
// Credentials

pub struct InMemoryCredentials {
    rows: Mutex<Vec<Credential>>,
}

impl InMemoryCredentials {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
        }
    }

    pub fn insert(&self, credential: Credential) {
        self.rows.lock().push(credential);
    }

    pub fn get_by_key(&self, key: &str) -> Credential {
        self.rows
            .lock()
            .iter()
            .find(|c| c.key == key)
            .cloned()
            .expect("credential exists")
    }
}

#[async_trait]
impl CredentialRepository for InMemoryCredentials {
    async fn create(
        &self,
        user_id: Uuid,
        key: &str,
        name: &str,
        quota_remaining: Option<i64>,
    ) -> AppResult<Credential> {
        let now = Utc::now();
        let credential = Credential {
            id: Uuid::new_v4(),
            user_id,
            key: key.to_string(),
            name: name.to_string(),
            is_active: true,
            quota_remaining,
            last_used: None,
            created_at: now,
            updated_at: now,
        };
        self.insert(credential.clone());
        Ok(credential)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Credential>> {
        Ok(self.rows.lock().iter().find(|c| c.id == id).cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Credential>> {
        let mut rows: Vec<Credential> = self
            .rows
            .lock()
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.created_at);
        Ok(rows)
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<Credential> {
        let mut rows = self.rows.lock();
        let row = rows.iter_mut().find(|c| c.id == id).expect("credential");
        row.is_active = is_active;
        Ok(row.clone())
    }

    async fn mark_exhausted(&self, id: Uuid) -> AppResult<()> {
        let mut rows = self.rows.lock();
        if let Some(row) = rows.iter_mut().find(|c| c.id == id) {
            row.is_active = false;
            row.quota_remaining = Some(0);
        }
        Ok(())
    }

    async fn reactivate(&self, id: Uuid, quota_remaining: i64) -> AppResult<()> {
        let mut rows = self.rows.lock();
        if let Some(row) = rows.iter_mut().find(|c| c.id == id) {
            row.is_active = true;
            row.quota_remaining = Some(quota_remaining);
        }
        Ok(())
    }

    async fn touch_last_used(&self, id: Uuid) -> AppResult<()> {
        let mut rows = self.rows.lock();
        if let Some(row) = rows.iter_mut().find(|c| c.id == id) {
            row.last_used = Some(Utc::now());
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.rows.lock().retain(|c| c.id != id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Storage

pub struct InMemoryStorage {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
        }
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().get(key).map(|(bytes, _)| bytes.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }
}

#[async_trait]
impl MediaStorage for InMemoryStorage {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.objects
            .lock()
            .insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects.lock().remove(key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("mem://bucket/{}", key)
    }
}

// ---------------------------------------------------------------------------
// Provider

/// Per-key behavior for one provider step.
#[derive(Debug, Clone)]
pub enum Step {
    Succeed,
    Quota,
    Fail(&'static str),
}

/// Scripted vendor: behavior is keyed by API key so tests can exercise the
/// credential fallback loop.
pub struct ScriptedProvider {
    pub quotas: Mutex<HashMap<String, i64>>,
    pub speech_steps: Mutex<HashMap<String, Step>>,
    pub conversion_steps: Mutex<HashMap<String, Step>>,
    /// Number of Pending responses before the conversion reports completed.
    pub pending_polls: AtomicU32,
    pub video_bytes: Mutex<Vec<u8>>,
    pub speech_calls: AtomicU32,
    pub poll_calls: AtomicU32,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            quotas: Mutex::new(HashMap::new()),
            speech_steps: Mutex::new(HashMap::new()),
            conversion_steps: Mutex::new(HashMap::new()),
            pending_polls: AtomicU32::new(0),
            video_bytes: Mutex::new(b"video-payload".to_vec()),
            speech_calls: AtomicU32::new(0),
            poll_calls: AtomicU32::new(0),
        }
    }

    pub fn set_speech(&self, key: &str, step: Step) {
        self.speech_steps.lock().insert(key.to_string(), step);
    }

    pub fn set_conversion(&self, key: &str, step: Step) {
        self.conversion_steps.lock().insert(key.to_string(), step);
    }

    pub fn set_quota(&self, key: &str, quota: i64) {
        self.quotas.lock().insert(key.to_string(), quota);
    }

    pub fn set_video(&self, bytes: Vec<u8>) {
        *self.video_bytes.lock() = bytes;
    }

    fn step_result(step: Option<Step>) -> Result<(), ProviderError> {
        match step.unwrap_or(Step::Succeed) {
            Step::Succeed => Ok(()),
            Step::Quota => Err(ProviderError::QuotaExceeded),
            Step::Fail(msg) => Err(ProviderError::Failed(msg.to_string())),
        }
    }
}

#[async_trait]
impl VoiceProvider for ScriptedProvider {
    async fn validate_key(&self, key: &str) -> Result<i64, ProviderError> {
        match self.quotas.lock().get(key) {
            Some(q) => Ok(*q),
            None => Err(ProviderError::Failed("unknown key".to_string())),
        }
    }

    async fn synthesize_speech(
        &self,
        key: &str,
        text: &str,
        _voice_id: &str,
    ) -> Result<Vec<u8>, ProviderError> {
        self.speech_calls.fetch_add(1, Ordering::SeqCst);
        Self::step_result(self.speech_steps.lock().get(key).cloned())?;
        Ok(format!("audio:{}", text.len()).into_bytes())
    }

    async fn create_conversion(
        &self,
        key: &str,
        _avatar_id: &str,
    ) -> Result<String, ProviderError> {
        Self::step_result(self.conversion_steps.lock().get(key).cloned())?;
        Ok("session-1".to_string())
    }

    async fn upload_conversion_audio(
        &self,
        _key: &str,
        _session_id: &str,
        _audio: &[u8],
    ) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn start_conversion(&self, _key: &str, _session_id: &str) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn conversion_state(
        &self,
        _key: &str,
        _session_id: &str,
    ) -> Result<ConversionState, ProviderError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.pending_polls.load(Ordering::SeqCst);
        if remaining > 0 {
            self.pending_polls.fetch_sub(1, Ordering::SeqCst);
            return Ok(ConversionState::Pending);
        }
        Ok(ConversionState::Completed {
            video_url: "https://provider/result/session-1".to_string(),
        })
    }

    async fn download_video(&self, _url: &str) -> Result<Vec<u8>, ProviderError> {
        Ok(self.video_bytes.lock().clone())
    }
}

// ---------------------------------------------------------------------------
// Fixtures

pub fn draft_project(user_id: Uuid, script: Option<&str>) -> Project {
    let now = Utc::now();
    Project {
        id: Uuid::new_v4(),
        user_id,
        title: "Morning briefing".to_string(),
        description: None,
        script: script.map(str::to_string),
        selected_hosts: vec!["avatar-emma".to_string()],
        selected_template: Some("studio".to_string()),
        selected_language: "en".to_string(),
        status: ProjectStatus::Draft,
        error_message: None,
        lease_token: None,
        lease_expires_at: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn active_credential(user_id: Uuid, key: &str, quota: Option<i64>) -> Credential {
    let now = Utc::now();
    Credential {
        id: Uuid::new_v4(),
        user_id,
        key: key.to_string(),
        name: key.to_string(),
        is_active: true,
        quota_remaining: quota,
        last_used: None,
        created_at: now,
        updated_at: now,
    }
}
