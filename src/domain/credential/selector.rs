use super::error::CredentialServiceError;
use super::model::Credential;
use crate::infrastructure::repositories::{CredentialRepository, VoiceProvider};
use std::sync::Arc;
use uuid::Uuid;

/// Picks one usable credential for a generation attempt and keeps credential
/// state consistent with the quota the provider actually reports.
pub struct KeySelector {
    credential_repo: Arc<dyn CredentialRepository>,
    provider: Arc<dyn VoiceProvider>,
}

impl KeySelector {
    pub fn new(
        credential_repo: Arc<dyn CredentialRepository>,
        provider: Arc<dyn VoiceProvider>,
    ) -> Self {
        Self {
            credential_repo,
            provider,
        }
    }

    /// Select a credential for the user.
    ///
    /// Active credentials (quota unknown or positive) win: highest known
    /// quota first, most recently created when no quota is known. With no
    /// active credential left, inactive ones are re-validated against the
    /// provider in creation order and the first with positive quota is
    /// reactivated. Validation failures mean "try the next one".
    pub async fn select_key(&self, user_id: Uuid) -> Result<Credential, CredentialServiceError> {
        let credentials = self
            .credential_repo
            .list_for_user(user_id)
            .await
            .map_err(|e| CredentialServiceError::Dependency(e.to_string()))?;

        if credentials.is_empty() {
            return Err(CredentialServiceError::NoCredentials);
        }

        let usable: Vec<&Credential> = credentials.iter().filter(|c| c.is_usable()).collect();

        if !usable.is_empty() {
            let picked = Self::pick_usable(&usable);
            self.touch(picked.id).await?;
            tracing::debug!(
                credential_id = %picked.id,
                quota_remaining = ?picked.quota_remaining,
                "Selected active credential"
            );
            return Ok(picked.clone());
        }

        // No active credential left: re-validate the rest in creation order.
        for credential in credentials.iter().filter(|c| !c.is_usable()) {
            match self.provider.validate_key(&credential.key).await {
                Ok(quota) if quota > 0 => {
                    self.credential_repo
                        .reactivate(credential.id, quota)
                        .await
                        .map_err(|e| CredentialServiceError::Dependency(e.to_string()))?;
                    self.touch(credential.id).await?;

                    tracing::info!(
                        credential_id = %credential.id,
                        quota_remaining = quota,
                        "Reactivated credential with restored quota"
                    );

                    let mut reactivated = credential.clone();
                    reactivated.is_active = true;
                    reactivated.quota_remaining = Some(quota);
                    return Ok(reactivated);
                }
                Ok(quota) => {
                    tracing::debug!(
                        credential_id = %credential.id,
                        quota_remaining = quota,
                        "Credential still exhausted"
                    );
                }
                Err(e) => {
                    // Validation failure is not fatal; the next key may work.
                    tracing::warn!(
                        credential_id = %credential.id,
                        error = %e,
                        "Credential validation failed, trying next"
                    );
                }
            }
        }

        Err(CredentialServiceError::AllExhausted)
    }

    /// Record a provider quota/rate-limit response against a credential.
    /// Idempotent: the credential ends inactive with zero quota.
    pub async fn mark_exhausted(&self, credential_id: Uuid) -> Result<(), CredentialServiceError> {
        self.credential_repo
            .mark_exhausted(credential_id)
            .await
            .map_err(|e| CredentialServiceError::Dependency(e.to_string()))?;

        tracing::info!(credential_id = %credential_id, "Credential marked exhausted");

        Ok(())
    }

    fn pick_usable<'a>(usable: &[&'a Credential]) -> &'a Credential {
        let with_known_quota = usable
            .iter()
            .copied()
            .filter(|c| c.quota_remaining.is_some())
            .max_by_key(|c| c.quota_remaining);

        match with_known_quota {
            Some(c) => c,
            // Quotas all unknown: newest credential first.
            None => usable
                .iter()
                .copied()
                .max_by_key(|c| c.created_at)
                .expect("usable set is non-empty"),
        }
    }

    async fn touch(&self, credential_id: Uuid) -> Result<(), CredentialServiceError> {
        self.credential_repo
            .touch_last_used(credential_id)
            .await
            .map_err(|e| CredentialServiceError::Dependency(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppResult;
    use crate::infrastructure::repositories::{ConversionState, ProviderError};
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct InMemoryCredentials {
        rows: Mutex<Vec<Credential>>,
    }

    impl InMemoryCredentials {
        fn new(rows: Vec<Credential>) -> Self {
            Self {
                rows: Mutex::new(rows),
            }
        }

        fn get(&self, id: Uuid) -> Credential {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.id == id)
                .cloned()
                .unwrap()
        }
    }

    #[async_trait]
    impl CredentialRepository for InMemoryCredentials {
        async fn create(
            &self,
            _user_id: Uuid,
            _key: &str,
            _name: &str,
            _quota_remaining: Option<i64>,
        ) -> AppResult<Credential> {
            unimplemented!("not used by selector tests")
        }

        async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Credential>> {
            Ok(self.rows.lock().unwrap().iter().find(|c| c.id == id).cloned())
        }

        async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Credential>> {
            let mut rows: Vec<Credential> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.user_id == user_id)
                .cloned()
                .collect();
            rows.sort_by_key(|c| c.created_at);
            Ok(rows)
        }

        async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<Credential> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows.iter_mut().find(|c| c.id == id).unwrap();
            row.is_active = is_active;
            Ok(row.clone())
        }

        async fn mark_exhausted(&self, id: Uuid) -> AppResult<()> {
            let mut rows = self.rows.lock().unwrap();
            if let Some(row) = rows.iter_mut().find(|c| c.id == id) {
                row.is_active = false;
                row.quota_remaining = Some(0);
            }
            Ok(())
        }

        async fn reactivate(&self, id: Uuid, quota_remaining: i64) -> AppResult<()> {
            let mut rows = self.rows.lock().unwrap();
            if let Some(row) = rows.iter_mut().find(|c| c.id == id) {
                row.is_active = true;
                row.quota_remaining = Some(quota_remaining);
            }
            Ok(())
        }

        async fn touch_last_used(&self, id: Uuid) -> AppResult<()> {
            let mut rows = self.rows.lock().unwrap();
            if let Some(row) = rows.iter_mut().find(|c| c.id == id) {
                row.last_used = Some(Utc::now());
            }
            Ok(())
        }

        async fn delete(&self, id: Uuid) -> AppResult<()> {
            self.rows.lock().unwrap().retain(|c| c.id != id);
            Ok(())
        }
    }

    /// Provider stub that answers validate_key from a fixed table.
    struct StubProvider {
        quotas: HashMap<String, Result<i64, String>>,
    }

    #[async_trait]
    impl VoiceProvider for StubProvider {
        async fn validate_key(&self, key: &str) -> Result<i64, ProviderError> {
            match self.quotas.get(key) {
                Some(Ok(q)) => Ok(*q),
                Some(Err(msg)) => Err(ProviderError::Failed(msg.clone())),
                None => Err(ProviderError::Failed("unknown key".to_string())),
            }
        }

        async fn synthesize_speech(
            &self,
            _key: &str,
            _text: &str,
            _voice_id: &str,
        ) -> Result<Vec<u8>, ProviderError> {
            unimplemented!("not used by selector tests")
        }

        async fn create_conversion(
            &self,
            _key: &str,
            _avatar_id: &str,
        ) -> Result<String, ProviderError> {
            unimplemented!("not used by selector tests")
        }

        async fn upload_conversion_audio(
            &self,
            _key: &str,
            _session_id: &str,
            _audio: &[u8],
        ) -> Result<(), ProviderError> {
            unimplemented!("not used by selector tests")
        }

        async fn start_conversion(
            &self,
            _key: &str,
            _session_id: &str,
        ) -> Result<(), ProviderError> {
            unimplemented!("not used by selector tests")
        }

        async fn conversion_state(
            &self,
            _key: &str,
            _session_id: &str,
        ) -> Result<ConversionState, ProviderError> {
            unimplemented!("not used by selector tests")
        }

        async fn download_video(&self, _url: &str) -> Result<Vec<u8>, ProviderError> {
            unimplemented!("not used by selector tests")
        }
    }

    fn credential(
        user_id: Uuid,
        key: &str,
        is_active: bool,
        quota: Option<i64>,
        age_minutes: i64,
    ) -> Credential {
        let created = Utc::now() - Duration::minutes(age_minutes);
        Credential {
            id: Uuid::new_v4(),
            user_id,
            key: key.to_string(),
            name: key.to_string(),
            is_active,
            quota_remaining: quota,
            last_used: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn selector(
        rows: Vec<Credential>,
        quotas: HashMap<String, Result<i64, String>>,
    ) -> (KeySelector, Arc<InMemoryCredentials>) {
        let repo = Arc::new(InMemoryCredentials::new(rows));
        let provider = Arc::new(StubProvider { quotas });
        (KeySelector::new(repo.clone(), provider), repo)
    }

    #[tokio::test]
    async fn test_no_credentials_fails() {
        let (selector, _) = selector(vec![], HashMap::new());
        let result = selector.select_key(Uuid::new_v4()).await;
        assert!(matches!(result, Err(CredentialServiceError::NoCredentials)));
    }

    #[tokio::test]
    async fn test_highest_known_quota_wins() {
        let user_id = Uuid::new_v4();
        let rows = vec![
            credential(user_id, "low", true, Some(10), 30),
            credential(user_id, "high", true, Some(500), 20),
            credential(user_id, "unknown", true, None, 10),
        ];
        let (selector, _) = selector(rows, HashMap::new());

        let picked = selector.select_key(user_id).await.unwrap();
        assert_eq!(picked.key, "high");
    }

    #[tokio::test]
    async fn test_all_unknown_quotas_picks_newest() {
        let user_id = Uuid::new_v4();
        let rows = vec![
            credential(user_id, "old", true, None, 60),
            credential(user_id, "new", true, None, 5),
        ];
        let (selector, _) = selector(rows, HashMap::new());

        let picked = selector.select_key(user_id).await.unwrap();
        assert_eq!(picked.key, "new");
    }

    #[tokio::test]
    async fn test_select_updates_last_used() {
        let user_id = Uuid::new_v4();
        let rows = vec![credential(user_id, "only", true, Some(5), 10)];
        let (selector, repo) = selector(rows, HashMap::new());

        let picked = selector.select_key(user_id).await.unwrap();
        assert!(repo.get(picked.id).last_used.is_some());
    }

    #[tokio::test]
    async fn test_reactivates_first_inactive_with_quota() {
        let user_id = Uuid::new_v4();
        let rows = vec![
            credential(user_id, "dead", false, Some(0), 40),
            credential(user_id, "revivable", false, Some(0), 30),
        ];
        let mut quotas = HashMap::new();
        quotas.insert("dead".to_string(), Ok(0));
        quotas.insert("revivable".to_string(), Ok(42));
        let (selector, repo) = selector(rows, quotas);

        let picked = selector.select_key(user_id).await.unwrap();
        assert_eq!(picked.key, "revivable");
        assert!(picked.is_active);
        assert_eq!(picked.quota_remaining, Some(42));

        let stored = repo.get(picked.id);
        assert!(stored.is_active);
        assert_eq!(stored.quota_remaining, Some(42));
    }

    #[tokio::test]
    async fn test_validation_failure_tries_next_credential() {
        let user_id = Uuid::new_v4();
        let rows = vec![
            credential(user_id, "broken", false, Some(0), 40),
            credential(user_id, "good", false, Some(0), 30),
        ];
        let mut quotas = HashMap::new();
        quotas.insert("broken".to_string(), Err("network error".to_string()));
        quotas.insert("good".to_string(), Ok(7));
        let (selector, _) = selector(rows, quotas);

        let picked = selector.select_key(user_id).await.unwrap();
        assert_eq!(picked.key, "good");
    }

    #[tokio::test]
    async fn test_all_exhausted_fails() {
        let user_id = Uuid::new_v4();
        let rows = vec![
            credential(user_id, "a", false, Some(0), 40),
            credential(user_id, "b", false, Some(0), 30),
        ];
        let mut quotas = HashMap::new();
        quotas.insert("a".to_string(), Ok(0));
        quotas.insert("b".to_string(), Err("invalid key".to_string()));
        let (selector, _) = selector(rows, quotas);

        let result = selector.select_key(user_id).await;
        assert!(matches!(result, Err(CredentialServiceError::AllExhausted)));
    }

    #[tokio::test]
    async fn test_never_returns_exhausted_credential_while_usable_exists() {
        let user_id = Uuid::new_v4();
        let rows = vec![
            credential(user_id, "spent", false, Some(0), 40),
            credential(user_id, "fresh", true, None, 30),
        ];
        let (selector, _) = selector(rows, HashMap::new());

        let picked = selector.select_key(user_id).await.unwrap();
        assert_eq!(picked.key, "fresh");
    }

    #[tokio::test]
    async fn test_mark_exhausted_is_idempotent() {
        let user_id = Uuid::new_v4();
        let rows = vec![credential(user_id, "k", true, Some(9), 10)];
        let (selector, repo) = selector(rows, HashMap::new());
        let id = repo.list_for_user(user_id).await.unwrap()[0].id;

        selector.mark_exhausted(id).await.unwrap();
        selector.mark_exhausted(id).await.unwrap();

        let stored = repo.get(id);
        assert!(!stored.is_active);
        assert_eq!(stored.quota_remaining, Some(0));
    }
}
