use crate::domain::credential::Credential;
use crate::error::AppResult;
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Persistence seam for provider credentials.
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    async fn create(
        &self,
        user_id: Uuid,
        key: &str,
        name: &str,
        quota_remaining: Option<i64>,
    ) -> AppResult<Credential>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Credential>>;

    /// All credentials for a user, in creation order. The Key Selector relies
    /// on this ordering when iterating the inactive set.
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Credential>>;

    async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<Credential>;

    /// Idempotent: is_active = false, quota_remaining = 0.
    async fn mark_exhausted(&self, id: Uuid) -> AppResult<()>;

    /// Flip a credential back to active with the quota the provider reported.
    async fn reactivate(&self, id: Uuid, quota_remaining: i64) -> AppResult<()>;

    async fn touch_last_used(&self, id: Uuid) -> AppResult<()>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

pub struct PgCredentialRepository {
    pool: Arc<DbPool>,
}

impl PgCredentialRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialRepository for PgCredentialRepository {
    async fn create(
        &self,
        user_id: Uuid,
        key: &str,
        name: &str,
        quota_remaining: Option<i64>,
    ) -> AppResult<Credential> {
        let pool = self.pool.as_ref();
        let id = Uuid::new_v4();
        let now = Utc::now();

        let credential = sqlx::query_as::<_, Credential>(
            r#"
            INSERT INTO credentials
                (id, user_id, key, name, is_active, quota_remaining, created_at, updated_at)
            VALUES ($1, $2, $3, $4, TRUE, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(key)
        .bind(name)
        .bind(quota_remaining)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(credential)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Credential>> {
        let pool = self.pool.as_ref();
        let credential = sqlx::query_as::<_, Credential>("SELECT * FROM credentials WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(credential)
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Credential>> {
        let pool = self.pool.as_ref();
        let credentials = sqlx::query_as::<_, Credential>(
            "SELECT * FROM credentials WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(credentials)
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<Credential> {
        let pool = self.pool.as_ref();
        let credential = sqlx::query_as::<_, Credential>(
            r#"
            UPDATE credentials
            SET is_active = $1, updated_at = $2
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(is_active)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(credential)
    }

    async fn mark_exhausted(&self, id: Uuid) -> AppResult<()> {
        let pool = self.pool.as_ref();
        sqlx::query(
            r#"
            UPDATE credentials
            SET is_active = FALSE, quota_remaining = 0, updated_at = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn reactivate(&self, id: Uuid, quota_remaining: i64) -> AppResult<()> {
        let pool = self.pool.as_ref();
        sqlx::query(
            r#"
            UPDATE credentials
            SET is_active = TRUE, quota_remaining = $2, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(quota_remaining)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn touch_last_used(&self, id: Uuid) -> AppResult<()> {
        let pool = self.pool.as_ref();
        let now = Utc::now();
        sqlx::query("UPDATE credentials SET last_used = $2, updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(now)
            .execute(pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let pool = self.pool.as_ref();
        sqlx::query("DELETE FROM credentials WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }
}
