use crate::domain::project::Project;
use crate::error::AppResult;
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Fields for a new project row
#[derive(Debug, Clone)]
pub struct NewProject {
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub script: Option<String>,
    pub selected_hosts: Vec<String>,
    pub selected_template: Option<String>,
    pub selected_language: String,
}

/// Persistence seam for projects.
///
/// The three generation transitions are atomic: each is a single guarded
/// UPDATE so that concurrent attempts cannot both claim a project, and a
/// superseded attempt (lease mismatch) cannot clobber a newer one.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create(&self, new: NewProject) -> AppResult<Project>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Project>>;

    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<Project>>;

    async fn update_script(&self, id: Uuid, script: &str) -> AppResult<Project>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Claim the project for a generation attempt: status -> processing with
    /// the given lease, clearing any previous error. Succeeds only from
    /// draft/completed, or from processing when the previous lease expired.
    /// Returns the claimed row, or None if another attempt holds the lease.
    async fn begin_generation(
        &self,
        id: Uuid,
        lease: Uuid,
        expires_at: DateTime<Utc>,
    ) -> AppResult<Option<Project>>;

    /// processing -> completed, only while the lease still matches.
    async fn complete_generation(&self, id: Uuid, lease: Uuid) -> AppResult<bool>;

    /// processing -> draft rollback with the triggering error recorded, only
    /// while the lease still matches.
    async fn fail_generation(&self, id: Uuid, lease: Uuid, error: &str) -> AppResult<bool>;

    /// completed -> draft on explicit reset/delete-media.
    async fn reset(&self, id: Uuid) -> AppResult<Project>;
}

pub struct PgProjectRepository {
    pool: Arc<DbPool>,
}

impl PgProjectRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    async fn create(&self, new: NewProject) -> AppResult<Project> {
        let pool = self.pool.as_ref();
        let id = Uuid::new_v4();
        let now = Utc::now();

        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects
                (id, user_id, title, description, script, selected_hosts,
                 selected_template, selected_language, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'draft', $9, $9)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(new.user_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.script)
        .bind(&new.selected_hosts)
        .bind(&new.selected_template)
        .bind(&new.selected_language)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(project)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Project>> {
        let pool = self.pool.as_ref();
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(project)
    }

    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<Project>> {
        let pool = self.pool.as_ref();
        let projects = sqlx::query_as::<_, Project>(
            "SELECT * FROM projects WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(projects)
    }

    async fn update_script(&self, id: Uuid, script: &str) -> AppResult<Project> {
        let pool = self.pool.as_ref();
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET script = $1, updated_at = $2
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(script)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(project)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let pool = self.pool.as_ref();
        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    async fn begin_generation(
        &self,
        id: Uuid,
        lease: Uuid,
        expires_at: DateTime<Utc>,
    ) -> AppResult<Option<Project>> {
        let pool = self.pool.as_ref();
        let now = Utc::now();

        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET status = 'processing',
                lease_token = $2,
                lease_expires_at = $3,
                error_message = NULL,
                updated_at = $4
            WHERE id = $1
              AND (status IN ('draft', 'completed')
                   OR (status = 'processing' AND lease_expires_at < $4))
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(lease)
        .bind(expires_at)
        .bind(now)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    async fn complete_generation(&self, id: Uuid, lease: Uuid) -> AppResult<bool> {
        let pool = self.pool.as_ref();

        let result = sqlx::query(
            r#"
            UPDATE projects
            SET status = 'completed',
                lease_token = NULL,
                lease_expires_at = NULL,
                error_message = NULL,
                updated_at = $3
            WHERE id = $1 AND status = 'processing' AND lease_token = $2
            "#,
        )
        .bind(id)
        .bind(lease)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn fail_generation(&self, id: Uuid, lease: Uuid, error: &str) -> AppResult<bool> {
        let pool = self.pool.as_ref();

        let result = sqlx::query(
            r#"
            UPDATE projects
            SET status = 'draft',
                lease_token = NULL,
                lease_expires_at = NULL,
                error_message = $3,
                updated_at = $4
            WHERE id = $1 AND status = 'processing' AND lease_token = $2
            "#,
        )
        .bind(id)
        .bind(lease)
        .bind(error)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn reset(&self, id: Uuid) -> AppResult<Project> {
        let pool = self.pool.as_ref();
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET status = 'draft',
                lease_token = NULL,
                lease_expires_at = NULL,
                error_message = NULL,
                updated_at = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;

        Ok(project)
    }
}
