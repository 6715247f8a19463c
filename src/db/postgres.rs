use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use std::collections::HashMap;
use tracing::debug;

use crate::db::models::{ApplicationRow, ApplicationWithJob, JobRow, NewJob, NewUser, UserRow};
use crate::db::repository::{
    ApplicationRepository, JobRepository, TokenRepository, UserRepository,
};

const JOB_COLUMNS: &str = "id, title, description, created_at, updated_at";
const APPLICATION_COLUMNS: &str = "id, user_id, job_id, reason, created_at, updated_at";
const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";

/// PostgreSQL-backed repositories sharing one connection pool
#[derive(Clone)]
pub struct PgRepository {
    pool: Pool<Postgres>,
}

impl PgRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepository for PgRepository {
    async fn list_latest(&self) -> Result<Vec<JobRow>, sqlx::Error> {
        let query = format!("SELECT {JOB_COLUMNS} FROM jobs ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query_as::<_, JobRow>(&query)
            .fetch_all(&self.pool)
            .await?;

        debug!("Fetched {} jobs", rows.len());
        Ok(rows)
    }

    async fn find(&self, id: i64) -> Result<Option<JobRow>, sqlx::Error> {
        let query = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, JobRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create(&self, job: &NewJob) -> Result<JobRow, sqlx::Error> {
        debug!("Creating job: title={}", job.title);

        let query = format!(
            "INSERT INTO jobs (title, description) VALUES ($1, $2) RETURNING {JOB_COLUMNS}"
        );
        let row = sqlx::query_as::<_, JobRow>(&query)
            .bind(&job.title)
            .bind(&job.description)
            .fetch_one(&self.pool)
            .await?;

        debug!("Job created with id={}", row.id);
        Ok(row)
    }

    async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM jobs")
            .fetch_one(&self.pool)
            .await
    }
}

#[async_trait]
impl ApplicationRepository for PgRepository {
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<ApplicationWithJob>, sqlx::Error> {
        let query = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications \
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        );
        let applications = sqlx::query_as::<_, ApplicationRow>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        if applications.is_empty() {
            return Ok(Vec::new());
        }

        // Eager-load the referenced jobs in one round trip
        let job_ids: Vec<i64> = applications.iter().map(|a| a.job_id).collect();
        let query = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ANY($1)");
        let jobs: HashMap<i64, JobRow> = sqlx::query_as::<_, JobRow>(&query)
            .bind(job_ids)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|job| (job.id, job))
            .collect();

        debug!(
            "Fetched {} applications for user_id={}",
            applications.len(),
            user_id
        );

        // The FK cascades on delete, so every application has its job
        Ok(applications
            .into_iter()
            .filter_map(|application| {
                jobs.get(&application.job_id)
                    .cloned()
                    .map(|job| ApplicationWithJob { application, job })
            })
            .collect())
    }

    async fn find(&self, id: i64) -> Result<Option<ApplicationRow>, sqlx::Error> {
        let query = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1");
        sqlx::query_as::<_, ApplicationRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn insert(
        &self,
        user_id: i64,
        job_id: i64,
        reason: &str,
    ) -> Result<Option<ApplicationRow>, sqlx::Error> {
        debug!("Inserting application: user_id={}, job_id={}", user_id, job_id);

        let query = format!(
            "INSERT INTO applications (user_id, job_id, reason) VALUES ($1, $2, $3) \
             ON CONFLICT ON CONSTRAINT applications_user_job_unique DO NOTHING \
             RETURNING {APPLICATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ApplicationRow>(&query)
            .bind(user_id)
            .bind(job_id)
            .bind(reason)
            .fetch_optional(&self.pool)
            .await?;

        match &row {
            Some(row) => debug!("Application created with id={}", row.id),
            None => debug!(
                "Application insert suppressed by unique constraint: user_id={}, job_id={}",
                user_id, job_id
            ),
        }
        Ok(row)
    }

    async fn update_reason(
        &self,
        id: i64,
        reason: &str,
    ) -> Result<Option<ApplicationRow>, sqlx::Error> {
        let query = format!(
            "UPDATE applications SET reason = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {APPLICATION_COLUMNS}"
        );
        sqlx::query_as::<_, ApplicationRow>(&query)
            .bind(id)
            .bind(reason)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserRepository for PgRepository {
    async fn create(&self, user: &NewUser) -> Result<Option<UserRow>, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) \
             ON CONFLICT (email) DO NOTHING RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRow>(&query)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, UserRow>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }
}

#[async_trait]
impl TokenRepository for PgRepository {
    async fn insert(&self, user_id: i64, name: &str, token_hash: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO personal_access_tokens (user_id, name, token_hash) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(name)
        .bind(token_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_user(&self, token_hash: &str) -> Result<Option<UserRow>, sqlx::Error> {
        let query = format!(
            "WITH touched AS ( \
                 UPDATE personal_access_tokens SET last_used_at = NOW() \
                 WHERE token_hash = $1 RETURNING user_id \
             ) \
             SELECT {USER_COLUMNS} FROM users WHERE id = (SELECT user_id FROM touched)"
        );
        sqlx::query_as::<_, UserRow>(&query)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete(&self, token_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM personal_access_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
