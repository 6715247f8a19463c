use async_trait::async_trait;

use crate::db::models::{ApplicationRow, ApplicationWithJob, JobRow, NewJob, NewUser, UserRow};

/// Storage for job postings
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// All jobs, newest first
    async fn list_latest(&self) -> Result<Vec<JobRow>, sqlx::Error>;

    async fn find(&self, id: i64) -> Result<Option<JobRow>, sqlx::Error>;

    async fn create(&self, job: &NewJob) -> Result<JobRow, sqlx::Error>;

    async fn count(&self) -> Result<i64, sqlx::Error>;
}

/// Storage for applications
///
/// Implementations must guarantee at most one row per `(user_id, job_id)`.
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Applications owned by `user_id`, newest first, each with its job
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<ApplicationWithJob>, sqlx::Error>;

    async fn find(&self, id: i64) -> Result<Option<ApplicationRow>, sqlx::Error>;

    /// Insert a new application.
    ///
    /// Returns `Ok(None)` when the user already has an application for the job;
    /// nothing is written in that case.
    async fn insert(
        &self,
        user_id: i64,
        job_id: i64,
        reason: &str,
    ) -> Result<Option<ApplicationRow>, sqlx::Error>;

    async fn update_reason(
        &self,
        id: i64,
        reason: &str,
    ) -> Result<Option<ApplicationRow>, sqlx::Error>;

    /// Returns whether a row was removed
    async fn delete(&self, id: i64) -> Result<bool, sqlx::Error>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Returns `Ok(None)` when the email is already registered
    async fn create(&self, user: &NewUser) -> Result<Option<UserRow>, sqlx::Error>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>, sqlx::Error>;
}

/// Storage for hashed bearer tokens
#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn insert(&self, user_id: i64, name: &str, token_hash: &str) -> Result<(), sqlx::Error>;

    /// Resolve a token hash to its owner and mark the token as used
    async fn find_user(&self, token_hash: &str) -> Result<Option<UserRow>, sqlx::Error>;

    /// Returns whether a token was removed
    async fn delete(&self, token_hash: &str) -> Result<bool, sqlx::Error>;
}
