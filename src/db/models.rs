use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database representation of a job posting
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct JobRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to insert a job (seeding only)
#[derive(Debug, Clone)]
pub struct NewJob {
    pub title: String,
    pub description: String,
}

/// Database representation of an application
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ApplicationRow {
    pub id: i64,
    pub user_id: i64,
    pub job_id: i64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An application with its job eagerly loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationWithJob {
    #[serde(flatten)]
    pub application: ApplicationRow,
    pub job: JobRow,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}
