//! In-memory repositories used by the test suites.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Mutex;

use crate::db::models::{ApplicationRow, ApplicationWithJob, JobRow, NewJob, NewUser, UserRow};
use crate::db::repository::{
    ApplicationRepository, JobRepository, TokenRepository, UserRepository,
};

#[derive(Default)]
struct Tables {
    jobs: Vec<JobRow>,
    applications: Vec<ApplicationRow>,
    users: Vec<UserRow>,
    tokens: Vec<(i64, String)>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with `count` jobs, created one minute apart
    pub fn with_jobs(count: usize) -> Self {
        let store = Self::new();
        {
            let mut tables = store.tables.lock().unwrap();
            let base = Utc::now() - Duration::hours(1);
            for n in 1..=count {
                let id = tables.next_id();
                let at = base + Duration::minutes(n as i64);
                tables.jobs.push(JobRow {
                    id,
                    title: format!("Job {n}"),
                    description: format!("Description of job {n}"),
                    created_at: at,
                    updated_at: at,
                });
            }
        }
        store
    }

    pub fn application_count(&self) -> usize {
        self.tables.lock().unwrap().applications.len()
    }
}

#[async_trait]
impl JobRepository for MemoryStore {
    async fn list_latest(&self) -> Result<Vec<JobRow>, sqlx::Error> {
        let mut jobs = self.tables.lock().unwrap().jobs.clone();
        jobs.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(jobs)
    }

    async fn find(&self, id: i64) -> Result<Option<JobRow>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.jobs.iter().find(|job| job.id == id).cloned())
    }

    async fn create(&self, job: &NewJob) -> Result<JobRow, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let now = Utc::now();
        let row = JobRow {
            id: tables.next_id(),
            title: job.title.clone(),
            description: job.description.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.jobs.push(row.clone());
        Ok(row)
    }

    async fn count(&self) -> Result<i64, sqlx::Error> {
        Ok(self.tables.lock().unwrap().jobs.len() as i64)
    }
}

#[async_trait]
impl ApplicationRepository for MemoryStore {
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<ApplicationWithJob>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        let mut owned: Vec<ApplicationWithJob> = tables
            .applications
            .iter()
            .filter(|a| a.user_id == user_id)
            .filter_map(|a| {
                tables
                    .jobs
                    .iter()
                    .find(|job| job.id == a.job_id)
                    .map(|job| ApplicationWithJob {
                        application: a.clone(),
                        job: job.clone(),
                    })
            })
            .collect();
        owned.sort_by(|a, b| {
            (b.application.created_at, b.application.id)
                .cmp(&(a.application.created_at, a.application.id))
        });
        Ok(owned)
    }

    async fn find(&self, id: i64) -> Result<Option<ApplicationRow>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.applications.iter().find(|a| a.id == id).cloned())
    }

    async fn insert(
        &self,
        user_id: i64,
        job_id: i64,
        reason: &str,
    ) -> Result<Option<ApplicationRow>, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .applications
            .iter()
            .any(|a| a.user_id == user_id && a.job_id == job_id)
        {
            return Ok(None);
        }
        let now = Utc::now();
        let row = ApplicationRow {
            id: tables.next_id(),
            user_id,
            job_id,
            reason: reason.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.applications.push(row.clone());
        Ok(Some(row))
    }

    async fn update_reason(
        &self,
        id: i64,
        reason: &str,
    ) -> Result<Option<ApplicationRow>, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables
            .applications
            .iter_mut()
            .find(|a| a.id == id)
            .map(|a| {
                a.reason = reason.to_string();
                a.updated_at = Utc::now();
                a.clone()
            }))
    }

    async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.applications.len();
        tables.applications.retain(|a| a.id != id);
        Ok(tables.applications.len() < before)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &NewUser) -> Result<Option<UserRow>, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|u| u.email == user.email) {
            return Ok(None);
        }
        let now = Utc::now();
        let row = UserRow {
            id: tables.next_id(),
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.users.push(row.clone());
        Ok(Some(row))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl TokenRepository for MemoryStore {
    async fn insert(&self, user_id: i64, _name: &str, token_hash: &str) -> Result<(), sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        tables.tokens.push((user_id, token_hash.to_string()));
        Ok(())
    }

    async fn find_user(&self, token_hash: &str) -> Result<Option<UserRow>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .tokens
            .iter()
            .find(|(_, hash)| hash == token_hash)
            .and_then(|(user_id, _)| tables.users.iter().find(|u| u.id == *user_id))
            .cloned())
    }

    async fn delete(&self, token_hash: &str) -> Result<bool, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.tokens.len();
        tables.tokens.retain(|(_, hash)| hash != token_hash);
        Ok(tables.tokens.len() < before)
    }
}
