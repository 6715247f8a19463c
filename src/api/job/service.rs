use std::sync::Arc;
use tracing::{info, warn};

use crate::api::error::ServiceError;
use crate::db::models::JobRow;
use crate::db::repository::JobRepository;

/// Read-only access to job postings
pub struct JobService {
    jobs: Arc<dyn JobRepository>,
}

impl JobService {
    pub fn new(jobs: Arc<dyn JobRepository>) -> Self {
        Self { jobs }
    }

    /// All job postings, most recently created first
    pub async fn list_jobs(&self) -> Result<Vec<JobRow>, ServiceError> {
        let jobs = self.jobs.list_latest().await?;
        info!("Service: Listed {} jobs", jobs.len());
        Ok(jobs)
    }

    /// A single job posting
    ///
    /// # Returns
    /// - `Ok(JobRow)` - Job found
    /// - `Err(ServiceError::NotFound)` - No job with that id
    pub async fn get_job(&self, id: i64) -> Result<JobRow, ServiceError> {
        match self.jobs.find(id).await? {
            Some(job) => Ok(job),
            None => {
                warn!("Service: Job not found: {}", id);
                Err(ServiceError::NotFound("Job not found.".to_string()))
            }
        }
    }
}
