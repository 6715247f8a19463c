pub mod application;
pub mod auth;
pub mod error;
pub mod health;
pub mod job;
pub mod policy;
pub mod validation;

use actix_web::web::{self, Data, ServiceConfig};
use std::sync::Arc;

use crate::db::PgRepository;
use crate::db::repository::{
    ApplicationRepository, JobRepository, TokenRepository, UserRepository,
};
use application::{ApplicationService, handlers::application_config};
use auth::{AuthService, handlers::auth_config};
use job::{JobService, handlers::job_config};

/// Path prefix every API route is mounted under
pub const API_PREFIX: &str = "/api";

/// Default JSON body limit: 10MB
pub const DEFAULT_PAYLOAD_LIMIT: usize = 10 * 1024 * 1024;

/// Shared services, cloned into every actix worker
#[derive(Clone)]
pub struct Services {
    pub jobs: Data<JobService>,
    pub applications: Data<ApplicationService>,
    pub auth: Data<AuthService>,
    payload_limit: usize,
}

impl Services {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        applications: Arc<dyn ApplicationRepository>,
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn TokenRepository>,
    ) -> Self {
        Self {
            jobs: Data::new(JobService::new(jobs.clone())),
            applications: Data::new(ApplicationService::new(applications, jobs)),
            auth: Data::new(AuthService::new(users, tokens)),
            payload_limit: DEFAULT_PAYLOAD_LIMIT,
        }
    }

    /// Maximum accepted JSON body size in bytes
    pub fn with_payload_limit(mut self, limit: usize) -> Self {
        self.payload_limit = limit;
        self
    }

    pub fn postgres(repository: PgRepository) -> Self {
        let repository = Arc::new(repository);
        Self::new(
            repository.clone(),
            repository.clone(),
            repository.clone(),
            repository,
        )
    }

    /// Register the services, extractor configs, and every API route
    pub fn configure(&self, config: &mut ServiceConfig) {
        config
            .app_data(self.jobs.clone())
            .app_data(self.applications.clone())
            .app_data(self.auth.clone())
            .app_data(validation::json_config(self.payload_limit))
            .app_data(validation::plain_json_config(self.payload_limit))
            .app_data(validation::path_config())
            .service(
                web::scope(API_PREFIX)
                    .configure(auth_config)
                    .configure(job_config)
                    .configure(application_config)
                    .default_service(web::to(validation::route_not_found)),
            );
    }
}
