use actix_web::{
    HttpResponse, get,
    web::{Data, Path, ServiceConfig, scope},
};

use crate::api::error::ServiceError;
use crate::api::job::JobService;

#[get("")]
async fn list_jobs(service: Data<JobService>) -> Result<HttpResponse, ServiceError> {
    let jobs = service.list_jobs().await?;
    Ok(HttpResponse::Ok().json(jobs))
}

#[get("/{id}")]
async fn show_job(
    service: Data<JobService>,
    path: Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let job = service.get_job(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(job))
}

/// Public job routes; no authentication required
pub fn job_config(config: &mut ServiceConfig) {
    config.service(scope("/jobs").service(list_jobs).service(show_job));
}
