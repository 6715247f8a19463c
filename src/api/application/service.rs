use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::application::dto::{CreateApplicationRequest, UpdateApplicationRequest};
use crate::api::error::{FieldErrors, ServiceError};
use crate::api::policy;
use crate::db::models::{ApplicationRow, ApplicationWithJob};
use crate::db::repository::{ApplicationRepository, JobRepository};

pub const ALREADY_APPLIED: &str = "You have already applied for this job";

const JOB_ID_REQUIRED: &str = "The job id field is required.";
const JOB_ID_INVALID: &str = "The selected job id is invalid.";
const REASON_REQUIRED: &str = "The reason field is required.";
const REASON_NOT_STRING: &str = "The reason field must be a string.";

/// Applications scoped to the user who submitted them
pub struct ApplicationService {
    applications: Arc<dyn ApplicationRepository>,
    jobs: Arc<dyn JobRepository>,
}

/// Trimmed reason, or the message explaining why it was rejected
fn reason_from(value: &Value) -> Result<&str, &'static str> {
    match value {
        Value::Null => Err(REASON_REQUIRED),
        Value::String(reason) if reason.trim().is_empty() => Err(REASON_REQUIRED),
        Value::String(reason) => Ok(reason.trim()),
        _ => Err(REASON_NOT_STRING),
    }
}

/// Job id as a number or numeric string
fn job_id_from(value: &Value) -> Result<i64, &'static str> {
    match value {
        Value::Null => Err(JOB_ID_REQUIRED),
        Value::Number(number) => number.as_i64().ok_or(JOB_ID_INVALID),
        Value::String(text) if text.trim().is_empty() => Err(JOB_ID_REQUIRED),
        Value::String(text) => text.trim().parse().map_err(|_| JOB_ID_INVALID),
        _ => Err(JOB_ID_INVALID),
    }
}

fn reject(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

impl ApplicationService {
    pub fn new(
        applications: Arc<dyn ApplicationRepository>,
        jobs: Arc<dyn JobRepository>,
    ) -> Self {
        Self { applications, jobs }
    }

    /// Applications owned by `user_id`, newest first, each with its job
    pub async fn list_applications(
        &self,
        user_id: i64,
    ) -> Result<Vec<ApplicationWithJob>, ServiceError> {
        let applications = self.applications.list_for_user(user_id).await?;
        info!(
            "Service: Listed {} applications for user_id={}",
            applications.len(),
            user_id
        );
        Ok(applications)
    }

    /// Submit an application for a job
    ///
    /// # Business Logic
    /// - The job must exist and the reason must not be blank; every failing
    ///   field is reported together
    /// - A user applies to a job at most once; the storage layer enforces it
    ///   and a suppressed insert is reported as a conflict
    ///
    /// # Returns
    /// - `Ok(ApplicationWithJob)` - Application stored
    /// - `Err(ServiceError::Validation)` - Missing or unknown job, blank reason
    /// - `Err(ServiceError::Conflict)` - User already applied for the job
    pub async fn create_application(
        &self,
        user_id: i64,
        input: &CreateApplicationRequest,
    ) -> Result<ApplicationWithJob, ServiceError> {
        let mut errors = FieldErrors::new();

        let job = match job_id_from(&input.job_id) {
            Ok(job_id) => {
                let job = self.jobs.find(job_id).await?;
                if job.is_none() {
                    reject(&mut errors, "job_id", JOB_ID_INVALID);
                }
                job
            }
            Err(message) => {
                reject(&mut errors, "job_id", message);
                None
            }
        };
        let reason = reason_from(&input.reason)
            .inspect_err(|message| reject(&mut errors, "reason", message))
            .ok();

        let (Some(job), Some(reason)) = (job, reason) else {
            warn!(
                "Service: Application rejected for user_id={}: {} invalid field(s)",
                user_id,
                errors.len()
            );
            return Err(ServiceError::invalid(errors));
        };

        info!(
            "Service: Creating application user_id={} job_id={}",
            user_id, job.id
        );

        let Some(application) = self.applications.insert(user_id, job.id, reason).await? else {
            warn!(
                "Service: Duplicate application rejected user_id={} job_id={}",
                user_id, job.id
            );
            return Err(ServiceError::Conflict(ALREADY_APPLIED.to_string()));
        };

        info!(
            "Service: Application created successfully with id={}",
            application.id
        );
        Ok(ApplicationWithJob { application, job })
    }

    /// Load an application and check that `user_id` owns it
    async fn owned_application(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<ApplicationRow, ServiceError> {
        let application = self
            .applications
            .find(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Application not found.".to_string()))?;

        policy::authorize(user_id, application).inspect_err(|_| {
            warn!(
                "Service: user_id={} denied access to application id={}",
                user_id, id
            )
        })
    }

    async fn with_job(
        &self,
        application: ApplicationRow,
    ) -> Result<ApplicationWithJob, ServiceError> {
        let job = self.jobs.find(application.job_id).await?.ok_or_else(|| {
            ServiceError::Internal(format!(
                "application {} references missing job {}",
                application.id, application.job_id
            ))
        })?;
        Ok(ApplicationWithJob { application, job })
    }

    pub async fn get_application(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<ApplicationWithJob, ServiceError> {
        let application = self.owned_application(user_id, id).await?;
        self.with_job(application).await
    }

    /// Replace the reason of an owned application.
    ///
    /// Existence and ownership are checked before the body is validated.
    pub async fn update_application(
        &self,
        user_id: i64,
        id: i64,
        input: &UpdateApplicationRequest,
    ) -> Result<ApplicationWithJob, ServiceError> {
        self.owned_application(user_id, id).await?;
        let reason = reason_from(&input.reason)
            .map_err(|message| ServiceError::invalid_field("reason", message))?;

        let application = self
            .applications
            .update_reason(id, reason)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Application not found.".to_string()))?;

        info!("Service: Application id={} updated", id);
        self.with_job(application).await
    }

    pub async fn delete_application(&self, user_id: i64, id: i64) -> Result<(), ServiceError> {
        self.owned_application(user_id, id).await?;

        if !self.applications.delete(id).await? {
            return Err(ServiceError::NotFound("Application not found.".to_string()));
        }

        info!("Service: Application id={} deleted", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use serde_json::json;

    const ALICE: i64 = 100;
    const BOB: i64 = 200;

    fn service() -> (ApplicationService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_jobs(6));
        (ApplicationService::new(store.clone(), store.clone()), store)
    }

    fn apply(job_id: i64, reason: &str) -> CreateApplicationRequest {
        CreateApplicationRequest {
            job_id: json!(job_id),
            reason: json!(reason),
        }
    }

    fn new_reason(reason: &str) -> UpdateApplicationRequest {
        UpdateApplicationRequest {
            reason: json!(reason),
        }
    }

    fn field_errors(err: ServiceError) -> FieldErrors {
        match err {
            ServiceError::Validation { errors, .. } => errors,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[actix_web::test]
    async fn create_then_get_round_trips_with_job() {
        let (service, _) = service();

        let created = service
            .create_application(ALICE, &apply(3, "I am qualified"))
            .await
            .unwrap();
        assert_eq!(created.application.reason, "I am qualified");
        assert_eq!(created.job.id, 3);

        let fetched = service
            .get_application(ALICE, created.application.id)
            .await
            .unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.application.user_id, ALICE);
        assert_eq!(fetched.application.job_id, 3);
    }

    #[actix_web::test]
    async fn second_application_for_same_job_conflicts() {
        let (service, store) = service();

        service.create_application(ALICE, &apply(3, "first")).await.unwrap();
        let err = service
            .create_application(ALICE, &apply(3, "second"))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(ref m) if m == ALREADY_APPLIED));
        assert_eq!(store.application_count(), 1);

        // Another user may still apply to the same job
        service.create_application(BOB, &apply(3, "me too")).await.unwrap();
        assert_eq!(store.application_count(), 2);
    }

    #[actix_web::test]
    async fn rejects_unknown_job_and_blank_reason() {
        let (service, store) = service();

        let err = service
            .create_application(ALICE, &apply(42, "reason"))
            .await
            .unwrap_err();
        assert_eq!(field_errors(err)["job_id"], vec![JOB_ID_INVALID]);

        let err = service
            .create_application(ALICE, &apply(1, "   "))
            .await
            .unwrap_err();
        assert_eq!(field_errors(err)["reason"], vec![REASON_REQUIRED]);

        assert_eq!(store.application_count(), 0);
    }

    #[actix_web::test]
    async fn reports_every_invalid_field_together() {
        let (service, store) = service();

        let errors = field_errors(
            service
                .create_application(ALICE, &apply(999, "   "))
                .await
                .unwrap_err(),
        );
        assert_eq!(errors["job_id"], vec![JOB_ID_INVALID]);
        assert_eq!(errors["reason"], vec![REASON_REQUIRED]);

        let missing_job = CreateApplicationRequest {
            job_id: Value::Null,
            reason: json!("   "),
        };
        let errors = field_errors(
            service
                .create_application(ALICE, &missing_job)
                .await
                .unwrap_err(),
        );
        assert_eq!(errors["job_id"], vec![JOB_ID_REQUIRED]);
        assert_eq!(errors["reason"], vec![REASON_REQUIRED]);

        let wrong_types = CreateApplicationRequest {
            job_id: json!([3]),
            reason: json!(123),
        };
        let errors = field_errors(
            service
                .create_application(ALICE, &wrong_types)
                .await
                .unwrap_err(),
        );
        assert_eq!(errors["job_id"], vec![JOB_ID_INVALID]);
        assert_eq!(errors["reason"], vec![REASON_NOT_STRING]);

        assert_eq!(store.application_count(), 0);
    }

    #[actix_web::test]
    async fn accepts_numeric_string_job_id() {
        let (service, _) = service();
        let input = CreateApplicationRequest {
            job_id: json!("4"),
            reason: json!("  padded  "),
        };

        let created = service.create_application(ALICE, &input).await.unwrap();

        assert_eq!(created.job.id, 4);
        assert_eq!(created.application.reason, "padded");
    }

    #[actix_web::test]
    async fn other_users_are_forbidden_and_nothing_changes() {
        let (service, store) = service();
        let id = service
            .create_application(ALICE, &apply(2, "original"))
            .await
            .unwrap()
            .application
            .id;

        assert!(matches!(
            service.get_application(BOB, id).await,
            Err(ServiceError::Forbidden)
        ));
        assert!(matches!(
            service.update_application(BOB, id, &new_reason("hijacked")).await,
            Err(ServiceError::Forbidden)
        ));
        // Ownership wins over validation, whatever the body holds
        for body in [json!(""), json!(123), Value::Null] {
            let input = UpdateApplicationRequest { reason: body };
            assert!(matches!(
                service.update_application(BOB, id, &input).await,
                Err(ServiceError::Forbidden)
            ));
        }
        assert!(matches!(
            service
                .update_application(BOB, id + 1000, &UpdateApplicationRequest::default())
                .await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_application(BOB, id).await,
            Err(ServiceError::Forbidden)
        ));

        let untouched = service.get_application(ALICE, id).await.unwrap();
        assert_eq!(untouched.application.reason, "original");
        assert_eq!(store.application_count(), 1);
    }

    #[actix_web::test]
    async fn update_changes_only_the_reason() {
        let (service, _) = service();
        let before = service
            .create_application(ALICE, &apply(5, "old reason"))
            .await
            .unwrap();

        let after = service
            .update_application(ALICE, before.application.id, &new_reason("new reason"))
            .await
            .unwrap();

        assert_eq!(after.application.reason, "new reason");
        assert_eq!(after.application.id, before.application.id);
        assert_eq!(after.application.user_id, before.application.user_id);
        assert_eq!(after.application.job_id, before.application.job_id);
        assert_eq!(after.application.created_at, before.application.created_at);
        assert_eq!(after.job, before.job);

        assert!(matches!(
            service
                .update_application(ALICE, before.application.id, &new_reason(" "))
                .await,
            Err(ServiceError::Validation { .. })
        ));
        let not_a_string = UpdateApplicationRequest { reason: json!(42) };
        let err = service
            .update_application(ALICE, before.application.id, &not_a_string)
            .await
            .unwrap_err();
        assert_eq!(field_errors(err)["reason"], vec![REASON_NOT_STRING]);
    }

    #[actix_web::test]
    async fn delete_then_get_is_not_found() {
        let (service, _) = service();
        let id = service
            .create_application(ALICE, &apply(1, "reason"))
            .await
            .unwrap()
            .application
            .id;

        service.delete_application(ALICE, id).await.unwrap();

        assert!(matches!(
            service.get_application(ALICE, id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_application(ALICE, id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[actix_web::test]
    async fn lists_only_own_applications_newest_first() {
        let (service, _) = service();
        service.create_application(ALICE, &apply(1, "a")).await.unwrap();
        service.create_application(BOB, &apply(2, "b")).await.unwrap();
        service.create_application(ALICE, &apply(4, "c")).await.unwrap();

        let listed = service.list_applications(ALICE).await.unwrap();
        let job_ids: Vec<i64> = listed.iter().map(|a| a.job.id).collect();

        assert_eq!(job_ids, vec![4, 1]);
        assert!(listed.iter().all(|a| a.application.user_id == ALICE));
    }
}
