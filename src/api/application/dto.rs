use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::models::ApplicationWithJob;

/// Body of `POST /applications`
///
/// Fields are kept as raw JSON so the service can report every bad field at
/// once, including values of the wrong type.
#[derive(Debug, Default, Deserialize)]
pub struct CreateApplicationRequest {
    #[serde(default)]
    pub job_id: Value,
    #[serde(default)]
    pub reason: Value,
}

/// Body of `PUT /applications/{id}`
///
/// Validated by the service once ownership has been established.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateApplicationRequest {
    #[serde(default)]
    pub reason: Value,
}

/// Response for a created or updated application
#[derive(Debug, Serialize, Deserialize)]
pub struct ApplicationResponse {
    pub message: String,
    pub application: ApplicationWithJob,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
