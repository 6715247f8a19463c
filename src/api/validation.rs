use actix_web::{HttpRequest, HttpResponse, error::JsonPayloadError, web};
use serde::Serialize;
use tracing::debug;
use validator::ValidationErrors;

use crate::api::error::{FieldErrors, summarize};

/// JSON body for every error the API returns
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl ErrorResponse {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: None,
        }
    }
}

/// Flatten validator output into field -> messages
pub fn field_errors(validation_errors: &ValidationErrors) -> FieldErrors {
    validation_errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let messages = errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| {
                            format!("The {} field is invalid.", field.replace('_', " "))
                        })
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

fn unprocessable(body: ErrorResponse) -> actix_web::Error {
    actix_web::error::InternalError::from_response("", HttpResponse::UnprocessableEntity().json(body))
        .into()
}

fn payload_message(err: &JsonPayloadError) -> String {
    match err {
        JsonPayloadError::ContentType => "Expected a JSON request body".to_string(),
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
            "Request body is too large".to_string()
        }
        JsonPayloadError::Deserialize(de_err) if de_err.is_eof() => {
            "Request body is empty. Expected JSON payload".to_string()
        }
        JsonPayloadError::Deserialize(de_err) if de_err.is_data() => {
            format!("Invalid field value: {}", de_err)
        }
        _ => "Invalid JSON format".to_string(),
    }
}

/// JsonConfig for validated bodies (`actix_web_validator::Json`)
///
/// Field-level failures become 422 `{message, errors}`; anything that fails to
/// deserialize becomes 422 `{message}`.
pub fn json_config(limit: usize) -> actix_web_validator::JsonConfig {
    actix_web_validator::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| match err {
            actix_web_validator::Error::Validate(validation_errors) => {
                let errors = field_errors(&validation_errors);
                unprocessable(ErrorResponse {
                    message: summarize(&errors),
                    errors: Some(errors),
                })
            }
            actix_web_validator::Error::JsonPayloadError(payload_err) => {
                unprocessable(ErrorResponse::message(payload_message(&payload_err)))
            }
            actix_web_validator::Error::Deserialize(de_err) => {
                let err_string = de_err.to_string();
                let message = if err_string.contains("EOF while parsing") {
                    "Request body is empty. Expected JSON payload".to_string()
                } else {
                    "Invalid JSON format".to_string()
                };
                unprocessable(ErrorResponse::message(message))
            }
            _ => unprocessable(ErrorResponse::message("The given data was invalid.")),
        })
}

/// JsonConfig for plain `web::Json` bodies, validated later in the services
pub fn plain_json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| unprocessable(ErrorResponse::message(payload_message(&err))))
}

/// PathConfig answering 404 `{message}` when an id segment does not parse
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, req| {
        debug!("Unparseable path {}: {}", req.path(), err);
        actix_web::error::InternalError::from_response(
            err,
            HttpResponse::NotFound().json(ErrorResponse::message("Not Found.")),
        )
        .into()
    })
}

/// Fallback for requests no route matches
pub async fn route_not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::message(format!(
        "The route {} could not be found.",
        req.path().trim_start_matches('/')
    )))
}
