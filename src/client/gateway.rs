use reqwest::{Method, RequestBuilder, StatusCode, header};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::api::application::dto::{ApplicationResponse, MessageResponse};
use crate::api::auth::dto::AuthResponse;
use crate::api::error::FieldErrors;
use crate::client::router::LOGIN_PATH;
use crate::client::session::{Session, SessionError};
use crate::db::models::{ApplicationWithJob, JobRow, UserRow};

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The API answered 401; the session has been cleared
    #[error("not logged in or session expired, please log in again")]
    Unauthenticated,

    /// Any other non-success answer, for the caller to display
    #[error("{message}")]
    Api {
        status: StatusCode,
        message: String,
        errors: FieldErrors,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl GatewayError {
    /// Path the caller must navigate to after this error, if any
    pub fn redirect(&self) -> Option<&'static str> {
        match self {
            GatewayError::Unauthenticated => Some(LOGIN_PATH),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(default)]
    errors: FieldErrors,
}

/// One method per API operation, all sharing the same session
pub struct Gateway {
    http: reqwest::Client,
    base_url: String,
    session: Session,
}

impl Gateway {
    pub fn new(base_url: impl Into<String>, session: Session) -> Result<Self, GatewayError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Outgoing request with the bearer token attached when one is held
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);
        let builder = self.http.request(method, url);
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Forget the session after a 401. Nothing is retried.
    fn intercept_unauthorized(&mut self) -> GatewayError {
        warn!("API answered 401, clearing session");
        if let Err(e) = self.session.clear() {
            error!("Failed to clear session: {}", e);
        }
        GatewayError::Unauthenticated
    }

    async fn send<T: DeserializeOwned>(&mut self, builder: RequestBuilder) -> Result<T, GatewayError> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(self.intercept_unauthorized());
        }
        if !status.is_success() {
            let body: ErrorBody = response.json().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status,
                message: body.message.unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("Request failed")
                        .to_string()
                }),
                errors: body.errors,
            });
        }

        Ok(response.json().await?)
    }

    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
        password_confirmation: &str,
    ) -> Result<UserRow, GatewayError> {
        let request = self.request(Method::POST, "/register").json(&json!({
            "name": name,
            "email": email,
            "password": password,
            "password_confirmation": password_confirmation,
        }));
        let auth: AuthResponse = self.send(request).await?;
        self.session.establish(auth.token, auth.user.clone())?;
        Ok(auth.user)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<UserRow, GatewayError> {
        let request = self
            .request(Method::POST, "/login")
            .json(&json!({"email": email, "password": password}));
        let auth: AuthResponse = self.send(request).await?;
        self.session.establish(auth.token, auth.user.clone())?;
        Ok(auth.user)
    }

    pub async fn logout(&mut self) -> Result<String, GatewayError> {
        let request = self.request(Method::POST, "/logout");
        let response: MessageResponse = self.send(request).await?;
        self.session.clear()?;
        Ok(response.message)
    }

    pub async fn user(&mut self) -> Result<UserRow, GatewayError> {
        let request = self.request(Method::GET, "/user");
        self.send(request).await
    }

    pub async fn jobs(&mut self) -> Result<Vec<JobRow>, GatewayError> {
        let request = self.request(Method::GET, "/jobs");
        self.send(request).await
    }

    pub async fn job(&mut self, id: i64) -> Result<JobRow, GatewayError> {
        let request = self.request(Method::GET, &format!("/jobs/{id}"));
        self.send(request).await
    }

    pub async fn applications(&mut self) -> Result<Vec<ApplicationWithJob>, GatewayError> {
        let request = self.request(Method::GET, "/applications");
        self.send(request).await
    }

    pub async fn application(&mut self, id: i64) -> Result<ApplicationWithJob, GatewayError> {
        let request = self.request(Method::GET, &format!("/applications/{id}"));
        self.send(request).await
    }

    pub async fn create_application(
        &mut self,
        job_id: i64,
        reason: &str,
    ) -> Result<ApplicationResponse, GatewayError> {
        let request = self
            .request(Method::POST, "/applications")
            .json(&json!({"job_id": job_id, "reason": reason}));
        self.send(request).await
    }

    pub async fn update_application(
        &mut self,
        id: i64,
        reason: &str,
    ) -> Result<ApplicationResponse, GatewayError> {
        let request = self
            .request(Method::PUT, &format!("/applications/{id}"))
            .json(&json!({"reason": reason}));
        self.send(request).await
    }

    pub async fn delete_application(&mut self, id: i64) -> Result<String, GatewayError> {
        let request = self.request(Method::DELETE, &format!("/applications/{id}"));
        let response: MessageResponse = self.send(request).await?;
        Ok(response.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Services;
    use crate::db::memory::MemoryStore;
    use actix_web::{App, HttpServer};
    use chrono::Utc;
    use std::sync::Arc;

    fn user() -> UserRow {
        let now = Utc::now();
        UserRow {
            id: 1,
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn attaches_bearer_token_only_when_logged_in() {
        let gateway = Gateway::new("http://localhost:8080/api/", Session::in_memory()).unwrap();
        let request = gateway.request(Method::GET, "/jobs").build().unwrap();
        assert_eq!(request.url().as_str(), "http://localhost:8080/api/jobs");
        assert!(request.headers().get(header::AUTHORIZATION).is_none());

        let mut session = Session::in_memory();
        session.establish("secret".into(), user()).unwrap();
        let gateway = Gateway::new("http://localhost:8080/api", session).unwrap();
        let request = gateway.request(Method::GET, "/applications").build().unwrap();
        assert_eq!(
            request.headers().get(header::AUTHORIZATION).unwrap(),
            "Bearer secret"
        );
    }

    #[test]
    fn unauthorized_clears_session_and_redirects_to_login() {
        let mut session = Session::in_memory();
        session.establish("stale".into(), user()).unwrap();
        let mut gateway = Gateway::new("http://localhost:8080/api", session).unwrap();

        let err = gateway.intercept_unauthorized();

        assert!(matches!(err, GatewayError::Unauthenticated));
        assert_eq!(err.redirect(), Some(LOGIN_PATH));
        assert!(!gateway.session().is_authenticated());
        assert!(gateway.session().user().is_none());
    }

    #[actix_web::test]
    async fn talks_to_a_running_server() {
        let store = Arc::new(MemoryStore::with_jobs(6));
        let services = Services::new(store.clone(), store.clone(), store.clone(), store);
        let server = HttpServer::new(move || {
            let services = services.clone();
            App::new().configure(move |cfg| services.configure(cfg))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        let mut gateway =
            Gateway::new(format!("http://{addr}/api"), Session::in_memory()).unwrap();

        assert_eq!(gateway.jobs().await.unwrap().len(), 6);
        assert!(matches!(
            gateway.applications().await,
            Err(GatewayError::Unauthenticated)
        ));

        let user = gateway
            .register("Alice", "alice@example.com", "password123", "password123")
            .await
            .unwrap();
        assert_eq!(gateway.session().user().map(|u| u.id), Some(user.id));

        let created = gateway.create_application(3, "I am qualified").await.unwrap();
        assert_eq!(created.application.job.id, 3);

        match gateway.create_application(3, "again").await {
            Err(GatewayError::Api { status, message, .. }) => {
                assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
                assert_eq!(message, "You have already applied for this job");
            }
            other => panic!("expected a conflict, got {other:?}"),
        }

        let id = created.application.application.id;
        let updated = gateway.update_application(id, "Even more qualified").await.unwrap();
        assert_eq!(updated.application.application.reason, "Even more qualified");
        assert_eq!(gateway.application(id).await.unwrap().job.id, 3);
        assert_eq!(
            gateway.delete_application(id).await.unwrap(),
            "Application deleted successfully"
        );

        gateway.logout().await.unwrap();
        assert!(!gateway.session().is_authenticated());

        // A token the server no longer knows clears the local session
        let mut stale = Session::in_memory();
        stale.establish("revoked".into(), user).unwrap();
        let mut gateway = Gateway::new(format!("http://{addr}/api"), stale).unwrap();
        let err = gateway.user().await.unwrap_err();
        assert_eq!(err.redirect(), Some(LOGIN_PATH));
        assert!(!gateway.session().is_authenticated());

        handle.stop(true).await;
    }
}
