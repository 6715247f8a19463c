use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web::Data};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::api::auth::AuthService;
use crate::api::error::ServiceError;
use crate::db::models::UserRow;

/// The user behind a valid `Authorization: Bearer` token.
///
/// Taking this as a handler argument is what makes a route protected;
/// requests without a known token are answered with 401.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: UserRow,
    /// Plaintext token used for this request, needed to revoke it on logout
    pub token: String,
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

impl FromRequest for AuthenticatedUser {
    type Error = ServiceError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let service = req.app_data::<Data<AuthService>>().cloned();
        let token = bearer_token(req);
        let path = req.path().to_string();

        Box::pin(async move {
            let service = service.ok_or_else(|| {
                ServiceError::Internal("AuthService is not registered as app data".to_string())
            })?;
            let Some(token) = token else {
                warn!("Missing bearer token for {}", path);
                return Err(ServiceError::Unauthenticated);
            };
            let user = service.authenticate(&token).await?;
            Ok(AuthenticatedUser { user, token })
        })
    }
}
