use actix_web::{
    HttpResponse, get, post,
    web::{Data, ServiceConfig},
};
use actix_web_validator::Json;

use crate::api::application::dto::MessageResponse;
use crate::api::auth::dto::{AuthResponse, LoginRequest, RegisterRequest};
use crate::api::auth::service::IssuedToken;
use crate::api::auth::{AuthService, AuthenticatedUser};
use crate::api::error::ServiceError;

fn auth_response(message: &str, issued: IssuedToken) -> AuthResponse {
    AuthResponse {
        message: message.to_string(),
        user: issued.user,
        token: issued.token,
        token_type: "Bearer".to_string(),
    }
}

#[post("/register")]
async fn register(
    service: Data<AuthService>,
    input: Json<RegisterRequest>,
) -> Result<HttpResponse, ServiceError> {
    let input = input.into_inner();
    let issued = service
        .register(
            input.name.as_deref().unwrap_or_default(),
            input.email.as_deref().unwrap_or_default(),
            input.password.as_deref().unwrap_or_default(),
            input.password_confirmation.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(HttpResponse::Created().json(auth_response("User registered successfully", issued)))
}

#[post("/login")]
async fn login(
    service: Data<AuthService>,
    input: Json<LoginRequest>,
) -> Result<HttpResponse, ServiceError> {
    let issued = service
        .login(
            input.email.as_deref().unwrap_or_default(),
            input.password.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(auth_response("Login successful", issued)))
}

#[post("/logout")]
async fn logout(
    service: Data<AuthService>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, ServiceError> {
    service.logout(&auth.token).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Logged out successfully".to_string(),
    }))
}

#[get("/user")]
async fn current_user(auth: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(auth.user)
}

pub fn auth_config(config: &mut ServiceConfig) {
    config
        .service(register)
        .service(login)
        .service(logout)
        .service(current_user);
}
