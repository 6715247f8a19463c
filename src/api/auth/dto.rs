use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::UserRow;

/// Body of `POST /register`
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        required(message = "The name field is required."),
        length(min = 1, max = 255, message = "The name field is required and may not exceed 255 characters.")
    )]
    pub name: Option<String>,
    #[validate(
        required(message = "The email field is required."),
        email(message = "The email field must be a valid email address.")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "The password field is required."),
        length(min = 8, message = "The password field must be at least 8 characters.")
    )]
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
}

/// Body of `POST /login`
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(
        required(message = "The email field is required."),
        email(message = "The email field must be a valid email address.")
    )]
    pub email: Option<String>,
    #[validate(required(message = "The password field is required."))]
    pub password: Option<String>,
}

/// Response for register and login
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserRow,
    pub token: String,
    pub token_type: String,
}
