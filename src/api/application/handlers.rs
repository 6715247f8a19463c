use actix_web::{
    HttpResponse, delete, get, post, put,
    web::{self, Data, Path, ServiceConfig, scope},
};

use crate::api::application::ApplicationService;
use crate::api::application::dto::{
    ApplicationResponse, CreateApplicationRequest, MessageResponse, UpdateApplicationRequest,
};
use crate::api::auth::AuthenticatedUser;
use crate::api::error::ServiceError;

#[get("")]
async fn list_applications(
    service: Data<ApplicationService>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, ServiceError> {
    let applications = service.list_applications(auth.user.id).await?;
    Ok(HttpResponse::Ok().json(applications))
}

#[post("")]
async fn create_application(
    service: Data<ApplicationService>,
    auth: AuthenticatedUser,
    input: web::Json<CreateApplicationRequest>,
) -> Result<HttpResponse, ServiceError> {
    let application = service.create_application(auth.user.id, &input).await?;

    Ok(HttpResponse::Created().json(ApplicationResponse {
        message: "Application submitted successfully".to_string(),
        application,
    }))
}

#[get("/{id}")]
async fn show_application(
    service: Data<ApplicationService>,
    auth: AuthenticatedUser,
    path: Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let application = service
        .get_application(auth.user.id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(application))
}

#[put("/{id}")]
async fn update_application(
    service: Data<ApplicationService>,
    auth: AuthenticatedUser,
    path: Path<i64>,
    input: web::Json<UpdateApplicationRequest>,
) -> Result<HttpResponse, ServiceError> {
    let application = service
        .update_application(auth.user.id, path.into_inner(), &input)
        .await?;

    Ok(HttpResponse::Ok().json(ApplicationResponse {
        message: "Application updated successfully".to_string(),
        application,
    }))
}

#[delete("/{id}")]
async fn delete_application(
    service: Data<ApplicationService>,
    auth: AuthenticatedUser,
    path: Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    service
        .delete_application(auth.user.id, path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Application deleted successfully".to_string(),
    }))
}

/// Application routes; every handler requires a bearer token
pub fn application_config(config: &mut ServiceConfig) {
    config.service(
        scope("/applications")
            .service(list_applications)
            .service(create_application)
            .service(show_application)
            .service(update_application)
            .service(delete_application),
    );
}
