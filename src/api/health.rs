use actix_web::{HttpResponse, Responder, get, web};
use serde::Serialize;
use sqlx::{Pool, Postgres};
use tracing::error;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn ping(pool: &Pool<Postgres>) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map(|_| ())
}

/// Reports 200 with `healthy_status` when the database answers, 503 otherwise
async fn database_probe(
    pool: &Pool<Postgres>,
    healthy_status: &'static str,
    unhealthy_status: &'static str,
) -> HttpResponse {
    match ping(pool).await {
        Ok(()) => HttpResponse::Ok().json(HealthResponse {
            status: healthy_status,
            database: "connected",
            error: None,
        }),
        Err(e) => {
            error!("{} probe failed: {:?}", healthy_status, e);
            HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: unhealthy_status,
                database: "disconnected",
                error: Some(format!("Database error: {}", e)),
            })
        }
    }
}

/// General health including database connectivity, for uptime monitors
#[get("/health")]
async fn health_check(pool: web::Data<Pool<Postgres>>) -> impl Responder {
    database_probe(pool.get_ref(), "healthy", "unhealthy").await
}

/// Readiness for load balancers; fails while the database is unreachable
#[get("/ready")]
async fn readiness_check(pool: web::Data<Pool<Postgres>>) -> impl Responder {
    database_probe(pool.get_ref(), "ready", "not_ready").await
}

/// Liveness only; dependencies are not checked
#[get("/live")]
async fn liveness_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "alive",
        database: "not_checked",
        error: None,
    })
}

pub fn health_config(config: &mut web::ServiceConfig) {
    config
        .service(health_check)
        .service(readiness_check)
        .service(liveness_check);
}
