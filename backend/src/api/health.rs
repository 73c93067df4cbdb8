use crate::state::AppState;
use actix_web::{HttpResponse, Responder, get, web};

#[get("/health")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "Taskflow Backend",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Ready once the backing store answers.
#[get("/ready")]
pub async fn readiness(state: web::Data<AppState>) -> impl Responder {
    match state.repos.health.ping() {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({"status": "ready"})),
        Err(e) => {
            log::warn!("Readiness check failed: {}", e);
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unavailable",
                "message": e.to_string()
            }))
        }
    }
}

#[get("/live")]
pub async fn liveness() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({"status": "alive"}))
}

#[get("/metrics")]
pub async fn metrics(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "uptimeSeconds": state.started_at.elapsed().as_secs(),
        "websocketConnections": state.hub.connection_count()
    }))
}

#[get("/info")]
pub async fn info(state: web::Data<AppState>) -> impl Responder {
    let storage = if state.config.in_memory {
        "memory"
    } else {
        "postgres"
    };
    HttpResponse::Ok().json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage,
        "emailRelay": state.config.email_relay_url.is_some()
    }))
}
