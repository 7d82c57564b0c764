use actix_web::{web, HttpResponse};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::AppError;
use crate::state::app_state::AppState;

pub async fn root() -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Deathroll lobby server is running 🎲"))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    app_version: &'static str,
    lobbies: usize,
    connections: usize,
    started_at: String,
    time: String,
}

fn rfc3339(at: OffsetDateTime) -> Result<String, AppError> {
    at.format(&Rfc3339)
        .map_err(|e| AppError::internal(format!("failed to format timestamp: {e}")))
}

async fn health(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let response = HealthResponse {
        status: "ok",
        app_version: env!("CARGO_PKG_VERSION"),
        lobbies: app_state.coordinator().lobby_count(),
        connections: app_state.websocket_registry().active_connections_count(),
        started_at: rfc3339(app_state.started_at())?,
        time: rfc3339(OffsetDateTime::now_utc())?,
    };

    Ok(HttpResponse::Ok().json(response))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(root))
        .route("/health", web::get().to(health));
}
