use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
struct KeepAliveQuery {
    secret: Option<String>,
}

/// Uptime probe for external cron pingers.
///
/// With `KEEP_ALIVE_SECRET` set, the `secret` query parameter must match.
async fn keep_alive(
    query: web::Query<KeepAliveQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    if let Some(expected) = app_state.config().keep_alive_secret.as_deref() {
        if query.secret.as_deref() != Some(expected) {
            warn!("keep-alive rejected: secret mismatch");
            return Err(AppError::forbidden(
                ErrorCode::Forbidden,
                "Invalid keep-alive secret",
            ));
        }
    }

    debug!(
        lobbies = app_state.coordinator().lobby_count(),
        "keep-alive ping"
    );
    Ok(HttpResponse::NoContent().finish())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(keep_alive));
}
