use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::domain::LobbyId;
use crate::error::AppError;
use crate::extractors::LobbyIdPath;
use crate::state::app_state::AppState;

/// GET /api/lobbies/{lobby_id}
async fn get_lobby(
    lobby_id: LobbyIdPath,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let snapshot = app_state.coordinator().lobby_snapshot(&lobby_id.0)?;
    Ok(HttpResponse::Ok().json(snapshot))
}

#[derive(Debug, Serialize)]
struct ExistsResponse {
    exists: bool,
}

/// GET /api/lobbies/{lobby_id}/exists
///
/// A malformed id simply does not exist.
async fn lobby_exists(
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let exists = LobbyId::parse(&path)
        .map(|id| app_state.coordinator().lobby_exists(&id))
        .unwrap_or(false);
    Ok(HttpResponse::Ok().json(ExistsResponse { exists }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/{lobby_id}", web::get().to(get_lobby))
        .route("/{lobby_id}/exists", web::get().to(lobby_exists));
}
