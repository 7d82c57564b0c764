use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::domain::LobbyId;
use crate::error::AppError;
use crate::errors::ErrorCode;

/// Lobby id taken from the `{lobby_id}` path segment, normalized to upper
/// case. Existence is left to the handler.
#[derive(Debug, Clone)]
pub struct LobbyIdPath(pub LobbyId);

impl FromRequest for LobbyIdPath {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = req
            .match_info()
            .get("lobby_id")
            .ok_or_else(|| {
                AppError::bad_request(ErrorCode::InvalidLobbyId, "Missing lobby_id parameter")
            })
            .and_then(|raw| LobbyId::parse(raw).map_err(AppError::from))
            .map(LobbyIdPath);
        ready(result)
    }
}
