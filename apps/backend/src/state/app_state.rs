use std::sync::Arc;

use time::OffsetDateTime;

use crate::config::ServerConfig;
use crate::services::LobbyCoordinator;
use crate::ws::hub::WsRegistry;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    coordinator: Arc<LobbyCoordinator>,
    websocket_registry: Arc<WsRegistry>,
    config: Arc<ServerConfig>,
    started_at: OffsetDateTime,
}

impl AppState {
    pub fn new(
        coordinator: Arc<LobbyCoordinator>,
        websocket_registry: Arc<WsRegistry>,
        config: ServerConfig,
    ) -> Self {
        Self {
            coordinator,
            websocket_registry,
            config: Arc::new(config),
            started_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn coordinator(&self) -> Arc<LobbyCoordinator> {
        Arc::clone(&self.coordinator)
    }

    pub fn websocket_registry(&self) -> Arc<WsRegistry> {
        Arc::clone(&self.websocket_registry)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn started_at(&self) -> OffsetDateTime {
        self.started_at
    }
}
