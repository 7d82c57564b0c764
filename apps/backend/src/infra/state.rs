use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::services::{LobbyCoordinator, LobbyNotifier};
use crate::state::app_state::AppState;
use crate::ws::hub::WsRegistry;

/// Builder for creating AppState instances (used in both tests and main)
pub struct StateBuilder {
    config: ServerConfig,
    rng_seed: Option<u64>,
    notifier: Option<Arc<dyn LobbyNotifier>>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            rng_seed: None,
            notifier: None,
        }
    }

    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_game_over_delay(mut self, delay: Duration) -> Self {
        self.config.game_over_delay = delay;
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Route coordinator events somewhere other than the WebSocket
    /// registry.
    pub fn with_notifier(mut self, notifier: Arc<dyn LobbyNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        if self.config.max_players < crate::domain::rules::MIN_PLAYERS_TO_START {
            return Err(AppError::config(format!(
                "max_players must be at least {}",
                crate::domain::rules::MIN_PLAYERS_TO_START
            )));
        }

        let registry = Arc::new(WsRegistry::new());
        let notifier: Arc<dyn LobbyNotifier> = match self.notifier {
            Some(notifier) => notifier,
            None => registry.clone(),
        };

        let mut coordinator_config = self.config.coordinator_config();
        coordinator_config.rng_seed = self.rng_seed;
        let coordinator = Arc::new(LobbyCoordinator::new(coordinator_config, notifier));

        info!(
            max_players = self.config.max_players,
            game_over_delay_ms = self.config.game_over_delay.as_millis() as u64,
            "lobby coordinator ready"
        );
        Ok(AppState::new(coordinator, registry, self.config))
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
