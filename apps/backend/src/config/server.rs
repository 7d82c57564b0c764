//! Server configuration loaded from environment variables.
//!
//! Every setting has a default so a bare `backend` binary starts on
//! `0.0.0.0:3001`. Values that are present but malformed are rejected at
//! startup rather than silently replaced.

use std::env;
use std::time::Duration;

use crate::domain::rules::{DEFAULT_GAME_OVER_DELAY, DEFAULT_MAX_PLAYERS, MIN_PLAYERS_TO_START};
use crate::error::AppError;
use crate::services::CoordinatorConfig;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Per-lobby capacity.
    pub max_players: usize,
    /// Window between a roll of 1 and the `game_over` broadcast.
    pub game_over_delay: Duration,
    /// Shared secret for `/api/keep-alive`. `None` leaves the probe open.
    pub keep_alive_secret: Option<String>,
    /// Browser origins allowed by CORS. Empty means localhost only.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_players: DEFAULT_MAX_PLAYERS,
            game_over_delay: DEFAULT_GAME_OVER_DELAY,
            keep_alive_secret: None,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let present = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = present("BACKEND_HOST").unwrap_or(defaults.host);

        let port = match present("BACKEND_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| {
                AppError::config(format!("BACKEND_PORT must be a valid port number, got '{raw}'"))
            })?,
            None => defaults.port,
        };

        let max_players = match present("LOBBY_MAX_PLAYERS") {
            Some(raw) => {
                let parsed = raw.parse::<usize>().map_err(|_| {
                    AppError::config(format!("LOBBY_MAX_PLAYERS must be an integer, got '{raw}'"))
                })?;
                if parsed < MIN_PLAYERS_TO_START {
                    return Err(AppError::config(format!(
                        "LOBBY_MAX_PLAYERS must be at least {MIN_PLAYERS_TO_START}, got {parsed}"
                    )));
                }
                parsed
            }
            None => defaults.max_players,
        };

        let game_over_delay = match present("GAME_OVER_DELAY_MS") {
            Some(raw) => raw.parse::<u64>().map(Duration::from_millis).map_err(|_| {
                AppError::config(format!(
                    "GAME_OVER_DELAY_MS must be a non-negative integer, got '{raw}'"
                ))
            })?,
            None => defaults.game_over_delay,
        };

        let keep_alive_secret = present("KEEP_ALIVE_SECRET");

        // Comma-separated, e.g. http://localhost:3000,https://deathroll.example
        let cors_origins = present("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty() && *s != "null")
                    .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host,
            port,
            max_players,
            game_over_delay,
            keep_alive_secret,
            cors_origins,
        })
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            max_players: self.max_players,
            game_over_delay: self.game_over_delay,
            rng_seed: None,
        }
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
