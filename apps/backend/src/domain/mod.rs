//! Domain layer: pure lobby and game logic, no locking or I/O.

pub mod game;
pub mod lobby;
pub mod rules;
pub mod snapshot;

#[cfg(test)]
mod tests_props_membership;

// Re-exports for ergonomics
pub use game::{validate_bound, Game, RollOutcome, RollRecord, TurnShift};
pub use lobby::{normalize_nickname, ConnId, Departure, Lobby, LobbyId, Player};
pub use snapshot::{GameView, LobbySnapshot, PlayerView, RollView};
