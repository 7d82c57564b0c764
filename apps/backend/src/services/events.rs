//! Outbound lobby notifications.

use crate::domain::{ConnId, LobbyId, PlayerView, RollView};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameOverReason {
    /// A player rolled 1.
    Loser {
        connection_id: ConnId,
        nickname: String,
    },
    /// The host ended the game early. Nobody lost.
    HostStopped,
}

/// One notification addressed to one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyEvent {
    PlayerJoined {
        lobby_id: LobbyId,
        player: PlayerView,
        players: Vec<PlayerView>,
    },
    PlayerLeft {
        lobby_id: LobbyId,
        connection_id: ConnId,
        nickname: String,
    },
    HostChanged {
        lobby_id: LobbyId,
        connection_id: ConnId,
        new_host: String,
    },
    GameStarted {
        lobby_id: LobbyId,
        starting_bound: u32,
        current_turn: usize,
        /// Turn order fixed for the whole game.
        players: Vec<PlayerView>,
    },
    /// `roll` is `None` when the turn moved because its holder left.
    TurnChanged {
        lobby_id: LobbyId,
        current_turn: usize,
        turn_holder: ConnId,
        roll: Option<RollView>,
    },
    CurrentRoll {
        lobby_id: LobbyId,
        roll: RollView,
    },
    PlayerReachedOne {
        lobby_id: LobbyId,
        connection_id: ConnId,
        nickname: String,
        roll: RollView,
        /// True only in the copy sent to the loser.
        is_you: bool,
    },
    GameOver {
        lobby_id: LobbyId,
        reason: GameOverReason,
    },
}

impl LobbyEvent {
    pub fn lobby_id(&self) -> &LobbyId {
        match self {
            LobbyEvent::PlayerJoined { lobby_id, .. }
            | LobbyEvent::PlayerLeft { lobby_id, .. }
            | LobbyEvent::HostChanged { lobby_id, .. }
            | LobbyEvent::GameStarted { lobby_id, .. }
            | LobbyEvent::TurnChanged { lobby_id, .. }
            | LobbyEvent::CurrentRoll { lobby_id, .. }
            | LobbyEvent::PlayerReachedOne { lobby_id, .. }
            | LobbyEvent::GameOver { lobby_id, .. } => lobby_id,
        }
    }

    /// Wire name of the event, also used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            LobbyEvent::PlayerJoined { .. } => "player_joined",
            LobbyEvent::PlayerLeft { .. } => "player_left",
            LobbyEvent::HostChanged { .. } => "host_changed",
            LobbyEvent::GameStarted { .. } => "game_started",
            LobbyEvent::TurnChanged { .. } => "turn_changed",
            LobbyEvent::CurrentRoll { .. } => "current_roll",
            LobbyEvent::PlayerReachedOne { .. } => "player_reached_one",
            LobbyEvent::GameOver { .. } => "game_over",
        }
    }
}

/// Delivery seam between the coordinator and live connections.
///
/// Called while the lobby lock is held: implementations must not block
/// and must not call back into the coordinator.
pub trait LobbyNotifier: Send + Sync + 'static {
    fn notify(&self, conn_id: ConnId, event: LobbyEvent);
}

/// Drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl LobbyNotifier for NoopNotifier {
    fn notify(&self, _conn_id: ConnId, _event: LobbyEvent) {}
}
