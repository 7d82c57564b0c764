//! Read-only projections of lobby and game state, used to (re)synchronize
//! clients over both HTTP and WebSocket.

use serde::Serialize;

use crate::domain::game::{Game, RollRecord};
use crate::domain::lobby::{ConnId, Lobby, LobbyId, Player};
use crate::domain::rules::ROLL_FLOOR;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlayerView {
    pub connection_id: ConnId,
    pub nickname: String,
    pub is_host: bool,
    pub is_loser: bool,
    pub avatar: u32,
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        Self {
            connection_id: player.conn_id,
            nickname: player.nickname.clone(),
            is_host: player.is_host,
            is_loser: player.is_loser,
            avatar: player.avatar,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RollView {
    pub connection_id: ConnId,
    pub nickname: String,
    pub value: u32,
    pub range_start: u32,
    pub range_end: u32,
}

impl From<&RollRecord> for RollView {
    fn from(record: &RollRecord) -> Self {
        Self {
            connection_id: record.conn_id,
            nickname: record.nickname.clone(),
            value: record.value,
            range_start: ROLL_FLOOR,
            range_end: record.bound,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GameView {
    pub is_active: bool,
    pub starting_bound: u32,
    pub current_turn: usize,
    pub last_roll: Option<u32>,
    pub is_first_turn: bool,
    pub next_bound: u32,
    pub rolls: Vec<RollView>,
}

impl From<&Game> for GameView {
    fn from(game: &Game) -> Self {
        Self {
            is_active: game.is_active(),
            starting_bound: game.starting_bound(),
            current_turn: game.current_turn(),
            last_roll: game.last_roll(),
            is_first_turn: game.is_first_turn(),
            next_bound: game.next_bound(),
            rolls: game.rolls().iter().map(RollView::from).collect(),
        }
    }
}

/// Full lobby state as seen by any member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LobbySnapshot {
    pub lobby_id: LobbyId,
    /// Derived from the member flagged as host, so it cannot drift.
    pub host_nickname: String,
    pub players: Vec<PlayerView>,
    pub max_players: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<GameView>,
}

impl LobbySnapshot {
    pub fn capture(lobby: &Lobby, game: Option<&Game>) -> Self {
        Self {
            lobby_id: lobby.id().clone(),
            host_nickname: lobby
                .host()
                .map(|host| host.nickname.clone())
                .unwrap_or_default(),
            players: lobby.players().iter().map(PlayerView::from).collect(),
            max_players: lobby.max_players(),
            game: game.map(GameView::from),
        }
    }
}
