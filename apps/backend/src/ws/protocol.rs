use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{ConnId, LobbyId, LobbySnapshot, PlayerView, RollView};
use crate::errors::ErrorCode;
use crate::services::{GameOverReason, LobbyEvent};

pub const PROTOCOL_VERSION: i32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    Hello {
        protocol: i32,
    },
    CreateLobby {
        nickname: String,
        #[serde(default)]
        avatar: u32,
    },
    JoinLobby {
        nickname: String,
        lobby_id: String,
        #[serde(default)]
        avatar: u32,
    },
    GetLobby {
        lobby_id: String,
    },
    LeaveLobby {
        lobby_id: String,
    },
    StartGame {
        lobby_id: String,
        starting_bound: i64,
    },
    PlayerAction {
        lobby_id: String,
    },
    StopGame {
        lobby_id: String,
    },
}

impl ClientMsg {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMsg::Hello { .. } => "hello",
            ClientMsg::CreateLobby { .. } => "create_lobby",
            ClientMsg::JoinLobby { .. } => "join_lobby",
            ClientMsg::GetLobby { .. } => "get_lobby",
            ClientMsg::LeaveLobby { .. } => "leave_lobby",
            ClientMsg::StartGame { .. } => "start_game",
            ClientMsg::PlayerAction { .. } => "player_action",
            ClientMsg::StopGame { .. } => "stop_game",
        }
    }
}

#[allow(clippy::large_enum_variant)]
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    HelloAck {
        protocol: i32,
        connection_id: Uuid,
    },

    LobbyCreated {
        lobby_id: LobbyId,
        player: PlayerView,
        lobby: LobbySnapshot,
    },

    LobbyJoined {
        lobby_id: LobbyId,
        player: PlayerView,
        lobby: LobbySnapshot,
    },

    LobbySnapshot {
        lobby: LobbySnapshot,
    },

    /// A rejected request, sent to the requester only.
    LobbyError {
        code: ErrorCode,
        message: String,
    },

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
        players: Vec<PlayerView>,
    },

    TurnChanged {
        lobby_id: LobbyId,
        current_turn: usize,
        turn_holder: ConnId,
        #[serde(skip_serializing_if = "Option::is_none")]
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
        is_you: bool,
    },

    GameOver {
        lobby_id: LobbyId,
        reason: GameOverKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        loser: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        loser_connection_id: Option<ConnId>,
    },

    /// Protocol violation; the socket is closed right after.
    Error {
        code: WsErrorCode,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverKind {
    Loser,
    HostStopped,
}

impl From<LobbyEvent> for ServerMsg {
    fn from(event: LobbyEvent) -> Self {
        match event {
            LobbyEvent::PlayerJoined {
                lobby_id,
                player,
                players,
            } => ServerMsg::PlayerJoined {
                lobby_id,
                player,
                players,
            },
            LobbyEvent::PlayerLeft {
                lobby_id,
                connection_id,
                nickname,
            } => ServerMsg::PlayerLeft {
                lobby_id,
                connection_id,
                nickname,
            },
            LobbyEvent::HostChanged {
                lobby_id,
                connection_id,
                new_host,
            } => ServerMsg::HostChanged {
                lobby_id,
                connection_id,
                new_host,
            },
            LobbyEvent::GameStarted {
                lobby_id,
                starting_bound,
                current_turn,
                players,
            } => ServerMsg::GameStarted {
                lobby_id,
                starting_bound,
                current_turn,
                players,
            },
            LobbyEvent::TurnChanged {
                lobby_id,
                current_turn,
                turn_holder,
                roll,
            } => ServerMsg::TurnChanged {
                lobby_id,
                current_turn,
                turn_holder,
                roll,
            },
            LobbyEvent::CurrentRoll { lobby_id, roll } => ServerMsg::CurrentRoll { lobby_id, roll },
            LobbyEvent::PlayerReachedOne {
                lobby_id,
                connection_id,
                nickname,
                roll,
                is_you,
            } => ServerMsg::PlayerReachedOne {
                lobby_id,
                connection_id,
                nickname,
                roll,
                is_you,
            },
            LobbyEvent::GameOver { lobby_id, reason } => match reason {
                GameOverReason::Loser {
                    connection_id,
                    nickname,
                } => ServerMsg::GameOver {
                    lobby_id,
                    reason: GameOverKind::Loser,
                    loser: Some(nickname),
                    loser_connection_id: Some(connection_id),
                },
                GameOverReason::HostStopped => ServerMsg::GameOver {
                    lobby_id,
                    reason: GameOverKind::HostStopped,
                    loser: None,
                    loser_connection_id: None,
                },
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WsErrorCode {
    BadProtocol,
    BadRequest,
}

impl WsErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WsErrorCode::BadProtocol => "bad_protocol",
            WsErrorCode::BadRequest => "bad_request",
        }
    }
}
