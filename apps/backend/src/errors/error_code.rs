//! Error codes for the lobby coordinator API.
//!
//! Add new codes here; never pass ad-hoc strings as error codes.
//! All error codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings
//! that appear in HTTP Problem Details bodies and `lobby_error` frames.

use core::fmt;

use serde::{Serialize, Serializer};

/// Centralized error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Lobby membership
    /// No lobby is registered under the given id
    LobbyNotFound,
    /// Lobby is at capacity
    LobbyFull,
    /// Another member of the lobby already uses this nickname
    NicknameTaken,

    // Authorization within a lobby
    /// Only the host may perform this action
    NotHost,
    /// Only the current turn holder may roll
    NotYourTurn,

    // Game lifecycle
    /// A game needs at least two players
    NotEnoughPlayers,
    /// No game is in progress
    NotActive,
    /// A game is already in progress for this lobby
    GameAlreadyActive,

    // Request Validation
    /// Starting bound must be a positive integer
    InvalidBound,
    /// Nickname is empty or too long
    InvalidNickname,
    /// Lobby id is not a well-formed code
    InvalidLobbyId,
    /// General validation error
    ValidationError,
    /// General bad request error
    BadRequest,

    // Access
    /// Access denied
    Forbidden,
    /// General not found error
    NotFound,

    // System Errors
    /// Internal server error
    Internal,
    /// Configuration error
    ConfigError,
}

impl ErrorCode {
    /// Returns the canonical SCREAMING_SNAKE_CASE string for this error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LobbyNotFound => "LOBBY_NOT_FOUND",
            Self::LobbyFull => "LOBBY_FULL",
            Self::NicknameTaken => "NICKNAME_TAKEN",

            Self::NotHost => "NOT_HOST",
            Self::NotYourTurn => "NOT_YOUR_TURN",

            Self::NotEnoughPlayers => "NOT_ENOUGH_PLAYERS",
            Self::NotActive => "NOT_ACTIVE",
            Self::GameAlreadyActive => "GAME_ALREADY_ACTIVE",

            Self::InvalidBound => "INVALID_BOUND",
            Self::InvalidNickname => "INVALID_NICKNAME",
            Self::InvalidLobbyId => "INVALID_LOBBY_ID",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::BadRequest => "BAD_REQUEST",

            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",

            Self::Internal => "INTERNAL",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
