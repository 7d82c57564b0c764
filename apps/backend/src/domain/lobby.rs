//! Lobby membership: players, host identity, capacity.
//!
//! Everything here is pure and single-threaded; the coordinator in
//! `services` wraps each `Lobby` in its own lock.

use std::fmt;

use lazy_regex::regex_is_match;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::domain::rules::MAX_NICKNAME_CHARS;
use crate::errors::domain::{ConflictKind, DomainError, ValidationKind};

/// Identity of one live client connection.
pub type ConnId = Uuid;

/// Short, human-shareable lobby code (`[A-Z0-9]{6}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LobbyId(String);

impl LobbyId {
    /// Parse a user-supplied code. Surrounding whitespace and letter case
    /// are not significant.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let candidate = raw.trim().to_ascii_uppercase();
        if regex_is_match!(r"^[A-Z0-9]{6}$", &candidate) {
            Ok(Self(candidate))
        } else {
            Err(DomainError::validation(
                ValidationKind::InvalidLobbyId,
                format!("Invalid lobby id: {raw}"),
            ))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LobbyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trim and NFKC-normalize a nickname, rejecting empty or oversized ones.
///
/// Uniqueness inside a lobby is checked on the normalized form, so two
/// visually identical nicknames cannot coexist.
pub fn normalize_nickname(raw: &str) -> Result<String, DomainError> {
    let nickname: String = raw.trim().nfkc().collect();
    if nickname.is_empty() {
        return Err(DomainError::validation(
            ValidationKind::InvalidNickname,
            "Nickname must not be empty",
        ));
    }
    if nickname.chars().count() > MAX_NICKNAME_CHARS {
        return Err(DomainError::validation(
            ValidationKind::InvalidNickname,
            format!("Nickname must be at most {MAX_NICKNAME_CHARS} characters"),
        ));
    }
    Ok(nickname)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub conn_id: ConnId,
    pub nickname: String,
    pub is_host: bool,
    /// Set only for the player who rolled 1 in the most recently finished game.
    pub is_loser: bool,
    /// Cosmetic avatar selection.
    pub avatar: u32,
}

impl Player {
    pub fn new(conn_id: ConnId, nickname: impl Into<String>, avatar: u32) -> Self {
        Self {
            conn_id,
            nickname: nickname.into(),
            is_host: false,
            is_loser: false,
            avatar,
        }
    }
}

/// Outcome of removing a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub player: Player,
    /// Position the player occupied before removal.
    pub index: usize,
    /// Set when the departing player was host and someone remains.
    pub new_host: Option<Player>,
}

#[derive(Debug, Clone)]
pub struct Lobby {
    id: LobbyId,
    /// Join order, or turn order once a game has started.
    players: Vec<Player>,
    max_players: usize,
}

impl Lobby {
    /// Open a lobby with `host` as its sole member.
    pub fn open(id: LobbyId, mut host: Player, max_players: usize) -> Self {
        host.is_host = true;
        Self {
            id,
            players: vec![host],
            max_players,
        }
    }

    pub fn id(&self) -> &LobbyId {
        &self.id
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub(crate) fn players_mut(&mut self) -> &mut [Player] {
        &mut self.players
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn host(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_host)
    }

    pub fn position_of(&self, conn_id: ConnId) -> Option<usize> {
        self.players.iter().position(|p| p.conn_id == conn_id)
    }

    pub fn member(&self, conn_id: ConnId) -> Option<&Player> {
        self.players.iter().find(|p| p.conn_id == conn_id)
    }

    pub fn is_host(&self, conn_id: ConnId) -> bool {
        self.member(conn_id).is_some_and(|p| p.is_host)
    }

    /// Check whether `conn_id` could join under `nickname` without changing
    /// anything.
    pub fn can_admit(&self, conn_id: ConnId, nickname: &str) -> Result<(), DomainError> {
        if self.players.len() >= self.max_players {
            return Err(DomainError::conflict(
                ConflictKind::LobbyFull,
                format!("Lobby {} is full ({} players)", self.id, self.max_players),
            ));
        }
        if self.players.iter().any(|p| p.nickname == nickname) {
            return Err(DomainError::conflict(
                ConflictKind::NicknameTaken,
                format!("Nickname '{nickname}' is already used in this lobby"),
            ));
        }
        if self.position_of(conn_id).is_some() {
            return Err(DomainError::conflict(
                ConflictKind::Other("ALREADY_MEMBER".into()),
                "Connection is already a member of this lobby",
            ));
        }
        Ok(())
    }

    /// Append a non-host member.
    pub fn admit(&mut self, mut player: Player) -> Result<&Player, DomainError> {
        self.can_admit(player.conn_id, &player.nickname)?;

        player.is_host = false;
        self.players.push(player);
        let idx = self.players.len() - 1;
        Ok(&self.players[idx])
    }

    /// Remove the member bound to `conn_id`, if any.
    ///
    /// When the host leaves and players remain, the earliest remaining
    /// member becomes host.
    pub fn remove(&mut self, conn_id: ConnId) -> Option<Departure> {
        let index = self.position_of(conn_id)?;
        let player = self.players.remove(index);

        let new_host = match self.players.first_mut() {
            Some(first) if player.is_host => {
                first.is_host = true;
                Some(first.clone())
            }
            _ => None,
        };

        Some(Departure {
            player,
            index,
            new_host,
        })
    }
}
