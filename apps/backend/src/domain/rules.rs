//! Fixed rules of a deathroll lobby.

use std::time::Duration;

/// Default per-lobby capacity.
pub const DEFAULT_MAX_PLAYERS: usize = 10;

/// A game cannot start with fewer members than this.
pub const MIN_PLAYERS_TO_START: usize = 2;

/// Length of a lobby code.
pub const LOBBY_CODE_LEN: usize = 6;

/// Alphabet lobby codes are drawn from.
pub const LOBBY_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Nicknames longer than this (in chars, after normalization) are rejected.
pub const MAX_NICKNAME_CHARS: usize = 24;

/// Every roll is drawn from `ROLL_FLOOR..=bound`.
pub const ROLL_FLOOR: u32 = 1;

/// Default window between a losing roll and the final game-over notice.
pub const DEFAULT_GAME_OVER_DELAY: Duration = Duration::from_secs(6);
