//! Turn engine state for one deathroll game.
//!
//! Turn order is the lobby's player sequence, shuffled once at start. Each
//! roll is drawn uniformly from `1..=bound`, where the bound is the host's
//! starting value for the first roll and the most recent roll afterwards.
//! Rolling 1 loses.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::lobby::{ConnId, Player};
use crate::domain::rules::ROLL_FLOOR;
use crate::errors::domain::{DomainError, ValidationKind};

/// One generated roll, recorded against the player who made it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollRecord {
    pub conn_id: ConnId,
    pub nickname: String,
    pub value: u32,
    /// Inclusive upper bound the value was drawn from.
    pub bound: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollOutcome {
    /// The turn passed to `next_turn`.
    Continue { record: RollRecord, next_turn: usize },
    /// The roller hit 1; the game is over.
    ReachedOne { record: RollRecord, loser_index: usize },
}

/// Effect of a membership change on whose turn it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnShift {
    /// Same player still holds the turn (their index may have moved).
    Unchanged,
    /// The turn holder left; the turn now belongs to `current_turn`.
    Moved { current_turn: usize },
}

#[derive(Debug, Clone)]
pub struct Game {
    is_active: bool,
    starting_bound: u32,
    current_turn: usize,
    last_roll: Option<u32>,
    is_first_turn: bool,
    rolls: Vec<RollRecord>,
}

/// Validate a host-supplied starting bound.
pub fn validate_bound(raw: i64) -> Result<u32, DomainError> {
    u32::try_from(raw)
        .ok()
        .filter(|bound| *bound >= ROLL_FLOOR)
        .ok_or_else(|| {
            DomainError::validation(
                ValidationKind::InvalidBound,
                format!("Starting bound must be between {ROLL_FLOOR} and {}, got {raw}", u32::MAX),
            )
        })
}

impl Game {
    /// Begin a game: fix the turn order with a uniform shuffle and clear
    /// the previous game's loser.
    pub fn start<R: Rng>(players: &mut [Player], starting_bound: u32, rng: &mut R) -> Self {
        players.shuffle(rng);
        for player in players.iter_mut() {
            player.is_loser = false;
        }

        Self {
            is_active: true,
            starting_bound: starting_bound.max(ROLL_FLOOR),
            current_turn: 0,
            last_roll: None,
            is_first_turn: true,
            rolls: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn starting_bound(&self) -> u32 {
        self.starting_bound
    }

    pub fn current_turn(&self) -> usize {
        self.current_turn
    }

    pub fn last_roll(&self) -> Option<u32> {
        self.last_roll
    }

    pub fn is_first_turn(&self) -> bool {
        self.is_first_turn
    }

    pub fn rolls(&self) -> &[RollRecord] {
        &self.rolls
    }

    /// Inclusive upper bound for the next roll.
    pub fn next_bound(&self) -> u32 {
        if self.is_first_turn {
            self.starting_bound
        } else {
            self.last_roll.unwrap_or(self.starting_bound).max(ROLL_FLOOR)
        }
    }

    /// Roll for the player holding the turn.
    ///
    /// `players` must be the live turn order and non-empty; the caller has
    /// already checked that the game is active and who is acting.
    pub fn roll<R: Rng>(&mut self, players: &mut [Player], rng: &mut R) -> RollOutcome {
        debug_assert!(self.is_active, "roll on inactive game");
        debug_assert!(!players.is_empty(), "roll with no players");

        if self.current_turn >= players.len() {
            self.current_turn = 0;
        }

        let bound = self.next_bound();
        let value = rng.random_range(ROLL_FLOOR..=bound);
        self.is_first_turn = false;
        self.last_roll = Some(value);

        let roller = &mut players[self.current_turn];
        let record = RollRecord {
            conn_id: roller.conn_id,
            nickname: roller.nickname.clone(),
            value,
            bound,
        };
        self.rolls.push(record.clone());

        if value == ROLL_FLOOR {
            roller.is_loser = true;
            self.is_active = false;
            return RollOutcome::ReachedOne {
                record,
                loser_index: self.current_turn,
            };
        }

        self.current_turn = (self.current_turn + 1) % players.len();
        RollOutcome::Continue {
            record,
            next_turn: self.current_turn,
        }
    }

    /// Host-initiated early end. No loser is designated.
    pub fn stop(&mut self) {
        self.is_active = false;
    }

    /// Keep `current_turn` pointing at a valid player after the member at
    /// `removed_index` left and `remaining` players are still seated.
    ///
    /// A removal before the turn holder shifts the index down so the same
    /// player keeps the turn. Removing the turn holder hands the turn to
    /// whoever followed them, wrapping to the first seat. The roll chain is
    /// untouched: the next bound is still the most recent roll.
    pub fn on_player_removed(&mut self, removed_index: usize, remaining: usize) -> TurnShift {
        if remaining == 0 {
            self.current_turn = 0;
            return TurnShift::Unchanged;
        }

        if removed_index < self.current_turn {
            self.current_turn -= 1;
            TurnShift::Unchanged
        } else if removed_index == self.current_turn {
            if self.current_turn >= remaining {
                self.current_turn = 0;
            }
            TurnShift::Moved {
                current_turn: self.current_turn,
            }
        } else {
            TurnShift::Unchanged
        }
    }
}
