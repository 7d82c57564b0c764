//! Turn engine operations: start, roll, stop, and the delayed game-over.

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::domain::rules::MIN_PLAYERS_TO_START;
use crate::domain::{validate_bound, ConnId, Game, LobbyId, PlayerView, RollOutcome, RollView};
use crate::errors::domain::{ConflictKind, DomainError, ForbiddenKind, ValidationKind};
use crate::services::coordinator::{LobbyCoordinator, LobbySlot, SlotHandle};
use crate::services::events::{GameOverReason, LobbyEvent, LobbyNotifier};

fn not_host(lobby_id: &LobbyId) -> DomainError {
    DomainError::forbidden(
        ForbiddenKind::NotHost,
        format!("Only the host of lobby {lobby_id} can do that"),
    )
}

fn not_active(lobby_id: &LobbyId) -> DomainError {
    DomainError::validation(
        ValidationKind::NotActive,
        format!("No game is in progress in lobby {lobby_id}"),
    )
}

impl LobbyCoordinator {
    /// Host starts a new game with the given starting bound.
    ///
    /// The player sequence is shuffled once here and stays the turn order
    /// until the next start. Any previous game is discarded.
    pub fn start_game(
        &self,
        lobby_id: &LobbyId,
        conn_id: ConnId,
        starting_bound: i64,
    ) -> Result<(), DomainError> {
        let handle = self.handle(lobby_id)?;
        let mut guard = handle.lock();
        if guard.closed {
            return Err(DomainError::lobby_not_found(lobby_id));
        }
        let slot = &mut *guard;

        if !slot.lobby.is_host(conn_id) {
            return Err(not_host(lobby_id));
        }
        if slot.lobby.len() < MIN_PLAYERS_TO_START {
            return Err(DomainError::validation(
                ValidationKind::NotEnoughPlayers,
                format!("At least {MIN_PLAYERS_TO_START} players are needed to start"),
            ));
        }
        if slot.game.as_ref().is_some_and(Game::is_active) {
            return Err(DomainError::conflict(
                ConflictKind::GameAlreadyActive,
                format!("A game is already in progress in lobby {lobby_id}"),
            ));
        }
        let bound = validate_bound(starting_bound)?;

        let game = Game::start(slot.lobby.players_mut(), bound, &mut slot.rng);
        let current_turn = game.current_turn();
        slot.game = Some(game);

        let order: Vec<PlayerView> = slot.lobby.players().iter().map(PlayerView::from).collect();
        info!(
            lobby_id = %lobby_id,
            starting_bound = bound,
            players = order.len(),
            first = %order[current_turn].nickname,
            "game started"
        );
        self.broadcast(
            &slot.lobby,
            LobbyEvent::GameStarted {
                lobby_id: lobby_id.clone(),
                starting_bound: bound,
                current_turn,
                players: order,
            },
        );
        Ok(())
    }

    /// Roll for the turn holder.
    ///
    /// On a 1 the game ends at once: every member learns who reached one,
    /// and the final `GameOver` follows after the configured delay.
    pub fn player_action(
        &self,
        lobby_id: &LobbyId,
        conn_id: ConnId,
    ) -> Result<RollView, DomainError> {
        let handle = self.handle(lobby_id)?;
        let mut guard = handle.lock();
        if guard.closed {
            return Err(DomainError::lobby_not_found(lobby_id));
        }
        let slot = &mut *guard;

        let Some(game) = slot.game.as_mut().filter(|g| g.is_active()) else {
            return Err(not_active(lobby_id));
        };
        let holder = slot
            .lobby
            .players()
            .get(game.current_turn())
            .or_else(|| slot.lobby.players().first())
            .map(|p| p.conn_id);
        if holder != Some(conn_id) {
            return Err(DomainError::forbidden(
                ForbiddenKind::NotYourTurn,
                "It is not your turn",
            ));
        }

        match game.roll(slot.lobby.players_mut(), &mut slot.rng) {
            RollOutcome::Continue { record, next_turn } => {
                let roll = RollView::from(&record);
                let next_holder = slot.lobby.players()[next_turn].conn_id;
                info!(
                    lobby_id = %lobby_id,
                    conn_id = %conn_id,
                    nickname = %record.nickname,
                    roll = record.value,
                    bound = record.bound,
                    next_turn,
                    "roll"
                );
                self.broadcast(
                    &slot.lobby,
                    LobbyEvent::TurnChanged {
                        lobby_id: lobby_id.clone(),
                        current_turn: next_turn,
                        turn_holder: next_holder,
                        roll: Some(roll.clone()),
                    },
                );
                self.broadcast(
                    &slot.lobby,
                    LobbyEvent::CurrentRoll {
                        lobby_id: lobby_id.clone(),
                        roll: roll.clone(),
                    },
                );
                Ok(roll)
            }
            RollOutcome::ReachedOne { record, .. } => {
                let roll = RollView::from(&record);
                info!(
                    lobby_id = %lobby_id,
                    conn_id = %conn_id,
                    nickname = %record.nickname,
                    bound = record.bound,
                    "player reached one"
                );
                for member in slot.lobby.players() {
                    self.notifier.notify(
                        member.conn_id,
                        LobbyEvent::PlayerReachedOne {
                            lobby_id: lobby_id.clone(),
                            connection_id: record.conn_id,
                            nickname: record.nickname.clone(),
                            roll: roll.clone(),
                            is_you: member.conn_id == record.conn_id,
                        },
                    );
                }

                let reason = GameOverReason::Loser {
                    connection_id: record.conn_id,
                    nickname: record.nickname,
                };
                self.schedule_game_over(&handle, slot, reason);
                Ok(roll)
            }
        }
    }

    /// Host ends the running game immediately; nobody loses.
    pub fn stop_game(&self, lobby_id: &LobbyId, conn_id: ConnId) -> Result<(), DomainError> {
        let handle = self.handle(lobby_id)?;
        let mut guard = handle.lock();
        if guard.closed {
            return Err(DomainError::lobby_not_found(lobby_id));
        }
        let slot = &mut *guard;

        if !slot.lobby.is_host(conn_id) {
            return Err(not_host(lobby_id));
        }
        let Some(game) = slot.game.as_mut().filter(|g| g.is_active()) else {
            return Err(not_active(lobby_id));
        };
        game.stop();

        info!(lobby_id = %lobby_id, conn_id = %conn_id, "game stopped by host");
        self.broadcast(
            &slot.lobby,
            LobbyEvent::GameOver {
                lobby_id: lobby_id.clone(),
                reason: GameOverReason::HostStopped,
            },
        );
        Ok(())
    }

    /// Deliver `GameOver` once the delay elapses, unless the lobby is
    /// deleted first. The lobby lock is not held while waiting.
    fn schedule_game_over(&self, handle: &SlotHandle, slot: &LobbySlot, reason: GameOverReason) {
        let Ok(runtime) = Handle::try_current() else {
            warn!(lobby_id = %slot.lobby.id(), "no async runtime, sending game_over without delay");
            emit_game_over(self.notifier.as_ref(), slot, reason);
            return;
        };

        let handle = Arc::clone(handle);
        let notifier = Arc::clone(&self.notifier);
        let cancelled = slot.shutdown.clone();
        let delay = self.config.game_over_delay;
        let lobby_id = slot.lobby.id().clone();

        runtime.spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {
                    debug!(lobby_id = %lobby_id, "pending game_over cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    let guard = handle.lock();
                    if guard.closed {
                        debug!(lobby_id = %lobby_id, "lobby gone before game_over");
                        return;
                    }
                    emit_game_over(notifier.as_ref(), &guard, reason);
                }
            }
        });
    }
}

fn emit_game_over(notifier: &dyn LobbyNotifier, slot: &LobbySlot, reason: GameOverReason) {
    let lobby_id = slot.lobby.id();
    info!(lobby_id = %lobby_id, "game over");
    for member in slot.lobby.players() {
        notifier.notify(
            member.conn_id,
            LobbyEvent::GameOver {
                lobby_id: lobby_id.clone(),
                reason: reason.clone(),
            },
        );
    }
}
