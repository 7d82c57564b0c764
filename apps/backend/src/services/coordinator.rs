//! Lobby coordinator state: the lobby registry, the connection index and
//! the per-lobby exclusive sections.
//!
//! Lock discipline: a slot's `Arc` is cloned out of the registry and the
//! map guard dropped before the slot mutex is taken. While a slot is
//! locked the coordinator may touch the registry maps (insert/remove), but
//! never the other way round, and never two slots at once.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::rules::{DEFAULT_GAME_OVER_DELAY, DEFAULT_MAX_PLAYERS};
use crate::domain::{ConnId, Game, Lobby, LobbyId, LobbySnapshot, PlayerView};
use crate::errors::domain::DomainError;
use crate::services::events::{LobbyEvent, LobbyNotifier};

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub max_players: usize,
    pub game_over_delay: Duration,
    /// Fixed seed for lobby codes, shuffles and rolls. `None` seeds from
    /// the OS.
    pub rng_seed: Option<u64>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_players: DEFAULT_MAX_PLAYERS,
            game_over_delay: DEFAULT_GAME_OVER_DELAY,
            rng_seed: None,
        }
    }
}

/// Result of creating or joining a lobby, returned to the requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub lobby_id: LobbyId,
    pub player: PlayerView,
    pub snapshot: LobbySnapshot,
}

/// Everything guarded by one lobby's exclusive section.
pub(crate) struct LobbySlot {
    pub(crate) lobby: Lobby,
    pub(crate) game: Option<Game>,
    pub(crate) rng: ChaCha20Rng,
    /// Set once the lobby has been removed from the registry. A handle
    /// obtained before removal must treat the lobby as gone.
    pub(crate) closed: bool,
    /// Cancels pending delayed broadcasts for this lobby.
    pub(crate) shutdown: CancellationToken,
}

impl LobbySlot {
    pub(crate) fn snapshot(&self) -> LobbySnapshot {
        LobbySnapshot::capture(&self.lobby, self.game.as_ref())
    }
}

pub(crate) type SlotHandle = Arc<Mutex<LobbySlot>>;

pub struct LobbyCoordinator {
    pub(crate) config: CoordinatorConfig,
    pub(crate) lobbies: DashMap<LobbyId, SlotHandle>,
    /// connection -> lobby it currently belongs to. Updated under the
    /// owning lobby's lock.
    pub(crate) memberships: DashMap<ConnId, LobbyId>,
    pub(crate) notifier: Arc<dyn LobbyNotifier>,
    /// Source of lobby codes and per-lobby seeds.
    pub(crate) seeder: Mutex<ChaCha20Rng>,
    shutdown: CancellationToken,
}

impl LobbyCoordinator {
    pub fn new(config: CoordinatorConfig, notifier: Arc<dyn LobbyNotifier>) -> Self {
        let seeder = match config.rng_seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_os_rng(),
        };
        Self {
            config,
            lobbies: DashMap::new(),
            memberships: DashMap::new(),
            notifier,
            seeder: Mutex::new(seeder),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn lobby_count(&self) -> usize {
        self.lobbies.len()
    }

    /// Lobby the connection currently belongs to, if any.
    pub fn lobby_of(&self, conn_id: ConnId) -> Option<LobbyId> {
        self.memberships.get(&conn_id).map(|entry| entry.value().clone())
    }

    /// Cancel every pending delayed broadcast. Used on server shutdown.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub(crate) fn new_slot(&self, lobby: Lobby) -> LobbySlot {
        let seed = self.seeder.lock().next_u64();
        LobbySlot {
            lobby,
            game: None,
            rng: ChaCha20Rng::seed_from_u64(seed),
            closed: false,
            shutdown: self.shutdown.child_token(),
        }
    }

    /// Clone the slot handle for `lobby_id` without holding the map guard.
    pub(crate) fn handle(&self, lobby_id: &LobbyId) -> Result<SlotHandle, DomainError> {
        self.lobbies
            .get(lobby_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| DomainError::lobby_not_found(lobby_id))
    }

    /// Delete a lobby whose last member just left. The caller holds the
    /// slot lock. No events are emitted.
    pub(crate) fn close_slot(&self, slot: &mut LobbySlot, handle: &SlotHandle) {
        slot.closed = true;
        slot.game = None;
        slot.shutdown.cancel();
        let lobby_id = slot.lobby.id().clone();
        self.lobbies
            .remove_if(&lobby_id, |_, current| Arc::ptr_eq(current, handle));
        debug!(lobby_id = %lobby_id, "lobby closed");
    }

    /// Send `event` to every current member of the lobby.
    pub(crate) fn broadcast(&self, lobby: &Lobby, event: LobbyEvent) {
        for player in lobby.players() {
            self.notifier.notify(player.conn_id, event.clone());
        }
    }

    /// Send `event` to every member except `skip`.
    pub(crate) fn broadcast_except(&self, lobby: &Lobby, skip: ConnId, event: LobbyEvent) {
        for player in lobby.players().iter().filter(|p| p.conn_id != skip) {
            self.notifier.notify(player.conn_id, event.clone());
        }
    }
}

impl Drop for LobbyCoordinator {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
