//! Lobby registry operations: create, join, snapshot, remove.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::domain::{
    normalize_nickname, ConnId, Lobby, LobbyId, LobbySnapshot, Player, PlayerView, TurnShift,
};
use crate::errors::domain::{ConflictKind, DomainError};
use crate::services::coordinator::{Admission, LobbyCoordinator, SlotHandle};
use crate::services::events::LobbyEvent;
use crate::utils::lobby_code::generate_lobby_code_with;

/// Attempts at drawing an unused lobby code before giving up.
const MAX_CODE_ATTEMPTS: usize = 32;

impl LobbyCoordinator {
    /// Open a new lobby with the caller as its host.
    ///
    /// A connection already in another lobby leaves it once the new lobby
    /// has a code. If no code can be allocated the caller stays where it is.
    pub fn create_lobby(
        &self,
        conn_id: ConnId,
        nickname: &str,
        avatar: u32,
    ) -> Result<Admission, DomainError> {
        let nickname = normalize_nickname(nickname)?;
        let (lobby_id, handle) = self.publish_lobby(conn_id, &nickname, avatar)?;

        self.disconnect(conn_id);

        let guard = handle.lock();
        self.memberships.insert(conn_id, lobby_id.clone());
        let snapshot = guard.snapshot();
        let player = snapshot.players[0].clone();
        info!(lobby_id = %lobby_id, conn_id = %conn_id, nickname = %nickname, "lobby created");
        Ok(Admission {
            lobby_id,
            player,
            snapshot,
        })
    }

    /// Register a fresh lobby hosted by `conn_id` under an unused code.
    fn publish_lobby(
        &self,
        conn_id: ConnId,
        nickname: &str,
        avatar: u32,
    ) -> Result<(LobbyId, SlotHandle), DomainError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_lobby_code_with(&mut *self.seeder.lock());
            let lobby_id = LobbyId::parse(&code)?;

            let host = Player::new(conn_id, nickname, avatar);
            let slot = self.new_slot(Lobby::open(lobby_id.clone(), host, self.config.max_players));
            let handle: SlotHandle = Arc::new(Mutex::new(slot));

            match self.lobbies.entry(lobby_id.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(vacant) => {
                    vacant.insert(Arc::clone(&handle));
                }
            }
            return Ok((lobby_id, handle));
        }

        warn!(conn_id = %conn_id, attempts = MAX_CODE_ATTEMPTS, "no free lobby code");
        Err(DomainError::conflict(
            ConflictKind::Other("LOBBY_ID_EXHAUSTED".into()),
            "Could not allocate a lobby id, try again",
        ))
    }

    /// Join an existing lobby as a non-host member and notify the others.
    ///
    /// A connection already in a different lobby leaves it only after the
    /// target has accepted it in principle: open, not full, nickname free.
    /// A rejected join changes nothing.
    pub fn join_lobby(
        &self,
        conn_id: ConnId,
        nickname: &str,
        lobby_id: &LobbyId,
        avatar: u32,
    ) -> Result<Admission, DomainError> {
        let nickname = normalize_nickname(nickname)?;
        let handle = self.handle(lobby_id)?;

        let previous = self
            .lobby_of(conn_id)
            .filter(|current| current != lobby_id);
        if let Some(previous) = previous {
            {
                let guard = handle.lock();
                if guard.closed {
                    return Err(DomainError::lobby_not_found(lobby_id));
                }
                guard.lobby.can_admit(conn_id, &nickname)?;
            }
            // Never hold two lobby locks at once.
            self.remove_player(&previous, conn_id);
        }

        let mut guard = handle.lock();
        if guard.closed {
            return Err(DomainError::lobby_not_found(lobby_id));
        }

        let player = guard
            .lobby
            .admit(Player::new(conn_id, nickname.clone(), avatar))
            .map(PlayerView::from)?;
        self.memberships.insert(conn_id, lobby_id.clone());

        let slot = &mut *guard;
        let snapshot = slot.snapshot();
        self.broadcast_except(
            &slot.lobby,
            conn_id,
            LobbyEvent::PlayerJoined {
                lobby_id: lobby_id.clone(),
                player: player.clone(),
                players: snapshot.players.clone(),
            },
        );

        info!(
            lobby_id = %lobby_id,
            conn_id = %conn_id,
            nickname = %nickname,
            players = slot.lobby.len(),
            "player joined"
        );
        Ok(Admission {
            lobby_id: lobby_id.clone(),
            player,
            snapshot,
        })
    }

    /// Read-only projection of one lobby.
    pub fn lobby_snapshot(&self, lobby_id: &LobbyId) -> Result<LobbySnapshot, DomainError> {
        let handle = self.handle(lobby_id)?;
        let guard = handle.lock();
        if guard.closed {
            return Err(DomainError::lobby_not_found(lobby_id));
        }
        Ok(guard.snapshot())
    }

    pub fn lobby_exists(&self, lobby_id: &LobbyId) -> bool {
        self.lobbies.contains_key(lobby_id)
    }

    /// Remove `conn_id` from `lobby_id` if it is a member there.
    ///
    /// Idempotent: returns `false` and does nothing when the lobby or the
    /// member is already gone. Handles explicit leave and disconnect alike.
    pub fn remove_player(&self, lobby_id: &LobbyId, conn_id: ConnId) -> bool {
        let Ok(handle) = self.handle(lobby_id) else {
            return false;
        };
        let mut guard = handle.lock();
        if guard.closed {
            return false;
        }
        let Some(departure) = guard.lobby.remove(conn_id) else {
            return false;
        };
        self.memberships
            .remove_if(&conn_id, |_, current| current == lobby_id);

        if guard.lobby.is_empty() {
            self.close_slot(&mut guard, &handle);
            info!(
                lobby_id = %lobby_id,
                conn_id = %conn_id,
                nickname = %departure.player.nickname,
                "last player left, lobby deleted"
            );
            return true;
        }

        let slot = &mut *guard;
        self.broadcast(
            &slot.lobby,
            LobbyEvent::PlayerLeft {
                lobby_id: lobby_id.clone(),
                connection_id: conn_id,
                nickname: departure.player.nickname.clone(),
            },
        );

        if let Some(new_host) = &departure.new_host {
            self.broadcast(
                &slot.lobby,
                LobbyEvent::HostChanged {
                    lobby_id: lobby_id.clone(),
                    connection_id: new_host.conn_id,
                    new_host: new_host.nickname.clone(),
                },
            );
            info!(lobby_id = %lobby_id, new_host = %new_host.nickname, "host changed");
        }

        if let Some(game) = slot.game.as_mut().filter(|g| g.is_active()) {
            if let TurnShift::Moved { current_turn } =
                game.on_player_removed(departure.index, slot.lobby.len())
            {
                let holder = slot.lobby.players()[current_turn].conn_id;
                self.broadcast(
                    &slot.lobby,
                    LobbyEvent::TurnChanged {
                        lobby_id: lobby_id.clone(),
                        current_turn,
                        turn_holder: holder,
                        roll: None,
                    },
                );
            }
        }

        info!(
            lobby_id = %lobby_id,
            conn_id = %conn_id,
            nickname = %departure.player.nickname,
            players = slot.lobby.len(),
            "player left"
        );
        true
    }

    /// Remove the connection from whatever lobby it is in.
    pub fn disconnect(&self, conn_id: ConnId) -> bool {
        match self.lobby_of(conn_id) {
            Some(lobby_id) => self.remove_player(&lobby_id, conn_id),
            None => false,
        }
    }
}
