use actix::prelude::*;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ConnId;
use crate::services::{LobbyEvent, LobbyNotifier};
use crate::ws::session::{LobbyBroadcast, Shutdown, WsSession};

struct Connection {
    recipient: Recipient<LobbyBroadcast>,
    addr: Addr<WsSession>,
}

/// Live WebSocket sessions by connection id.
#[derive(Default)]
pub struct WsRegistry {
    connections: DashMap<Uuid, Connection>,
}

impl WsRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    pub fn register_connection(
        &self,
        conn_id: Uuid,
        recipient: Recipient<LobbyBroadcast>,
        addr: Addr<WsSession>,
    ) {
        self.connections
            .insert(conn_id, Connection { recipient, addr });
    }

    pub fn unregister_connection(&self, conn_id: Uuid) {
        self.connections.remove(&conn_id);
    }

    pub fn active_connections_count(&self) -> usize {
        self.connections.len()
    }

    /// Ask every live session to close. Returns the ids that were asked.
    pub fn close_all_connections(&self) -> Vec<Uuid> {
        let ids: Vec<Uuid> = self.connections.iter().map(|entry| *entry.key()).collect();
        for id in &ids {
            if let Some(conn) = self.connections.get(id) {
                conn.addr.do_send(Shutdown);
            }
        }
        ids
    }
}

impl LobbyNotifier for WsRegistry {
    fn notify(&self, conn_id: ConnId, event: LobbyEvent) {
        match self.connections.get(&conn_id) {
            Some(conn) => conn.recipient.do_send(LobbyBroadcast(event)),
            None => debug!(conn_id = %conn_id, kind = event.kind(), "no live session for event"),
        }
    }
}
