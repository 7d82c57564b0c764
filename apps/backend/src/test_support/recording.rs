use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::domain::{ConnId, LobbyId};
use crate::services::{CoordinatorConfig, LobbyCoordinator, LobbyEvent, LobbyNotifier};

/// Notifier that keeps every outbound event, in delivery order.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(ConnId, LobbyEvent)>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<(ConnId, LobbyEvent)> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Events delivered to one connection.
    pub fn events_for(&self, conn_id: ConnId) -> Vec<LobbyEvent> {
        self.events
            .lock()
            .iter()
            .filter(|(to, _)| *to == conn_id)
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// Wire names of the events delivered to one connection.
    pub fn kinds_for(&self, conn_id: ConnId) -> Vec<&'static str> {
        self.events
            .lock()
            .iter()
            .filter(|(to, _)| *to == conn_id)
            .map(|(_, event)| event.kind())
            .collect()
    }

    pub fn count_for_lobby(&self, lobby_id: &LobbyId) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|(_, event)| event.lobby_id() == lobby_id)
            .count()
    }

    /// Poll until `pred` holds for the recorded events or `timeout` passes.
    pub async fn wait_until<F>(&self, timeout: Duration, pred: F) -> bool
    where
        F: Fn(&[(ConnId, LobbyEvent)]) -> bool,
    {
        let start = tokio::time::Instant::now();
        loop {
            if pred(&self.events.lock()) {
                return true;
            }
            if start.elapsed() >= timeout {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl LobbyNotifier for RecordingNotifier {
    fn notify(&self, conn_id: ConnId, event: LobbyEvent) {
        self.events.lock().push((conn_id, event));
    }
}

/// A coordinator wired to a fresh [`RecordingNotifier`].
pub fn recording_coordinator(
    config: CoordinatorConfig,
) -> (Arc<LobbyCoordinator>, Arc<RecordingNotifier>) {
    let recorder = RecordingNotifier::new();
    let coordinator = Arc::new(LobbyCoordinator::new(config, recorder.clone()));
    (coordinator, recorder)
}
