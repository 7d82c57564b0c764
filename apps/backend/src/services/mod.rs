//! Lobby coordinator: the in-memory lobby registry and turn engine.
//!
//! Inbound operations are synchronous and lock exactly one lobby at a
//! time. Outbound notifications go through a [`LobbyNotifier`] while that
//! lock is held, so each lobby's events leave in mutation order.

pub mod coordinator;
pub mod events;
mod lobbies;
mod turns;

pub use coordinator::{Admission, CoordinatorConfig, LobbyCoordinator};
pub use events::{GameOverReason, LobbyEvent, LobbyNotifier, NoopNotifier};
