//! Helpers shared by unit and integration tests.

pub mod app_builder;
pub mod recording;

pub use app_builder::create_test_app_builder;
pub use recording::{recording_coordinator, RecordingNotifier};
