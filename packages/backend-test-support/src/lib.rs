//! Backend test support utilities
//!
//! Shared by the backend's unit and integration tests: one-time logging
//! setup and assertions for the Problem Details error contract.

pub mod problem_details;
pub mod test_logging;
