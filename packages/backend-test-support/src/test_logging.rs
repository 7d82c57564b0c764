//! One-time tracing subscriber for test binaries.
//!
//! Unit tests (via `ctor` in the backend crate) and every integration test
//! binary call [`init`]. Level precedence: `TEST_LOG`, then `RUST_LOG`,
//! then `warn`.

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

static INSTALLED: OnceCell<()> = OnceCell::new();

fn filter_from_env() -> EnvFilter {
    ["TEST_LOG", "RUST_LOG"]
        .iter()
        .find_map(|key| std::env::var(key).ok())
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

/// Install the test subscriber. Idempotent; never panics when another
/// subscriber is already installed.
pub fn init() {
    INSTALLED.get_or_init(|| {
        let _ = fmt()
            .with_env_filter(filter_from_env())
            .with_test_writer()
            .without_time()
            .with_target(false)
            .try_init();
    });
}
