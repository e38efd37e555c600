//! Opt-in logging initialization.
//!
//! The library itself only emits through the `log` facade; binaries and
//! tests that want console output call `init_logging` once. Respects
//! `RUST_LOG`, defaulting to `info`.

use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes `env_logger` exactly once per process. Safe to call from
/// multiple tests or entry points.
pub fn init_logging() {
    INIT.call_once(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp_millis()
            .init();
    });
}
