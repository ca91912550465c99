//! Tracing setup for the orchestration binary (spec §6 "Logging"):
//! `RUST_LOG`-driven filtering over the `tracing` spans each stage crate
//! already emits.
use tracing_subscriber::{fmt, EnvFilter};

/// Installs a global subscriber. Safe to call more than once in tests; a
/// failed install (subscriber already set) is ignored.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
