//! Structured logging setup for the trade-copier process. Levels follow
//! `spec.md` §6's expansion: `info` for state-changing actions, `trace` for
//! routine no-op cycles, `warn` for timeouts/transient errors, `error` for
//! fatal startup conditions.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn env_filter() -> tracing_subscriber::filter::EnvFilter {
    tracing_subscriber::filter::EnvFilter::builder()
        .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        .from_env_lossy()
}

/// Human-readable logging to stdout, controlled by `RUST_LOG`.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .init()
}

/// JSON logging for aggregators, selected by `--json-logs` (`spec.md` §6).
pub fn init_json_logging() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
        .init()
}
