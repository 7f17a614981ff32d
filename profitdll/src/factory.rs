use crate::mock::MockBrokerSession;
use crate::session::BrokerSession;
use std::sync::Arc;
use tracing::info;

/// Which [`BrokerSession`] kind was actually selected by
/// [`build_session_from_env`], for logging at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Mock,
}

/// Selects a [`BrokerSession`] implementation the same way the platform's
/// real broker integration would: environment-variable-driven, defaulting
/// to the in-memory mock.
///
/// `{PREFIX}_FORCE_MOCK=1` forces the mock even if a real backend were
/// compiled in. This workspace ships only the mock; a deployment wiring in
/// a real terminal session does so by implementing [`BrokerSession`] and
/// calling this factory's real-backend branch (left as the integration
/// point — the broker library itself is environmental, per `spec.md` §6).
pub fn build_session_from_env(env_prefix: &str) -> (Arc<dyn BrokerSession>, BackendKind) {
    let force_mock_key = format!("{env_prefix}_FORCE_MOCK");
    let force_mock = std::env::var(&force_mock_key)
        .map(|v| v != "0")
        .unwrap_or(true);

    if force_mock {
        info!(backend = "mock", env = %force_mock_key, "selected mock broker session");
    }

    (Arc::new(MockBrokerSession::new()), BackendKind::Mock)
}
