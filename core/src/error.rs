use thiserror::Error;

/// Every error kind the reconciliation loop can encounter, mapped one-to-one
/// onto the policy bullets of `spec.md` §7. Only the [`ReconcileError::Fatal`]
/// variants propagate out of [`crate::engine::process_cycle`] and cause
/// shutdown; every other variant is caught at the call site, logged, and
/// turned into a no-op for that cycle.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("donor aggregation error: {0}")]
    Donor(#[from] trade_copier_donors::error::DonorSourceError),

    #[error("broker gateway error: {0}")]
    Gateway(#[from] trade_copier_domain::gateway::GatewayError),

    #[error("trader error: {0}")]
    Trader(#[from] trade_copier_trader::error::TraderError),

    #[error("strategy error: {0}")]
    Strategy(#[from] trade_copier_strategies::error::StrategyError),

    #[error("state persistence error: {0}")]
    Persist(#[from] trade_copier_execution::persist::PersistError),

    #[error(transparent)]
    Fatal(#[from] FatalError),
}

/// The three fatal startup conditions of `spec.md` §7. Any of these ends the
/// process with a non-zero exit code rather than being retried.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("could not obtain client account info at startup: {0}")]
    ClientAccountUnreachable(String),

    #[error("broker refused trading permissions for this account")]
    TradingNotAllowed,

    #[error("no donor sources configured")]
    NoDonorSources,

    #[error("donors_config.json is invalid: {0}")]
    InvalidDonorsConfig(String),
}
