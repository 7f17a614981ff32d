use thiserror::Error;
use trade_copier_domain::ids::Symbol;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TraderError {
    #[error("symbol {0} is unavailable, added to skipped_symbols")]
    SymbolUnavailable(Symbol),
    #[error("gateway round-trip timed out")]
    Timeout,
    #[error("broker gateway error: {0}")]
    Gateway(String),
    #[error("placement retry budget exhausted after {0} attempts")]
    RetriesExhausted(u32),
}

impl From<trade_copier_domain::gateway::GatewayError> for TraderError {
    fn from(error: trade_copier_domain::gateway::GatewayError) -> Self {
        use trade_copier_domain::gateway::GatewayError;
        match error {
            GatewayError::SymbolUnavailable(symbol) => TraderError::SymbolUnavailable(symbol),
            GatewayError::Timeout => TraderError::Timeout,
            other => TraderError::Gateway(other.to_string()),
        }
    }
}
