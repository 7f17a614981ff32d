use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StrategyError {
    #[error("gateway round-trip timed out")]
    Timeout,
    #[error("broker gateway error: {0}")]
    Gateway(String),
}

impl From<trade_copier_domain::gateway::GatewayError> for StrategyError {
    fn from(error: trade_copier_domain::gateway::GatewayError) -> Self {
        use trade_copier_domain::gateway::GatewayError;
        match error {
            GatewayError::Timeout => StrategyError::Timeout,
            other => StrategyError::Gateway(other.to_string()),
        }
    }
}
