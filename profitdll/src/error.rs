use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BrokerSessionError {
    #[error("session not connected")]
    NotConnected,
    #[error("symbol {0} unavailable")]
    SymbolUnavailable(String),
    #[error("ticket {0} not found")]
    TicketNotFound(u64),
    #[error("backend rejected the request: {0}")]
    Rejected(String),
}
