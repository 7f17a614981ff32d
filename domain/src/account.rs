use crate::ids::Symbol;
use chrono::{DateTime, Utc};
use derive_more::Constructor;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Constructor, Deserialize, Serialize)]
pub struct AccountInfo {
    pub login: u64,
    pub balance: Decimal,
    pub equity: Decimal,
    pub free_margin: Decimal,
    pub currency: String,
    pub server: String,
}

/// Last-known quote for a symbol, returned by `BrokerGateway::tick`.
#[derive(Debug, Clone, Copy, PartialEq, Constructor, Deserialize, Serialize)]
pub struct Tick {
    pub bid: Decimal,
    pub ask: Decimal,
    pub last: Decimal,
    pub volume: Decimal,
    pub time: DateTime<Utc>,
}

/// Symbol metadata returned by `BrokerGateway::symbol_check`, used to round
/// prices and clamp volumes.
#[derive(Debug, Clone, Copy, PartialEq, Constructor, Deserialize, Serialize)]
pub struct SymbolMeta {
    pub digits: u32,
    pub point: Decimal,
    pub volume_min: Decimal,
    pub volume_max: Decimal,
    pub volume_step: Decimal,
    pub trade_allowed: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SymbolUnavailable {
    pub symbol: Symbol,
}
