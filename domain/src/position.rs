use crate::ids::{Direction, MagicTag, SourceId, Symbol, Ticket};
use chrono::{DateTime, Utc};
use derive_more::Constructor;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An open position reported by a donor source.
///
/// Identity is `(source_id, ticket)`; lifetime ends when it is absent from a
/// Donor Aggregator snapshot.
#[derive(Debug, Clone, PartialEq, Constructor, Deserialize, Serialize)]
pub struct DonorPosition {
    pub ticket: Ticket,
    pub source_id: SourceId,
    pub symbol: Symbol,
    pub direction: Direction,
    pub volume: Decimal,
    pub price_open: Decimal,
    pub price_current: Decimal,
    pub profit: Decimal,
    pub time_opened: DateTime<Utc>,
    pub magic_tag: Option<MagicTag>,
    pub comment: Option<String>,
    pub sl: Option<Decimal>,
    pub tp: Option<Decimal>,
}

/// An open position on the client account, structurally identical to
/// [`DonorPosition`] but always carrying the engine's `magic_tag` (or a
/// donor-copied one, see `order_config.copy_sl_tp`/magic-copy policy).
#[derive(Debug, Clone, PartialEq, Constructor, Deserialize, Serialize)]
pub struct ClientPosition {
    pub ticket: Ticket,
    pub symbol: Symbol,
    pub direction: Direction,
    pub volume: Decimal,
    pub price_open: Decimal,
    pub price_current: Decimal,
    pub profit: Decimal,
    pub time_opened: DateTime<Utc>,
    pub magic_tag: Option<MagicTag>,
    pub comment: Option<String>,
    pub sl: Option<Decimal>,
    pub tp: Option<Decimal>,
}

impl DonorPosition {
    pub fn volume_delta(&self, previous: &DonorPosition) -> Decimal {
        self.volume - previous.volume
    }
}

impl ClientPosition {
    pub fn volume_delta(&self, previous: &ClientPosition) -> Decimal {
        self.volume - previous.volume
    }
}
