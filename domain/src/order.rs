use crate::ids::{PendingOrderKind, SourceId, Symbol, Ticket};
use chrono::{DateTime, Utc};
use derive_more::Constructor;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A pending (not-yet-filled) order reported by a donor source.
#[derive(Debug, Clone, PartialEq, Constructor, Deserialize, Serialize)]
pub struct DonorPendingOrder {
    pub ticket: Ticket,
    pub source_id: SourceId,
    pub symbol: Symbol,
    pub order_kind: PendingOrderKind,
    pub volume: Decimal,
    pub price: Decimal,
    pub time_setup: DateTime<Utc>,
    pub sl: Option<Decimal>,
    pub tp: Option<Decimal>,
}

/// A pending order on the client account, structurally identical to
/// [`DonorPendingOrder`].
#[derive(Debug, Clone, PartialEq, Constructor, Deserialize, Serialize)]
pub struct ClientPendingOrder {
    pub ticket: Ticket,
    pub symbol: Symbol,
    pub order_kind: PendingOrderKind,
    pub volume: Decimal,
    pub price: Decimal,
    pub time_setup: DateTime<Utc>,
    pub sl: Option<Decimal>,
    pub tp: Option<Decimal>,
}
