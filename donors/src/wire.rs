use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trade_copier_domain::ids::{MagicTag, RawPositionOrOrderKind, SourceId, Symbol, Ticket};
use trade_copier_domain::order::DonorPendingOrder;
use trade_copier_domain::position::DonorPosition;

use crate::error::DonorSourceError;

/// The length-prefixed JSON payload carried by a donor socket frame
/// (`spec.md` §6). The MT4 and MT5 agent variants emit the identical shape.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DonorFrame {
    pub positions: Vec<RawItem>,
    pub orders: Vec<RawItem>,
    pub account_info: Option<RawAccountInfo>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawItem {
    pub ticket: u64,
    pub symbol: String,
    #[serde(rename = "type")]
    pub kind: i64,
    pub volume: Decimal,
    pub price_open: Decimal,
    pub price_current: Decimal,
    pub profit: Decimal,
    pub time: i64,
    #[serde(default)]
    pub magic: Option<u32>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub sl: Option<Decimal>,
    #[serde(default)]
    pub tp: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawAccountInfo {
    pub login: u64,
    pub balance: Decimal,
}

fn unix_seconds_to_utc(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap_or_else(Utc::now)
}

impl RawItem {
    /// Decode the wire `type` field and split into either a
    /// [`DonorPosition`] or a [`DonorPendingOrder`], tagging the result with
    /// `source_id` per `spec.md` §3.
    pub fn into_position_or_order(
        self,
        source_id: &SourceId,
    ) -> Result<PositionOrOrder, DonorSourceError> {
        let decoded = RawPositionOrOrderKind::try_from(self.kind)
            .map_err(|_| DonorSourceError::Transport(format!("unknown wire type {}", self.kind)))?;

        let time = unix_seconds_to_utc(self.time);

        Ok(match decoded {
            RawPositionOrOrderKind::Position(direction) => {
                PositionOrOrder::Position(DonorPosition {
                    ticket: Ticket(self.ticket),
                    source_id: source_id.clone(),
                    symbol: Symbol::new(self.symbol),
                    direction,
                    volume: self.volume,
                    price_open: self.price_open,
                    price_current: self.price_current,
                    profit: self.profit,
                    time_opened: time,
                    magic_tag: self.magic.map(MagicTag),
                    comment: self.comment,
                    sl: self.sl,
                    tp: self.tp,
                })
            }
            RawPositionOrOrderKind::Pending(kind) => {
                PositionOrOrder::Order(DonorPendingOrder {
                    ticket: Ticket(self.ticket),
                    source_id: source_id.clone(),
                    symbol: Symbol::new(self.symbol),
                    order_kind: kind,
                    volume: self.volume,
                    price: self.price_open,
                    time_setup: time,
                    sl: self.sl,
                    tp: self.tp,
                })
            }
        })
    }
}

#[derive(Debug, Clone)]
pub enum PositionOrOrder {
    Position(DonorPosition),
    Order(DonorPendingOrder),
}

/// Split a frame's combined `positions`/`orders` wire lists (the wire
/// format tags everything uniformly by `type`, regardless of which JSON
/// array it arrived in) into typed donor positions and pending orders.
pub fn decode_frame(
    frame: DonorFrame,
    source_id: &SourceId,
) -> Result<(Vec<DonorPosition>, Vec<DonorPendingOrder>), DonorSourceError> {
    let mut positions = Vec::new();
    let mut orders = Vec::new();

    for item in frame.positions.into_iter().chain(frame.orders) {
        match item.into_position_or_order(source_id)? {
            PositionOrOrder::Position(p) => positions.push(p),
            PositionOrOrder::Order(o) => orders.push(o),
        }
    }

    Ok((positions, orders))
}

#[cfg(test)]
mod tests {
    use super::*;
    use trade_copier_domain::ids::{Direction, PendingOrderKind};

    #[test]
    fn decodes_buy_position_and_buy_limit_order() {
        let frame = DonorFrame {
            positions: vec![RawItem {
                ticket: 1,
                symbol: "EURUSD".into(),
                kind: 0,
                volume: Decimal::new(10, 2),
                price_open: Decimal::new(110000, 5),
                price_current: Decimal::new(110020, 5),
                profit: Decimal::ZERO,
                time: 1_700_000_000,
                magic: None,
                comment: None,
                sl: None,
                tp: None,
            }],
            orders: vec![RawItem {
                ticket: 2,
                symbol: "EURUSD".into(),
                kind: 2,
                volume: Decimal::new(10, 2),
                price_open: Decimal::new(109990, 5),
                price_current: Decimal::ZERO,
                profit: Decimal::ZERO,
                time: 1_700_000_000,
                magic: None,
                comment: None,
                sl: None,
                tp: None,
            }],
            account_info: None,
        };

        let source_id = SourceId::new("donor-a");
        let (positions, orders) = decode_frame(frame, &source_id).unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].direction, Direction::Buy);
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_kind, PendingOrderKind::BuyLimit);
    }
}
