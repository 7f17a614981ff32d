use derive_more::{Constructor, Display, From};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Broker-assigned integer identifying a position or order.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Deserialize, Serialize,
)]
#[serde(transparent)]
pub struct Ticket(pub u64);

/// Identifier of a configured donor (see `donors_config.json`).
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Deserialize, Serialize,
)]
#[serde(transparent)]
pub struct SourceId(pub SmolStr);

impl SourceId {
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }
}

/// Primary key of donor-side Correspondence Map entries.
///
/// Keyed by `(source_id, donor_ticket)` rather than bare ticket: two donor
/// sources may legitimately reuse the same broker ticket space.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Constructor, Deserialize, Serialize)]
pub struct DonorKey {
    pub source_id: SourceId,
    pub ticket: Ticket,
}

#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Deserialize, Serialize,
)]
#[serde(transparent)]
pub struct Symbol(pub SmolStr);

impl Symbol {
    pub fn new(symbol: impl Into<SmolStr>) -> Self {
        Self(symbol.into())
    }
}

/// Integer tag attached to orders so the engine can filter its own activity
/// out of an account's full position/order list.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Deserialize, Serialize,
)]
#[serde(transparent)]
pub struct MagicTag(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Buy => Direction::Sell,
            Direction::Sell => Direction::Buy,
        }
    }
}

/// Pending-order kinds a donor or client account may carry.
///
/// Wire-encoded as the integer `type` field of `spec.md` §6: 2=BUY_LIMIT,
/// 3=SELL_LIMIT, 4=BUY_STOP, 5=SELL_STOP, 6=BUY_STOP_LIMIT, 7=SELL_STOP_LIMIT.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum PendingOrderKind {
    BuyLimit,
    SellLimit,
    BuyStop,
    SellStop,
    BuyStopLimit,
    SellStopLimit,
}

impl PendingOrderKind {
    pub fn direction(self) -> Direction {
        match self {
            PendingOrderKind::BuyLimit
            | PendingOrderKind::BuyStop
            | PendingOrderKind::BuyStopLimit => Direction::Buy,
            PendingOrderKind::SellLimit
            | PendingOrderKind::SellStop
            | PendingOrderKind::SellStopLimit => Direction::Sell,
        }
    }

    pub fn is_buy_limit(self) -> bool {
        matches!(self, PendingOrderKind::BuyLimit)
    }

    pub fn is_sell_limit(self) -> bool {
        matches!(self, PendingOrderKind::SellLimit)
    }
}

/// Wire `type` encoding used by the donor socket frame (`spec.md` §6).
impl TryFrom<i64> for RawPositionOrOrderKind {
    type Error = ();

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RawPositionOrOrderKind::Position(Direction::Buy)),
            1 => Ok(RawPositionOrOrderKind::Position(Direction::Sell)),
            2 => Ok(RawPositionOrOrderKind::Pending(PendingOrderKind::BuyLimit)),
            3 => Ok(RawPositionOrOrderKind::Pending(PendingOrderKind::SellLimit)),
            4 => Ok(RawPositionOrOrderKind::Pending(PendingOrderKind::BuyStop)),
            5 => Ok(RawPositionOrOrderKind::Pending(PendingOrderKind::SellStop)),
            6 => Ok(RawPositionOrOrderKind::Pending(
                PendingOrderKind::BuyStopLimit,
            )),
            7 => Ok(RawPositionOrOrderKind::Pending(
                PendingOrderKind::SellStopLimit,
            )),
            _ => Err(()),
        }
    }
}

/// Disambiguated result of decoding the wire `type` field: either an open
/// position direction or a pending-order kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RawPositionOrOrderKind {
    Position(Direction),
    Pending(PendingOrderKind),
}
