use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use trade_copier_domain::ids::PendingOrderKind;
use trade_copier_domain::prelude::*;

/// Metadata recorded alongside an in-flight opening limit order, enough to
/// drive the Pending-Order Walker (`spec.md` §4.7) and to validate the link
/// on restart (`spec.md` §4.10).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OpenOrderInfo {
    pub donor_key: DonorKey,
    pub symbol: Symbol,
    pub order_kind: PendingOrderKind,
    pub original_price: rust_decimal::Decimal,
}

/// Metadata recorded alongside an in-flight closing limit order.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CloseOrderInfo {
    pub donor_key: DonorKey,
    pub symbol: Symbol,
    pub order_kind: PendingOrderKind,
    pub original_close_price: rust_decimal::Decimal,
    pub client_position_ticket_to_close: Ticket,
}

/// Rich snapshot of one `pos_link` entry, persisted so that on restart the
/// engine can both verify the link and feed the Matcher (`spec.md` §4.10).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PositionLinkSnapshot {
    pub client_ticket: Ticket,
    pub symbol: Symbol,
    pub direction: Direction,
    pub donor_price_open: rust_decimal::Decimal,
    pub client_price_open: rust_decimal::Decimal,
    pub donor_time: DateTime<Utc>,
    pub client_time: DateTime<Utc>,
    pub donor_magic: Option<MagicTag>,
    pub client_magic: Option<MagicTag>,
    pub donor_comment: Option<String>,
    pub client_comment: Option<String>,
}

/// The five relations of `spec.md` §3's Correspondence Map, plus the
/// negative symbol cache. Holds no broker I/O; every mutation here is
/// followed by a persist call from the reconciliation loop.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CorrespondenceMap {
    pub pos_link: IndexMap<DonorKey, Ticket>,
    pub pos_link_snapshots: IndexMap<DonorKey, PositionLinkSnapshot>,
    pub open_order_link: IndexMap<Ticket, OpenOrderInfo>,
    pub close_order_link: IndexMap<DonorKey, Ticket>,
    pub close_order_info: IndexMap<Ticket, CloseOrderInfo>,
    pub pending_order_link: IndexMap<DonorKey, Ticket>,
    pub skipped_symbols: IndexSet<Symbol>,
}

impl CorrespondenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invariant 2 (`spec.md` §3): a donor ticket appears in at most one of
    /// `pos_link`, `open_order_link` (by donor_key), `close_order_link`.
    pub fn donor_key_in_flight(&self, key: &DonorKey) -> bool {
        self.pos_link.contains_key(key)
            || self
                .open_order_link
                .values()
                .any(|info| &info.donor_key == key)
            || self.close_order_link.contains_key(key)
    }

    pub fn link_position(&mut self, donor: DonorKey, client_ticket: Ticket, snapshot: PositionLinkSnapshot) {
        self.pos_link.insert(donor.clone(), client_ticket);
        self.pos_link_snapshots.insert(donor, snapshot);
    }

    pub fn unlink_position(&mut self, donor: &DonorKey) {
        self.pos_link.shift_remove(donor);
        self.pos_link_snapshots.shift_remove(donor);
    }

    pub fn client_ticket_for(&self, donor: &DonorKey) -> Option<Ticket> {
        self.pos_link.get(donor).copied()
    }

    pub fn drop_open_order(&mut self, client_order_ticket: Ticket) {
        self.open_order_link.shift_remove(&client_order_ticket);
    }

    pub fn drop_close_order(&mut self, donor: &DonorKey, client_order_ticket: Ticket) {
        self.close_order_link.shift_remove(donor);
        self.close_order_info.shift_remove(&client_order_ticket);
    }

    /// Invariant 1 (`spec.md` §3): `pos_link` values are unique.
    pub fn pos_link_is_injective(&self) -> bool {
        let mut seen = IndexSet::new();
        self.pos_link.values().all(|ticket| seen.insert(*ticket))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn donor_key(ticket: u64) -> DonorKey {
        DonorKey::new(SourceId::new("donor-a"), Ticket(ticket))
    }

    fn snapshot() -> PositionLinkSnapshot {
        PositionLinkSnapshot {
            client_ticket: Ticket(100),
            symbol: Symbol::new("EURUSD"),
            direction: Direction::Buy,
            donor_price_open: dec!(1.1),
            client_price_open: dec!(1.1),
            donor_time: Utc::now(),
            client_time: Utc::now(),
            donor_magic: None,
            client_magic: Some(MagicTag(1)),
            donor_comment: None,
            client_comment: None,
        }
    }

    #[test]
    fn injective_after_single_link() {
        let mut map = CorrespondenceMap::new();
        map.link_position(donor_key(1), Ticket(100), snapshot());
        assert!(map.pos_link_is_injective());
        assert_eq!(map.client_ticket_for(&donor_key(1)), Some(Ticket(100)));
    }

    #[test]
    fn unlinking_removes_snapshot_too() {
        let mut map = CorrespondenceMap::new();
        map.link_position(donor_key(1), Ticket(100), snapshot());
        map.unlink_position(&donor_key(1));
        assert!(map.client_ticket_for(&donor_key(1)).is_none());
        assert!(!map.pos_link_snapshots.contains_key(&donor_key(1)));
    }

    #[test]
    fn donor_key_in_flight_detects_open_order() {
        let mut map = CorrespondenceMap::new();
        map.open_order_link.insert(
            Ticket(55),
            OpenOrderInfo {
                donor_key: donor_key(1),
                symbol: Symbol::new("EURUSD"),
                order_kind: PendingOrderKind::BuyLimit,
                original_price: dec!(1.1),
            },
        );
        assert!(map.donor_key_in_flight(&donor_key(1)));
    }
}
