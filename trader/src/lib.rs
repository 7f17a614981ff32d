#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! The Order Planner (`spec.md` §4.4, §4.5): opens a client-side copy of a
//! new donor position and closes it again once the donor position vanishes,
//! including the late-matching fallback for links the monitor missed.

pub mod close;
pub mod config;
pub mod error;
pub mod open;

use trade_copier_domain::position::{ClientPosition, DonorPosition};
use trade_copier_execution::correspondence::PositionLinkSnapshot;

/// Build the rich snapshot recorded alongside a `pos_link` entry
/// (`spec.md` §4.10), shared by the opening, closing and pending-order
/// mirroring paths that all link a donor position to a client position.
pub fn link_snapshot(donor: &DonorPosition, client: &ClientPosition) -> PositionLinkSnapshot {
    PositionLinkSnapshot {
        client_ticket: client.ticket,
        symbol: donor.symbol.clone(),
        direction: donor.direction,
        donor_price_open: donor.price_open,
        client_price_open: client.price_open,
        donor_time: donor.time_opened,
        client_time: client.time_opened,
        donor_magic: donor.magic_tag,
        client_magic: client.magic_tag,
        donor_comment: donor.comment.clone(),
        client_comment: client.comment.clone(),
    }
}

pub mod prelude {
    pub use crate::close::{close_copy, ClosedDonor};
    pub use crate::config::{CopyStyle, OrderConfig};
    pub use crate::error::TraderError;
    pub use crate::link_snapshot;
    pub use crate::open::open_copy;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::close::{close_copy, ClosedDonor};
    use crate::open::open_copy;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use trade_copier_broker::mock::MockBrokerSession;
    use trade_copier_domain::account::{SymbolMeta, Tick};
    use trade_copier_domain::ids::{Direction, DonorKey, SourceId, Symbol, Ticket};
    use trade_copier_execution::correspondence::CorrespondenceMap;
    use trade_copier_execution::gateway::{GatewayMode, GatewayTimeouts, GatewayWorker};
    use trade_copier_risk::lot::{LotConfig, LotMode};

    fn gateway_with_mock() -> (impl trade_copier_domain::gateway::BrokerGateway, Arc<MockBrokerSession>) {
        let session = Arc::new(MockBrokerSession::new());
        session.seed_symbol(
            Symbol::new("EURUSD"),
            SymbolMeta {
                digits: 5,
                point: dec!(0.00001),
                volume_min: dec!(0.01),
                volume_max: dec!(100),
                volume_step: dec!(0.01),
                trade_allowed: true,
            },
        );
        session.seed_tick(
            Symbol::new("EURUSD"),
            Tick {
                bid: dec!(1.10020),
                ask: dec!(1.10025),
                last: dec!(1.10022),
                volume: dec!(0),
                time: Utc::now(),
            },
        );
        let (handle, _join) = GatewayWorker::spawn(session.clone(), GatewayMode::ReadWrite, GatewayTimeouts::default());
        (handle, session)
    }

    #[tokio::test]
    async fn opens_market_copy_and_links_position() {
        let (gateway, _session) = gateway_with_mock();
        let mut map = CorrespondenceMap::new();
        let donor_key = DonorKey::new(SourceId::new("donor-a"), Ticket(1));
        let donor = trade_copier_domain::position::DonorPosition {
            ticket: Ticket(1),
            source_id: SourceId::new("donor-a"),
            symbol: Symbol::new("EURUSD"),
            direction: Direction::Buy,
            volume: dec!(0.10),
            price_open: dec!(1.10000),
            price_current: dec!(1.10000),
            profit: dec!(0),
            time_opened: Utc::now(),
            magic_tag: None,
            comment: None,
            sl: None,
            tp: None,
        };

        let lot_config = LotConfig {
            mode: LotMode::Fixed,
            value: dec!(0.01),
            min_lot: dec!(0.01),
            max_lot: dec!(100),
        };
        let order_config = config::OrderConfig::default();

        open_copy(
            &gateway,
            &mut map,
            &donor_key,
            &donor,
            &lot_config,
            &order_config,
            config::CopyStyle::ByMarket,
            false,
            dec!(10000),
        )
        .await
        .unwrap();

        assert_eq!(map.pos_link.len(), 1);
        assert!(map.client_ticket_for(&donor_key).is_some());
    }

    #[tokio::test]
    async fn closes_linked_market_copy() {
        let (gateway, _session) = gateway_with_mock();
        let mut map = CorrespondenceMap::new();
        let donor_key = DonorKey::new(SourceId::new("donor-a"), Ticket(1));
        let donor = trade_copier_domain::position::DonorPosition {
            ticket: Ticket(1),
            source_id: SourceId::new("donor-a"),
            symbol: Symbol::new("EURUSD"),
            direction: Direction::Buy,
            volume: dec!(0.10),
            price_open: dec!(1.10000),
            price_current: dec!(1.10000),
            profit: dec!(0),
            time_opened: Utc::now(),
            magic_tag: None,
            comment: None,
            sl: None,
            tp: None,
        };
        let lot_config = LotConfig {
            mode: LotMode::Fixed,
            value: dec!(0.01),
            min_lot: dec!(0.01),
            max_lot: dec!(100),
        };
        let order_config = config::OrderConfig::default();

        open_copy(
            &gateway,
            &mut map,
            &donor_key,
            &donor,
            &lot_config,
            &order_config,
            config::CopyStyle::ByMarket,
            false,
            dec!(10000),
        )
        .await
        .unwrap();
        assert_eq!(map.pos_link.len(), 1);

        let closed = ClosedDonor {
            donor_key: donor_key.clone(),
            last_known: donor.clone(),
        };

        close_copy(
            &gateway,
            &mut map,
            &closed,
            &[],
            &order_config,
            config::CopyStyle::ByMarket,
            Utc::now(),
        )
        .await
        .unwrap();

        assert!(map.client_ticket_for(&donor_key).is_none());
    }
}
