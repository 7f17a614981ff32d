use std::time::Duration;
use tracing::{info, warn};
use trade_copier_domain::gateway::{BrokerGateway, SubmitAction};
use trade_copier_domain::ids::DonorKey;
use trade_copier_execution::correspondence::CorrespondenceMap;

use crate::error::StrategyError;

const SETTLE_DELAY: Duration = Duration::from_millis(300);

/// Resolve every `close_order_link` entry whose closing limit order has
/// filled, handing the resulting counter-position to the broker's
/// close-by action (`spec.md` §4.8).
pub async fn check_close_by(
    gateway: &dyn BrokerGateway,
    map: &mut CorrespondenceMap,
) -> Result<(), StrategyError> {
    let entries: Vec<(DonorKey, trade_copier_domain::ids::Ticket)> = map
        .close_order_link
        .iter()
        .map(|(k, v)| (k.clone(), *v))
        .collect();

    for (donor_key, close_ticket) in entries {
        let live_orders = gateway.list_orders().await.map_err(StrategyError::from)?;
        if live_orders.iter().any(|o| o.ticket == close_ticket) {
            continue; // still pending, try again next cycle
        }

        tokio::time::sleep(SETTLE_DELAY).await;

        let Some(info) = map.close_order_info.get(&close_ticket).cloned() else {
            continue;
        };

        let original = gateway
            .position_by_ticket(info.client_position_ticket_to_close)
            .await
            .map_err(StrategyError::from)?;

        let Some(original) = original else {
            map.unlink_position(&donor_key);
            map.drop_close_order(&donor_key, close_ticket);
            info!(donor = ?donor_key, "original position already gone, broker netted automatically");
            continue;
        };

        let opposite_direction = original.direction.opposite();
        let opposite = gateway
            .list_positions(None)
            .await
            .map_err(StrategyError::from)?
            .into_iter()
            .find(|p| {
                p.symbol == original.symbol
                    && p.direction == opposite_direction
                    && p.ticket != original.ticket
            });

        let Some(opposite) = opposite else {
            // Counter-position hasn't settled yet, retry next cycle.
            continue;
        };

        let result = gateway
            .submit(SubmitAction::CloseBy {
                position: original.ticket,
                opposite: opposite.ticket,
            })
            .await
            .map_err(StrategyError::from)?;

        if result.is_done() {
            map.unlink_position(&donor_key);
            map.drop_close_order(&donor_key, close_ticket);
            info!(donor = ?donor_key, "closed counter-position via close-by");
        } else {
            warn!(donor = ?donor_key, ?result, "close-by rejected, retrying next cycle");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use trade_copier_broker::mock::MockBrokerSession;
    use trade_copier_broker::session::BrokerSession;
    use trade_copier_domain::ids::{Direction, SourceId, Symbol, Ticket};
    use trade_copier_domain::position::ClientPosition;
    use trade_copier_execution::correspondence::CloseOrderInfo;
    use trade_copier_execution::gateway::{GatewayMode, GatewayTimeouts, GatewayWorker};

    fn position(ticket: u64, direction: Direction) -> ClientPosition {
        ClientPosition {
            ticket: Ticket(ticket),
            symbol: Symbol::new("EURUSD"),
            direction,
            volume: dec!(0.1),
            price_open: dec!(1.1),
            price_current: dec!(1.1),
            profit: dec!(0),
            time_opened: Utc::now(),
            magic_tag: None,
            comment: None,
            sl: None,
            tp: None,
        }
    }

    #[tokio::test]
    async fn treats_original_position_as_closed_when_already_gone() {
        let session = Arc::new(MockBrokerSession::new());
        let (gateway, _join) =
            GatewayWorker::spawn(session.clone(), GatewayMode::ReadWrite, GatewayTimeouts::default());

        let donor_key = DonorKey::new(SourceId::new("donor-a"), Ticket(1));
        let mut map = CorrespondenceMap::new();
        map.close_order_link.insert(donor_key.clone(), Ticket(500));
        map.close_order_info.insert(
            Ticket(500),
            CloseOrderInfo {
                donor_key: donor_key.clone(),
                symbol: Symbol::new("EURUSD"),
                order_kind: trade_copier_domain::ids::PendingOrderKind::SellLimit,
                original_close_price: dec!(1.1),
                client_position_ticket_to_close: Ticket(99),
            },
        );

        check_close_by(&gateway, &mut map).await.unwrap();

        assert!(map.close_order_link.is_empty());
        assert!(map.close_order_info.is_empty());
    }

    #[tokio::test]
    async fn closes_by_when_counter_position_present() {
        let session = Arc::new(MockBrokerSession::new());
        session.connect().await.unwrap();
        session.push_position(position(1, Direction::Sell));
        session.push_position(position(2, Direction::Buy));
        let (gateway, _join) =
            GatewayWorker::spawn(session.clone(), GatewayMode::ReadWrite, GatewayTimeouts::default());

        let donor_key = DonorKey::new(SourceId::new("donor-a"), Ticket(1));
        let mut map = CorrespondenceMap::new();
        map.close_order_link.insert(donor_key.clone(), Ticket(500));
        map.close_order_info.insert(
            Ticket(500),
            CloseOrderInfo {
                donor_key: donor_key.clone(),
                symbol: Symbol::new("EURUSD"),
                order_kind: trade_copier_domain::ids::PendingOrderKind::SellLimit,
                original_close_price: dec!(1.1),
                client_position_ticket_to_close: Ticket(1),
            },
        );

        check_close_by(&gateway, &mut map).await.unwrap();

        assert!(map.close_order_link.is_empty());
        assert!(map.close_order_info.is_empty());
    }
}
