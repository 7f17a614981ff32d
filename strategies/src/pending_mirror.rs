use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::{info, warn};
use trade_copier_domain::gateway::{BrokerGateway, SubmitAction};
use trade_copier_domain::ids::DonorKey;
use trade_copier_domain::order::DonorPendingOrder;
use trade_copier_domain::position::DonorPosition;
use trade_copier_execution::correspondence::CorrespondenceMap;
use trade_copier_risk::lot::{calculate_lot, LotConfig};
use trade_copier_trader::config::OrderConfig;
use trade_copier_trader::link_snapshot;

use crate::error::StrategyError;

/// Mirror donor pending orders onto the client account (`spec.md` §4.9).
/// A no-op unless `order_config.copy_pending_orders` is set.
pub async fn mirror_pending_orders(
    gateway: &dyn BrokerGateway,
    map: &mut CorrespondenceMap,
    donor_pending: &[DonorPendingOrder],
    donor_positions: &[DonorPosition],
    lot_config: &LotConfig,
    order_config: &OrderConfig,
    client_balance: Decimal,
) -> Result<(), StrategyError> {
    if !order_config.copy_pending_orders {
        return Ok(());
    }

    for donor_order in donor_pending {
        let donor_key = DonorKey::new(donor_order.source_id.clone(), donor_order.ticket);
        if map.pending_order_link.contains_key(&donor_key) || map.donor_key_in_flight(&donor_key) {
            continue;
        }

        let meta = gateway
            .symbol_check(&donor_order.symbol)
            .await
            .map_err(StrategyError::from)?;
        let lot = calculate_lot(lot_config, donor_order.volume, client_balance, meta.volume_step);
        let (sl, tp) = if order_config.copy_sl_tp {
            (donor_order.sl, donor_order.tp)
        } else {
            (None, None)
        };

        let result = gateway
            .submit(SubmitAction::PlacePending {
                symbol: donor_order.symbol.clone(),
                kind: donor_order.order_kind,
                volume: lot,
                price: donor_order.price,
                magic: order_config.magic,
                sl,
                tp,
            })
            .await
            .map_err(StrategyError::from)?;

        if result.is_done() {
            if let Some(ticket) = result.assigned_ticket {
                map.pending_order_link.insert(donor_key.clone(), ticket);
                info!(donor = ?donor_key, client = ?ticket, "mirrored donor pending order");
            }
        } else {
            warn!(donor = ?donor_key, ?result, "pending-order mirror rejected");
        }
    }

    let still_pending: HashSet<DonorKey> = donor_pending
        .iter()
        .map(|o| DonorKey::new(o.source_id.clone(), o.ticket))
        .collect();
    let vanished: Vec<DonorKey> = map
        .pending_order_link
        .keys()
        .filter(|k| !still_pending.contains(k))
        .cloned()
        .collect();

    for donor_key in vanished {
        let client_ticket = map.pending_order_link.get(&donor_key).copied().unwrap();
        let filled = donor_positions
            .iter()
            .find(|p| p.source_id == donor_key.source_id && p.ticket == donor_key.ticket);

        if let Some(donor_position) = filled {
            if let Ok(Some(position)) = gateway.position_by_ticket(client_ticket).await {
                map.pending_order_link.shift_remove(&donor_key);
                map.link_position(
                    donor_key.clone(),
                    position.ticket,
                    link_snapshot(donor_position, &position),
                );
                info!(donor = ?donor_key, client = ?position.ticket, "promoted filled mirrored order to open position");
            }
            // Client position hasn't appeared yet; leave the link and retry next cycle.
        } else {
            let _ = gateway.submit(SubmitAction::Delete { ticket: client_ticket }).await;
            map.pending_order_link.shift_remove(&donor_key);
            info!(donor = ?donor_key, client = ?client_ticket, "cancelled client mirror of a donor order cancelled upstream");
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
    use trade_copier_domain::account::SymbolMeta;
    use trade_copier_domain::ids::{SourceId, Symbol};
    use trade_copier_execution::gateway::{GatewayMode, GatewayTimeouts, GatewayWorker};
    use trade_copier_risk::lot::LotMode;

    fn donor_order() -> DonorPendingOrder {
        DonorPendingOrder {
            ticket: trade_copier_domain::ids::Ticket(1),
            source_id: SourceId::new("donor-a"),
            symbol: Symbol::new("EURUSD"),
            order_kind: trade_copier_domain::ids::PendingOrderKind::BuyLimit,
            volume: dec!(0.1),
            price: dec!(1.1),
            time_setup: Utc::now(),
            sl: None,
            tp: None,
        }
    }

    #[tokio::test]
    async fn mirrors_a_new_donor_pending_order() {
        let session = Arc::new(MockBrokerSession::new());
        session.connect().await.unwrap();
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
        let (gateway, _join) =
            GatewayWorker::spawn(session.clone(), GatewayMode::ReadWrite, GatewayTimeouts::default());

        let mut map = CorrespondenceMap::new();
        let lot_config = LotConfig {
            mode: LotMode::Fixed,
            value: dec!(0.01),
            min_lot: dec!(0.01),
            max_lot: dec!(100),
        };
        let mut order_config = OrderConfig::default();
        order_config.copy_pending_orders = true;

        mirror_pending_orders(&gateway, &mut map, &[donor_order()], &[], &lot_config, &order_config, dec!(10000))
            .await
            .unwrap();

        assert_eq!(map.pending_order_link.len(), 1);
    }

    #[tokio::test]
    async fn disabled_flag_is_a_no_op() {
        let session = Arc::new(MockBrokerSession::new());
        let (gateway, _join) =
            GatewayWorker::spawn(session.clone(), GatewayMode::ReadWrite, GatewayTimeouts::default());

        let mut map = CorrespondenceMap::new();
        let lot_config = LotConfig {
            mode: LotMode::Fixed,
            value: dec!(0.01),
            min_lot: dec!(0.01),
            max_lot: dec!(100),
        };
        let order_config = OrderConfig::default();

        mirror_pending_orders(&gateway, &mut map, &[donor_order()], &[], &lot_config, &order_config, dec!(10000))
            .await
            .unwrap();

        assert!(map.pending_order_link.is_empty());
    }
}
