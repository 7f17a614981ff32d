use rust_decimal::Decimal;
use tracing::{debug, info};
use trade_copier_domain::account::{SymbolMeta, Tick};
use trade_copier_domain::gateway::{BrokerGateway, SubmitAction};
use trade_copier_domain::ids::PendingOrderKind;
use trade_copier_execution::correspondence::CorrespondenceMap;
use trade_copier_risk::price::{limit_price, round_to_digits};
use trade_copier_trader::config::OrderConfig;

use crate::error::StrategyError;

/// Reprice every in-flight opening and closing limit order by at most one
/// point per cycle, walking toward either the original price or the live
/// market (`spec.md` §4.7).
pub async fn walk_orders(
    gateway: &dyn BrokerGateway,
    map: &mut CorrespondenceMap,
    order_config: &OrderConfig,
) -> Result<(), StrategyError> {
    let live_orders = gateway.list_orders().await.map_err(StrategyError::from)?;
    let live: std::collections::HashSet<_> = live_orders.iter().map(|o| o.ticket).collect();

    let open_tickets: Vec<_> = map.open_order_link.keys().copied().collect();
    for ticket in open_tickets {
        if !live.contains(&ticket) {
            map.drop_open_order(ticket);
            continue;
        }
        let Some(order) = live_orders.iter().find(|o| o.ticket == ticket) else {
            continue;
        };
        let info = map.open_order_link.get(&ticket).cloned().unwrap();
        let meta = gateway
            .symbol_check(&info.symbol)
            .await
            .map_err(StrategyError::from)?;
        let tick = gateway.tick(&info.symbol).await.map_err(StrategyError::from)?;

        let target = if order_config.optimize_to_market {
            market_reference(info.order_kind, &tick)
        } else {
            info.original_price
        };

        if let Some(new_price) = step_price(
            info.order_kind,
            order.price,
            target,
            &tick,
            &meta,
            order_config.optimize_to_market,
            info.original_price,
        ) {
            let rounded = round_to_digits(new_price, meta.digits);
            submit_modify(gateway, ticket, rounded).await?;
        }
    }

    let close_tickets: Vec<_> = map.close_order_info.keys().copied().collect();
    for ticket in close_tickets {
        if !live.contains(&ticket) {
            continue; // Close-By Protocol (§4.8) handles the vanished ticket.
        }
        let Some(order) = live_orders.iter().find(|o| o.ticket == ticket) else {
            continue;
        };
        let info = map.close_order_info.get(&ticket).cloned().unwrap();
        let meta = gateway
            .symbol_check(&info.symbol)
            .await
            .map_err(StrategyError::from)?;
        let tick = gateway.tick(&info.symbol).await.map_err(StrategyError::from)?;

        let target = if order_config.optimize_to_market {
            market_reference(info.order_kind, &tick)
        } else {
            info.original_close_price
        };

        if let Some(new_price) = step_price(
            info.order_kind,
            order.price,
            target,
            &tick,
            &meta,
            order_config.optimize_to_market,
            info.original_close_price,
        ) {
            let rounded = round_to_digits(new_price, meta.digits);
            submit_modify(gateway, ticket, rounded).await?;
        }
    }

    Ok(())
}

fn market_reference(kind: PendingOrderKind, tick: &Tick) -> Decimal {
    match kind {
        PendingOrderKind::BuyLimit => tick.ask,
        PendingOrderKind::SellLimit => tick.bid,
        _ => tick.last,
    }
}

/// One repricing attempt: a one-point step, falling back to the directly
/// computed optimal allowed price if the step is not legal.
fn step_price(
    kind: PendingOrderKind,
    current: Decimal,
    target: Decimal,
    tick: &Tick,
    meta: &SymbolMeta,
    optimize_to_market: bool,
    original: Decimal,
) -> Option<Decimal> {
    let point = meta.point;
    let direction = kind.direction();

    let stepped = match kind {
        PendingOrderKind::BuyLimit => {
            let candidate = current + point;
            let closer = (candidate - target).abs() < (current - target).abs();
            let legal = candidate < tick.bid;
            let within_original = optimize_to_market || candidate <= original;
            (closer && legal && within_original).then_some(candidate)
        }
        PendingOrderKind::SellLimit => {
            let candidate = current - point;
            let closer = (candidate - target).abs() < (current - target).abs();
            let legal = candidate > tick.ask;
            let within_original = optimize_to_market || candidate >= original;
            (closer && legal && within_original).then_some(candidate)
        }
        _ => None,
    };

    if stepped.is_some() {
        return stepped;
    }

    let market_ref = market_reference(kind, tick);
    let direct = limit_price(direction, market_ref, original, Decimal::ZERO);
    let legal = match kind {
        PendingOrderKind::BuyLimit => direct < tick.bid,
        PendingOrderKind::SellLimit => direct > tick.ask,
        _ => false,
    };
    let improves = (direct - target).abs() < (current - target).abs();

    (legal && improves).then_some(direct)
}

async fn submit_modify(
    gateway: &dyn BrokerGateway,
    ticket: trade_copier_domain::ids::Ticket,
    price: Decimal,
) -> Result<(), StrategyError> {
    let result = gateway
        .submit(SubmitAction::Modify { ticket, price })
        .await
        .map_err(StrategyError::from)?;
    if result.is_done() {
        info!(?ticket, ?price, "repriced order one step toward target");
    } else {
        debug!(?ticket, ?result, "reprice attempt rejected, retrying next cycle");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn tick(bid: Decimal, ask: Decimal) -> Tick {
        Tick {
            bid,
            ask,
            last: (bid + ask) / dec!(2),
            volume: Decimal::ZERO,
            time: Utc::now(),
        }
    }

    fn meta(point: Decimal, digits: u32) -> SymbolMeta {
        SymbolMeta {
            digits,
            point,
            volume_min: dec!(0.01),
            volume_max: dec!(100),
            volume_step: dec!(0.01),
            trade_allowed: true,
        }
    }

    #[test]
    fn buy_limit_steps_one_point_toward_original() {
        let t = tick(dec!(1.10020), dec!(1.10025));
        let m = meta(dec!(0.00001), 5);
        let price = step_price(
            PendingOrderKind::BuyLimit,
            dec!(1.09990),
            dec!(1.10000),
            &t,
            &m,
            false,
            dec!(1.10000),
        );
        assert_eq!(price, Some(dec!(1.09991)));
    }

    #[test]
    fn buy_limit_refuses_step_crossing_original() {
        let t = tick(dec!(1.10020), dec!(1.10025));
        let m = meta(dec!(0.00001), 5);
        let price = step_price(
            PendingOrderKind::BuyLimit,
            dec!(1.10000),
            dec!(1.10020),
            &t,
            &m,
            false,
            dec!(1.10000),
        );
        assert_eq!(price, None);
    }

    #[test]
    fn buy_limit_optimizing_to_market_steps_past_original() {
        let t = tick(dec!(1.10020), dec!(1.10025));
        let m = meta(dec!(0.00001), 5);
        let price = step_price(
            PendingOrderKind::BuyLimit,
            dec!(1.10000),
            dec!(1.10025),
            &t,
            &m,
            true,
            dec!(1.10000),
        );
        assert_eq!(price, Some(dec!(1.10001)));
    }

    #[tokio::test]
    async fn walk_orders_reprices_an_open_order_toward_its_original_price() {
        use std::sync::Arc;
        use trade_copier_broker::mock::MockBrokerSession;
        use trade_copier_broker::session::BrokerSession;
        use trade_copier_domain::ids::Symbol;
        use trade_copier_domain::order::ClientPendingOrder;
        use trade_copier_execution::correspondence::{CorrespondenceMap, OpenOrderInfo};
        use trade_copier_execution::gateway::{GatewayMode, GatewayTimeouts, GatewayWorker};

        let session = Arc::new(MockBrokerSession::new());
        session.connect().await.unwrap();
        session.seed_symbol(Symbol::new("EURUSD"), meta(dec!(0.00001), 5));
        session.seed_tick(Symbol::new("EURUSD"), tick(dec!(1.10020), dec!(1.10025)));
        session.push_order(ClientPendingOrder {
            ticket: trade_copier_domain::ids::Ticket(7),
            symbol: Symbol::new("EURUSD"),
            order_kind: PendingOrderKind::BuyLimit,
            volume: dec!(0.1),
            price: dec!(1.09990),
            time_setup: Utc::now(),
            sl: None,
            tp: None,
        });
        let (gateway, _join) =
            GatewayWorker::spawn(session.clone(), GatewayMode::ReadWrite, GatewayTimeouts::default());

        let mut map = CorrespondenceMap::new();
        map.open_order_link.insert(
            trade_copier_domain::ids::Ticket(7),
            OpenOrderInfo {
                donor_key: trade_copier_domain::ids::DonorKey::new(
                    trade_copier_domain::ids::SourceId::new("donor-a"),
                    trade_copier_domain::ids::Ticket(1),
                ),
                symbol: Symbol::new("EURUSD"),
                order_kind: PendingOrderKind::BuyLimit,
                original_price: dec!(1.10000),
            },
        );
        let order_config = trade_copier_trader::config::OrderConfig::default();

        walk_orders(&gateway, &mut map, &order_config).await.unwrap();

        let orders = session.orders().await.unwrap();
        assert_eq!(orders[0].price, dec!(1.09991));
    }
}
