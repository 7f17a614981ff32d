//! The reconciliation loop (`spec.md` §2, §5): one cooperative task running
//! `process_cycle` on a timer, driving the Donor Aggregator, Position
//! Monitor, Order Planner, Pending-Order Walker, Close-By Protocol and
//! Pending-Order Mirroring, persisting the Correspondence Map whenever it
//! changes.

use chrono::Utc;
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::{info, warn};
use trade_copier_domain::gateway::BrokerGateway;
use trade_copier_domain::ids::DonorKey;
use trade_copier_domain::position::{ClientPosition, DonorPosition};
use trade_copier_donors::aggregator::DonorAggregator;
use trade_copier_execution::correspondence::CorrespondenceMap;
use trade_copier_execution::persist::save_state;
use trade_copier_risk::lot::LotConfig;
use trade_copier_strategies::close_by::check_close_by;
use trade_copier_strategies::matcher::run_matcher;
use trade_copier_strategies::pending_mirror::mirror_pending_orders;
use trade_copier_strategies::walker::walk_orders;
use trade_copier_trader::close::close_copy;
use trade_copier_trader::config::{CopyStyle, OrderConfig};
use trade_copier_trader::link_snapshot;
use trade_copier_trader::open::open_copy;

use crate::error::ReconcileError;
use crate::monitor::PositionMonitor;

/// Restart-time restoration (`spec.md` §4.10, §9): score every live donor
/// position against every live client position with the matcher, favouring
/// pairs the persisted state already vouched for, and replace `pos_link`
/// with only the pairs that survive. Called once at startup before the
/// reconciliation loop begins.
pub async fn restore_links(
    client_gateway: &dyn BrokerGateway,
    map: &mut CorrespondenceMap,
    monitor: &mut PositionMonitor,
    donor_positions: &[DonorPosition],
    client_positions: &[ClientPosition],
    copy_donor_magic: bool,
) {
    let donors: Vec<(DonorKey, DonorPosition)> = donor_positions
        .iter()
        .map(|p| (DonorKey::new(p.source_id.clone(), p.ticket), p.clone()))
        .collect();

    let mut points = HashMap::new();
    for (_, donor) in &donors {
        if points.contains_key(&donor.symbol) {
            continue;
        }
        if let Ok(meta) = client_gateway.symbol_check(&donor.symbol).await {
            points.insert(donor.symbol.clone(), meta.point);
        }
    }

    let saved_pairs: HashMap<DonorKey, trade_copier_domain::ids::Ticket> =
        map.pos_link.iter().map(|(k, v)| (k.clone(), *v)).collect();

    let pairs = run_matcher(&donors, client_positions, &points, copy_donor_magic, &saved_pairs);

    let mut new_pos_link = IndexMap::new();
    let mut new_snapshots = IndexMap::new();
    for (donor_key, client_ticket) in pairs {
        let Some((_, donor)) = donors.iter().find(|(k, _)| *k == donor_key) else {
            continue;
        };
        let Some(client) = client_positions.iter().find(|c| c.ticket == client_ticket) else {
            continue;
        };
        monitor.adopt(donor);
        new_snapshots.insert(donor_key.clone(), link_snapshot(donor, client));
        new_pos_link.insert(donor_key, client_ticket);
    }

    info!(
        restored = new_pos_link.len(),
        donors = donors.len(),
        "restart-time matcher restored position links"
    );
    map.pos_link = new_pos_link;
    map.pos_link_snapshots = new_snapshots;
}

/// Counts of what changed this cycle, returned for logging/testing. Does not
/// influence control flow — every field is informational.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    pub donor_positions_opened: usize,
    pub donor_positions_closed: usize,
}

#[allow(clippy::too_many_arguments)]
pub async fn process_cycle(
    client_gateway: &dyn BrokerGateway,
    aggregator: &DonorAggregator,
    monitor: &mut PositionMonitor,
    map: &mut CorrespondenceMap,
    lot_config: &LotConfig,
    order_config: &OrderConfig,
    copy_style: CopyStyle,
    copy_donor_magic: bool,
    state_path: &std::path::Path,
) -> Result<CycleOutcome, ReconcileError> {
    let (donor_positions, donor_orders) = aggregator.collect().await;

    let account = client_gateway.account_info().await?;
    let client_positions = client_gateway.list_positions(None).await?;

    let new_positions = monitor.new_donor_positions(&donor_positions);
    let closed = monitor.closed_donor_tickets(&donor_positions);
    let _ = monitor.volume_changes_donor(&donor_positions);
    let _ = monitor.volume_changes_client(&client_positions);

    for donor in &new_positions {
        let donor_key = trade_copier_domain::ids::DonorKey::new(
            donor.source_id.clone(),
            donor.ticket,
        );
        if let Err(error) = open_copy(
            client_gateway,
            map,
            &donor_key,
            donor,
            lot_config,
            order_config,
            copy_style,
            copy_donor_magic,
            account.balance,
        )
        .await
        {
            warn!(donor = ?donor_key, %error, "opening a donor copy failed, retrying next cycle");
        }
    }

    let now = Utc::now();
    for closed_donor in &closed {
        if let Err(error) = close_copy(
            client_gateway,
            map,
            closed_donor,
            &client_positions,
            order_config,
            copy_style,
            now,
        )
        .await
        {
            warn!(donor = ?closed_donor.donor_key, %error, "closing a donor copy failed, retrying next cycle");
        }
    }

    if let Err(error) = walk_orders(client_gateway, map, order_config).await {
        warn!(%error, "pending-order walk failed this cycle");
    }

    if let Err(error) = check_close_by(client_gateway, map).await {
        warn!(%error, "close-by check failed this cycle");
    }

    let balance = account.balance;
    if let Err(error) = mirror_pending_orders(
        client_gateway,
        map,
        &donor_orders,
        &donor_positions,
        lot_config,
        order_config,
        balance,
    )
    .await
    {
        warn!(%error, "pending-order mirroring failed this cycle");
    }

    if let Err(error) = save_state(state_path, map).await {
        warn!(%error, "failed to persist correspondence state this cycle");
    }

    let outcome = CycleOutcome {
        donor_positions_opened: new_positions.len(),
        donor_positions_closed: closed.len(),
    };
    if outcome != CycleOutcome::default() {
        info!(?outcome, "reconciliation cycle made changes");
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use trade_copier_broker::mock::MockBrokerSession;
    use trade_copier_broker::session::BrokerSession;
    use trade_copier_domain::account::{SymbolMeta, Tick};
    use trade_copier_domain::ids::{Direction, SourceId, Symbol, Ticket};
    use trade_copier_donors::in_process::InProcessDonorSource;
    use trade_copier_donors::source::DonorSourceImpl;
    use trade_copier_execution::gateway::{GatewayMode, GatewayTimeouts, GatewayWorker};
    use trade_copier_risk::lot::{LotConfig, LotMode};
    use trade_copier_trader::config::{CopyStyle, OrderConfig};

    fn meta() -> SymbolMeta {
        SymbolMeta {
            digits: 5,
            point: dec!(0.00001),
            volume_min: dec!(0.01),
            volume_max: dec!(100),
            volume_step: dec!(0.01),
            trade_allowed: true,
        }
    }

    fn tick() -> Tick {
        Tick {
            bid: dec!(1.10020),
            ask: dec!(1.10025),
            last: dec!(1.10022),
            volume: dec!(0),
            time: Utc::now(),
        }
    }

    fn lot_config() -> LotConfig {
        LotConfig {
            mode: LotMode::Fixed,
            value: dec!(0.10),
            min_lot: dec!(0.01),
            max_lot: dec!(100),
        }
    }

    fn position_fixture(ticket: u64) -> trade_copier_domain::position::ClientPosition {
        trade_copier_domain::position::ClientPosition {
            ticket: Ticket(ticket),
            symbol: Symbol::new("EURUSD"),
            direction: Direction::Buy,
            volume: dec!(1.0),
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
    async fn process_cycle_opens_a_market_copy_for_a_new_donor_position() {
        let donor_session = Arc::new(MockBrokerSession::new());
        donor_session.connect().await.unwrap();
        donor_session.push_position(position_fixture(1));

        let client_session = Arc::new(MockBrokerSession::new());
        client_session.connect().await.unwrap();
        client_session.seed_symbol(Symbol::new("EURUSD"), meta());
        client_session.seed_tick(Symbol::new("EURUSD"), tick());

        let (client_gateway, _client_join) = GatewayWorker::spawn(
            client_session.clone(),
            GatewayMode::ReadWrite,
            GatewayTimeouts::default(),
        );

        let donor_source = DonorSourceImpl::InProcess(InProcessDonorSource::new(
            SourceId::new("donor-a"),
            donor_session,
        ));
        let aggregator = DonorAggregator::new(vec![donor_source]);
        aggregator.connect_all().await;

        let mut monitor = PositionMonitor::new();
        let mut map = CorrespondenceMap::new();
        let lot_config = lot_config();
        let order_config = OrderConfig::default();
        let state_dir = tempfile::tempdir().unwrap();
        let state_path = state_dir.path().join("state.json");

        let outcome = process_cycle(
            &client_gateway,
            &aggregator,
            &mut monitor,
            &mut map,
            &lot_config,
            &order_config,
            CopyStyle::ByMarket,
            false,
            &state_path,
        )
        .await
        .unwrap();

        assert_eq!(outcome.donor_positions_opened, 1);
        assert_eq!(map.pos_link.len(), 1);
        assert_eq!(client_session.positions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn restore_links_adopts_a_donor_position_matched_by_persisted_state() {
        let client_session = Arc::new(MockBrokerSession::new());
        client_session.connect().await.unwrap();
        client_session.seed_symbol(Symbol::new("EURUSD"), meta());
        client_session.seed_tick(Symbol::new("EURUSD"), tick());
        client_session.push_position(position_fixture(9));
        let (client_gateway, _join) = GatewayWorker::spawn(
            client_session,
            GatewayMode::ReadWrite,
            GatewayTimeouts::default(),
        );

        let donor_key = DonorKey::new(SourceId::new("donor-a"), Ticket(1));
        let donor_positions = vec![trade_copier_domain::position::DonorPosition {
            ticket: Ticket(1),
            source_id: SourceId::new("donor-a"),
            symbol: Symbol::new("EURUSD"),
            direction: Direction::Buy,
            volume: dec!(1.0),
            price_open: dec!(1.1),
            price_current: dec!(1.1),
            profit: dec!(0),
            time_opened: Utc::now(),
            magic_tag: None,
            comment: None,
            sl: None,
            tp: None,
        }];
        let client_positions = vec![position_fixture(9)];

        let mut map = CorrespondenceMap::new();
        map.pos_link.insert(donor_key.clone(), Ticket(9));
        let mut monitor = PositionMonitor::new();

        restore_links(
            &client_gateway,
            &mut map,
            &mut monitor,
            &donor_positions,
            &client_positions,
            false,
        )
        .await;

        assert_eq!(map.pos_link.get(&donor_key), Some(&Ticket(9)));
        let fresh = monitor.new_donor_positions(&donor_positions);
        assert!(fresh.is_empty(), "restored donor position must not be reported as new");
    }
}
