use chrono::{DateTime, Utc};
use tracing::{info, warn};
use trade_copier_domain::ids::{Direction, DonorKey, Ticket};
use trade_copier_domain::gateway::{BrokerGateway, SubmitAction};
use trade_copier_domain::position::{ClientPosition, DonorPosition};
use trade_copier_execution::correspondence::{CloseOrderInfo, CorrespondenceMap};
use trade_copier_risk::price::limit_price;

use crate::config::{CopyStyle, OrderConfig};
use crate::error::TraderError;

/// A donor position/ticket that vanished from the aggregator snapshot this
/// cycle, as reported by the Position Monitor (`spec.md` §4.3, §4.5).
#[derive(Debug, Clone)]
pub struct ClosedDonor {
    pub donor_key: DonorKey,
    pub last_known: DonorPosition,
}

const LATE_MATCH_WINDOW: chrono::Duration = chrono::Duration::seconds(60);

/// Close the client-side copy of a donor position that just disappeared
/// from the donor snapshot (`spec.md` §4.5).
pub async fn close_copy(
    gateway: &dyn BrokerGateway,
    map: &mut CorrespondenceMap,
    closed: &ClosedDonor,
    client_positions: &[ClientPosition],
    order_config: &OrderConfig,
    copy_style: CopyStyle,
    now: DateTime<Utc>,
) -> Result<(), TraderError> {
    let donor_key = &closed.donor_key;

    if let Some((&client_order_ticket, _)) = map
        .open_order_link
        .iter()
        .find(|(_, info)| &info.donor_key == donor_key)
    {
        let _ = gateway.submit(SubmitAction::Delete {
            ticket: client_order_ticket,
        }).await;
        map.drop_open_order(client_order_ticket);
        info!(donor = ?donor_key, client_order = ?client_order_ticket, "cancelled in-flight open order for closed donor position");
        return Ok(());
    }

    if let Some(client_ticket) = map.client_ticket_for(donor_key) {
        return close_linked(
            gateway,
            map,
            donor_key,
            client_ticket,
            &closed.last_known,
            order_config,
            copy_style,
        )
        .await;
    }

    if let Some(candidate) = late_match(client_positions, map, &closed.last_known, now) {
        map.link_position(
            donor_key.clone(),
            candidate.ticket,
            crate::link_snapshot(&closed.last_known, &candidate),
        );
        info!(donor = ?donor_key, client = ?candidate.ticket, "late-matched client position before closing");
        return close_linked(
            gateway,
            map,
            donor_key,
            candidate.ticket,
            &closed.last_known,
            order_config,
            copy_style,
        )
        .await;
    }

    warn!(donor = ?donor_key, "closed donor position has no open-order, pos_link, or late-match candidate");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn close_linked(
    gateway: &dyn BrokerGateway,
    map: &mut CorrespondenceMap,
    donor_key: &DonorKey,
    client_ticket: Ticket,
    donor: &DonorPosition,
    order_config: &OrderConfig,
    copy_style: CopyStyle,
) -> Result<(), TraderError> {
    let live = gateway
        .position_by_ticket(client_ticket)
        .await
        .map_err(TraderError::from)?;

    let Some(live) = live else {
        map.unlink_position(donor_key);
        info!(donor = ?donor_key, client = ?client_ticket, "client position already gone, treating as closed");
        return Ok(());
    };

    match copy_style {
        CopyStyle::ByMarket => {
            let buy = matches!(live.direction, Direction::Sell);
            let result = gateway
                .submit(SubmitAction::PlaceMarket {
                    symbol: live.symbol.clone(),
                    buy,
                    volume: live.volume,
                    magic: order_config.magic,
                    closing_position: Some(client_ticket),
                })
                .await
                .map_err(TraderError::from)?;

            if result.is_done() {
                map.unlink_position(donor_key);
                info!(donor = ?donor_key, client = ?client_ticket, "closed market copy");
            } else {
                warn!(donor = ?donor_key, ?result, "market close rejected, retrying next cycle");
            }
            Ok(())
        }
        CopyStyle::ByLimits => {
            let meta = gateway
                .symbol_check(&live.symbol)
                .await
                .map_err(TraderError::from)?;
            let tick = gateway.tick(&live.symbol).await.map_err(TraderError::from)?;

            let closing_direction = live.direction.opposite();
            let market_ref = match closing_direction {
                Direction::Buy => tick.ask,
                Direction::Sell => tick.bid,
            };
            let offset = order_config.limit_offset_points * meta.point;
            let price = limit_price(closing_direction, market_ref, live.price_current, offset)
                .round_dp(meta.digits);

            let kind = match closing_direction {
                Direction::Buy => trade_copier_domain::ids::PendingOrderKind::BuyLimit,
                Direction::Sell => trade_copier_domain::ids::PendingOrderKind::SellLimit,
            };

            let result = gateway
                .submit(SubmitAction::PlacePending {
                    symbol: live.symbol.clone(),
                    kind,
                    volume: live.volume,
                    price,
                    magic: order_config.magic,
                    sl: None,
                    tp: None,
                })
                .await
                .map_err(TraderError::from)?;

            if result.is_done() {
                if let Some(ticket) = result.assigned_ticket {
                    map.close_order_link.insert(donor_key.clone(), ticket);
                    map.close_order_info.insert(
                        ticket,
                        CloseOrderInfo {
                            donor_key: donor_key.clone(),
                            symbol: live.symbol.clone(),
                            order_kind: kind,
                            original_close_price: price,
                            client_position_ticket_to_close: client_ticket,
                        },
                    );
                    info!(donor = ?donor_key, client_order = ?ticket, "placed closing limit order");
                }
            } else {
                warn!(donor = ?donor_key, ?result, "closing limit order rejected, retrying next cycle");
            }
            Ok(())
        }
    }
}

fn late_match(
    client_positions: &[ClientPosition],
    map: &CorrespondenceMap,
    donor: &DonorPosition,
    now: DateTime<Utc>,
) -> Option<ClientPosition> {
    let linked: std::collections::HashSet<Ticket> = map.pos_link.values().copied().collect();

    client_positions
        .iter()
        .find(|candidate| {
            candidate.symbol == donor.symbol
                && candidate.direction == donor.direction
                && !linked.contains(&candidate.ticket)
                && now.signed_duration_since(candidate.time_opened) <= LATE_MATCH_WINDOW
                && now.signed_duration_since(candidate.time_opened) >= chrono::Duration::zero()
        })
        .cloned()
}
