use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{info, warn};
use trade_copier_domain::account::SymbolMeta;
use trade_copier_domain::gateway::{BrokerGateway, SubmitAction};
use trade_copier_domain::ids::{DonorKey, MagicTag, PendingOrderKind};
use trade_copier_domain::position::DonorPosition;
use trade_copier_execution::correspondence::{CorrespondenceMap, OpenOrderInfo};
use trade_copier_risk::lot::{calculate_lot, LotConfig};
use trade_copier_risk::price::{dominance, limit_price, round_to_digits};

use crate::config::{CopyStyle, OrderConfig};
use crate::error::TraderError;

const SETTLE_DELAY: Duration = Duration::from_millis(300);

fn kind_for(direction: trade_copier_domain::ids::Direction) -> PendingOrderKind {
    match direction {
        trade_copier_domain::ids::Direction::Buy => PendingOrderKind::BuyLimit,
        trade_copier_domain::ids::Direction::Sell => PendingOrderKind::SellLimit,
    }
}

/// Open a client-side copy of a newly observed donor position (`spec.md`
/// §4.4). Returns `Ok(())` once the position is linked (market style) or a
/// pending order is tracked for next-cycle fill detection (limit style).
#[allow(clippy::too_many_arguments)]
pub async fn open_copy(
    gateway: &dyn BrokerGateway,
    map: &mut CorrespondenceMap,
    donor_key: &DonorKey,
    donor: &DonorPosition,
    lot_config: &LotConfig,
    order_config: &OrderConfig,
    copy_style: CopyStyle,
    copy_donor_magic: bool,
    client_balance: Decimal,
) -> Result<(), TraderError> {
    if map.skipped_symbols.contains(&donor.symbol) {
        return Ok(());
    }

    let magic = if copy_donor_magic {
        donor.magic_tag.unwrap_or(order_config.magic)
    } else {
        order_config.magic
    };

    if let Some(pending_client_ticket) = map.pending_order_link.get(donor_key).copied() {
        if let Ok(Some(position)) = gateway.position_by_ticket(pending_client_ticket).await {
            map.pending_order_link.shift_remove(donor_key);
            map.link_position(
                donor_key.clone(),
                position.ticket,
                crate::link_snapshot(donor, &position),
            );
            info!(donor = ?donor_key, client = ?position.ticket, "adopted mirrored pending order as open position");
            return Ok(());
        }
    }

    let meta = gateway
        .symbol_check(&donor.symbol)
        .await
        .map_err(TraderError::from)
        .inspect_err(|_| {
            map.skipped_symbols.insert(donor.symbol.clone());
        })?;

    let lot = calculate_lot(
        lot_config,
        donor.volume,
        client_balance,
        meta.volume_step,
    );

    match copy_style {
        CopyStyle::ByMarket => open_by_market(gateway, map, donor_key, donor, magic, lot).await,
        CopyStyle::ByLimits => {
            open_by_limit(gateway, map, donor_key, donor, magic, lot, order_config, &meta).await
        }
    }
}

async fn open_by_market(
    gateway: &dyn BrokerGateway,
    map: &mut CorrespondenceMap,
    donor_key: &DonorKey,
    donor: &DonorPosition,
    magic: MagicTag,
    lot: Decimal,
) -> Result<(), TraderError> {
    let buy = matches!(donor.direction, trade_copier_domain::ids::Direction::Buy);
    let result = gateway
        .submit(SubmitAction::PlaceMarket {
            symbol: donor.symbol.clone(),
            buy,
            volume: lot,
            magic,
            closing_position: None,
        })
        .await
        .map_err(TraderError::from)?;

    if !result.is_done() {
        warn!(donor = ?donor_key, ?result, "market open rejected");
        return Ok(());
    }

    tokio::time::sleep(SETTLE_DELAY).await;

    let position = gateway
        .position_by_symbol(&donor.symbol, Some(magic))
        .await
        .map_err(TraderError::from)?;

    if let Some(position) = position {
        map.link_position(
            donor_key.clone(),
            position.ticket,
            crate::link_snapshot(donor, &position),
        );
        info!(donor = ?donor_key, client = ?position.ticket, "opened market copy");
    } else {
        warn!(donor = ?donor_key, "market order done but resulting position not found yet");
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn open_by_limit(
    gateway: &dyn BrokerGateway,
    map: &mut CorrespondenceMap,
    donor_key: &DonorKey,
    donor: &DonorPosition,
    magic: MagicTag,
    lot: Decimal,
    order_config: &OrderConfig,
    meta: &SymbolMeta,
) -> Result<(), TraderError> {
    let kind = kind_for(donor.direction);
    let point = meta.point;
    let mut offset = order_config.limit_offset_points * point;

    for attempt in 0..order_config.max_retries {
        let tick = gateway.tick(&donor.symbol).await.map_err(TraderError::from)?;
        let market_ref = match donor.direction {
            trade_copier_domain::ids::Direction::Buy => tick.ask,
            trade_copier_domain::ids::Direction::Sell => tick.bid,
        };

        let price = round_to_digits(
            limit_price(donor.direction, market_ref, donor.price_open, offset),
            meta.digits,
        );

        if !dominance(price, donor.price_open, donor.direction, point) {
            offset += point;
            continue;
        }

        let result = gateway
            .submit(SubmitAction::PlacePending {
                symbol: donor.symbol.clone(),
                kind,
                volume: lot,
                price,
                magic,
                sl: donor.sl,
                tp: donor.tp,
            })
            .await
            .map_err(TraderError::from)?;

        if result.is_done() {
            if let Some(ticket) = result.assigned_ticket {
                map.open_order_link.insert(
                    ticket,
                    OpenOrderInfo {
                        donor_key: donor_key.clone(),
                        symbol: donor.symbol.clone(),
                        order_kind: kind,
                        original_price: donor.price_open,
                    },
                );
                info!(donor = ?donor_key, client = ?ticket, attempt, "placed opening limit order");
            }
            return Ok(());
        }

        if result.is_transient() {
            offset += point;
            continue;
        }

        warn!(donor = ?donor_key, ?result, "opening limit order rejected, not retrying");
        return Ok(());
    }

    Err(TraderError::RetriesExhausted(order_config.max_retries))
}

