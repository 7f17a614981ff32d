use async_trait::async_trait;
use std::sync::Arc;
use trade_copier_broker::session::BrokerSession;
use trade_copier_domain::account::AccountInfo;
use trade_copier_domain::donor_source::{DonorSource, DonorSourceError};
use trade_copier_domain::ids::SourceId;
use trade_copier_domain::order::DonorPendingOrder;
use trade_copier_domain::position::DonorPosition;

use crate::error::BrokerSessionError;

fn map_error(error: BrokerSessionError) -> DonorSourceError {
    match error {
        BrokerSessionError::NotConnected => DonorSourceError::Disconnected,
        other => DonorSourceError::Transport(other.to_string()),
    }
}

/// A donor source reading directly from an in-process [`BrokerSession`],
/// used for the `python_api` donor type (`spec.md` §4.2, §9): the same
/// broker library process the client gateway uses, queried read-only.
pub struct InProcessDonorSource {
    id: SourceId,
    session: Arc<dyn BrokerSession>,
}

impl InProcessDonorSource {
    pub fn new(id: SourceId, session: Arc<dyn BrokerSession>) -> Self {
        Self { id, session }
    }
}

#[async_trait]
impl DonorSource for InProcessDonorSource {
    fn id(&self) -> &SourceId {
        &self.id
    }

    async fn connect(&self) -> Result<(), DonorSourceError> {
        self.session.connect().await.map_err(map_error)
    }

    async fn disconnect(&self) -> Result<(), DonorSourceError> {
        self.session.disconnect().await.map_err(map_error)
    }

    async fn positions(&self) -> Result<Vec<DonorPosition>, DonorSourceError> {
        let positions = self.session.positions().await.map_err(map_error)?;
        Ok(positions
            .into_iter()
            .map(|p| DonorPosition {
                ticket: p.ticket,
                source_id: self.id.clone(),
                symbol: p.symbol,
                direction: p.direction,
                volume: p.volume,
                price_open: p.price_open,
                price_current: p.price_current,
                profit: p.profit,
                time_opened: p.time_opened,
                magic_tag: p.magic_tag,
                comment: p.comment,
                sl: p.sl,
                tp: p.tp,
            })
            .collect())
    }

    async fn orders(&self) -> Result<Vec<DonorPendingOrder>, DonorSourceError> {
        let orders = self.session.orders().await.map_err(map_error)?;
        Ok(orders
            .into_iter()
            .map(|o| DonorPendingOrder {
                ticket: o.ticket,
                source_id: self.id.clone(),
                symbol: o.symbol,
                order_kind: o.order_kind,
                volume: o.volume,
                price: o.price,
                time_setup: o.time_setup,
                sl: o.sl,
                tp: o.tp,
            })
            .collect())
    }

    async fn account_info(&self) -> Result<AccountInfo, DonorSourceError> {
        self.session.account_info().await.map_err(map_error)
    }

    fn is_connected(&self) -> bool {
        true
    }
}
