use trade_copier_domain::donor_source::DonorSource;
use trade_copier_domain::order::DonorPendingOrder;
use trade_copier_domain::position::DonorPosition;
use tracing::warn;

use crate::source::DonorSourceImpl;

/// Union of every configured donor source's positions and orders, tagged by
/// `source_id` (`spec.md` §4.2: "Donor Aggregator"). A source that errors or
/// reports disconnected is skipped for this cycle rather than failing the
/// whole aggregation — its last-known state simply ages out of the
/// correspondence map once its positions stop appearing.
pub struct DonorAggregator {
    sources: Vec<DonorSourceImpl>,
}

impl DonorAggregator {
    pub fn new(sources: Vec<DonorSourceImpl>) -> Self {
        Self { sources }
    }

    pub async fn connect_all(&self) {
        for source in &self.sources {
            if let Err(error) = source.connect().await {
                warn!(source = %source.id(), %error, "donor source failed to connect");
            }
        }
    }

    pub async fn disconnect_all(&self) {
        for source in &self.sources {
            if let Err(error) = source.disconnect().await {
                warn!(source = %source.id(), %error, "donor source failed to disconnect cleanly");
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub async fn collect(&self) -> (Vec<DonorPosition>, Vec<DonorPendingOrder>) {
        let mut positions = Vec::new();
        let mut orders = Vec::new();

        for source in &self.sources {
            if !source.is_connected() {
                warn!(source = %source.id(), "donor source disconnected, skipping this cycle");
                continue;
            }

            match source.positions().await {
                Ok(mut p) => positions.append(&mut p),
                Err(error) => {
                    warn!(source = %source.id(), %error, "failed to read donor positions");
                    continue;
                }
            }

            match source.orders().await {
                Ok(mut o) => orders.append(&mut o),
                Err(error) => warn!(source = %source.id(), %error, "failed to read donor orders"),
            }
        }

        (positions, orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_process::InProcessDonorSource;
    use std::sync::Arc;
    use trade_copier_broker::mock::MockBrokerSession;
    use trade_copier_domain::ids::SourceId;

    #[tokio::test]
    async fn collects_empty_state_from_a_freshly_connected_source() {
        let session = MockBrokerSession::new();
        let a = DonorSourceImpl::InProcess(InProcessDonorSource::new(
            SourceId::new("a"),
            Arc::new(session),
        ));

        let aggregator = DonorAggregator::new(vec![a]);
        aggregator.connect_all().await;
        let (positions, orders) = aggregator.collect().await;
        assert!(positions.is_empty());
        assert!(orders.is_empty());
    }
}
