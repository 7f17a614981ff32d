use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};
use trade_copier_broker::factory::build_session_from_env;
use trade_copier_donors::aggregator::DonorAggregator;
use trade_copier_donors::config::{DonorKind, DonorsConfig};
use trade_copier_donors::in_process::InProcessDonorSource;
use trade_copier_donors::socket::{SocketDonorSource, SocketKind};
use trade_copier_donors::source::DonorSourceImpl;
use trade_copier_domain::gateway::BrokerGateway;
use trade_copier_domain::ids::SourceId;
use trade_copier_execution::correspondence::CorrespondenceMap;
use trade_copier_execution::gateway::{GatewayHandle, GatewayMode, GatewayTimeouts, GatewayWorker};
use trade_copier_execution::persist::load_state;

use crate::engine::{process_cycle, restore_links};
use crate::error::{FatalError, ReconcileError};
use crate::monitor::PositionMonitor;
use crate::system::config::AppConfig;

/// Everything `System::build` needs, after config files have been loaded and
/// CLI overrides applied (`spec.md` §6).
#[derive(Debug, Clone)]
pub struct SystemArgs {
    pub app_config: AppConfig,
    pub donors_config: DonorsConfig,
    pub state_path: PathBuf,
}

/// A fully-wired trade-copier process: the client gateway, the donor
/// aggregator, the restored Correspondence Map, and the Position Monitor.
pub struct System {
    app_config: AppConfig,
    state_path: PathBuf,
    client_gateway: GatewayHandle,
    client_join: JoinHandle<()>,
    aggregator: DonorAggregator,
    monitor: PositionMonitor,
    map: CorrespondenceMap,
}

fn build_donor_source(entry: &trade_copier_donors::config::DonorEntry) -> DonorSourceImpl {
    let id = SourceId::new(entry.id.clone());
    match entry.kind {
        DonorKind::PythonApi => {
            let env_prefix = format!("TRADE_COPIER_DONOR_{}", entry.id.to_uppercase());
            let (session, _) = build_session_from_env(&env_prefix);
            DonorSourceImpl::InProcess(InProcessDonorSource::new(id, session))
        }
        DonorKind::SocketMt4 => {
            let addr = format!(
                "{}:{}",
                entry.host.clone().unwrap_or_else(|| "127.0.0.1".into()),
                entry.port.expect("validated by DonorsConfig::validate")
            );
            DonorSourceImpl::SocketMt4(SocketDonorSource::new(id, addr, SocketKind::Mt4))
        }
        DonorKind::SocketMt5 => {
            let addr = format!(
                "{}:{}",
                entry.host.clone().unwrap_or_else(|| "127.0.0.1".into()),
                entry.port.expect("validated by DonorsConfig::validate")
            );
            DonorSourceImpl::SocketMt5(SocketDonorSource::new(id, addr, SocketKind::Mt5))
        }
    }
}

impl System {
    /// Build and wire a full system: connect the client gateway, connect
    /// every donor source, load persisted state, then validate it with the
    /// restart-time matcher before returning (`spec.md` §4.4/4.5, §9).
    ///
    /// Only the three conditions of `spec.md` §7's "Fatal" bullet return an
    /// error here; everything else is logged and tolerated.
    pub async fn build(args: SystemArgs) -> Result<Self, FatalError> {
        args.donors_config
            .validate()
            .map_err(|e| FatalError::InvalidDonorsConfig(e.to_string()))?;
        if args.donors_config.donors.is_empty() {
            return Err(FatalError::NoDonorSources);
        }

        let (client_session, backend) = build_session_from_env("TRADE_COPIER_CLIENT");
        info!(?backend, "client broker session selected");
        let (client_gateway, client_join) = GatewayWorker::spawn(
            client_session,
            GatewayMode::ReadWrite,
            GatewayTimeouts::default(),
        );

        let account = client_gateway
            .account_info()
            .await
            .map_err(|e| FatalError::ClientAccountUnreachable(e.to_string()))?;
        info!(login = account.login, "client account reachable");

        let sources: Vec<DonorSourceImpl> = args
            .donors_config
            .donors
            .iter()
            .map(build_donor_source)
            .collect();
        let aggregator = DonorAggregator::new(sources);
        aggregator.connect_all().await;

        let mut map = load_state(&args.state_path).await;
        let mut monitor = PositionMonitor::new();

        let (donor_positions, _donor_orders) = aggregator.collect().await;
        let client_positions = client_gateway
            .list_positions(None)
            .await
            .unwrap_or_default();
        restore_links(
            &client_gateway,
            &mut map,
            &mut monitor,
            &donor_positions,
            &client_positions,
            args.app_config.copy_donor_magic,
        )
        .await;

        // §9 Open Question: run the initial-copy sweep only after
        // matcher-based restoration, and only for donor positions it left
        // unlinked. A donor position the matcher could not place is either
        // genuinely new (copy it, if enabled) or pre-existing drift we were
        // told to leave alone.
        if !args.app_config.copy_existing_positions {
            for donor in &donor_positions {
                let key = trade_copier_domain::ids::DonorKey::new(
                    donor.source_id.clone(),
                    donor.ticket,
                );
                if !map.pos_link.contains_key(&key) {
                    monitor.adopt(donor);
                }
            }
        }

        Ok(Self {
            app_config: args.app_config,
            state_path: args.state_path,
            client_gateway,
            client_join,
            aggregator,
            monitor,
            map,
        })
    }

    /// Drive the reconciliation loop until `shutdown` fires, persisting
    /// state after every cycle (`spec.md` §5).
    pub async fn run(mut self, mut shutdown: tokio::sync::watch::Receiver<bool>) -> Result<(), ReconcileError> {
        let interval = Duration::from_secs(self.app_config.check_interval_secs.max(1));

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }

            process_cycle(
                &self.client_gateway,
                &self.aggregator,
                &mut self.monitor,
                &mut self.map,
                &self.app_config.lot_config,
                &self.app_config.order_config,
                self.app_config.copy_style,
                self.app_config.copy_donor_magic,
                &self.state_path,
            )
            .await?;
        }

        self.shutdown().await;
        Ok(())
    }

    async fn shutdown(self) {
        const GATEWAY_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

        self.client_gateway.shutdown().await;
        self.aggregator.disconnect_all().await;

        let mut client_join = self.client_join;
        if tokio::time::timeout(GATEWAY_SHUTDOWN_TIMEOUT, &mut client_join)
            .await
            .is_err()
        {
            warn!("client gateway worker did not stop within the shutdown timeout, aborting it");
            client_join.abort();
        }
        info!("trade-copier system shut down cleanly");
    }
}
