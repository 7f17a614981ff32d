use crate::command::{GatewayCommand, GatewayResponse};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use trade_copier_broker::prelude::BrokerSession;
use trade_copier_domain::prelude::*;

/// Whether a [`GatewayWorker`] accepts `submit` commands. The donor-side
/// gateway is constructed `ReadOnly`; the client-side gateway is
/// `ReadWrite` (`spec.md` §4.1: "The donor gateway is symmetric but
/// exposes only the read-only subset").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayMode {
    ReadOnly,
    ReadWrite,
}

/// Default round-trip timeouts (`spec.md` §5: "typically 5 s for reads, 10 s
/// for order submission").
#[derive(Debug, Clone, Copy)]
pub struct GatewayTimeouts {
    pub read: Duration,
    pub write: Duration,
}

impl Default for GatewayTimeouts {
    fn default() -> Self {
        Self {
            read: Duration::from_secs(5),
            write: Duration::from_secs(10),
        }
    }
}

type Envelope = (GatewayCommand, oneshot::Sender<GatewayResponse>);

/// Owns exactly one [`BrokerSession`] and serves one command at a time from
/// its channel in FIFO order — this is what linearizes all mutation against
/// one broker account (`spec.md` §4.1 "Critical contract").
pub struct GatewayWorker<S: ?Sized> {
    session: Arc<S>,
    mode: GatewayMode,
    rx: mpsc::Receiver<Envelope>,
}

impl<S: BrokerSession + ?Sized + 'static> GatewayWorker<S> {
    /// Spawn the worker as its own task and return a cheaply-cloneable
    /// [`GatewayHandle`] plus the task's [`JoinHandle`] for shutdown joining.
    pub fn spawn(
        session: Arc<S>,
        mode: GatewayMode,
        timeouts: GatewayTimeouts,
    ) -> (GatewayHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(256);
        let worker = GatewayWorker { session, mode, rx };
        let join = tokio::spawn(worker.run());
        (GatewayHandle { tx, timeouts }, join)
    }

    async fn run(mut self) {
        while let Some((cmd, reply)) = self.rx.recv().await {
            if matches!(cmd, GatewayCommand::Shutdown) {
                let _ = reply.send(GatewayResponse::ShutdownAck);
                debug!("gateway worker received shutdown, exiting command loop");
                return;
            }
            let response = self.handle(cmd).await;
            // The caller may have dropped its receiver (e.g. timed out already).
            let _ = reply.send(response);
        }
    }

    async fn handle(&self, cmd: GatewayCommand) -> GatewayResponse {
        match cmd {
            GatewayCommand::ListPositions { magic_filter } => {
                match self.session.positions().await {
                    Ok(positions) => GatewayResponse::Positions(filter_by_magic(
                        positions,
                        magic_filter,
                    )),
                    Err(e) => GatewayResponse::Err(GatewayError::Session(e.to_string())),
                }
            }
            GatewayCommand::PositionByTicket { ticket } => match self.session.positions().await {
                Ok(positions) => {
                    GatewayResponse::Position(positions.into_iter().find(|p| p.ticket == ticket))
                }
                Err(e) => GatewayResponse::Err(GatewayError::Session(e.to_string())),
            },
            GatewayCommand::PositionBySymbol {
                symbol,
                magic_filter,
            } => match self.session.positions().await {
                Ok(positions) => GatewayResponse::Position(
                    filter_by_magic(positions, magic_filter)
                        .into_iter()
                        .find(|p| p.symbol == symbol),
                ),
                Err(e) => GatewayResponse::Err(GatewayError::Session(e.to_string())),
            },
            GatewayCommand::ListOrders => match self.session.orders().await {
                Ok(orders) => GatewayResponse::Orders(orders),
                Err(e) => GatewayResponse::Err(GatewayError::Session(e.to_string())),
            },
            GatewayCommand::OrderByTicket { ticket } => match self.session.orders().await {
                Ok(orders) => {
                    GatewayResponse::Order(orders.into_iter().find(|o| o.ticket == ticket))
                }
                Err(e) => GatewayResponse::Err(GatewayError::Session(e.to_string())),
            },
            GatewayCommand::Submit { action } => {
                if self.mode == GatewayMode::ReadOnly {
                    return GatewayResponse::Err(GatewayError::ReadOnly);
                }
                match self.session.submit(action).await {
                    Ok(result) => GatewayResponse::Submitted(result),
                    Err(e) => GatewayResponse::Err(GatewayError::Session(e.to_string())),
                }
            }
            GatewayCommand::Tick { symbol } => match self.session.tick(&symbol).await {
                Ok(tick) => GatewayResponse::Tick(tick),
                Err(_) => GatewayResponse::Err(GatewayError::SymbolUnavailable(symbol)),
            },
            GatewayCommand::SymbolCheck { symbol } => {
                // spec.md §4.1: select -> metadata -> tick; failure at any step
                // is "unavailable".
                match self.session.symbol_info(&symbol).await {
                    Ok(meta) => match self.session.tick(&symbol).await {
                        Ok(_) => GatewayResponse::SymbolMeta(meta),
                        Err(_) => GatewayResponse::Err(GatewayError::SymbolUnavailable(symbol)),
                    },
                    Err(_) => GatewayResponse::Err(GatewayError::SymbolUnavailable(symbol)),
                }
            }
            GatewayCommand::AccountInfo => match self.session.account_info().await {
                Ok(info) => GatewayResponse::Account(info),
                Err(e) => GatewayResponse::Err(GatewayError::Session(e.to_string())),
            },
            GatewayCommand::Shutdown => unreachable!("handled in run()"),
        }
    }
}

fn filter_by_magic(
    positions: Vec<ClientPosition>,
    magic_filter: Option<MagicTag>,
) -> Vec<ClientPosition> {
    match magic_filter {
        None => positions,
        Some(magic) => positions
            .into_iter()
            .filter(|p| p.magic_tag == Some(magic))
            .collect(),
    }
}

/// Cheaply-cloneable client handle to a running [`GatewayWorker`]. This is
/// the concrete [`BrokerGateway`] the reconciliation loop talks to.
#[derive(Clone)]
pub struct GatewayHandle {
    tx: mpsc::Sender<Envelope>,
    timeouts: GatewayTimeouts,
}

impl GatewayHandle {
    async fn call(&self, cmd: GatewayCommand, timeout: Duration) -> Result<GatewayResponse, GatewayError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send((cmd, reply_tx))
            .await
            .map_err(|_| GatewayError::Session("gateway worker has shut down".into()))?;

        match tokio::time::timeout(timeout, reply_rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(GatewayError::Session("gateway worker dropped reply".into())),
            Err(_) => {
                warn!("gateway round-trip timed out");
                Err(GatewayError::Timeout)
            }
        }
    }

    /// Sends the shutdown command and waits (briefly) for the worker to
    /// acknowledge, per `spec.md` §5's bounded-timeout join.
    pub async fn shutdown(&self) {
        let _ = self
            .call(GatewayCommand::Shutdown, Duration::from_secs(2))
            .await;
    }
}

#[async_trait]
impl BrokerGateway for GatewayHandle {
    async fn list_positions(
        &self,
        magic_filter: Option<MagicTag>,
    ) -> Result<Vec<ClientPosition>, GatewayError> {
        match self
            .call(GatewayCommand::ListPositions { magic_filter }, self.timeouts.read)
            .await?
        {
            GatewayResponse::Positions(p) => Ok(p),
            GatewayResponse::Err(e) => Err(e),
            _ => unreachable!("worker returned mismatched response variant"),
        }
    }

    async fn position_by_ticket(
        &self,
        ticket: Ticket,
    ) -> Result<Option<ClientPosition>, GatewayError> {
        match self
            .call(GatewayCommand::PositionByTicket { ticket }, self.timeouts.read)
            .await?
        {
            GatewayResponse::Position(p) => Ok(p),
            GatewayResponse::Err(e) => Err(e),
            _ => unreachable!("worker returned mismatched response variant"),
        }
    }

    async fn position_by_symbol(
        &self,
        symbol: &Symbol,
        magic_filter: Option<MagicTag>,
    ) -> Result<Option<ClientPosition>, GatewayError> {
        match self
            .call(
                GatewayCommand::PositionBySymbol {
                    symbol: symbol.clone(),
                    magic_filter,
                },
                self.timeouts.read,
            )
            .await?
        {
            GatewayResponse::Position(p) => Ok(p),
            GatewayResponse::Err(e) => Err(e),
            _ => unreachable!("worker returned mismatched response variant"),
        }
    }

    async fn list_orders(&self) -> Result<Vec<ClientPendingOrder>, GatewayError> {
        match self
            .call(GatewayCommand::ListOrders, self.timeouts.read)
            .await?
        {
            GatewayResponse::Orders(o) => Ok(o),
            GatewayResponse::Err(e) => Err(e),
            _ => unreachable!("worker returned mismatched response variant"),
        }
    }

    async fn order_by_ticket(
        &self,
        ticket: Ticket,
    ) -> Result<Option<ClientPendingOrder>, GatewayError> {
        match self
            .call(GatewayCommand::OrderByTicket { ticket }, self.timeouts.read)
            .await?
        {
            GatewayResponse::Order(o) => Ok(o),
            GatewayResponse::Err(e) => Err(e),
            _ => unreachable!("worker returned mismatched response variant"),
        }
    }

    async fn submit(&self, action: SubmitAction) -> Result<SubmitResult, GatewayError> {
        match self
            .call(GatewayCommand::Submit { action }, self.timeouts.write)
            .await?
        {
            GatewayResponse::Submitted(r) => Ok(r),
            GatewayResponse::Err(e) => Err(e),
            _ => unreachable!("worker returned mismatched response variant"),
        }
    }

    async fn tick(&self, symbol: &Symbol) -> Result<Tick, GatewayError> {
        match self
            .call(
                GatewayCommand::Tick {
                    symbol: symbol.clone(),
                },
                self.timeouts.read,
            )
            .await?
        {
            GatewayResponse::Tick(t) => Ok(t),
            GatewayResponse::Err(e) => Err(e),
            _ => unreachable!("worker returned mismatched response variant"),
        }
    }

    async fn symbol_check(&self, symbol: &Symbol) -> Result<SymbolMeta, GatewayError> {
        match self
            .call(
                GatewayCommand::SymbolCheck {
                    symbol: symbol.clone(),
                },
                self.timeouts.read,
            )
            .await?
        {
            GatewayResponse::SymbolMeta(m) => Ok(m),
            GatewayResponse::Err(e) => Err(e),
            _ => unreachable!("worker returned mismatched response variant"),
        }
    }

    async fn account_info(&self) -> Result<AccountInfo, GatewayError> {
        match self
            .call(GatewayCommand::AccountInfo, self.timeouts.read)
            .await?
        {
            GatewayResponse::Account(a) => Ok(a),
            GatewayResponse::Err(e) => Err(e),
            _ => unreachable!("worker returned mismatched response variant"),
        }
    }
}
