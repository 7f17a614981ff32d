use crate::error::BrokerSessionError;
use async_trait::async_trait;
use trade_copier_domain::prelude::*;

/// The raw operation surface the trading platform's broker library exposes
/// (`spec.md` §6: "Broker gateway interface"): initialize a session against
/// an installed terminal, fetch positions/orders/account info, submit
/// orders, and read ticks and symbol metadata.
///
/// A [`BrokerSession`] has no notion of the engine's magic-tag filtering or
/// FIFO command serialization; those live one layer up in the execution
/// crate's `GatewayWorker`, which owns exactly one `BrokerSession` per
/// account and is the only thing allowed to call it.
#[async_trait]
pub trait BrokerSession: Send + Sync {
    async fn connect(&self) -> Result<(), BrokerSessionError>;

    async fn disconnect(&self) -> Result<(), BrokerSessionError>;

    async fn positions(&self) -> Result<Vec<ClientPosition>, BrokerSessionError>;

    async fn orders(&self) -> Result<Vec<ClientPendingOrder>, BrokerSessionError>;

    async fn account_info(&self) -> Result<AccountInfo, BrokerSessionError>;

    async fn submit(&self, action: SubmitAction) -> Result<SubmitResult, BrokerSessionError>;

    async fn tick(&self, symbol: &Symbol) -> Result<Tick, BrokerSessionError>;

    async fn symbol_info(&self, symbol: &Symbol) -> Result<SymbolMeta, BrokerSessionError>;
}
