use crate::account::{AccountInfo, SymbolMeta, Tick};
use crate::ids::{MagicTag, PendingOrderKind, Symbol, Ticket};
use crate::order::ClientPendingOrder;
use crate::position::ClientPosition;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A mutating or close-by action submitted to a [`BrokerGateway`], per the
/// request/response table of `spec.md` §4.1.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum SubmitAction {
    PlacePending {
        symbol: Symbol,
        kind: PendingOrderKind,
        volume: Decimal,
        price: Decimal,
        magic: MagicTag,
        sl: Option<Decimal>,
        tp: Option<Decimal>,
    },
    PlaceMarket {
        symbol: Symbol,
        buy: bool,
        volume: Decimal,
        magic: MagicTag,
        closing_position: Option<Ticket>,
    },
    Modify {
        ticket: Ticket,
        price: Decimal,
    },
    Delete {
        ticket: Ticket,
    },
    CloseBy {
        position: Ticket,
        opposite: Ticket,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub enum ReturnCode {
    Done,
    Requote,
    InvalidPrice,
    InvalidStops,
    TradeDisabled,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SubmitResult {
    pub return_code: ReturnCode,
    pub assigned_ticket: Option<Ticket>,
    pub assigned_deal: Option<Ticket>,
    pub message: Option<String>,
}

impl SubmitResult {
    pub fn is_done(&self) -> bool {
        matches!(self.return_code, ReturnCode::Done)
    }

    /// Transient failures the Placement retry loop (`spec.md` §4.6) should
    /// retry with a wider offset rather than give up on immediately.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.return_code,
            ReturnCode::Requote | ReturnCode::InvalidPrice | ReturnCode::InvalidStops
        )
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GatewayError {
    #[error("gateway is read-only, cannot submit actions")]
    ReadOnly,
    #[error("symbol {0} unavailable on this account")]
    SymbolUnavailable(Symbol),
    #[error("ticket {0} not found")]
    TicketNotFound(Ticket),
    #[error("gateway round-trip timed out")]
    Timeout,
    #[error("broker session error: {0}")]
    Session(String),
}

/// The per-account command surface exposed by a Broker Gateway (`spec.md`
/// §4.1). Every implementation must serialize submissions against a single
/// underlying broker session (see `GatewayWorker` in the execution crate).
#[async_trait]
pub trait BrokerGateway: Send + Sync {
    async fn list_positions(
        &self,
        magic_filter: Option<MagicTag>,
    ) -> Result<Vec<ClientPosition>, GatewayError>;

    async fn position_by_ticket(
        &self,
        ticket: Ticket,
    ) -> Result<Option<ClientPosition>, GatewayError>;

    async fn position_by_symbol(
        &self,
        symbol: &Symbol,
        magic_filter: Option<MagicTag>,
    ) -> Result<Option<ClientPosition>, GatewayError>;

    async fn list_orders(&self) -> Result<Vec<ClientPendingOrder>, GatewayError>;

    async fn order_by_ticket(
        &self,
        ticket: Ticket,
    ) -> Result<Option<ClientPendingOrder>, GatewayError>;

    async fn submit(&self, action: SubmitAction) -> Result<SubmitResult, GatewayError>;

    async fn tick(&self, symbol: &Symbol) -> Result<Tick, GatewayError>;

    async fn symbol_check(&self, symbol: &Symbol) -> Result<SymbolMeta, GatewayError>;

    async fn account_info(&self) -> Result<AccountInfo, GatewayError>;
}
