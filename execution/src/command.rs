use trade_copier_domain::prelude::*;

/// Internal request sent to a [`crate::gateway::GatewayWorker`] over its
/// command channel. Mirrors the request/response table of `spec.md` §4.1.
#[derive(Debug, Clone)]
pub enum GatewayCommand {
    ListPositions {
        magic_filter: Option<MagicTag>,
    },
    PositionByTicket {
        ticket: Ticket,
    },
    PositionBySymbol {
        symbol: Symbol,
        magic_filter: Option<MagicTag>,
    },
    ListOrders,
    OrderByTicket {
        ticket: Ticket,
    },
    Submit {
        action: SubmitAction,
    },
    Tick {
        symbol: Symbol,
    },
    SymbolCheck {
        symbol: Symbol,
    },
    AccountInfo,
    Shutdown,
}

#[derive(Debug, Clone)]
pub enum GatewayResponse {
    Positions(Vec<ClientPosition>),
    Position(Option<ClientPosition>),
    Orders(Vec<ClientPendingOrder>),
    Order(Option<ClientPendingOrder>),
    Submitted(SubmitResult),
    Tick(Tick),
    SymbolMeta(SymbolMeta),
    Account(AccountInfo),
    Err(GatewayError),
    ShutdownAck,
}
