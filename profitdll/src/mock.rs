use crate::error::BrokerSessionError;
use crate::session::BrokerSession;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use trade_copier_domain::prelude::*;

/// Deterministic in-memory [`BrokerSession`] used by default when no real
/// terminal is configured (see [`crate::factory`]), and by every test in
/// this workspace that needs a broker to submit against.
///
/// Positions/orders/ticks/symbol metadata are seeded by the test or by the
/// operator (for manual smoke-testing); `submit` mutates this in-memory
/// state the same way a real broker would mutate its own book.
#[derive(Debug)]
pub struct MockBrokerSession {
    connected: AtomicBool,
    next_ticket: AtomicU64,
    positions: RwLock<Vec<ClientPosition>>,
    orders: RwLock<Vec<ClientPendingOrder>>,
    ticks: RwLock<HashMap<Symbol, Tick>>,
    symbols: RwLock<HashMap<Symbol, SymbolMeta>>,
    account: RwLock<AccountInfo>,
}

impl Default for MockBrokerSession {
    fn default() -> Self {
        Self {
            connected: AtomicBool::new(false),
            next_ticket: AtomicU64::new(1),
            positions: RwLock::new(Vec::new()),
            orders: RwLock::new(Vec::new()),
            ticks: RwLock::new(HashMap::new()),
            symbols: RwLock::new(HashMap::new()),
            account: RwLock::new(AccountInfo {
                login: 0,
                balance: Default::default(),
                equity: Default::default(),
                free_margin: Default::default(),
                currency: "USD".into(),
                server: "mock".into(),
            }),
        }
    }
}

impl MockBrokerSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_ticket(&self) -> Ticket {
        Ticket(self.next_ticket.fetch_add(1, Ordering::SeqCst))
    }

    pub fn seed_tick(&self, symbol: Symbol, tick: Tick) {
        self.ticks.write().insert(symbol, tick);
    }

    pub fn seed_symbol(&self, symbol: Symbol, meta: SymbolMeta) {
        self.symbols.write().insert(symbol, meta);
    }

    pub fn seed_account(&self, account: AccountInfo) {
        *self.account.write() = account;
    }

    pub fn push_position(&self, position: ClientPosition) {
        self.positions.write().push(position);
    }

    pub fn push_order(&self, order: ClientPendingOrder) {
        self.orders.write().push(order);
    }
}

#[async_trait]
impl BrokerSession for MockBrokerSession {
    async fn connect(&self) -> Result<(), BrokerSessionError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), BrokerSessionError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn positions(&self) -> Result<Vec<ClientPosition>, BrokerSessionError> {
        Ok(self.positions.read().clone())
    }

    async fn orders(&self) -> Result<Vec<ClientPendingOrder>, BrokerSessionError> {
        Ok(self.orders.read().clone())
    }

    async fn account_info(&self) -> Result<AccountInfo, BrokerSessionError> {
        Ok(self.account.read().clone())
    }

    async fn submit(&self, action: SubmitAction) -> Result<SubmitResult, BrokerSessionError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(BrokerSessionError::NotConnected);
        }

        let result = match action {
            SubmitAction::PlacePending {
                symbol,
                kind,
                volume,
                price,
                sl,
                tp,
                ..
            } => {
                let ticket = self.next_ticket();
                self.orders.write().push(ClientPendingOrder {
                    ticket,
                    symbol,
                    order_kind: kind,
                    volume,
                    price,
                    time_setup: Utc::now(),
                    sl,
                    tp,
                });
                done(ticket)
            }
            SubmitAction::PlaceMarket {
                symbol,
                buy,
                volume,
                magic,
                closing_position,
            } => {
                if let Some(closing) = closing_position {
                    self.positions.write().retain(|p| p.ticket != closing);
                }
                let ticket = self.next_ticket();
                let reference = self
                    .ticks
                    .read()
                    .get(&symbol)
                    .map(|t| if buy { t.ask } else { t.bid })
                    .unwrap_or_default();
                self.positions.write().push(ClientPosition {
                    ticket,
                    symbol,
                    direction: if buy {
                        Direction::Buy
                    } else {
                        Direction::Sell
                    },
                    volume,
                    price_open: reference,
                    price_current: reference,
                    profit: Default::default(),
                    time_opened: Utc::now(),
                    magic_tag: Some(magic),
                    comment: None,
                    sl: None,
                    tp: None,
                });
                done(ticket)
            }
            SubmitAction::Modify { ticket, price } => {
                let mut orders = self.orders.write();
                match orders.iter_mut().find(|o| o.ticket == ticket) {
                    Some(order) => {
                        order.price = price;
                        done(ticket)
                    }
                    None => unknown(),
                }
            }
            SubmitAction::Delete { ticket } => {
                let mut orders = self.orders.write();
                let before = orders.len();
                orders.retain(|o| o.ticket != ticket);
                if orders.len() < before {
                    done(ticket)
                } else {
                    unknown()
                }
            }
            SubmitAction::CloseBy { position, opposite } => {
                let mut positions = self.positions.write();
                let has_both = positions.iter().any(|p| p.ticket == position)
                    && positions.iter().any(|p| p.ticket == opposite);
                if has_both {
                    positions.retain(|p| p.ticket != position && p.ticket != opposite);
                    done(position)
                } else {
                    unknown()
                }
            }
        };

        Ok(result)
    }

    async fn tick(&self, symbol: &Symbol) -> Result<Tick, BrokerSessionError> {
        self.ticks
            .read()
            .get(symbol)
            .copied()
            .ok_or_else(|| BrokerSessionError::SymbolUnavailable(symbol.0.to_string()))
    }

    async fn symbol_info(&self, symbol: &Symbol) -> Result<SymbolMeta, BrokerSessionError> {
        self.symbols
            .read()
            .get(symbol)
            .copied()
            .ok_or_else(|| BrokerSessionError::SymbolUnavailable(symbol.0.to_string()))
    }
}

fn done(ticket: Ticket) -> SubmitResult {
    SubmitResult {
        return_code: ReturnCode::Done,
        assigned_ticket: Some(ticket),
        assigned_deal: None,
        message: None,
    }
}

fn unknown() -> SubmitResult {
    SubmitResult {
        return_code: ReturnCode::Unknown,
        assigned_ticket: None,
        assigned_deal: None,
        message: None,
    }
}
