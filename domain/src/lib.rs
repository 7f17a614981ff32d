#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_extern_crates,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! Core value types and the two collaborator trait boundaries
//! ([`BrokerGateway`](gateway::BrokerGateway), [`DonorSource`](donor_source::DonorSource))
//! shared by every other crate in the trade-copier workspace.
//!
//! This crate performs no I/O: it defines the vocabulary the engine,
//! planner, and strategies crates compute over, and the async traits that
//! the execution/donors/broker crates implement.

pub mod account;
pub mod donor_source;
pub mod gateway;
pub mod ids;
pub mod order;
pub mod position;

pub mod prelude {
    pub use crate::account::{AccountInfo, SymbolMeta, Tick};
    pub use crate::donor_source::{DonorSnapshot, DonorSource, DonorSourceError};
    pub use crate::gateway::{BrokerGateway, GatewayError, ReturnCode, SubmitAction, SubmitResult};
    pub use crate::ids::{
        Direction, DonorKey, MagicTag, PendingOrderKind, RawPositionOrOrderKind, SourceId, Symbol,
        Ticket,
    };
    pub use crate::order::{ClientPendingOrder, DonorPendingOrder};
    pub use crate::position::{ClientPosition, DonorPosition};
}
