#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! Donor sources and the Donor Aggregator (`spec.md` §4.2, §9): an
//! in-process [`BrokerSession`](trade_copier_broker::session::BrokerSession)
//! reader and two length-prefixed JSON socket readers (MT4/MT5, identical
//! wire format), fanned out through [`aggregator::DonorAggregator`].

pub mod aggregator;
pub mod config;
pub mod error;
pub mod in_process;
pub mod socket;
pub mod source;
pub mod wire;

pub mod prelude {
    pub use crate::aggregator::DonorAggregator;
    pub use crate::config::{DonorEntry, DonorKind, DonorsConfig, DonorsConfigError};
    pub use crate::error::{BrokerSessionError, DonorSourceError};
    pub use crate::in_process::InProcessDonorSource;
    pub use crate::socket::{SocketDonorSource, SocketKind};
    pub use crate::source::DonorSourceImpl;
    pub use crate::wire::{decode_frame, DonorFrame, PositionOrOrder, RawAccountInfo, RawItem};
}
