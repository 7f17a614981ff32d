#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! [`BrokerSession`] trait boundary and its in-memory mock implementation,
//! plus the environment-driven factory that selects between mock and a
//! real terminal backend (`spec.md` §6, "Broker gateway interface").

pub mod error;
pub mod factory;
pub mod mock;
pub mod session;

pub mod prelude {
    pub use crate::error::BrokerSessionError;
    pub use crate::factory::{build_session_from_env, BackendKind};
    pub use crate::mock::MockBrokerSession;
    pub use crate::session::BrokerSession;
}
