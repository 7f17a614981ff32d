//! Wiring a complete trade-copier process: load config, build gateways and
//! donor sources, restore persisted state, then drive the reconciliation
//! loop until shutdown (`spec.md` §2, §4.4/4.5, §5).

pub mod builder;
pub mod config;

pub use builder::{System, SystemArgs};
