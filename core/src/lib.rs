//! Wires the donor, execution, risk, trader and strategies crates into one
//! reconciliation process: load configuration, build gateways and donor
//! sources, restore persisted correspondence state, then drive the cycle
//! loop until shutdown (`spec.md` §2).

pub mod engine;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod system;

pub mod prelude {
    pub use crate::engine::{process_cycle, restore_links, CycleOutcome};
    pub use crate::error::{FatalError, ReconcileError};
    pub use crate::logging::{init_json_logging, init_logging};
    pub use crate::monitor::{ClosedDonor, PositionMonitor, VolumeChange};
    pub use crate::system::config::{AppConfig, ClientAccount, ConfigError};
    pub use crate::system::{System, SystemArgs};
}
