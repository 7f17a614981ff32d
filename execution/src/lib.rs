#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! The client-account side of the trade-copier: a [`gateway::GatewayWorker`]
//! serializing broker commands against one [`trade_copier_broker`] session,
//! the [`correspondence::CorrespondenceMap`] (`spec.md` §3), and the state
//! persistor (`spec.md` §4.10, §5).

pub mod balance;
pub mod command;
pub mod correspondence;
pub mod gateway;
pub mod persist;

pub mod prelude {
    pub use crate::balance::{AssetBalance, Balance};
    pub use crate::command::{GatewayCommand, GatewayResponse};
    pub use crate::correspondence::{
        CloseOrderInfo, CorrespondenceMap, OpenOrderInfo, PositionLinkSnapshot,
    };
    pub use crate::gateway::{GatewayHandle, GatewayMode, GatewayTimeouts, GatewayWorker};
    pub use crate::persist::{load_state, save_state, PersistError, PersistedState};
}
