#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! Pending-Order Walker (§4.7), Close-By Protocol (§4.8), Pending-Order
//! Mirroring (§4.9) and the restart-time Matcher (§4.10).

pub mod close_by;
pub mod error;
pub mod matcher;
pub mod pending_mirror;
pub mod walker;

pub mod prelude {
    pub use crate::close_by::check_close_by;
    pub use crate::error::StrategyError;
    pub use crate::matcher::{run_matcher, score_candidate, ACCEPT_THRESHOLD};
    pub use crate::pending_mirror::mirror_pending_orders;
    pub use crate::walker::walk_orders;
}
