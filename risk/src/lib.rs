#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! Pure, broker-I/O-free sizing and pricing math for the trade-copier
//! reconciliation engine: the Lot Calculator and Price Calculator of
//! `spec.md` §4.6.

pub mod lot;
pub mod price;

pub mod prelude {
    pub use crate::lot::{calculate_lot, LotConfig, LotMode};
    pub use crate::price::{dominance, limit_price, round_to_digits};
}
