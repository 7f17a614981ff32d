use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trade_copier_domain::ids::MagicTag;

/// Open/close technique selected by `app_config.json`'s `copy_style`
/// (`spec.md` §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyStyle {
    ByLimits,
    ByMarket,
}

impl Default for CopyStyle {
    fn default() -> Self {
        CopyStyle::ByLimits
    }
}

/// `order_config` section of `app_config.json`, field names and defaults
/// matching the original implementation's configuration loader.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OrderConfig {
    #[serde(default = "OrderConfig::default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "OrderConfig::default_magic")]
    pub magic: MagicTag,
    #[serde(default)]
    pub optimize_to_market: bool,
    #[serde(default = "OrderConfig::default_limit_offset_points")]
    pub limit_offset_points: Decimal,
    #[serde(default)]
    pub copy_sl_tp: bool,
    #[serde(default)]
    pub copy_pending_orders: bool,
}

impl OrderConfig {
    fn default_max_retries() -> u32 {
        10
    }

    fn default_magic() -> MagicTag {
        MagicTag(234_000)
    }

    fn default_limit_offset_points() -> Decimal {
        Decimal::new(2, 0)
    }
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            max_retries: Self::default_max_retries(),
            magic: Self::default_magic(),
            optimize_to_market: false,
            limit_offset_points: Self::default_limit_offset_points(),
            copy_sl_tp: false,
            copy_pending_orders: false,
        }
    }
}
