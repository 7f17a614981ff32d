//! `app_config.json`'s shape (`spec.md` §6): client account, lot sizing,
//! order behaviour, and the reconciliation cadence.

use serde::{Deserialize, Serialize};
use trade_copier_risk::lot::LotConfig;
use trade_copier_trader::config::{CopyStyle, OrderConfig};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientAccount {
    pub account_number: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub client_account: ClientAccount,
    pub lot_config: LotConfig,
    #[serde(default)]
    pub order_config: OrderConfig,
    #[serde(default)]
    pub copy_style: CopyStyle,
    #[serde(default = "AppConfig::default_check_interval_secs")]
    pub check_interval_secs: u64,
    /// `copy donor magic` is a CLI-only switch in the original implementation,
    /// not an `app_config.json` field; exposed here too so a config file can
    /// set it for non-interactive deployments.
    #[serde(default)]
    pub copy_donor_magic: bool,
    /// Run the initial-copy sweep for pre-existing donor positions on
    /// startup, after matcher-based restoration (`spec.md` §9 Open Question).
    #[serde(default)]
    pub copy_existing_positions: bool,
}

impl AppConfig {
    fn default_check_interval_secs() -> u64 {
        1
    }

    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error parsing config: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_app_config() {
        let raw = r#"{
            "client_account": {"account_number": 1000},
            "lot_config": {"mode": "fixed", "value": "0.01", "min_lot": "0.01", "max_lot": "100"}
        }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.check_interval_secs, 1);
        assert_eq!(config.copy_style, CopyStyle::ByLimits);
        assert!(!config.copy_donor_magic);
    }
}
