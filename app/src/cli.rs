use std::path::PathBuf;

use clap::Parser;

/// Command-line overrides for `app_config.json` (`spec.md` §6). Every flag
/// is optional; anything left unset keeps the value loaded from disk.
#[derive(Debug, Parser)]
#[command(author, version, about = "Mirrors donor account positions onto a client account")]
pub struct Cli {
    /// Path to app_config.json.
    #[arg(long, env = "TRADE_COPIER_APP_CONFIG", default_value = "app_config.json")]
    pub app_config: PathBuf,

    /// Path to donors_config.json.
    #[arg(long, env = "TRADE_COPIER_DONORS_CONFIG", default_value = "donors_config.json")]
    pub donors_config: PathBuf,

    /// Where the Correspondence Map is persisted between restarts.
    #[arg(long, env = "TRADE_COPIER_STATE_FILE", default_value = "sync_state.json")]
    pub state_file: PathBuf,

    /// Overrides `app_config.json`'s `check_interval_secs`.
    #[arg(long)]
    pub check_interval: Option<u64>,

    /// Walk pending orders toward the live market instead of their original
    /// price (overrides `order_config.optimize_to_market`).
    #[arg(long)]
    pub optimize_to_market: bool,

    /// Tag client copies with the donor's own magic number instead of
    /// `order_config.magic` (overrides `copy_donor_magic`).
    #[arg(long)]
    pub copy_donor_magic: bool,

    /// Emit structured JSON logs instead of human-readable text.
    #[arg(long)]
    pub json_logs: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_to_the_current_directory() {
        let cli = Cli::parse_from(["trade-copier"]);
        assert_eq!(cli.app_config, std::path::PathBuf::from("app_config.json"));
        assert_eq!(cli.donors_config, std::path::PathBuf::from("donors_config.json"));
        assert!(!cli.json_logs);
    }

    #[test]
    fn overrides_parse_from_flags() {
        let cli = Cli::parse_from([
            "trade-copier",
            "--check-interval",
            "5",
            "--optimize-to-market",
            "--copy-donor-magic",
        ]);
        assert_eq!(cli.check_interval, Some(5));
        assert!(cli.optimize_to_market);
        assert!(cli.copy_donor_magic);
    }
}
