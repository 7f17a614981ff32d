mod cli;

use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;
use tracing::error;
use trade_copier_core::prelude::*;
use trade_copier_donors::config::DonorsConfig;

use cli::Cli;

#[derive(Debug, Error)]
enum StartupError {
    #[error("loading app config: {0}")]
    AppConfig(#[from] trade_copier_core::system::config::ConfigError),
    #[error("reading donors config {path}: {source}")]
    DonorsConfigIo {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing donors config {path}: {source}")]
    DonorsConfigJson {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Fatal(#[from] FatalError),
    #[error(transparent)]
    Run(#[from] ReconcileError),
}

fn load_donors_config(path: &std::path::Path) -> Result<DonorsConfig, StartupError> {
    let bytes = std::fs::read(path).map_err(|source| StartupError::DonorsConfigIo {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| StartupError::DonorsConfigJson {
        path: path.to_path_buf(),
        source,
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.json_logs {
        init_json_logging();
    } else {
        init_logging();
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(%error, "trade-copier exiting");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), StartupError> {
    let mut app_config = AppConfig::load(&cli.app_config)?;
    if let Some(secs) = cli.check_interval {
        app_config.check_interval_secs = secs;
    }
    if cli.optimize_to_market {
        app_config.order_config.optimize_to_market = true;
    }
    if cli.copy_donor_magic {
        app_config.copy_donor_magic = true;
    }

    let donors_config = load_donors_config(&cli.donors_config)?;

    let system = System::build(SystemArgs {
        app_config,
        donors_config,
        state_path: cli.state_file,
    })
    .await?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = shutdown_tx.send(true);
    });

    system.run(shutdown_rx).await?;
    Ok(())
}
