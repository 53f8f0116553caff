pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::simulate::SimulateArgs;
use crate::core::TimeRange;
use crate::core::config::AppConfig;
use anyhow::Result;
use tracing::{debug, info};

pub enum AppCommand {
    Market { range: Option<TimeRange> },
    Simulate(SimulateArgs),
    Watch { range: Option<TimeRange> },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("btcboard starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Market { range } => {
            let poller = providers::build_poller(&config)?;
            cli::market::run(&poller, range.unwrap_or(config.default_range)).await
        }
        AppCommand::Simulate(args) => cli::simulate::run(&args, &config.simulator),
        AppCommand::Watch { range } => {
            let poller = providers::build_poller(&config)?;
            cli::watch::run(
                poller,
                range.unwrap_or(config.default_range),
                config.polling.interval(),
            )
            .await
        }
    }
}
