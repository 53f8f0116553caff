use anyhow::Result;
use btcboard::cli::simulate::SimulateArgs;
use btcboard::core::log::init_logging;
use btcboard::core::{GrowthScenario, TimeRange};
use clap::{CommandFactory, Parser, Subcommand};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for btcboard::AppCommand {
    fn from(cmd: Commands) -> btcboard::AppCommand {
        match cmd {
            Commands::Market { range } => btcboard::AppCommand::Market { range },
            Commands::Simulate {
                monthly,
                years,
                scenario,
            } => btcboard::AppCommand::Simulate(SimulateArgs {
                monthly,
                years,
                scenario,
            }),
            Commands::Watch { range } => btcboard::AppCommand::Watch { range },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show current price, sentiment and price history
    Market {
        /// History range: 1D, 7D, 1M or 1Y
        #[arg(short, long)]
        range: Option<TimeRange>,
    },
    /// Project the growth of a monthly investment
    Simulate {
        /// Monthly contribution in USD (10 to 1000)
        #[arg(short, long)]
        monthly: Option<f64>,
        /// Investment horizon in years (1 to 20)
        #[arg(short, long)]
        years: Option<u32>,
        /// Growth scenario: conservative, moderate or aggressive
        #[arg(short, long)]
        scenario: Option<GrowthScenario>,
    },
    /// Keep the market dashboard open and refresh it periodically
    Watch {
        /// History range: 1D, 7D, 1M or 1Y
        #[arg(short, long)]
        range: Option<TimeRange>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => btcboard::cli::setup::setup(),
        Some(cmd) => btcboard::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
