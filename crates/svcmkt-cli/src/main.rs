mod locate;
mod search;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use locate::StrategyArg;
use search::{SearchArgs, SearchTarget};

#[derive(Debug, Parser)]
#[command(name = "svcmkt")]
#[command(about = "Location tools for the service marketplace")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve the current location, trying strategies in order
    Locate {
        /// Strategy to try; repeat to build a chain (defaults to device, then ip)
        #[arg(long = "strategy", value_enum)]
        strategies: Vec<StrategyArg>,
        /// Address used by the `address` strategy
        #[arg(long)]
        address: Option<String>,
    },
    /// Geocode a free-text address
    Geocode { address: String },
    /// Look up the address at a position
    Reverse {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },
    /// Filter and sort the local catalog
    Search {
        #[arg(value_enum)]
        target: SearchTarget,
        #[command(flatten)]
        args: SearchArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = svcmkt_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::debug!(env = %config.env, command = ?cli.command, "starting");

    match cli.command {
        Commands::Locate {
            strategies,
            address,
        } => locate::run_locate(&config, &strategies, address.as_deref()).await,
        Commands::Geocode { address } => locate::run_geocode(&config, &address).await,
        Commands::Reverse { lat, lon } => locate::run_reverse(&config, lat, lon).await,
        Commands::Search { target, args } => search::run_search(&config, target, &args).await,
    }
}
