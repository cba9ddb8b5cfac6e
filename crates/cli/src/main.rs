//! Command Line Interface for the limit order book.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use limit_order_engine::config::MarketConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

mod demo;
mod price_path;
mod simulate;

#[derive(Parser)]
#[command(name = "limit-order")]
#[command(about = "Resting limit orders on a concentrated-liquidity pool", long_about = None)]
struct Cli {
    /// Market configuration as JSON. Falls back to LIMIT_ORDER_CONFIG.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Place a sell above the price, sweep it with a swap and print the events
    Demo,
    /// Drive random participants along a simulated price path
    Simulate {
        /// Number of price steps
        #[arg(short, long, default_value_t = 200)]
        steps: usize,

        /// Number of order-placing participants
        #[arg(short, long, default_value_t = 8)]
        participants: u64,

        /// Seed for the price path and the participants
        #[arg(long, default_value_t = 7)]
        seed: u64,

        /// Annualized volatility of the price path
        #[arg(long, default_value_t = 0.8)]
        volatility: f64,

        /// Probability that a participant acts on a given step
        #[arg(long, default_value_t = 0.3)]
        activity: f64,
    },
}

fn load_config(path: Option<&Path>) -> Result<MarketConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match env::var("LIMIT_ORDER_CONFIG") {
            Ok(path) => PathBuf::from(path),
            Err(_) => return Ok(MarketConfig::default()),
        },
    };
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Demo => {
            let events = demo::run(config)?;
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
        Commands::Simulate {
            steps,
            participants,
            seed,
            volatility,
            activity,
        } => {
            let params = simulate::SimulationParams {
                steps: *steps,
                participants: *participants,
                seed: *seed,
                volatility: *volatility,
                activity: *activity,
            };
            let summary = simulate::run(config, &params)?;

            println!("📈 Simulation finished after {} steps", summary.steps);
            println!("{:<12} | {:>8}", "Metric", "Count");
            println!("{}", "-".repeat(23));
            for (label, value) in [
                ("swaps", summary.swaps),
                ("placed", summary.placed),
                ("canceled", summary.canceled),
                ("filled", summary.filled),
                ("taken", summary.taken),
                ("rejected", summary.rejected),
            ] {
                println!("{label:<12} | {value:>8}");
            }
            println!("Final tick: {}", summary.final_tick);
            println!("✅ Hook custody fully accounted for (dust {:?})", summary.dust);
        }
    }

    Ok(())
}
