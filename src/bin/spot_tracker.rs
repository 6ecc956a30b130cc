//! Command-line front end for the spot price tracker

use clap::{Args, Parser, Subcommand, ValueHint};
use spot_price_tracker::{logging, Metal, SpotPriceTracker, TrackerConfig, UpdateOutcome};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about = "Precious-metal spot price tracker")]
struct Cli {
    /// Path to environment file
    #[arg(
        long,
        value_hint = ValueHint::FilePath,
        default_value = ".env",
        env = "SPOT_ENV_FILE",
        global = true
    )]
    env_file: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch prices if the cache is stale
    Refresh {
        /// Fetch even when cached prices are fresh
        #[arg(long)]
        force: bool,
    },

    /// Print current prices
    Show,

    /// Print price history
    History(HistoryArgs),

    /// Enter a price by hand
    Set {
        metal: Metal,
        price: f64,
    },

    /// Reset a metal to its default price
    Reset { metal: Metal },

    /// Keep polling until interrupted
    Watch,

    /// Print health and provider metrics as JSON
    Status,
}

#[derive(Args)]
struct HistoryArgs {
    /// Only show this metal
    #[arg(long)]
    metal: Option<Metal>,

    /// Number of most recent entries to show
    #[arg(long, default_value_t = 20)]
    limit: usize,

    /// Delete the history instead of printing it
    #[arg(long, conflicts_with_all = ["metal"])]
    clear: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    dotenvy::from_path(&cli.env_file).ok();
    logging::init();

    let config = TrackerConfig::from_env()?;
    let tracker = Arc::new(SpotPriceTracker::from_config(&config).await?);

    match cli.cmd {
        Command::Refresh { force } => {
            match tracker.update_prices(force).await {
                UpdateOutcome::Skipped => println!("Prices are fresh; use --force to refetch"),
                UpdateOutcome::Superseded => println!("Refresh superseded by a newer one"),
                UpdateOutcome::Updated { updated, failed } => {
                    println!("Updated {} metals", updated.len());
                    for (metal, error) in failed {
                        eprintln!("  {}: {}", metal, error);
                    }
                }
                UpdateOutcome::Failed { errors } => {
                    eprintln!("All fetches failed; keeping cached prices");
                    for (metal, error) in errors {
                        eprintln!("  {}: {}", metal, error);
                    }
                }
            }
            print_prices(&tracker).await;
        }
        Command::Show => print_prices(&tracker).await,
        Command::History(args) => {
            if args.clear {
                tracker.clear_history().await?;
                println!("History cleared");
                return Ok(());
            }
            let entries = match args.metal {
                Some(metal) => tracker.history_for(metal).await,
                None => tracker.history().await,
            };
            let skip = entries.len().saturating_sub(args.limit);
            for quote in entries.iter().skip(skip) {
                println!(
                    "{}  {:<10} {:>12.2}  {}",
                    quote.observed_at.format("%Y-%m-%d %H:%M:%S"),
                    quote.metal,
                    quote.price,
                    quote.source
                );
            }
        }
        Command::Set { metal, price } => {
            let quote = tracker.set_manual_price(metal, price).await?;
            println!("{} set to ${:.2}", quote.metal, quote.price);
        }
        Command::Reset { metal } => {
            let quote = tracker.reset_price(metal).await?;
            println!("{} reset to ${:.2}", quote.metal, quote.price);
        }
        Command::Watch => {
            let mut events = tracker.subscribe();
            let handle = tracker.start_background_task();
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    event = events.recv() => match event {
                        Ok(event) => println!("{}", event),
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Dropped price events");
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            handle.abort();
        }
        Command::Status => {
            let report = serde_json::json!({
                "health": tracker.health_check().await,
                "metrics": tracker.provider_metrics().await,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

async fn print_prices(tracker: &SpotPriceTracker) {
    let prices = tracker.current_prices().await;
    if prices.is_empty() {
        println!("No prices yet");
        return;
    }
    for (metal, quote) in prices.iter() {
        println!(
            "{:<10} ${:>10.2}  {} ({})",
            metal,
            quote.price,
            quote.observed_at.format("%Y-%m-%d %H:%M:%S UTC"),
            quote.source
        );
    }
    if let Some(last) = tracker.last_update().await {
        println!("last refresh: {}", last.format("%Y-%m-%d %H:%M:%S UTC"));
    }
}
