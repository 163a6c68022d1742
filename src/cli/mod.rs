use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod formatters;

#[derive(Parser)]
#[command(name = "value-analysis")]
#[command(
    version,
    about = "Quarterly report fetcher and intrinsic value estimator"
)]
#[command(
    long_about = "Fetch quarterly reports for HK (.HK) and US (.O) listings, normalize them into quarter tables, and estimate fair value with a two-phase growth model."
)]
pub struct Cli {
    /// Path to the TOML config (default: $XDG_CONFIG_HOME/value-analysis/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the configured securities
    Watchlist,

    /// Fetch, normalize and save quarter tables
    Fetch {
        /// Watchlist names or tickers (default: the whole watchlist)
        tickers: Vec<String>,
    },

    /// Show a saved quarter table
    Show {
        /// Watchlist name or ticker
        ticker: String,
    },

    /// Estimate fair values for securities with growth assumptions
    Value {
        /// Current price as NAME=PRICE (repeatable)
        #[arg(short, long = "price", value_name = "NAME=PRICE")]
        prices: Vec<String>,

        /// CSV file with `name,price` rows
        #[arg(long)]
        prices_file: Option<PathBuf>,
    },
}
