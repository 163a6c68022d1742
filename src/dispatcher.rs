//! Command dispatcher that routes parsed clap commands to their handlers.

use anyhow::{anyhow, bail, Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use crate::cli::{formatters, Commands};
use value_analysis::config::Config;
use value_analysis::provider::HttpReportSource;
use value_analysis::report::normalize_report;
use value_analysis::storage;
use value_analysis::valuation::perform_valuation;

/// Route a parsed command to its handler
pub fn dispatch_command(command: Commands, config: &Config, json_output: bool) -> Result<()> {
    match command {
        Commands::Watchlist => dispatch_watchlist(config, json_output),
        Commands::Fetch { tickers } => dispatch_fetch(config, &tickers),
        Commands::Show { ticker } => dispatch_show(config, &ticker, json_output),
        Commands::Value {
            prices,
            prices_file,
        } => dispatch_value(config, &prices, prices_file.as_deref(), json_output),
    }
}

fn dispatch_watchlist(config: &Config, json_output: bool) -> Result<()> {
    if json_output {
        println!("{}", formatters::format_watchlist_json(config));
    } else {
        print!("{}", formatters::format_watchlist_table(config));
    }
    Ok(())
}

/// Watchlist name or ticker to ticker; unknown keys are taken as tickers
fn resolve_ticker(config: &Config, key: &str) -> String {
    config
        .find(key)
        .map(|e| e.ticker.clone())
        .unwrap_or_else(|| key.trim().to_string())
}

fn dispatch_fetch(config: &Config, keys: &[String]) -> Result<()> {
    let tickers: Vec<String> = if keys.is_empty() {
        config.securities.iter().map(|e| e.ticker.clone()).collect()
    } else {
        keys.iter().map(|k| resolve_ticker(config, k)).collect()
    };
    if tickers.is_empty() {
        bail!("Nothing to fetch: the watchlist is empty");
    }

    let source = HttpReportSource::new(config.timeout())?;

    let pb = ProgressBar::new(tickers.len() as u64);
    pb.set_style(ProgressStyle::with_template(
        "{spinner:.cyan} [{bar:30}] {pos}/{len} {msg}",
    )?);

    let mut failed = Vec::new();
    for ticker in &tickers {
        pb.set_message(ticker.clone());

        let outcome = normalize_report(ticker, &source)
            .with_context(|| format!("fetch stage failed for {}", ticker))
            .and_then(|table| {
                storage::save_report(&config.data_dir, ticker, &table)
                    .map(|path| (table.len(), path))
                    .with_context(|| format!("save stage failed for {}", ticker))
            });

        match outcome {
            Ok((quarters, path)) => {
                pb.suspend(|| {
                    println!(
                        "{} {}: {} quarters → {}",
                        "✓".green(),
                        ticker,
                        quarters,
                        path.display()
                    )
                });
            }
            Err(e) => {
                warn!("{:#}", e);
                pb.suspend(|| println!("{} {}: {:#}", "❌".red(), ticker, e));
                failed.push(ticker.clone());
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!(
        "Fetched {} of {} securities",
        tickers.len() - failed.len(),
        tickers.len()
    );

    if !failed.is_empty() {
        bail!(
            "{} of {} securities failed: {}",
            failed.len(),
            tickers.len(),
            failed.iter().join(", ")
        );
    }
    Ok(())
}

fn dispatch_show(config: &Config, key: &str, json_output: bool) -> Result<()> {
    let ticker = resolve_ticker(config, key);
    let table = storage::load_report(&config.data_dir, &ticker)?;

    if json_output {
        println!("{}", formatters::format_report_json(&ticker, &table));
    } else {
        print!("{}", formatters::format_report_table(&ticker, &table));
    }
    Ok(())
}

fn dispatch_value(
    config: &Config,
    price_args: &[String],
    prices_file: Option<&Path>,
    json_output: bool,
) -> Result<()> {
    let mut prices = match prices_file {
        Some(path) => read_prices_file(config, path)?,
        None => HashMap::new(),
    };
    for arg in price_args {
        let (name, price) = parse_price_arg(arg)?;
        prices.insert(canonical_name(config, &name), price);
    }

    let inputs = config.valuation_inputs();
    let report = perform_valuation(&config.valuation, &inputs, &prices);

    if json_output {
        println!("{}", formatters::format_valuation_json(&report));
    } else {
        print!("{}", formatters::format_valuation_table(&report));
    }
    Ok(())
}

/// Map a ticker to its display name so prices can be given either way
fn canonical_name(config: &Config, key: &str) -> String {
    config
        .find(key)
        .map(|e| e.name.clone())
        .unwrap_or_else(|| key.to_string())
}

/// Parse `NAME=PRICE`
fn parse_price_arg(arg: &str) -> Result<(String, f64)> {
    let (name, price) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid price '{}': expected NAME=PRICE", arg))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("Invalid price '{}': missing name", arg);
    }
    let price = price
        .trim()
        .parse::<f64>()
        .with_context(|| format!("Invalid price '{}'", arg))?;
    Ok((name.to_string(), price))
}

/// Read a `name,price` CSV; names may also be tickers
fn read_prices_file(config: &Config, path: &Path) -> Result<HashMap<String, f64>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open prices file {:?}", path))?;

    let mut prices = HashMap::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.context("Failed to read prices record")?;
        let name = record
            .get(0)
            .ok_or_else(|| anyhow!("Missing name at row {}", idx + 2))?;
        let price = record
            .get(1)
            .ok_or_else(|| anyhow!("Missing price at row {}", idx + 2))?
            .parse::<f64>()
            .with_context(|| format!("Invalid price at row {}", idx + 2))?;
        prices.insert(canonical_name(config, name), price);
    }
    Ok(prices)
}
