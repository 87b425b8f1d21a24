//! Value every ticker in a fundamentals CSV under one request
//!
//! Writes one summary row per ticker for spreadsheet review

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use intrinsic_valuation::blend::relative_to_price;
use intrinsic_valuation::fundamentals::{load_fundamentals, DEFAULT_FUNDAMENTALS_PATH};
use intrinsic_valuation::{run_batch, BatchResults, EngineConfig, FundamentalsTable, ValuationEngine, ValuationRequest};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "run_batch")]
#[command(version, about = "Batch intrinsic valuation across tickers", long_about = None)]
struct Args {
    /// Fundamentals CSV
    #[arg(short, long, default_value = DEFAULT_FUNDAMENTALS_PATH)]
    fundamentals: PathBuf,

    /// Request JSON applied to every ticker
    #[arg(short, long)]
    request: Option<PathBuf>,

    /// Engine config JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tickers to value; every ticker in the CSV when omitted
    #[arg(short, long, value_delimiter = ',')]
    tickers: Vec<String>,

    #[arg(short, long, default_value = "batch_valuation_output.csv")]
    output: PathBuf,
}

/// One CSV row per ticker
#[derive(Debug, Serialize)]
struct SummaryRow {
    ticker: String,
    mode: String,
    currency: String,
    current_price: Option<f64>,
    base_value: Option<f64>,
    weighted_intrinsic_value: Option<f64>,
    margin_of_safety_buy_price: Option<f64>,
    upside_pct: Option<f64>,
    warnings: usize,
    error: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::from_json_path(path)
            .map_err(|e| anyhow!("failed to load config {}: {}", path.display(), e))?,
        None => EngineConfig::default(),
    };

    let request = match &args.request {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("failed to open request {}", path.display()))?;
            ValuationRequest::from_json_reader(file, &config.defaults)
                .map_err(|e| anyhow!("failed to parse request {}: {}", path.display(), e))?
        }
        None => ValuationRequest::from_defaults(Default::default(), &config.defaults),
    };

    let start = Instant::now();
    println!("Loading fundamentals from {}...", args.fundamentals.display());
    let records = load_fundamentals(&args.fundamentals)
        .map_err(|e| anyhow!("failed to load fundamentals {}: {}", args.fundamentals.display(), e))?;
    let table = FundamentalsTable::from_records(records);
    println!("Loaded {} tickers in {:?}", table.len(), start.elapsed());

    let tickers = if args.tickers.is_empty() { table.tickers() } else { args.tickers.clone() };

    println!("Running valuations...");
    let run_start = Instant::now();
    let engine = ValuationEngine::new(config);
    let results = run_batch(&engine, &request, &table, &tickers);
    println!("Valuations complete in {:?}", run_start.elapsed());

    write_summary(&args.output, &request, &results)?;
    println!("Output written to: {}", args.output.display());

    let failed = results.values().filter(|r| r.is_err()).count();
    println!("\nSummary:");
    println!("  Tickers: {}", results.len());
    println!("  Valued: {}", results.len() - failed);
    println!("  Failed: {}", failed);

    Ok(())
}

fn write_summary(path: &Path, request: &ValuationRequest, results: &BatchResults) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("failed to create {}", path.display()))?;

    for (ticker, result) in results {
        let row = match result {
            Ok(v) => SummaryRow {
                ticker: ticker.clone(),
                mode: v.mode.to_string(),
                currency: v.currency.clone(),
                current_price: v.current_price,
                base_value: v.base_value,
                weighted_intrinsic_value: Some(v.weighted_intrinsic_value),
                margin_of_safety_buy_price: Some(v.margin_of_safety_buy_price),
                upside_pct: relative_to_price(v.weighted_intrinsic_value, v.current_price),
                warnings: v.all_warnings().len(),
                error: String::new(),
            },
            Err(e) => SummaryRow {
                ticker: ticker.clone(),
                mode: request.mode.to_string(),
                currency: String::new(),
                current_price: None,
                base_value: None,
                weighted_intrinsic_value: None,
                margin_of_safety_buy_price: None,
                upside_pct: None,
                warnings: 0,
                error: e.to_string(),
            },
        };
        writer.serialize(row)?;
    }

    writer.flush()?;
    Ok(())
}
