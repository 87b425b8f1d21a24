//! Intrinsic Valuation CLI
//!
//! Values a single ticker from a fundamentals CSV and prints the scenario table
//!
//! Usage: cargo run -- --ticker MSFT --request data/request.json

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use intrinsic_valuation::fundamentals::{load_fundamentals, DEFAULT_FUNDAMENTALS_PATH};
use intrinsic_valuation::{
    EngineConfig, FundamentalsProvider, FundamentalsTable, ValuationEngine, ValuationMode, ValuationRequest,
    ValuationResult,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Dcf,
    Ddm,
}

impl From<Mode> for ValuationMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Dcf => ValuationMode::Dcf,
            Mode::Ddm => ValuationMode::Ddm,
        }
    }
}

/// Scenario-weighted intrinsic value for one ticker
#[derive(Parser, Debug)]
#[command(name = "intrinsic_valuation")]
#[command(version, about, long_about = None)]
struct Args {
    /// Ticker to value
    #[arg(short, long)]
    ticker: String,

    /// Fundamentals CSV
    #[arg(short, long, default_value = DEFAULT_FUNDAMENTALS_PATH)]
    fundamentals: PathBuf,

    /// Request JSON; engine defaults are used when omitted
    #[arg(short, long)]
    request: Option<PathBuf>,

    /// Engine config JSON (thresholds and request defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, value_enum)]
    mode: Option<Mode>,

    /// Forecast horizon in years
    #[arg(short, long)]
    years: Option<u32>,

    #[arg(short, long)]
    discount_rate: Option<f64>,

    #[arg(long)]
    margin_of_safety: Option<f64>,

    /// Project from owner earnings instead of free cash flow
    #[arg(long)]
    owner_earnings: bool,

    /// Write the full result as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::from_json_path(path)
            .map_err(|e| anyhow!("failed to load config {}: {}", path.display(), e))?,
        None => EngineConfig::default(),
    };

    let mut request = match &args.request {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("failed to open request {}", path.display()))?;
            ValuationRequest::from_json_reader(file, &config.defaults)
                .map_err(|e| anyhow!("failed to parse request {}: {}", path.display(), e))?
        }
        None => ValuationRequest::from_defaults(ValuationMode::default(), &config.defaults),
    };

    // Flags win over the request file
    if let Some(mode) = args.mode {
        request.mode = mode.into();
    }
    if let Some(years) = args.years {
        request.forecast_years = years;
    }
    if let Some(rate) = args.discount_rate {
        request.discount_rate = rate;
    }
    if let Some(mos) = args.margin_of_safety {
        request.margin_of_safety = mos;
    }
    if args.owner_earnings {
        request.use_owner_earnings = true;
    }

    let records = load_fundamentals(&args.fundamentals)
        .map_err(|e| anyhow!("failed to load fundamentals {}: {}", args.fundamentals.display(), e))?;
    let table = FundamentalsTable::from_records(records);
    let fundamentals = table
        .fundamentals(&args.ticker)
        .ok_or_else(|| anyhow!("no fundamentals for ticker {}", args.ticker))?;

    let engine = ValuationEngine::new(config);
    let result = engine
        .run_valuation(&request, &fundamentals)
        .with_context(|| format!("invalid valuation request for {}", fundamentals.ticker))?;

    print_result(&result);

    if let Some(path) = &args.output {
        let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &result)?;
        println!("\nResult written to: {}", path.display());
    }

    Ok(())
}

fn print_result(result: &ValuationResult) {
    println!("Intrinsic Valuation v0.1.0");
    println!("==========================\n");

    println!("Ticker: {} ({} mode, {})", result.ticker, result.mode, result.currency);
    match result.current_price {
        Some(price) => println!("  Current Price: {:.2}", price),
        None => println!("  Current Price: n/a"),
    }
    match result.base_value {
        Some(base) => println!("  Base Value: {:.2} ({:?})", base, result.base_basis),
        None => println!("  Base Value: n/a"),
    }
    println!("  Margin of Safety: {:.1}%", result.margin_of_safety * 100.0);
    println!();

    println!("{:<14} {:>8} {:>8} {:>14} {:>14} {:>10} {:>10}",
        "Scenario", "Weight", "Multiple", "Intrinsic", "Buy Price", "Upside", "Downside");
    println!("{}", "-".repeat(84));

    for s in &result.scenarios {
        println!("{:<14} {:>7.1}% {:>8.1} {:>14.2} {:>14.2} {:>10} {:>10}",
            s.name,
            s.weight * 100.0,
            s.terminal_multiple,
            s.intrinsic_value,
            s.buy_price,
            pct(s.upside_pct),
            pct(s.downside_pct),
        );
    }

    println!("{}", "-".repeat(84));
    println!("{:<14} {:>7.1}% {:>8} {:>14.2} {:>14.2}",
        "Weighted",
        result.scenarios.iter().map(|s| s.weight).sum::<f64>() * 100.0,
        "", result.weighted_intrinsic_value, result.margin_of_safety_buy_price);

    if let Some(below) = result.trades_below_buy_price() {
        println!("\nTrades below buy price: {}", if below { "yes" } else { "no" });
    }

    let warnings = result.all_warnings();
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for warning in warnings {
            println!("  - {}", warning);
        }
    }
}

fn pct(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.1}%", v * 100.0))
}
