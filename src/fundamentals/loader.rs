//! Load fundamentals from a CSV snapshot
//!
//! Empty cells mean the provider had no figure for that field.

use super::Fundamentals;
use csv::{ReaderBuilder, Trim};
use std::error::Error;
use std::path::Path;

/// Default path to the fundamentals snapshot
pub const DEFAULT_FUNDAMENTALS_PATH: &str = "data/fundamentals.csv";

/// Raw CSV row matching fundamentals.csv columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    ticker: String,
    #[serde(default)]
    currency: Option<String>,
    current_price: Option<f64>,
    shares_outstanding: Option<f64>,
    trailing_free_cash_flow: Option<f64>,
    operating_cash_flow: Option<f64>,
    capital_expenditure: Option<f64>,
    depreciation: Option<f64>,
    net_income: Option<f64>,
    trailing_dividend_per_share: Option<f64>,
}

impl CsvRow {
    fn into_fundamentals(self) -> Result<Fundamentals, Box<dyn Error>> {
        let ticker = self.ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err("Fundamentals row with empty ticker".into());
        }

        let mut fundamentals = Fundamentals::new(&ticker);
        if let Some(currency) = self.currency.filter(|c| !c.trim().is_empty()) {
            fundamentals.currency = currency.trim().to_uppercase();
        }
        fundamentals.current_price = self.current_price;
        fundamentals.shares_outstanding = self.shares_outstanding;
        fundamentals.trailing_free_cash_flow = self.trailing_free_cash_flow;
        fundamentals.operating_cash_flow = self.operating_cash_flow;
        fundamentals.capital_expenditure = self.capital_expenditure;
        fundamentals.depreciation = self.depreciation;
        fundamentals.net_income = self.net_income;
        fundamentals.trailing_dividend_per_share = self.trailing_dividend_per_share;

        Ok(fundamentals)
    }
}

/// Load all fundamentals rows from a CSV file
pub fn load_fundamentals<P: AsRef<Path>>(path: P) -> Result<Vec<Fundamentals>, Box<dyn Error>> {
    let file = std::fs::File::open(path)?;
    load_fundamentals_from_reader(file)
}

/// Load fundamentals from any reader (e.g., string buffer, network stream)
pub fn load_fundamentals_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<Fundamentals>, Box<dyn Error>> {
    let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut records = Vec::new();

    for result in csv_reader.deserialize() {
        let row: CsvRow = result?;
        records.push(row.into_fundamentals()?);
    }

    Ok(records)
}

/// Load fundamentals from the default data/fundamentals.csv location
pub fn load_default_fundamentals() -> Result<Vec<Fundamentals>, Box<dyn Error>> {
    load_fundamentals(DEFAULT_FUNDAMENTALS_PATH)
}
