//! Fundamentals record matching the data provider's snapshot format

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_currency() -> String {
    "USD".to_string()
}

/// Trailing fundamentals for one ticker.
///
/// Every figure is optional; `None` means the provider could not supply it.
/// Cashflow figures are company totals, dividends are per share.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub ticker: String,

    /// Currency prices and financials are quoted in
    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub shares_outstanding: Option<f64>,

    #[serde(default)]
    pub trailing_free_cash_flow: Option<f64>,
    #[serde(default)]
    pub operating_cash_flow: Option<f64>,

    /// Reported either signed (outflow negative) or as a magnitude
    #[serde(default)]
    pub capital_expenditure: Option<f64>,

    #[serde(default)]
    pub depreciation: Option<f64>,
    #[serde(default)]
    pub net_income: Option<f64>,

    #[serde(default)]
    pub trailing_dividend_per_share: Option<f64>,
}

impl Fundamentals {
    pub fn new(ticker: &str) -> Self {
        Self {
            ticker: ticker.trim().to_uppercase(),
            currency: default_currency(),
            ..Default::default()
        }
    }

    /// Current price if it is usable as a denominator
    pub fn market_price(&self) -> Option<f64> {
        positive(self.current_price)
    }

    /// Shares outstanding if usable for a per-share conversion
    pub fn share_count(&self) -> Option<f64> {
        positive(self.shares_outstanding)
    }

    /// Trailing dividend if the company actually pays one
    pub fn dividend(&self) -> Option<f64> {
        positive(self.trailing_dividend_per_share)
    }

    /// Operating cash flow less capital expenditure, when both are reported
    pub fn operating_less_capex(&self) -> Option<f64> {
        let operating = finite(self.operating_cash_flow)?;
        let capex = finite(self.capital_expenditure)?;
        Some(operating - capex.abs())
    }

    /// Net income plus depreciation less capital expenditure.
    ///
    /// `None` unless all three components are reported.
    pub fn owner_earnings(&self) -> Option<f64> {
        let net_income = finite(self.net_income)?;
        let depreciation = finite(self.depreciation)?;
        let capex = finite(self.capital_expenditure)?;
        Some(net_income + depreciation - capex.abs())
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Source of fundamentals, looked up by ticker.
///
/// Implement this to plug in a live data provider. Lookups must be safe to
/// run from several threads at once for batch valuation.
pub trait FundamentalsProvider: Sync {
    /// Fundamentals for `ticker`, or `None` if the source has nothing for it
    fn fundamentals(&self, ticker: &str) -> Option<Fundamentals>;
}

/// In-memory fundamentals keyed by upper-case ticker
#[derive(Debug, Clone, Default)]
pub struct FundamentalsTable {
    entries: HashMap<String, Fundamentals>,
}

impl FundamentalsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<Fundamentals>) -> Self {
        let mut table = Self::new();
        for record in records {
            table.insert(record);
        }
        table
    }

    /// Insert or replace the record for its ticker
    pub fn insert(&mut self, mut record: Fundamentals) {
        record.ticker = record.ticker.trim().to_uppercase();
        self.entries.insert(record.ticker.clone(), record);
    }

    /// All known tickers, sorted
    pub fn tickers(&self) -> Vec<String> {
        let mut tickers: Vec<String> = self.entries.keys().cloned().collect();
        tickers.sort();
        tickers
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FundamentalsProvider for FundamentalsTable {
    fn fundamentals(&self, ticker: &str) -> Option<Fundamentals> {
        self.entries.get(&ticker.trim().to_uppercase()).cloned()
    }
}
