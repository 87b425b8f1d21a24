//! Cashflow output structures for scenario projections

use serde::{Deserialize, Serialize};

/// A single projected forecast year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRow {
    /// Forecast year (1-indexed)
    pub year: u32,

    /// Growth applied to reach this year's cashflow
    pub growth_rate: f64,

    /// Nominal cashflow (or dividend) for the year
    pub cashflow: f64,

    /// Factor applied to bring the cashflow back to today
    pub discount_factor: f64,

    pub discounted_cashflow: f64,
}

/// Complete projection for one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Yearly rows, one per forecast year
    pub rows: Vec<ProjectionRow>,

    /// Final-year cashflow times the terminal multiple
    pub terminal_value: f64,

    /// Terminal value discounted from the end of the horizon
    pub discounted_terminal_value: f64,

    /// Sum of discounted cashflows plus discounted terminal value
    pub total_value: f64,

    /// Total value per share when shares outstanding is known, else the total
    pub intrinsic_value: f64,
}

impl Projection {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            terminal_value: 0.0,
            discounted_terminal_value: 0.0,
            total_value: 0.0,
            intrinsic_value: 0.0,
        }
    }

    /// Add a projected year
    pub fn add_row(&mut self, row: ProjectionRow) {
        self.rows.push(row);
    }

    pub fn cashflows(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.cashflow).collect()
    }

    pub fn discounted_cashflows(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.discounted_cashflow).collect()
    }

    /// Present value of the explicit forecast years only
    pub fn pv_forecast(&self) -> f64 {
        self.rows.iter().map(|r| r.discounted_cashflow).sum()
    }

    /// Final forecast-year cashflow, 0 for an empty projection
    pub fn final_cashflow(&self) -> f64 {
        self.rows.last().map(|r| r.cashflow).unwrap_or(0.0)
    }

    /// Share of total value coming from the terminal value
    pub fn terminal_share(&self) -> Option<f64> {
        if self.total_value.abs() < 1e-12 {
            None
        } else {
            Some(self.discounted_terminal_value / self.total_value)
        }
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::new()
    }
}
