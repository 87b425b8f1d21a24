//! Discounting of projected yearly cashflows
//!
//! Supports:
//! - Single annual discount rate (standard DCF / DDM)
//! - Present value of a yearly stream

use serde::{Deserialize, Serialize};

/// Annual discount curve at a single flat rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscountCurve {
    /// Required annual return, as a fraction
    pub annual_rate: f64,
}

impl DiscountCurve {
    /// Create a curve at a single annual rate.
    ///
    /// Rates at or below -1 make every factor singular; callers validate
    /// before building a curve.
    pub fn single_rate(annual_rate: f64) -> Self {
        Self { annual_rate }
    }

    /// Discount factor for a cashflow received at the end of `year` (1-indexed)
    pub fn discount_factor(&self, year: u32) -> f64 {
        (1.0 + self.annual_rate).powi(year as i32).recip()
    }

    /// Present value of `amount` received at the end of `year`
    pub fn present_value(&self, amount: f64, year: u32) -> f64 {
        amount / (1.0 + self.annual_rate).powi(year as i32)
    }

    /// Present value of a stream where element `i` lands at the end of year `i + 1`
    pub fn pv_stream(&self, amounts: &[f64]) -> f64 {
        amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| self.present_value(*amount, i as u32 + 1))
            .sum()
    }
}

impl Default for DiscountCurve {
    fn default() -> Self {
        Self::single_rate(0.10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_rate_curve() {
        let curve = DiscountCurve::single_rate(0.05);
        assert!((curve.annual_rate - 0.05).abs() < 1e-10);
    }

    #[test]
    fn test_discount_factors() {
        let curve = DiscountCurve::single_rate(0.10);

        assert!((curve.discount_factor(0) - 1.0).abs() < 1e-12);
        assert!((curve.discount_factor(1) - 1.0 / 1.1).abs() < 1e-12);

        let expected_5: f64 = 1.0 / 1.1_f64.powi(5);
        assert!((curve.discount_factor(5) - expected_5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_rate_is_undiscounted() {
        let curve = DiscountCurve::single_rate(0.0);
        assert!((curve.pv_stream(&[100.0, 100.0, 100.0]) - 300.0).abs() < 1e-10);
    }

    #[test]
    fn test_pv_stream() {
        // $100 a year for 3 years at 10%
        let pv = DiscountCurve::single_rate(0.10).pv_stream(&[100.0, 100.0, 100.0]);

        // 100/1.1 + 100/1.21 + 100/1.331 ≈ 248.69
        assert!((pv - 248.685).abs() < 0.001);
    }
}
