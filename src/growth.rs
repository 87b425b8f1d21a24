//! Growth series construction
//!
//! Callers describe growth either as one rate applied every year or as an
//! explicit per-year list. Both are resolved once into a fixed-length
//! sequence of fractional rates before projection.

use serde::{Deserialize, Serialize};

/// Caller-supplied growth assumption before resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthInput {
    /// Same rate every forecast year
    SingleRate(f64),
    /// Explicit rate per year, padded or truncated to the horizon
    ExplicitSeries(Vec<f64>),
    /// Per-year rates parsed from text, already fractional
    FractionalSeries(Vec<f64>),
}

impl GrowthInput {
    /// Combine the two input forms the way the request boundary sees them.
    ///
    /// A series that parses to at least one number wins; otherwise the single
    /// rate is used, and a missing single rate means 0% growth.
    pub fn from_parts(single_rate: Option<f64>, series_text: Option<&str>) -> Self {
        let series = series_text.map(parse_series).unwrap_or_default();
        if series.is_empty() {
            GrowthInput::SingleRate(single_rate.unwrap_or(0.0))
        } else {
            GrowthInput::FractionalSeries(series)
        }
    }

    /// Resolve into exactly `years` fractional rates
    pub fn resolve(&self, years: usize) -> Vec<f64> {
        match self {
            GrowthInput::SingleRate(rate) => vec![normalize_rate(*rate); years],
            GrowthInput::ExplicitSeries(values) => {
                let normalized: Vec<f64> = values
                    .iter()
                    .copied()
                    .filter(|v| v.is_finite())
                    .map(normalize_rate)
                    .collect();
                fit_to_horizon(normalized, years)
            }
            GrowthInput::FractionalSeries(values) => {
                fit_to_horizon(values.iter().copied().filter(|v| v.is_finite()).collect(), years)
            }
        }
    }
}

/// Pad with the last rate or truncate; an empty series means 0% growth
fn fit_to_horizon(rates: Vec<f64>, years: usize) -> Vec<f64> {
    let Some(&last) = rates.last() else {
        return vec![0.0; years];
    };

    rates.into_iter().chain(std::iter::repeat(last)).take(years).collect()
}

impl Default for GrowthInput {
    fn default() -> Self {
        GrowthInput::SingleRate(0.0)
    }
}

/// Builds fixed-length growth sequences from raw form input
pub struct GrowthSeriesBuilder;

impl GrowthSeriesBuilder {
    /// Never fails; anything unusable degrades to 0% growth.
    pub fn build(single_rate: Option<f64>, series_text: Option<&str>, years: usize) -> Vec<f64> {
        GrowthInput::from_parts(single_rate, series_text).resolve(years)
    }
}

/// Interpret a rate as a fraction.
///
/// Magnitudes above 1 are read as percentages (12 -> 0.12). Anything else is
/// already fractional, so normalizing twice is harmless.
pub fn normalize_rate(rate: f64) -> f64 {
    if !rate.is_finite() {
        0.0
    } else if rate.abs() > 1.0 {
        rate / 100.0
    } else {
        rate
    }
}

/// Parse a delimited list of rates into fractions.
///
/// Accepts commas, semicolons and whitespace as separators. Tokens that do not
/// parse are dropped. A trailing `%` marks an explicit percentage and is only
/// divided by 100, so "0.5%" stays 0.005 and "150%" stays 1.5. Bare numbers go
/// through `normalize_rate`.
pub fn parse_series(text: &str) -> Vec<f64> {
    text.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter_map(parse_token)
        .collect()
}

fn parse_token(token: &str) -> Option<f64> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    let (number, percent) = match token.strip_suffix('%') {
        Some(stripped) => (stripped.trim(), true),
        None => (token, false),
    };

    let value = number.parse::<f64>().ok().filter(|v| v.is_finite())?;
    if percent {
        Some(value / 100.0)
    } else {
        Some(normalize_rate(value))
    }
}
