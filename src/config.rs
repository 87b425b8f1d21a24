//! Engine configuration: guardrail thresholds and request defaults
//!
//! Defaults are built in; a JSON file may override any subset of fields.

use crate::engine::ScenarioAssumptions;
use crate::growth::GrowthInput;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Limits at which guardrails start warning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardrailThresholds {
    /// Any yearly growth above this is aggressive
    pub aggressive_growth: f64,

    /// Any yearly growth below this is a steep decline
    pub steep_decline: f64,

    pub aggressive_terminal_multiple: f64,
    pub low_terminal_multiple: f64,

    /// Allowed distance of the raw weight sum from 1 (or from 100 for percentages)
    pub weight_sum_tolerance: f64,

    /// Longest accepted forecast horizon, in years
    pub max_forecast_years: u32,
}

impl Default for GuardrailThresholds {
    fn default() -> Self {
        Self {
            aggressive_growth: 0.15,
            steep_decline: -0.10,
            aggressive_terminal_multiple: 20.0,
            low_terminal_multiple: 5.0,
            weight_sum_tolerance: 0.05,
            max_forecast_years: 30,
        }
    }
}

/// Values used when a request leaves a field out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestDefaults {
    pub forecast_years: u32,
    pub discount_rate: f64,
    pub margin_of_safety: f64,
    pub scenarios: Vec<ScenarioAssumptions>,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            forecast_years: 10,
            discount_rate: 0.10,
            margin_of_safety: 0.30,
            scenarios: default_scenarios(),
        }
    }
}

/// Bear / Base / Bull set used when a request carries no scenarios
pub fn default_scenarios() -> Vec<ScenarioAssumptions> {
    vec![
        ScenarioAssumptions::new("Bear", GrowthInput::SingleRate(0.02), 10.0, 0.25),
        ScenarioAssumptions::new("Base", GrowthInput::SingleRate(0.05), 12.0, 0.50),
        ScenarioAssumptions::new("Bull", GrowthInput::SingleRate(0.08), 15.0, 0.25),
    ]
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub thresholds: GuardrailThresholds,
    pub defaults: RequestDefaults,
}

impl EngineConfig {
    /// Load overrides from a JSON file; absent fields keep their defaults
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load overrides from any reader (e.g., string buffer)
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, Box<dyn Error>> {
        Ok(serde_json::from_reader(reader)?)
    }
}
