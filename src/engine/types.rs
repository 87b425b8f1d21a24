//! Request and result types for a single valuation

use super::BaseBasis;
use crate::config::RequestDefaults;
use crate::growth::GrowthInput;
use crate::guardrails::Warning;
use serde::{Deserialize, Serialize};
use std::error::Error;

/// Valuation model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValuationMode {
    /// Discounted cash flow on company free cash flow or owner earnings
    #[default]
    #[serde(alias = "DCF")]
    Dcf,
    /// Dividend discount on trailing dividend per share
    #[serde(alias = "DDM")]
    Ddm,
}

impl std::fmt::Display for ValuationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dcf => write!(f, "DCF"),
            Self::Ddm => write!(f, "DDM"),
        }
    }
}

/// Explicit growth series as the form sends it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GrowthSeries {
    /// Delimited text such as "10, 9, 8"
    Text(String),
    Values(Vec<f64>),
}

fn default_terminal_multiple() -> f64 {
    12.0
}

fn default_weight() -> f64 {
    1.0
}

/// One scenario as the caller describes it, before growth resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAssumptions {
    #[serde(default)]
    pub name: String,

    /// Single growth rate (fraction, or percentage if above 1)
    #[serde(default)]
    pub growth_rate: Option<f64>,

    /// Per-year growth; wins over `growth_rate` when it has any number in it
    #[serde(default)]
    pub growth_rates: Option<GrowthSeries>,

    #[serde(default = "default_terminal_multiple")]
    pub terminal_multiple: f64,

    /// Un-normalized probability weight
    #[serde(default = "default_weight", alias = "probability")]
    pub probability_weight: f64,

    /// Scenario-specific base figure replacing the trailing one
    #[serde(default)]
    pub base_value: Option<f64>,
}

impl ScenarioAssumptions {
    pub fn new(name: &str, growth: GrowthInput, terminal_multiple: f64, probability_weight: f64) -> Self {
        let (growth_rate, growth_rates) = match growth {
            GrowthInput::SingleRate(rate) => (Some(rate), None),
            // Fractional rates above 1 read back as percentages here
            GrowthInput::ExplicitSeries(values) | GrowthInput::FractionalSeries(values) => {
                (None, Some(GrowthSeries::Values(values)))
            }
        };
        Self {
            name: name.to_string(),
            growth_rate,
            growth_rates,
            terminal_multiple,
            probability_weight,
            base_value: None,
        }
    }

    /// Replace the trailing base figure for this scenario
    pub fn with_base_value(mut self, base_value: f64) -> Self {
        self.base_value = Some(base_value);
        self
    }

    /// Collapse the two growth fields into one tagged input
    pub fn growth_input(&self) -> GrowthInput {
        match &self.growth_rates {
            Some(GrowthSeries::Text(text)) => GrowthInput::from_parts(self.growth_rate, Some(text.as_str())),
            Some(GrowthSeries::Values(values)) if values.iter().any(|v| v.is_finite()) => {
                GrowthInput::ExplicitSeries(values.clone())
            }
            _ => GrowthInput::SingleRate(self.growth_rate.unwrap_or(0.0)),
        }
    }
}

/// Scenario with its growth resolved to the forecast horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioInput {
    pub name: String,
    /// Exactly one fractional rate per forecast year
    pub growth_rates: Vec<f64>,
    pub terminal_multiple: f64,
    pub probability_weight: f64,
    pub base_value: Option<f64>,
}

impl ScenarioInput {
    /// Build from caller assumptions; `index` names unnamed scenarios
    pub fn build(assumptions: &ScenarioAssumptions, index: usize, forecast_years: usize) -> Self {
        let name = match assumptions.name.trim() {
            "" => format!("Scenario {}", index + 1),
            name => name.to_string(),
        };
        Self {
            name,
            growth_rates: assumptions.growth_input().resolve(forecast_years),
            terminal_multiple: assumptions.terminal_multiple,
            probability_weight: assumptions.probability_weight,
            base_value: assumptions.base_value,
        }
    }
}

/// Structured valuation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationRequest {
    pub mode: ValuationMode,
    pub forecast_years: u32,
    /// Required annual return; must exceed -1
    pub discount_rate: f64,
    /// Fractional discount on intrinsic value for the buy target
    pub margin_of_safety: f64,
    /// DCF only: value owner earnings instead of free cash flow
    pub use_owner_earnings: bool,
    pub scenarios: Vec<ScenarioAssumptions>,
}

impl ValuationRequest {
    pub fn new(
        mode: ValuationMode,
        forecast_years: u32,
        discount_rate: f64,
        margin_of_safety: f64,
        scenarios: Vec<ScenarioAssumptions>,
    ) -> Self {
        Self {
            mode,
            forecast_years,
            discount_rate,
            margin_of_safety,
            use_owner_earnings: false,
            scenarios,
        }
    }

    /// Request built purely from configured defaults
    pub fn from_defaults(mode: ValuationMode, defaults: &RequestDefaults) -> Self {
        Self::new(
            mode,
            defaults.forecast_years,
            defaults.discount_rate,
            defaults.margin_of_safety,
            defaults.scenarios.clone(),
        )
    }

    pub fn with_owner_earnings(mut self, use_owner_earnings: bool) -> Self {
        self.use_owner_earnings = use_owner_earnings;
        self
    }

    /// Parse a JSON payload, filling omitted fields from `defaults`
    pub fn from_json_reader<R: std::io::Read>(reader: R, defaults: &RequestDefaults) -> Result<Self, Box<dyn Error>> {
        let payload: RequestPayload = serde_json::from_reader(reader)?;
        Ok(payload.into_request(defaults))
    }
}

/// Request as it arrives over the wire; every field optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestPayload {
    #[serde(default)]
    pub mode: Option<ValuationMode>,
    #[serde(default)]
    pub forecast_years: Option<u32>,
    #[serde(default)]
    pub discount_rate: Option<f64>,
    #[serde(default)]
    pub margin_of_safety: Option<f64>,
    #[serde(default)]
    pub use_owner_earnings: Option<bool>,
    /// Missing means the default set; an explicit empty list stays empty
    #[serde(default)]
    pub scenarios: Option<Vec<ScenarioAssumptions>>,
}

impl RequestPayload {
    pub fn into_request(self, defaults: &RequestDefaults) -> ValuationRequest {
        ValuationRequest {
            mode: self.mode.unwrap_or_default(),
            forecast_years: self.forecast_years.unwrap_or(defaults.forecast_years),
            discount_rate: self.discount_rate.unwrap_or(defaults.discount_rate),
            margin_of_safety: self.margin_of_safety.unwrap_or(defaults.margin_of_safety),
            use_owner_earnings: self.use_owner_earnings.unwrap_or(false),
            scenarios: self.scenarios.unwrap_or_else(|| defaults.scenarios.clone()),
        }
    }
}

/// Valuation of one scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub growth_rates: Vec<f64>,
    pub terminal_multiple: f64,
    pub cashflows: Vec<f64>,
    pub discounted_cashflows: Vec<f64>,
    pub terminal_value: f64,
    pub discounted_terminal_value: f64,
    /// Per share when shares outstanding is known (always per share for DDM)
    pub intrinsic_value: f64,
    pub buy_price: f64,
    pub upside_pct: Option<f64>,
    pub downside_pct: Option<f64>,
    /// Normalized probability weight used in the blend
    pub weight: f64,
    /// Excluded from the blend by a guardrail
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub excluded: bool,
    pub warnings: Vec<Warning>,
}

impl ScenarioResult {
    /// Whether a warning of the same kind is attached, ignoring its context
    pub fn has_warning(&self, warning: &Warning) -> bool {
        let kind = std::mem::discriminant(warning);
        self.warnings.iter().any(|w| std::mem::discriminant(w) == kind)
    }
}

/// Complete valuation of one ticker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationResult {
    pub ticker: String,
    pub mode: ValuationMode,
    pub currency: String,
    pub current_price: Option<f64>,
    /// Trailing figure the projection started from, `None` if unavailable
    pub base_value: Option<f64>,
    /// Which reported figure `base_value` came from
    pub base_basis: BaseBasis,
    pub discount_rate: f64,
    /// Share count used for the per-share conversion (DCF only)
    pub shares_outstanding: Option<f64>,
    pub use_owner_earnings: bool,
    /// Clamped margin of safety that was applied
    pub margin_of_safety: f64,
    pub weighted_intrinsic_value: f64,
    pub margin_of_safety_buy_price: f64,
    pub scenarios: Vec<ScenarioResult>,
    pub global_warnings: Vec<Warning>,
}

impl ValuationResult {
    /// Whether the market price is at or under the blended buy target
    pub fn trades_below_buy_price(&self) -> Option<bool> {
        self.current_price
            .filter(|p| *p > 0.0)
            .map(|price| price <= self.margin_of_safety_buy_price)
    }

    /// Every warning, global first, without repeats
    pub fn all_warnings(&self) -> Vec<String> {
        let mut all: Vec<String> = Vec::new();
        let scenario_warnings = self.scenarios.iter().flat_map(|s| s.warnings.iter());
        for warning in self.global_warnings.iter().chain(scenario_warnings) {
            let text = warning.to_string();
            if !all.contains(&text) {
                all.push(text);
            }
        }
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_text_wins_over_single_rate() {
        let json = r#"{ "name": "Base", "growth_rate": 8, "growth_rates": "10,9" }"#;
        let scenario: ScenarioAssumptions = serde_json::from_str(json).unwrap();
        let input = ScenarioInput::build(&scenario, 0, 4);

        assert_eq!(input.growth_rates.len(), 4);
        assert!((input.growth_rates[0] - 0.10).abs() < 1e-12);
        assert!((input.growth_rates[3] - 0.09).abs() < 1e-12);
        assert!((input.terminal_multiple - 12.0).abs() < 1e-12);
        assert!((input.probability_weight - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_growth_array_accepted() {
        let json = r#"{ "growth_rates": [0.14, 0.13], "probability": 0.5 }"#;
        let scenario: ScenarioAssumptions = serde_json::from_str(json).unwrap();
        let input = ScenarioInput::build(&scenario, 2, 3);

        assert_eq!(input.name, "Scenario 3");
        assert_eq!(input.growth_rates, vec![0.14, 0.13, 0.13]);
        assert!((input.probability_weight - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_unparseable_series_uses_single_rate() {
        let json = r#"{ "name": "Odd", "growth_rate": 0.04, "growth_rates": "n/a" }"#;
        let scenario: ScenarioAssumptions = serde_json::from_str(json).unwrap();
        assert_eq!(ScenarioInput::build(&scenario, 0, 2).growth_rates, vec![0.04, 0.04]);
    }

    #[test]
    fn test_payload_defaults() {
        let defaults = RequestDefaults::default();
        let request = ValuationRequest::from_json_reader(r#"{ "mode": "DDM" }"#.as_bytes(), &defaults).unwrap();

        assert_eq!(request.mode, ValuationMode::Ddm);
        assert_eq!(request.forecast_years, 10);
        assert!((request.discount_rate - 0.10).abs() < 1e-12);
        assert_eq!(request.scenarios.len(), 3);
        assert!(!request.use_owner_earnings);
    }

    #[test]
    fn test_explicit_empty_scenarios_preserved() {
        let defaults = RequestDefaults::default();
        let request = ValuationRequest::from_json_reader(r#"{ "scenarios": [] }"#.as_bytes(), &defaults).unwrap();
        assert!(request.scenarios.is_empty());
    }

    #[test]
    fn test_sample_request_file() {
        let file = std::fs::File::open("data/request.json").expect("Failed to open sample request");
        let request = ValuationRequest::from_json_reader(file, &RequestDefaults::default()).unwrap();

        assert_eq!(request.mode, ValuationMode::Dcf);
        assert_eq!(request.scenarios.len(), 3);
        assert_eq!(request.scenarios[1].name, "Base");
    }
}
