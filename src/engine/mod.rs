//! Valuation engine for single-ticker DCF and DDM valuations
//!
//! One pass per request: validate, resolve the base figure, project and
//! check every scenario, evaluate request-wide guardrails, then blend.
//! The engine holds configuration only and never mutates it, so a single
//! instance can serve concurrent requests.

mod base;
mod types;

pub use base::{resolve_base, BaseBasis, BaseResolution};
pub use types::{
    GrowthSeries, RequestPayload, ScenarioAssumptions, ScenarioInput, ScenarioResult, ValuationMode,
    ValuationRequest, ValuationResult,
};

use crate::blend::{relative_to_price, ValuationBlender, WeightedValue};
use crate::config::EngineConfig;
use crate::error::ValidationError;
use crate::fundamentals::Fundamentals;
use crate::guardrails::GuardrailEvaluator;
use crate::projection::ScenarioProjector;
use log::debug;

/// Main valuation engine
#[derive(Debug, Clone, Default)]
pub struct ValuationEngine {
    config: EngineConfig,
    guardrails: GuardrailEvaluator,
}

impl ValuationEngine {
    /// Create an engine with the given configuration
    pub fn new(config: EngineConfig) -> Self {
        let guardrails = GuardrailEvaluator::new(config.thresholds.clone());
        Self { config, guardrails }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Check the request's shape; nothing is computed for a malformed request
    pub fn validate(&self, request: &ValuationRequest) -> Result<(), ValidationError> {
        if request.scenarios.is_empty() {
            return Err(ValidationError::NoScenarios);
        }

        let max = self.config.thresholds.max_forecast_years;
        if request.forecast_years == 0 || request.forecast_years > max {
            return Err(ValidationError::ForecastYearsOutOfRange { years: request.forecast_years, max });
        }

        // Negated so NaN is rejected too
        if !(request.discount_rate.is_finite() && request.discount_rate > -1.0) {
            return Err(ValidationError::InvalidDiscountRate(request.discount_rate));
        }

        if !request.margin_of_safety.is_finite() {
            return Err(ValidationError::InvalidMarginOfSafety(request.margin_of_safety));
        }

        for (idx, scenario) in request.scenarios.iter().enumerate() {
            let name = || match scenario.name.trim() {
                "" => format!("Scenario {}", idx + 1),
                name => name.to_string(),
            };
            if !(scenario.terminal_multiple.is_finite() && scenario.terminal_multiple >= 0.0) {
                return Err(ValidationError::InvalidTerminalMultiple {
                    name: name(),
                    value: scenario.terminal_multiple,
                });
            }
            if !(scenario.probability_weight.is_finite() && scenario.probability_weight >= 0.0) {
                return Err(ValidationError::InvalidProbabilityWeight {
                    name: name(),
                    value: scenario.probability_weight,
                });
            }
        }

        Ok(())
    }

    /// Value one ticker.
    ///
    /// Returns exactly one result for any structurally valid request. Missing
    /// or degraded fundamentals show up as warnings on the result.
    pub fn run_valuation(
        &self,
        request: &ValuationRequest,
        fundamentals: &Fundamentals,
    ) -> Result<ValuationResult, ValidationError> {
        self.validate(request)?;

        let years = request.forecast_years as usize;
        let base = resolve_base(request.mode, request.use_owner_earnings, fundamentals);
        debug!("{}: {} base {:?} ({:?})", fundamentals.ticker, request.mode, base.value, base.basis);

        // DDM works on a per-share dividend already
        let shares = match request.mode {
            ValuationMode::Dcf => fundamentals.share_count(),
            ValuationMode::Ddm => None,
        };
        let current_price = fundamentals.market_price();

        let projector = ScenarioProjector::new(request.discount_rate);
        let blender = ValuationBlender::new(request.margin_of_safety);

        let mut scenarios: Vec<ScenarioResult> = request
            .scenarios
            .iter()
            .enumerate()
            .map(|(idx, assumptions)| {
                let input = ScenarioInput::build(assumptions, idx, years);
                let scenario_base = input.base_value.filter(|v| v.is_finite()).or(base.value);
                self.value_scenario(&projector, &blender, &input, scenario_base, shares, current_price)
            })
            .collect();

        let blended = blender.blend(
            &scenarios
                .iter()
                .zip(&request.scenarios)
                .map(|(result, assumptions)| WeightedValue {
                    intrinsic_value: result.intrinsic_value,
                    weight: assumptions.probability_weight,
                    enabled: !result.excluded,
                })
                .collect::<Vec<_>>(),
        );
        for (result, weight) in scenarios.iter_mut().zip(&blended.weights) {
            result.weight = *weight;
        }

        let global_warnings = self.guardrails.evaluate_global(request, &base, fundamentals, &scenarios);

        debug!(
            "{}: weighted intrinsic value {:.4}, buy price {:.4}, {} global warnings",
            fundamentals.ticker,
            blended.weighted_intrinsic_value,
            blended.buy_price,
            global_warnings.len()
        );

        Ok(ValuationResult {
            ticker: fundamentals.ticker.clone(),
            mode: request.mode,
            currency: fundamentals.currency.clone(),
            current_price,
            base_value: base.value,
            base_basis: base.basis,
            discount_rate: request.discount_rate,
            shares_outstanding: shares,
            use_owner_earnings: request.use_owner_earnings,
            margin_of_safety: blender.margin_of_safety(),
            weighted_intrinsic_value: blended.weighted_intrinsic_value,
            margin_of_safety_buy_price: blended.buy_price,
            scenarios,
            global_warnings,
        })
    }

    /// Project one scenario and attach its warnings.
    ///
    /// A scenario without a base is excluded: it keeps full-length rows of
    /// zeros so the output shape is uniform, but reports no value.
    fn value_scenario(
        &self,
        projector: &ScenarioProjector,
        blender: &ValuationBlender,
        input: &ScenarioInput,
        base_value: Option<f64>,
        shares: Option<f64>,
        current_price: Option<f64>,
    ) -> ScenarioResult {
        let excluded = base_value.is_none();
        let projection = projector.project(
            base_value.unwrap_or(0.0),
            &input.growth_rates,
            input.terminal_multiple,
            shares,
        );
        let warnings = self.guardrails.evaluate(input, base_value);

        let intrinsic_value = if excluded { 0.0 } else { projection.intrinsic_value };
        let buy_price = blender.buy_price(intrinsic_value);
        let (upside_pct, downside_pct) = if excluded {
            (None, None)
        } else {
            (
                relative_to_price(intrinsic_value, current_price),
                relative_to_price(buy_price, current_price),
            )
        };

        debug!(
            "scenario {}: intrinsic {:.4}, terminal share {:?}, {} warnings",
            input.name,
            intrinsic_value,
            projection.terminal_share(),
            warnings.len()
        );

        ScenarioResult {
            name: input.name.clone(),
            growth_rates: input.growth_rates.clone(),
            terminal_multiple: input.terminal_multiple,
            cashflows: projection.cashflows(),
            discounted_cashflows: projection.discounted_cashflows(),
            terminal_value: projection.terminal_value,
            discounted_terminal_value: projection.discounted_terminal_value,
            intrinsic_value,
            buy_price,
            upside_pct,
            downside_pct,
            weight: 0.0,
            excluded,
            warnings,
        }
    }
}

/// Value one ticker with the default configuration
pub fn run_valuation(
    request: &ValuationRequest,
    fundamentals: &Fundamentals,
) -> Result<ValuationResult, ValidationError> {
    ValuationEngine::default().run_valuation(request, fundamentals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::growth::GrowthInput;
    use crate::guardrails::Warning;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn scenario(name: &str, rate: f64, multiple: f64, weight: f64) -> ScenarioAssumptions {
        ScenarioAssumptions::new(name, GrowthInput::SingleRate(rate), multiple, weight)
    }

    fn fundamentals() -> Fundamentals {
        let mut f = Fundamentals::new("TEST");
        f.current_price = Some(120.0);
        f.shares_outstanding = Some(10.0);
        f.trailing_free_cash_flow = Some(100.0);
        f.trailing_dividend_per_share = Some(2.0);
        f
    }

    fn golden_request() -> ValuationRequest {
        ValuationRequest::new(ValuationMode::Dcf, 5, 0.10, 0.30, vec![scenario("Base", 0.06, 12.0, 1.0)])
    }

    #[test]
    fn test_golden_value_end_to_end() {
        let result = run_valuation(&golden_request(), &fundamentals()).unwrap();

        let base = &result.scenarios[0];
        assert_abs_diff_eq!(base.intrinsic_value, 144.514_745, epsilon = 1e-5);
        assert_relative_eq!(result.weighted_intrinsic_value, base.intrinsic_value, max_relative = 1e-12);
        assert_relative_eq!(result.margin_of_safety_buy_price, base.intrinsic_value * 0.7, max_relative = 1e-12);
        assert_relative_eq!(base.upside_pct.unwrap(), base.intrinsic_value / 120.0 - 1.0, max_relative = 1e-12);
        assert_relative_eq!(base.downside_pct.unwrap(), base.buy_price / 120.0 - 1.0, max_relative = 1e-12);
        assert!(result.global_warnings.is_empty(), "{:?}", result.global_warnings);
        assert!(base.warnings.is_empty());
    }

    #[test]
    fn test_lengths_match_horizon() {
        let mut request = golden_request();
        request.forecast_years = 7;
        request.scenarios.push(ScenarioAssumptions {
            growth_rates: Some(GrowthSeries::Text("12, 10".into())),
            ..scenario("Explicit", 0.0, 12.0, 1.0)
        });

        let result = run_valuation(&request, &fundamentals()).unwrap();
        for s in &result.scenarios {
            assert_eq!(s.cashflows.len(), 7);
            assert_eq!(s.discounted_cashflows.len(), 7);
            assert_eq!(s.growth_rates.len(), 7);
            for t in 0..7 {
                let expected = s.cashflows[t] / 1.10_f64.powi(t as i32 + 1);
                assert_relative_eq!(s.discounted_cashflows[t], expected, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn test_cashflows_compound_by_each_years_growth() {
        let mut request = golden_request();
        request.scenarios[0].growth_rates = Some(GrowthSeries::Values(vec![0.10, 0.05, 0.02]));
        request.forecast_years = 3;

        let result = run_valuation(&request, &fundamentals()).unwrap();
        let s = &result.scenarios[0];
        assert_relative_eq!(s.cashflows[0], 100.0 * 1.10, max_relative = 1e-12);
        assert_relative_eq!(s.cashflows[1], s.cashflows[0] * 1.05, max_relative = 1e-12);
        assert_relative_eq!(s.cashflows[2], s.cashflows[1] * 1.02, max_relative = 1e-12);
    }

    #[test]
    fn test_validation_errors() {
        let f = fundamentals();

        let mut request = golden_request();
        request.scenarios.clear();
        assert_eq!(run_valuation(&request, &f), Err(ValidationError::NoScenarios));

        let mut request = golden_request();
        request.forecast_years = 0;
        assert!(matches!(
            run_valuation(&request, &f),
            Err(ValidationError::ForecastYearsOutOfRange { years: 0, max: 30 })
        ));

        let mut request = golden_request();
        request.forecast_years = 31;
        assert!(run_valuation(&request, &f).is_err());

        let mut request = golden_request();
        request.discount_rate = -1.0;
        assert!(matches!(run_valuation(&request, &f), Err(ValidationError::InvalidDiscountRate(_))));

        let mut request = golden_request();
        request.discount_rate = f64::NAN;
        assert!(matches!(run_valuation(&request, &f), Err(ValidationError::InvalidDiscountRate(_))));

        let mut request = golden_request();
        request.scenarios[0].terminal_multiple = -1.0;
        assert!(matches!(
            run_valuation(&request, &f),
            Err(ValidationError::InvalidTerminalMultiple { .. })
        ));

        let mut request = golden_request();
        request.scenarios[0].probability_weight = -0.5;
        assert!(matches!(
            run_valuation(&request, &f),
            Err(ValidationError::InvalidProbabilityWeight { .. })
        ));
    }

    #[test]
    fn test_weights_normalized_and_blended() {
        let request = ValuationRequest::new(
            ValuationMode::Dcf,
            5,
            0.10,
            0.30,
            vec![
                scenario("Bear", 0.02, 10.0, 25.0),
                scenario("Base", 0.05, 12.0, 50.0),
                scenario("Bull", 0.08, 15.0, 25.0),
            ],
        );
        let result = run_valuation(&request, &fundamentals()).unwrap();

        let weights: Vec<f64> = result.scenarios.iter().map(|s| s.weight).collect();
        assert_abs_diff_eq!(weights[0], 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(weights[1], 0.50, epsilon = 1e-12);
        assert_abs_diff_eq!(weights[2], 0.25, epsilon = 1e-12);

        let expected: f64 = result.scenarios.iter().map(|s| s.weight * s.intrinsic_value).sum();
        assert_relative_eq!(result.weighted_intrinsic_value, expected, max_relative = 1e-12);

        // Percentage weights that sum to 100 are not flagged
        assert!(result.global_warnings.is_empty(), "{:?}", result.global_warnings);
        assert!(result.scenarios[0].intrinsic_value < result.scenarios[2].intrinsic_value);
    }

    #[test]
    fn test_margin_of_safety_out_of_range_applies_no_discount() {
        let mut request = golden_request();
        request.margin_of_safety = 1.5;

        let result = run_valuation(&request, &fundamentals()).unwrap();
        assert_abs_diff_eq!(result.margin_of_safety, 0.0);
        assert_relative_eq!(result.margin_of_safety_buy_price, result.weighted_intrinsic_value, max_relative = 1e-12);
        assert_relative_eq!(result.scenarios[0].buy_price, result.scenarios[0].intrinsic_value, max_relative = 1e-12);
    }

    #[test]
    fn test_aggressive_scenario_warnings() {
        let mut request = golden_request();
        request.scenarios[0] = scenario("Hot", 0.20, 25.0, 1.0);

        let result = run_valuation(&request, &fundamentals()).unwrap();
        let rendered = crate::guardrails::render(&result.scenarios[0].warnings);
        assert!(rendered.contains(&"aggressive growth assumption".to_string()));
        assert!(rendered.contains(&"aggressive terminal multiple".to_string()));
    }

    #[test]
    fn test_ddm_without_dividend_excludes_scenario() {
        let mut f = fundamentals();
        f.trailing_dividend_per_share = Some(0.0);

        let request = ValuationRequest::new(
            ValuationMode::Ddm,
            5,
            0.08,
            0.25,
            vec![
                scenario("Trailing", 0.04, 12.0, 0.5),
                scenario("Normalized A", 0.03, 12.0, 0.25).with_base_value(1.5),
                scenario("Normalized B", 0.05, 14.0, 0.25).with_base_value(1.5),
            ],
        );
        let result = run_valuation(&request, &f).unwrap();

        let trailing = &result.scenarios[0];
        assert!(trailing.excluded);
        assert!(trailing.has_warning(&Warning::DividendUnavailable));
        assert_abs_diff_eq!(trailing.intrinsic_value, 0.0);
        assert_abs_diff_eq!(trailing.weight, 0.0);
        assert_eq!(trailing.upside_pct, None);
        assert_eq!(trailing.cashflows.len(), 5);

        let enabled_total: f64 = result.scenarios.iter().map(|s| s.weight).sum();
        assert_abs_diff_eq!(enabled_total, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(result.scenarios[1].weight, 0.5, epsilon = 1e-12);

        let expected = 0.5 * result.scenarios[1].intrinsic_value + 0.5 * result.scenarios[2].intrinsic_value;
        assert_relative_eq!(result.weighted_intrinsic_value, expected, max_relative = 1e-12);
        assert!(result.global_warnings.contains(&Warning::DividendUnavailable));
    }

    #[test]
    fn test_ddm_is_per_share_without_share_conversion() {
        let request = ValuationRequest::new(ValuationMode::Ddm, 3, 0.10, 0.0, vec![scenario("Flat", 0.0, 10.0, 1.0)]);
        let result = run_valuation(&request, &fundamentals()).unwrap();

        // 2.0 a year for 3 years plus 20.0 terminal, no division by 10 shares
        let expected = 2.0 / 1.1 + 2.0 / 1.21 + 2.0 / 1.331 + 20.0 / 1.331;
        assert_relative_eq!(result.scenarios[0].intrinsic_value, expected, max_relative = 1e-12);
        assert_eq!(result.base_value, Some(2.0));
    }

    #[test]
    fn test_every_scenario_excluded() {
        let mut f = fundamentals();
        f.trailing_dividend_per_share = None;
        let request = ValuationRequest::new(ValuationMode::Ddm, 5, 0.08, 0.3, vec![scenario("Only", 0.04, 12.0, 1.0)]);

        let result = run_valuation(&request, &f).unwrap();
        assert_abs_diff_eq!(result.weighted_intrinsic_value, 0.0);
        assert_abs_diff_eq!(result.margin_of_safety_buy_price, 0.0);
        assert!(result.global_warnings.contains(&Warning::AllScenariosDisabled));
    }

    #[test]
    fn test_owner_earnings_fallback_warns() {
        let mut f = fundamentals();
        f.trailing_free_cash_flow = None;
        f.operating_cash_flow = Some(150.0);
        f.capital_expenditure = Some(-30.0);

        let request = golden_request().with_owner_earnings(true);
        let result = run_valuation(&request, &f).unwrap();

        assert_eq!(result.base_value, Some(120.0));
        assert!(result.global_warnings.contains(&Warning::OwnerEarningsUnavailable));
    }

    #[test]
    fn test_owner_earnings_fallback_to_free_cash_flow() {
        let request = golden_request().with_owner_earnings(true);
        let result = run_valuation(&request, &fundamentals()).unwrap();

        assert_eq!(result.base_value, Some(100.0));
        assert_eq!(result.base_basis, BaseBasis::FreeCashFlow);
        assert!(result.use_owner_earnings);
        assert_eq!(result.global_warnings, vec![Warning::OwnerEarningsUsingFreeCashFlow]);
    }

    #[test]
    fn test_missing_free_cash_flow_uses_operating_less_capex() {
        let mut f = fundamentals();
        f.trailing_free_cash_flow = None;
        f.operating_cash_flow = Some(150.0);
        f.capital_expenditure = Some(-30.0);

        let result = run_valuation(&golden_request(), &f).unwrap();
        assert_eq!(result.base_basis, BaseBasis::OperatingLessCapex);
        assert_eq!(result.global_warnings, vec![Warning::FreeCashFlowUnavailable]);
    }

    #[test]
    fn test_no_cash_flow_data_projects_from_zero() {
        let mut f = fundamentals();
        f.trailing_free_cash_flow = None;

        let result = run_valuation(&golden_request(), &f).unwrap();
        assert_eq!(result.base_value, Some(0.0));
        assert!(result.global_warnings.contains(&Warning::CashFlowUnavailable));
        assert!(result.scenarios[0].has_warning(&Warning::NonPositiveBaseValue));
        assert!(!result.scenarios[0].excluded);
        assert_abs_diff_eq!(result.weighted_intrinsic_value, 0.0);
    }

    #[test]
    fn test_zero_discount_rate_computes_with_warning() {
        let mut request = golden_request();
        request.discount_rate = 0.0;

        let result = run_valuation(&request, &fundamentals()).unwrap();
        assert!(result
            .global_warnings
            .iter()
            .any(|w| matches!(w, Warning::NonPositiveDiscountRate { .. })));
        assert_eq!(result.scenarios[0].cashflows, result.scenarios[0].discounted_cashflows);
        assert_abs_diff_eq!(result.discount_rate, 0.0);
    }

    #[test]
    fn test_ddm_with_scenario_bases_has_no_dividend_warning() {
        let mut f = fundamentals();
        f.trailing_dividend_per_share = None;

        let request = ValuationRequest::new(
            ValuationMode::Ddm,
            5,
            0.08,
            0.25,
            vec![scenario("Normalized", 0.03, 12.0, 1.0).with_base_value(1.5)],
        );
        let result = run_valuation(&request, &f).unwrap();

        assert!(!result.scenarios[0].excluded);
        assert!(!result.global_warnings.contains(&Warning::DividendUnavailable));
        assert_eq!(result.shares_outstanding, None);
    }

    #[test]
    fn test_result_echoes_request_inputs() {
        let result = run_valuation(&golden_request(), &fundamentals()).unwrap();

        assert_abs_diff_eq!(result.discount_rate, 0.10);
        assert_eq!(result.shares_outstanding, Some(10.0));
        assert!(!result.use_owner_earnings);
        assert_eq!(result.base_basis, BaseBasis::FreeCashFlow);
    }

    #[test]
    fn test_non_positive_base_and_missing_price() {
        let mut f = fundamentals();
        f.trailing_free_cash_flow = Some(-50.0);
        f.current_price = None;

        let result = run_valuation(&golden_request(), &f).unwrap();
        let s = &result.scenarios[0];
        assert!(s.has_warning(&Warning::NonPositiveBaseValue));
        assert!(s.intrinsic_value < 0.0);
        assert_eq!(s.upside_pct, None);
        assert_eq!(s.downside_pct, None);
        assert_eq!(result.current_price, None);
        assert!(result.global_warnings.contains(&Warning::CurrentPriceUnavailable));
    }

    #[test]
    fn test_result_wire_format() {
        let result = run_valuation(&golden_request(), &fundamentals()).unwrap();
        let json = serde_json::to_value(&result).unwrap();

        for key in [
            "currency",
            "current_price",
            "base_basis",
            "discount_rate",
            "shares_outstanding",
            "use_owner_earnings",
            "weighted_intrinsic_value",
            "margin_of_safety_buy_price",
            "scenarios",
            "global_warnings",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        let scenario = &json["scenarios"][0];
        for key in [
            "name",
            "growth_rates",
            "terminal_multiple",
            "cashflows",
            "discounted_cashflows",
            "intrinsic_value",
            "buy_price",
            "upside_pct",
            "downside_pct",
            "warnings",
        ] {
            assert!(scenario.get(key).is_some(), "missing scenarios[].{}", key);
        }
        assert!(scenario.get("excluded").is_none());
    }
}
