//! Advisory guardrails over scenario inputs and valuation results
//!
//! Warnings never stop a valuation. They are kept as a closed set of tagged
//! reasons and only become display strings when serialized.

use crate::config::GuardrailThresholds;
use crate::engine::{BaseBasis, BaseResolution, ScenarioInput, ScenarioResult, ValuationMode, ValuationRequest};
use crate::fundamentals::Fundamentals;
use serde::{Serialize, Serializer};
use std::fmt;

/// Reason a valuation deserves a second look
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// Some year's growth exceeds the aggressive threshold (highest rate attached)
    AggressiveGrowth { rate: f64 },
    /// Some year's growth falls below the steep-decline threshold (lowest rate attached)
    SteepDecline { rate: f64 },
    AggressiveTerminalMultiple { multiple: f64 },
    LowTerminalMultiple { multiple: f64 },
    /// Trailing cashflow or dividend at or below zero
    NonPositiveBaseValue,
    /// DDM requested without a trailing dividend; the scenario is excluded
    DividendUnavailable,
    /// Raw probability weights summed to something other than 1 (or 100%)
    WeightsNotNormalized { sum: f64 },
    /// Owner earnings requested, operating cash flow less capex used instead
    OwnerEarningsUnavailable,
    /// Owner earnings requested, trailing free cash flow used instead
    OwnerEarningsUsingFreeCashFlow,
    FreeCashFlowUnavailable,
    CashFlowUnavailable,
    NonPositiveDiscountRate { rate: f64 },
    SharesOutstandingUnavailable,
    CurrentPriceUnavailable,
    AllScenariosDisabled,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::AggressiveGrowth { .. } => "aggressive growth assumption",
            Self::SteepDecline { .. } => "steep decline growth assumption",
            Self::AggressiveTerminalMultiple { .. } => "aggressive terminal multiple",
            Self::LowTerminalMultiple { .. } => "unusually low terminal multiple",
            Self::NonPositiveBaseValue => "non-positive base value; intrinsic value may be unreliable",
            Self::DividendUnavailable => "dividend data unavailable; DDM valuation disabled for this scenario",
            Self::WeightsNotNormalized { .. } => {
                "scenario probability weights do not sum to 100%; weights will be renormalized"
            }
            Self::OwnerEarningsUnavailable => {
                "owner earnings unavailable; falling back to operating cash flow minus capital expenditure"
            }
            Self::OwnerEarningsUsingFreeCashFlow => {
                "owner earnings unavailable; falling back to trailing free cash flow"
            }
            Self::FreeCashFlowUnavailable => {
                "free cash flow unavailable; using operating cash flow minus capital expenditure"
            }
            Self::CashFlowUnavailable => "cash flow data unavailable; base value set to 0",
            Self::NonPositiveDiscountRate { .. } => "non-positive discount rate; intrinsic value is not meaningful",
            Self::SharesOutstandingUnavailable => {
                "shares outstanding unavailable; intrinsic value reported as a company total"
            }
            Self::CurrentPriceUnavailable => "current price unavailable; upside and downside omitted",
            Self::AllScenariosDisabled => "all scenarios disabled; weighted intrinsic value unavailable",
        };
        f.write_str(message)
    }
}

impl Serialize for Warning {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Render warnings to their display strings
pub fn render(warnings: &[Warning]) -> Vec<String> {
    warnings.iter().map(Warning::to_string).collect()
}

/// Append unless an identical reason is already present
fn push_unique(warnings: &mut Vec<Warning>, warning: Warning) {
    if !warnings.contains(&warning) {
        warnings.push(warning);
    }
}

/// Evaluates scenario-scoped and request-wide guardrails
#[derive(Debug, Clone, Default)]
pub struct GuardrailEvaluator {
    thresholds: GuardrailThresholds,
}

impl GuardrailEvaluator {
    pub fn new(thresholds: GuardrailThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &GuardrailThresholds {
        &self.thresholds
    }

    /// Warnings for one scenario.
    ///
    /// `base_value` is the figure the scenario was projected from, or `None`
    /// when no usable base exists and the scenario is excluded.
    pub fn evaluate(&self, input: &ScenarioInput, base_value: Option<f64>) -> Vec<Warning> {
        let mut warnings = Vec::new();
        let limits = &self.thresholds;

        let max_rate = input.growth_rates.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if max_rate > limits.aggressive_growth {
            push_unique(&mut warnings, Warning::AggressiveGrowth { rate: max_rate });
        }

        let min_rate = input.growth_rates.iter().copied().fold(f64::INFINITY, f64::min);
        if min_rate < limits.steep_decline {
            push_unique(&mut warnings, Warning::SteepDecline { rate: min_rate });
        }

        let multiple = input.terminal_multiple;
        if multiple > limits.aggressive_terminal_multiple {
            push_unique(&mut warnings, Warning::AggressiveTerminalMultiple { multiple });
        } else if multiple < limits.low_terminal_multiple {
            push_unique(&mut warnings, Warning::LowTerminalMultiple { multiple });
        }

        match base_value {
            None => push_unique(&mut warnings, Warning::DividendUnavailable),
            Some(base) if base <= 0.0 => push_unique(&mut warnings, Warning::NonPositiveBaseValue),
            Some(_) => {}
        }

        warnings
    }

    /// Warnings that concern the request as a whole
    pub fn evaluate_global(
        &self,
        request: &ValuationRequest,
        base: &BaseResolution,
        fundamentals: &Fundamentals,
        results: &[ScenarioResult],
    ) -> Vec<Warning> {
        let mut warnings = Vec::new();

        let sum: f64 = request.scenarios.iter().map(|s| s.probability_weight).sum();
        if !self.weights_sum_to_whole(sum) {
            push_unique(&mut warnings, Warning::WeightsNotNormalized { sum });
        }

        if request.discount_rate <= 0.0 {
            push_unique(&mut warnings, Warning::NonPositiveDiscountRate { rate: request.discount_rate });
        }

        match request.mode {
            ValuationMode::Ddm => {
                // Scenarios carrying their own base are unaffected
                if base.basis == BaseBasis::Unavailable && results.iter().any(|r| r.excluded) {
                    push_unique(&mut warnings, Warning::DividendUnavailable);
                }
            }
            ValuationMode::Dcf => {
                match (request.use_owner_earnings, base.basis) {
                    (true, BaseBasis::OperatingLessCapex) => {
                        push_unique(&mut warnings, Warning::OwnerEarningsUnavailable)
                    }
                    (true, BaseBasis::FreeCashFlow) => {
                        push_unique(&mut warnings, Warning::OwnerEarningsUsingFreeCashFlow)
                    }
                    (false, BaseBasis::OperatingLessCapex) => {
                        push_unique(&mut warnings, Warning::FreeCashFlowUnavailable)
                    }
                    (_, BaseBasis::Unavailable) => push_unique(&mut warnings, Warning::CashFlowUnavailable),
                    _ => {}
                }
                if fundamentals.share_count().is_none() {
                    push_unique(&mut warnings, Warning::SharesOutstandingUnavailable);
                }
            }
        }

        if fundamentals.market_price().is_none() {
            push_unique(&mut warnings, Warning::CurrentPriceUnavailable);
        }

        if !results.is_empty() && results.iter().all(|r| r.excluded) {
            push_unique(&mut warnings, Warning::AllScenariosDisabled);
        }

        warnings
    }

    /// Weights may be given as fractions (sum 1) or percentages (sum 100)
    fn weights_sum_to_whole(&self, sum: f64) -> bool {
        let tolerance = self.thresholds.weight_sum_tolerance;
        (sum - 1.0).abs() <= tolerance || (sum - 100.0).abs() <= tolerance * 100.0
    }
}
