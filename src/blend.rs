//! Probability-weighted blending of scenario values
//!
//! This is the join point of a valuation: every scenario must be projected
//! before the blended value and buy price can be computed.

use serde::{Deserialize, Serialize};

/// One scenario's contribution to the blend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedValue {
    pub intrinsic_value: f64,
    /// Raw, caller-supplied weight
    pub weight: f64,
    /// Excluded scenarios (e.g. DDM without a dividend) get zero weight
    pub enabled: bool,
}

/// Blended result across scenarios
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendedValuation {
    pub weighted_intrinsic_value: f64,
    pub buy_price: f64,
    /// Normalized weight per scenario, in input order
    pub weights: Vec<f64>,
}

/// Margin of safety actually applied.
///
/// Values outside [0, 1) mean no discount rather than a negative or inflated
/// buy price.
pub fn clamp_margin_of_safety(margin_of_safety: f64) -> f64 {
    if (0.0..1.0).contains(&margin_of_safety) {
        margin_of_safety
    } else {
        0.0
    }
}

/// Normalize weights over the enabled scenarios.
///
/// Disabled scenarios get 0. If the enabled weights sum to zero they share
/// equally. With nothing enabled every weight is 0.
pub fn normalize_weights(weights: &[f64], enabled: &[bool]) -> Vec<f64> {
    let is_enabled = |i: usize| enabled.get(i).copied().unwrap_or(true);

    let active = (0..weights.len()).filter(|&i| is_enabled(i)).count();
    if active == 0 {
        return vec![0.0; weights.len()];
    }

    let total: f64 = weights
        .iter()
        .enumerate()
        .filter(|(i, _)| is_enabled(*i))
        .map(|(_, w)| w.max(0.0))
        .sum();

    weights
        .iter()
        .enumerate()
        .map(|(i, w)| {
            if !is_enabled(i) {
                0.0
            } else if total <= 0.0 {
                1.0 / active as f64
            } else {
                w.max(0.0) / total
            }
        })
        .collect()
}

/// `value / price - 1`, or `None` without a usable market price
pub fn relative_to_price(value: f64, current_price: Option<f64>) -> Option<f64> {
    current_price
        .filter(|p| p.is_finite() && *p > 0.0)
        .map(|price| value / price - 1.0)
}

/// Blends scenario values and applies the margin of safety
#[derive(Debug, Clone, Copy)]
pub struct ValuationBlender {
    margin_of_safety: f64,
}

impl ValuationBlender {
    /// Create a blender; the margin of safety is clamped on the way in
    pub fn new(margin_of_safety: f64) -> Self {
        Self {
            margin_of_safety: clamp_margin_of_safety(margin_of_safety),
        }
    }

    /// The clamped margin of safety in effect
    pub fn margin_of_safety(&self) -> f64 {
        self.margin_of_safety
    }

    /// Conservative buy target for a given intrinsic value
    pub fn buy_price(&self, intrinsic_value: f64) -> f64 {
        intrinsic_value * (1.0 - self.margin_of_safety)
    }

    pub fn blend(&self, values: &[WeightedValue]) -> BlendedValuation {
        let raw: Vec<f64> = values.iter().map(|v| v.weight).collect();
        let enabled: Vec<bool> = values.iter().map(|v| v.enabled).collect();
        let weights = normalize_weights(&raw, &enabled);

        let weighted_intrinsic_value: f64 = values
            .iter()
            .zip(&weights)
            .map(|(v, w)| v.intrinsic_value * w)
            .sum();

        BlendedValuation {
            weighted_intrinsic_value,
            buy_price: self.buy_price(weighted_intrinsic_value),
            weights,
        }
    }
}
