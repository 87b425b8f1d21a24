//! Yearly cashflow projection and terminal value estimation

use super::cashflows::{Projection, ProjectionRow};
use super::discount::DiscountCurve;

/// Projects a base figure forward under a growth path and discounts it.
///
/// Pure numeric transform: a non-positive base still projects, and no business
/// rule is enforced here. Guardrails annotate suspicious inputs afterwards.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioProjector {
    curve: DiscountCurve,
}

impl ScenarioProjector {
    /// Create a projector discounting at `discount_rate` (must be > -1)
    pub fn new(discount_rate: f64) -> Self {
        Self::with_curve(DiscountCurve::single_rate(discount_rate))
    }

    pub fn with_curve(curve: DiscountCurve) -> Self {
        Self { curve }
    }

    pub fn curve(&self) -> &DiscountCurve {
        &self.curve
    }

    /// Run the projection.
    ///
    /// `shares_outstanding` converts the total into a per-share figure when it
    /// is known and positive. Pass `None` when the base is already per share.
    pub fn project(
        &self,
        base_value: f64,
        growth_rates: &[f64],
        terminal_multiple: f64,
        shares_outstanding: Option<f64>,
    ) -> Projection {
        let mut projection = Projection::new();
        let mut cashflow = base_value;

        for (idx, &growth_rate) in growth_rates.iter().enumerate() {
            let year = idx as u32 + 1;
            cashflow *= 1.0 + growth_rate;

            let discount_factor = self.curve.discount_factor(year);
            projection.add_row(ProjectionRow {
                year,
                growth_rate,
                cashflow,
                discount_factor,
                discounted_cashflow: self.curve.present_value(cashflow, year),
            });
        }

        let horizon = growth_rates.len() as u32;
        projection.terminal_value = projection.final_cashflow() * terminal_multiple;
        projection.discounted_terminal_value =
            self.curve.present_value(projection.terminal_value, horizon);
        projection.total_value = projection.pv_forecast() + projection.discounted_terminal_value;

        projection.intrinsic_value = match shares_outstanding {
            Some(shares) if shares > 0.0 => projection.total_value / shares,
            _ => projection.total_value,
        };

        projection
    }
}
