//! Selection of the base figure a valuation projects from

use super::ValuationMode;
use crate::fundamentals::Fundamentals;
use log::warn;
use serde::{Deserialize, Serialize};

/// Where the base figure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseBasis {
    FreeCashFlow,
    OwnerEarnings,
    /// Operating cash flow less capital expenditure, used as a fallback
    OperatingLessCapex,
    TrailingDividend,
    /// Nothing usable was reported
    Unavailable,
}

/// Resolved base figure for a ticker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseResolution {
    /// `None` only in DDM mode without a dividend; DCF degrades to 0
    pub value: Option<f64>,
    pub basis: BaseBasis,
}

impl BaseResolution {
    fn from(value: f64, basis: BaseBasis) -> Self {
        Self { value: Some(value), basis }
    }
}

/// Pick the base figure for a mode.
///
/// DCF on owner earnings tries owner earnings, then operating cash flow less
/// capex, then trailing free cash flow. Plain DCF tries trailing free cash
/// flow, then operating cash flow less capex. With nothing reported DCF
/// projects from 0. DDM uses the trailing dividend per share or nothing.
pub fn resolve_base(mode: ValuationMode, use_owner_earnings: bool, fundamentals: &Fundamentals) -> BaseResolution {
    let trailing_fcf = fundamentals.trailing_free_cash_flow.filter(|v| v.is_finite());

    let resolved = match mode {
        ValuationMode::Ddm => match fundamentals.dividend() {
            Some(dividend) => BaseResolution::from(dividend, BaseBasis::TrailingDividend),
            None => BaseResolution { value: None, basis: BaseBasis::Unavailable },
        },
        ValuationMode::Dcf if use_owner_earnings => {
            if let Some(owner) = fundamentals.owner_earnings() {
                BaseResolution::from(owner, BaseBasis::OwnerEarnings)
            } else if let Some(fallback) = fundamentals.operating_less_capex() {
                BaseResolution::from(fallback, BaseBasis::OperatingLessCapex)
            } else if let Some(fcf) = trailing_fcf {
                BaseResolution::from(fcf, BaseBasis::FreeCashFlow)
            } else {
                BaseResolution::from(0.0, BaseBasis::Unavailable)
            }
        }
        ValuationMode::Dcf => {
            if let Some(fcf) = trailing_fcf {
                BaseResolution::from(fcf, BaseBasis::FreeCashFlow)
            } else if let Some(fallback) = fundamentals.operating_less_capex() {
                BaseResolution::from(fallback, BaseBasis::OperatingLessCapex)
            } else {
                BaseResolution::from(0.0, BaseBasis::Unavailable)
            }
        }
    };

    let preferred = match mode {
        ValuationMode::Ddm => BaseBasis::TrailingDividend,
        ValuationMode::Dcf if use_owner_earnings => BaseBasis::OwnerEarnings,
        ValuationMode::Dcf => BaseBasis::FreeCashFlow,
    };
    if resolved.basis != preferred {
        warn!(
            "{}: {:?} unavailable for {} valuation, using {:?}",
            fundamentals.ticker, preferred, mode, resolved.basis
        );
    }

    resolved
}
