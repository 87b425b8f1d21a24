//! Intrinsic Valuation - Scenario-weighted DCF and DDM valuation engine
//!
//! This library provides:
//! - Growth series normalization from single rates or per-year sequences
//! - Yearly cashflow projection, discounting and terminal value
//! - Advisory guardrails for aggressive or degraded inputs
//! - Probability-weighted blending with a margin-of-safety buy price
//! - Parallel batch valuation across many tickers

pub mod batch;
pub mod blend;
pub mod config;
pub mod engine;
pub mod error;
pub mod fundamentals;
pub mod growth;
pub mod guardrails;
pub mod projection;

// Re-export commonly used types
pub use batch::{run_batch, BatchResults, BatchRunner};
pub use blend::ValuationBlender;
pub use config::{EngineConfig, GuardrailThresholds, RequestDefaults};
pub use engine::{
    run_valuation, ScenarioAssumptions, ScenarioResult, ValuationEngine, ValuationMode, ValuationRequest,
    ValuationResult,
};
pub use error::{BatchError, ValidationError};
pub use fundamentals::{Fundamentals, FundamentalsProvider, FundamentalsTable};
pub use growth::{GrowthInput, GrowthSeriesBuilder};
pub use guardrails::{GuardrailEvaluator, Warning};
pub use projection::{Projection, ScenarioProjector};
