//! Batch runner for valuing many tickers under one request
//!
//! Every ticker is an independent engine invocation, so the batch fans out
//! across the rayon pool and collects results keyed by ticker.

use crate::engine::{ValuationEngine, ValuationRequest, ValuationResult};
use crate::error::BatchError;
use crate::fundamentals::FundamentalsProvider;
use log::{info, warn};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Results of a batch run, keyed by uppercase ticker
pub type BatchResults = BTreeMap<String, Result<ValuationResult, BatchError>>;

/// Pre-configured runner for batch valuations
///
/// # Example
/// ```ignore
/// let table = load_default_fundamentals()?;
/// let runner = BatchRunner::new(ValuationEngine::default());
///
/// let results = runner.run(&request, &table, &["MSFT", "KO"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BatchRunner {
    engine: ValuationEngine,
}

impl BatchRunner {
    pub fn new(engine: ValuationEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &ValuationEngine {
        &self.engine
    }

    /// Value one ticker from the provider
    pub fn run_one<P>(&self, request: &ValuationRequest, provider: &P, ticker: &str) -> Result<ValuationResult, BatchError>
    where
        P: FundamentalsProvider + ?Sized,
    {
        let fundamentals = provider
            .fundamentals(ticker)
            .ok_or_else(|| BatchError::UnknownTicker(ticker.to_uppercase()))?;
        Ok(self.engine.run_valuation(request, &fundamentals)?)
    }

    /// Value every ticker in parallel
    pub fn run<P, S>(&self, request: &ValuationRequest, provider: &P, tickers: &[S]) -> BatchResults
    where
        P: FundamentalsProvider + ?Sized,
        S: AsRef<str> + Sync,
    {
        info!("Valuing {} tickers ({} mode)", tickers.len(), request.mode);

        let results: BatchResults = tickers
            .par_iter()
            .map(|ticker| {
                let ticker = ticker.as_ref().trim();
                let result = self.run_one(request, provider, ticker);
                if let Err(e) = &result {
                    warn!("{}: {}", ticker, e);
                }
                (ticker.to_uppercase(), result)
            })
            .collect();

        let failed = results.values().filter(|r| r.is_err()).count();
        info!("Batch complete: {} valued, {} failed", results.len() - failed, failed);

        results
    }
}

/// Value every ticker in parallel with the given engine
pub fn run_batch<P, S>(
    engine: &ValuationEngine,
    request: &ValuationRequest,
    provider: &P,
    tickers: &[S],
) -> BatchResults
where
    P: FundamentalsProvider + ?Sized,
    S: AsRef<str> + Sync,
{
    BatchRunner::new(engine.clone()).run(request, provider, tickers)
}
