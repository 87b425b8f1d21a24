//! Company fundamentals consumed by the engine and their sources

mod data;
pub mod loader;

pub use data::{Fundamentals, FundamentalsProvider, FundamentalsTable};
pub use loader::{load_default_fundamentals, load_fundamentals, load_fundamentals_from_reader, DEFAULT_FUNDAMENTALS_PATH};
