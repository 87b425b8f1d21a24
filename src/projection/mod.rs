//! Scenario projection: yearly cashflows, discounting and terminal value

mod cashflows;
mod discount;
mod projector;

pub use cashflows::{Projection, ProjectionRow};
pub use discount::DiscountCurve;
pub use projector::ScenarioProjector;
