//! Core business logic: scenario inputs, assumption resolution and the ROI engine

pub mod assumptions;
pub mod config;
pub mod log;
pub mod roi;
pub mod scenario;

// Re-export main types for cleaner imports
pub use assumptions::{AdminGate, AssumptionOverrides, AssumptionSet, resolve_assumptions};
pub use roi::{DerivedMetrics, Funnel, FunnelStage, RoiReport, evaluate};
pub use scenario::ScenarioInputs;
