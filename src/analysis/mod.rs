//! Counting results turned into averages, variations and a verdict

pub mod evaluator;
pub mod fixed_point;
pub mod history;
pub mod pass;
pub mod variation;

pub use evaluator::{evaluate, should_notify};
pub use fixed_point::{FixedPoint, Variation};
pub use history::{aggregate, HistoryAverage};
pub use pass::{AnalysisResult, HistoryComparison, PreviousComparison};
pub use variation::{variation, variations};
