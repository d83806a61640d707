//! Domain models for the mobility simulator

pub mod diagnostics;
pub mod series;
pub mod state;
pub mod trial;

// Re-exports
pub use diagnostics::{check_finite, InstabilityReport, InstabilityStage};
pub use series::Series;
pub use state::TrialState;
pub use trial::{TrialFailure, TrialResult, TrialSink};
