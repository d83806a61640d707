//! Mobility Simulator Core - Rust Engine
//!
//! Intergenerational economic-mobility simulator with deterministic execution.
//!
//! # Architecture
//!
//! - **config**: Named model coefficients, validation, and fingerprinting
//! - **models**: Domain types (Series, TrialState, TrialResult, diagnostics)
//! - **mechanisms**: Income, neighborhood, tax, and human-capital transitions
//! - **orchestrator**: Generation loop, trial runner, and parameter sweeps
//! - **results**: Per-trial statistics and multi-trial aggregation
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. All randomness is deterministic (seeded RNG)
//! 2. Each neighborhood population row sums to the number of families
//! 3. Trials never share state buffers
//! 4. FFI boundary is minimal and safe

// Module declarations
pub mod config;
pub mod mechanisms;
pub mod models;
pub mod orchestrator;
pub mod results;
pub mod rng;

// Re-exports for convenience
pub use config::{
    config_fingerprint, ConfigError, ConfigParam, ConfigWarning, InstabilityPolicy, SimConfig,
};
pub use mechanisms::{NeighborhoodError, NeighborhoodPolicy, SkillFormation};
pub use models::{
    InstabilityReport, InstabilityStage, Series, TrialFailure, TrialResult, TrialSink, TrialState,
};
pub use orchestrator::{GenerationSummary, Orchestrator, SimulationError, Trial};
pub use results::{AggregateResult, SeriesKind, SweepResult, SweepRow};
pub use rng::RngManager;

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn mobility_simulator_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::simulation::PySimulation>()?;
    Ok(())
}
