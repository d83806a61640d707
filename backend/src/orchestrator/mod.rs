//! Orchestrator - generation loop, trial runner, and parameter sweeps
//!
//! See `engine.rs` for full implementation.

pub mod engine;

pub use engine::{GenerationSummary, Orchestrator, SimulationError, Trial};
