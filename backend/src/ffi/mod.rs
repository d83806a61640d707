//! Python bindings
//!
//! Thin PyO3 layer over [`crate::Orchestrator`]. Results cross the boundary
//! as plain dicts and lists.

pub mod simulation;
pub mod types;
