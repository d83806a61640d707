//! Result reduction: per-trial statistics, multi-trial aggregates, sweeps

pub mod aggregate;
pub mod stats;
pub mod sweep;

pub use aggregate::{AggregateResult, Column, SeriesAggregate, SeriesKind, SeriesStats, TrialStats};
pub use sweep::{SweepPoint, SweepResult, SweepRow};
