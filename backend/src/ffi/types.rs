//! Type conversion utilities for FFI boundary
//!
//! Converts between Rust types and PyO3-compatible types (PyDict, PyList).

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::config::{InstabilityPolicy, SimConfig};
use crate::mechanisms::{NeighborhoodPolicy, SkillFormation};
use crate::models::{Series, TrialResult};
use crate::orchestrator::SimulationError;
use crate::results::{AggregateResult, SeriesAggregate, SeriesKind, SweepResult};

// ========================================================================
// Errors
// ========================================================================

/// Map an engine error onto a Python exception.
///
/// Configuration problems raise `ValueError`, everything else `RuntimeError`.
pub fn simulation_error_to_py(err: SimulationError) -> PyErr {
    match err {
        SimulationError::InvalidConfig(e) => {
            PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string())
        }
        other => PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(other.to_string()),
    }
}

// ========================================================================
// Configuration Parsers
// ========================================================================

/// Convert a Python dict of model parameters to a `SimConfig`.
///
/// Keys are model names (`TAX_RATE`, `N_FAMILIES`, ...). Three keys take
/// strings: `NEIGHBORHOOD_POLICY`, `SKILL_FORMATION`, `INSTABILITY_POLICY`.
/// `RNG_SEED` takes an integer. Anything else must be a named coefficient.
///
/// # Errors
///
/// Raises ValueError for unknown names, wrong types, or invalid values.
pub fn parse_sim_config(py_config: &Bound<'_, PyDict>) -> PyResult<SimConfig> {
    let mut config = SimConfig::default();

    for (key, value) in py_config.iter() {
        let name: String = key.extract()?;
        match name.as_str() {
            "NEIGHBORHOOD_POLICY" => {
                let policy: String = value.extract()?;
                config.set_neighborhood_policy(policy.parse::<NeighborhoodPolicy>().map_err(value_error)?);
            }
            "SKILL_FORMATION" => {
                let form: String = value.extract()?;
                config.set_skill_formation(form.parse::<SkillFormation>().map_err(value_error)?);
            }
            "INSTABILITY_POLICY" => {
                let policy: String = value.extract()?;
                config.set_instability_policy(policy.parse::<InstabilityPolicy>().map_err(value_error)?);
            }
            "RNG_SEED" => {
                config.rng_seed = value.extract()?;
            }
            _ => {
                let coefficient: f64 = value.extract()?;
                config.set(&name, coefficient).map_err(value_error)?;
            }
        }
    }

    config.validate().map_err(value_error)?;
    Ok(config)
}

fn value_error(err: impl std::fmt::Display) -> PyErr {
    PyErr::new::<pyo3::exceptions::PyValueError, _>(err.to_string())
}

// ========================================================================
// Result Converters
// ========================================================================

/// Wide table for one series: `{"mean_0": [...], "sd_0": [...], ...}`
pub fn series_aggregate_to_py(py: Python, aggregate: &SeriesAggregate) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new(py);
    for column in aggregate.columns() {
        dict.set_item(column.name, column.values.to_vec())?;
    }
    Ok(dict.into())
}

fn series_to_rows<T: Copy>(series: &Series<T>) -> Vec<Vec<T>> {
    series.iter_rows().map(|row| row.to_vec()).collect()
}

/// Convert one kept trial to a dict of row-major arrays
pub fn trial_result_to_py(py: Python, trial: &TrialResult) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("trial", trial.trial)?;
    dict.set_item("income", series_to_rows(&trial.income))?;
    dict.set_item("human_capital", series_to_rows(&trial.human_capital))?;
    dict.set_item("neighborhood", series_to_rows(&trial.neighborhood))?;
    dict.set_item("neighborhood_size", series_to_rows(&trial.neighborhood_size))?;
    dict.set_item("instabilities", trial.diagnostics.len())?;
    Ok(dict.into())
}

/// Convert an aggregate to a dict keyed by series display name
///
/// ```text
/// {
///   "config_fingerprint": "...",
///   "Income": {"mean_0": [...], "sd_0": [...], "gini_0": [...], ...},
///   "Capital": {...},
///   "Neighborhood Size": {"mean_0": [...], "sd_0": [...], ...},
///   "failures": [{"trial": 3, "generation": 12, "stage": "human capital", "families": [...]}],
///   "trials": [...]            # only when trials were kept
/// }
/// ```
pub fn aggregate_to_py(py: Python, aggregate: &AggregateResult) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("config_fingerprint", &aggregate.config_fingerprint)?;

    for kind in SeriesKind::ALL {
        let table = series_aggregate_to_py(py, aggregate.series(kind))?;
        dict.set_item(kind.to_string(), table)?;
    }

    let failures = PyList::empty(py);
    for failure in &aggregate.failures {
        let entry = PyDict::new(py);
        entry.set_item("trial", failure.trial)?;
        entry.set_item("generation", failure.report.generation)?;
        entry.set_item("stage", failure.report.stage.to_string())?;
        entry.set_item("families", failure.report.families.clone())?;
        failures.append(entry)?;
    }
    dict.set_item("failures", failures)?;

    if aggregate.keeps_trials() {
        let trials = PyList::empty(py);
        for trial in &aggregate.trial_data {
            trials.append(trial_result_to_py(py, trial)?)?;
        }
        dict.set_item("trials", trials)?;
    }

    Ok(dict.into())
}

/// Convert a sweep to a dict with long `(param, time)` tables per series
/// plus the full aggregate of each point.
pub fn sweep_to_py(py: Python, sweep: &SweepResult) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("param", &sweep.param)?;
    dict.set_item("values", sweep.values())?;

    for kind in SeriesKind::ALL {
        let rows = sweep.rows(kind);
        let table = PyDict::new(py);
        table.set_item("param", rows.iter().map(|r| r.param).collect::<Vec<_>>())?;
        table.set_item("time", rows.iter().map(|r| r.time).collect::<Vec<_>>())?;
        table.set_item("mean", rows.iter().map(|r| r.mean).collect::<Vec<_>>())?;
        table.set_item("sd", rows.iter().map(|r| r.sd).collect::<Vec<_>>())?;
        if kind.tracks_gini() {
            table.set_item(
                "gini",
                rows.iter().map(|r| r.gini.unwrap_or(f64::NAN)).collect::<Vec<_>>(),
            )?;
        }
        dict.set_item(kind.to_string(), table)?;
    }

    let points = PyList::empty(py);
    for point in &sweep.points {
        points.append(aggregate_to_py(py, &point.aggregate)?)?;
    }
    dict.set_item("points", points)?;

    Ok(dict.into())
}
