//! PyO3 wrapper for the Orchestrator
//!
//! This module provides the Python interface to the Rust engine.

use pyo3::prelude::*;
use pyo3::types::PyDict;

use super::types::{aggregate_to_py, parse_sim_config, simulation_error_to_py, sweep_to_py};
use crate::config::SimConfig;
use crate::mechanisms::{NeighborhoodPolicy, SkillFormation};
use crate::orchestrator::Orchestrator;

/// Python wrapper for the Rust Orchestrator
///
/// # Example (from Python)
///
/// ```python
/// from mobility_simulator_core_rs import Simulation
///
/// sim = Simulation({"N_FAMILIES": 50, "N_TIMESTEPS": 100, "RNG_SEED": 7})
/// sim.set("TAX_RATE", 0.3)
/// sim.set_neighborhood_policy("SortedPairs")
///
/// result = sim.run(20)
/// income = pd.DataFrame(result["Income"])
///
/// sweep = sim.run_sweep("TAX_RATE", [0.1, 0.2, 0.3], 10)
/// ```
#[pyclass(name = "Simulation")]
pub struct PySimulation {
    inner: Orchestrator,
}

#[pymethods]
impl PySimulation {
    /// Create a simulation, optionally from a dict of model parameters
    ///
    /// # Errors
    ///
    /// Raises ValueError on unknown names or invalid values.
    #[new]
    #[pyo3(signature = (config=None))]
    fn new(config: Option<&Bound<'_, PyDict>>) -> PyResult<Self> {
        let config = match config {
            Some(dict) => parse_sim_config(dict)?,
            None => SimConfig::default(),
        };
        let inner = Orchestrator::new(config).map_err(simulation_error_to_py)?;
        Ok(PySimulation { inner })
    }

    /// Set a named coefficient
    ///
    /// # Returns
    ///
    /// Ill-conditioning warnings for the new configuration (may be empty)
    ///
    /// # Errors
    ///
    /// Raises ValueError for unknown names; the configuration is unchanged.
    fn set(&mut self, name: &str, value: f64) -> PyResult<Vec<String>> {
        let warnings = self.inner.set(name, value).map_err(simulation_error_to_py)?;
        Ok(warnings.iter().map(|w| w.to_string()).collect())
    }

    /// Read a named coefficient
    fn get(&self, name: &str) -> PyResult<f64> {
        self.inner
            .config()
            .get(name)
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string()))
    }

    /// Select the neighborhood policy: "Static", "SortedPairs", or "FullSort"
    fn set_neighborhood_policy(&mut self, policy: &str) -> PyResult<()> {
        let policy = policy
            .parse::<NeighborhoodPolicy>()
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string()))?;
        self.inner
            .set_neighborhood_policy(policy)
            .map_err(simulation_error_to_py)
    }

    /// Select the skill-formation form: "Product" or "CobbDouglas"
    fn set_skill_formation(&mut self, form: &str) -> PyResult<()> {
        let form = form
            .parse::<SkillFormation>()
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string()))?;
        self.inner
            .set_skill_formation(form)
            .map_err(simulation_error_to_py)
    }

    /// Fingerprint of the current configuration
    #[getter]
    fn fingerprint(&self) -> String {
        self.inner.fingerprint().to_string()
    }

    /// Run `ntrials` trials and return the aggregate as a dict
    ///
    /// # Errors
    ///
    /// Raises RuntimeError on an unimplemented neighborhood policy or, under
    /// the abort-run instability policy, on the first non-finite value.
    #[pyo3(signature = (ntrials, keep_trials=false))]
    fn run(&mut self, py: Python, ntrials: usize, keep_trials: bool) -> PyResult<Py<PyDict>> {
        let result = self
            .inner
            .run(ntrials, keep_trials)
            .map_err(simulation_error_to_py)?;
        aggregate_to_py(py, &result)
    }

    /// Run a full aggregate at each value of one named parameter
    ///
    /// The simulation's own configuration is left unchanged.
    #[pyo3(signature = (param, values, ntrials, keep_trials=false))]
    fn run_sweep(
        &mut self,
        py: Python,
        param: &str,
        values: Vec<f64>,
        ntrials: usize,
        keep_trials: bool,
    ) -> PyResult<Py<PyDict>> {
        let sweep = self
            .inner
            .run_sweep(param, &values, ntrials, keep_trials)
            .map_err(simulation_error_to_py)?;
        sweep_to_py(py, &sweep)
    }
}
