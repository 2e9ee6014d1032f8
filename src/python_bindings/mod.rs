//! Provides tools and interfaces to integrate the crate's functionality with Python.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock};

use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::automaton::{Automaton, StateId, Symbol};
use crate::config::Config;

#[pyclass(name = "Automaton", module = "dfa_minimizer.dfa_minimizer_rs")]
#[derive(Clone, Debug)]
pub struct PyAutomaton(Arc<RwLock<Automaton>>);

fn map_poison_error_to_pyerr<G>(_: PoisonError<G>) -> PyErr {
    PyErr::new::<pyo3::exceptions::PyRuntimeError, _>("RwLock poisoned")
}

impl PyAutomaton {
    fn wrap(automaton: Automaton) -> Self {
        PyAutomaton(Arc::new(RwLock::new(automaton)))
    }

    fn snapshot(&self) -> PyResult<Automaton> {
        let guard = self.0.read().map_err(map_poison_error_to_pyerr)?;
        Ok(guard.clone())
    }
}

#[pymethods]
impl PyAutomaton {
    #[new]
    #[pyo3(signature = (sink_state=None, minimized_prefix=None, parallel_refinement=None))]
    fn __new__(
        sink_state: Option<String>,
        minimized_prefix: Option<String>,
        parallel_refinement: Option<bool>,
    ) -> Self {
        let mut config = Config::new();
        if let Some(name) = sink_state {
            config = config.sink_state(name);
        }
        if let Some(prefix) = minimized_prefix {
            config = config.minimized_prefix(prefix);
        }
        if let Some(yes) = parallel_refinement {
            config = config.parallel_refinement(yes);
        }
        Self::wrap(Automaton::with_config(config))
    }

    // builders
    fn set_alphabet(&self, symbols: &str) -> PyResult<()> {
        let mut guard = self.0.write().map_err(map_poison_error_to_pyerr)?;
        guard.set_alphabet(symbols.chars());
        Ok(())
    }

    fn set_states(&self, count: usize) -> PyResult<()> {
        let mut guard = self.0.write().map_err(map_poison_error_to_pyerr)?;
        guard.set_states(count)?;
        Ok(())
    }

    fn set_start(&self, index: usize) -> PyResult<()> {
        let mut guard = self.0.write().map_err(map_poison_error_to_pyerr)?;
        guard.set_start(index)?;
        Ok(())
    }

    fn set_accepting(&self, indices: Vec<usize>) -> PyResult<()> {
        let mut guard = self.0.write().map_err(map_poison_error_to_pyerr)?;
        guard.set_accepting(indices)?;
        Ok(())
    }

    fn set_dead(&self, indices: Vec<usize>) -> PyResult<()> {
        let mut guard = self.0.write().map_err(map_poison_error_to_pyerr)?;
        guard.set_dead(indices)?;
        Ok(())
    }

    fn set_transition(&self, state: usize, symbol: Symbol, destination: usize) -> PyResult<()> {
        let mut guard = self.0.write().map_err(map_poison_error_to_pyerr)?;
        guard.set_transition(state, symbol, destination)?;
        Ok(())
    }

    fn set_dead_transition(&self, state: usize, symbol: Symbol) -> PyResult<()> {
        let mut guard = self.0.write().map_err(map_poison_error_to_pyerr)?;
        guard.set_dead_transition(state, symbol)?;
        Ok(())
    }

    // stages, each returning a new automaton
    fn convert_to_dfa(&self, py: Python<'_>) -> PyResult<Self> {
        let automaton = self.snapshot()?;
        py.allow_threads(|| automaton.convert_to_dfa().map(Self::wrap).map_err(Into::into))
    }

    fn complete_dfa(&self) -> PyResult<Self> {
        Ok(Self::wrap(self.snapshot()?.complete_dfa()?))
    }

    fn dead_state_normalize(&self) -> PyResult<Self> {
        Ok(Self::wrap(self.snapshot()?.dead_state_normalize()))
    }

    fn remove_unreachable_states(&self) -> PyResult<Self> {
        Ok(Self::wrap(self.snapshot()?.remove_unreachable_states()))
    }

    fn minimize_dfa(&self, py: Python<'_>) -> PyResult<Self> {
        let automaton = self.snapshot()?;
        py.allow_threads(|| automaton.minimize_dfa().map(Self::wrap).map_err(Into::into))
    }

    fn canonical_minimal(&self, py: Python<'_>) -> PyResult<Self> {
        let automaton = self.snapshot()?;
        py.allow_threads(|| {
            automaton
                .canonical_minimal()
                .map(|report| Self::wrap(report.minimal))
                .map_err(Into::into)
        })
    }

    // queries
    fn is_deterministic(&self) -> PyResult<bool> {
        let guard = self.0.read().map_err(map_poison_error_to_pyerr)?;
        Ok(guard.is_deterministic())
    }

    fn is_complete(&self) -> PyResult<bool> {
        let guard = self.0.read().map_err(map_poison_error_to_pyerr)?;
        Ok(guard.is_complete())
    }

    fn has_unreachable_states(&self) -> PyResult<bool> {
        let guard = self.0.read().map_err(map_poison_error_to_pyerr)?;
        Ok(guard.has_unreachable_states())
    }

    fn accepts(&self, word: &str) -> PyResult<bool> {
        let guard = self.0.read().map_err(map_poison_error_to_pyerr)?;
        Ok(guard.accepts(word))
    }

    fn get_state_sequence(&self, word: &str) -> PyResult<Option<Vec<StateId>>> {
        let guard = self.0.read().map_err(map_poison_error_to_pyerr)?;
        Ok(guard.state_sequence(word))
    }

    fn get_states(&self) -> PyResult<Vec<StateId>> {
        let guard = self.0.read().map_err(map_poison_error_to_pyerr)?;
        Ok(guard.states().to_vec())
    }

    fn get_start_state(&self) -> PyResult<StateId> {
        let guard = self.0.read().map_err(map_poison_error_to_pyerr)?;
        Ok(guard.start_state().to_string())
    }

    fn get_accepting_states(&self) -> PyResult<BTreeSet<StateId>> {
        let guard = self.0.read().map_err(map_poison_error_to_pyerr)?;
        Ok(guard.accepting_states().clone())
    }

    fn get_dead_states(&self) -> PyResult<BTreeSet<StateId>> {
        let guard = self.0.read().map_err(map_poison_error_to_pyerr)?;
        Ok(guard.dead_states().clone())
    }

    fn get_transitions(&self) -> PyResult<BTreeMap<StateId, BTreeMap<Symbol, Vec<StateId>>>> {
        let guard = self.0.read().map_err(map_poison_error_to_pyerr)?;
        Ok(guard
            .table()
            .into_iter()
            .map(|row| {
                let destinations = row
                    .destinations
                    .into_iter()
                    .filter(|(_, dests)| !dests.is_empty())
                    .collect();
                (row.state, destinations)
            })
            .collect())
    }

    fn __repr__(&self) -> PyResult<String> {
        let guard = self.0.read().map_err(map_poison_error_to_pyerr)?;
        Ok(format!("{:#?}", *guard))
    }

    fn __str__(&self) -> PyResult<String> {
        let guard = self.0.read().map_err(map_poison_error_to_pyerr)?;
        Ok(format!("{}", *guard))
    }

    fn __eq__(&self, other: &PyAutomaton) -> PyResult<bool> {
        if Arc::ptr_eq(&self.0, &other.0) {
            return Ok(true);
        }
        let self_guard = self.0.read().map_err(map_poison_error_to_pyerr)?;
        let other_guard = other.0.read().map_err(map_poison_error_to_pyerr)?;
        Ok(*self_guard == *other_guard)
    }

    fn __deepcopy__(&self, _py: Python<'_>, _memo: Py<PyDict>) -> PyResult<Self> {
        Ok(Self::wrap(self.snapshot()?))
    }
}

#[pymodule]
fn dfa_minimizer_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyAutomaton>()?;

    Ok(())
}
