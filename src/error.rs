//! The Errors that may occur within the crate.

use thiserror::Error;

use crate::automaton::Symbol;

pub type Result<T, E = crate::Error> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Builder Errors
    #[error("Invalid state index {0}, expected a value in 0..{1}")]
    InvalidIndex(usize, usize),
    #[error("Symbol {0:?} is not part of the alphabet")]
    UnknownSymbol(Symbol),
    #[error("Unknown state: {0}")]
    UnknownState(String),
    // Algorithm Errors
    #[error("Automaton has no states or an empty alphabet")]
    EmptyAutomaton,
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}

impl Error {
    pub fn is_builder_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidIndex(..) | Self::UnknownSymbol(_) | Self::UnknownState(_)
        )
    }
}

#[cfg(feature = "python-bindings")]
impl From<Error> for pyo3::PyErr {
    fn from(e: Error) -> Self {
        use pyo3::exceptions::PyValueError;
        use pyo3::PyErr;
        PyErr::new::<PyValueError, _>(e.to_string())
    }
}
