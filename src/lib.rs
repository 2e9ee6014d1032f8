//! # DFA_Minimizer
//!
//! `dfa_minimizer` crate reduces finite automata to their minimal DFA:
//! subset construction, completion with a sink state, dead state
//! normalization, pruning of unreachable states and Hopcroft style
//! partition refinement.
//!
//! ```
//! use dfa_minimizer::Automaton;
//!
//! let mut nfa = Automaton::new();
//! nfa.set_alphabet(['a', 'b']).set_states(3)?;
//! nfa.set_accepting([2])?;
//! nfa.set_transition(0, 'a', 1)?.set_transition(0, 'a', 2)?;
//! nfa.set_transition(1, 'b', 2)?;
//! assert!(!nfa.is_deterministic());
//!
//! let minimal = nfa.canonical_minimal()?.minimal;
//! assert!(minimal.is_deterministic());
//! assert!(minimal.accepts("a") && minimal.accepts("ab"));
//! # Ok::<(), dfa_minimizer::Error>(())
//! ```

pub mod automaton;
pub mod completion;
pub mod config;
pub mod dead_state;
pub mod error;
pub mod minimize;
pub mod pipeline;
pub mod reachability;
pub mod subset;

pub use automaton::{Automaton, StateId, StateSet, Symbol, TransitionRow};
pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::{PipelineReport, Stage};
pub use subset::state_set_name;

#[cfg(feature = "python-bindings")]
mod python_bindings;

#[cfg(test)]
mod test_util;
