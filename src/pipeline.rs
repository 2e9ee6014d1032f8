//! The full reduction of a raw automaton to its minimal DFA.

use tracing::{info, info_span};

use crate::automaton::{Automaton, StateId};
use crate::{Error, Result};

/// The stages of the reduction, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SubsetConstruction,
    Completion,
    DeadStateNormalization,
    ReachabilityPruning,
    Minimization,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::SubsetConstruction => "subset construction",
            Stage::Completion => "completion",
            Stage::DeadStateNormalization => "dead state normalization",
            Stage::ReachabilityPruning => "reachability pruning",
            Stage::Minimization => "minimization",
        };
        f.write_str(name)
    }
}

/// Every intermediate automaton of one run of [`Automaton::canonical_minimal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Output of subset construction, `None` if the input was deterministic.
    pub determinized: Option<Automaton>,
    pub completed: Automaton,
    pub normalized: Automaton,
    pub pruned: Automaton,
    /// States dropped by pruning, in their original order.
    pub removed_states: Vec<StateId>,
    pub minimal: Automaton,
}

impl PipelineReport {
    pub fn stages(&self) -> Vec<(Stage, &Automaton)> {
        let mut stages = Vec::with_capacity(5);
        if let Some(determinized) = &self.determinized {
            stages.push((Stage::SubsetConstruction, determinized));
        }
        stages.push((Stage::Completion, &self.completed));
        stages.push((Stage::DeadStateNormalization, &self.normalized));
        stages.push((Stage::ReachabilityPruning, &self.pruned));
        stages.push((Stage::Minimization, &self.minimal));
        stages
    }
}

impl Automaton {
    /// Determinizes (if needed), completes, normalizes dead states, prunes
    /// unreachable states and minimizes. `self` is left untouched.
    ///
    /// A non-deterministic input has its dead states normalized before subset
    /// construction, so a subset is never accepting through a dead member.
    pub fn canonical_minimal(&self) -> Result<PipelineReport> {
        if self.states.is_empty() {
            return Err(Error::EmptyAutomaton);
        }

        let determinized = if self.is_deterministic() {
            None
        } else {
            let _span = info_span!("stage", name = %Stage::SubsetConstruction).entered();
            Some(self.clone().dead_state_normalize().convert_to_dfa()?)
        };
        let source = determinized.clone().unwrap_or_else(|| self.clone());

        let completed = {
            let _span = info_span!("stage", name = %Stage::Completion).entered();
            source.complete_dfa()?
        };
        let normalized = {
            let _span = info_span!("stage", name = %Stage::DeadStateNormalization).entered();
            let normalized = completed.clone().dead_state_normalize();
            normalized.validate()?;
            normalized
        };
        let (pruned, removed_states) = {
            let _span = info_span!("stage", name = %Stage::ReachabilityPruning).entered();
            if normalized.has_unreachable_states() {
                let pruned = normalized.clone().remove_unreachable_states();
                let removed = normalized
                    .states
                    .iter()
                    .filter(|s| !pruned.contains_state(s))
                    .cloned()
                    .collect();
                (pruned, removed)
            } else {
                (normalized.clone(), Vec::new())
            }
        };
        let minimal = {
            let _span = info_span!("stage", name = %Stage::Minimization).entered();
            pruned.minimize_dfa()?
        };
        info!(
            "Reduced {} states to a minimal DFA with {} states",
            self.states.len(),
            minimal.states.len()
        );

        Ok(PipelineReport {
            determinized,
            completed,
            normalized,
            pruned,
            removed_states,
            minimal,
        })
    }
}
