//! Normalization of designated dead states.

use std::collections::BTreeSet;

use tracing::info;

use crate::automaton::Automaton;

impl Automaton {
    /// Re-establishes the dead state invariants: a dead state is never
    /// accepting, and it moves to itself on every symbol. Transitions recorded
    /// earlier for a dead state are overwritten.
    pub fn dead_state_normalize(mut self) -> Automaton {
        let conflicting: Vec<_> = self
            .dead_states
            .intersection(&self.accepting_states)
            .cloned()
            .collect();
        for state in conflicting {
            info!("Removing dead state '{state}' from accepting states");
            self.accepting_states.remove(&state);
        }

        for dead in &self.dead_states {
            let self_loops = self
                .alphabet
                .iter()
                .map(|symbol| (*symbol, BTreeSet::from([dead.clone()])))
                .collect();
            self.transitions.insert(dead.clone(), self_loops);
        }
        self.refresh_determinism();
        if !self.dead_states.is_empty() {
            info!(
                "Dead state transitions now loop back to themselves: {:?}",
                self.dead_states
            );
        }
        self
    }

    /// Returns `true` if `state` moves to itself, and only itself, on every symbol.
    pub fn self_loops(&self, state: &str) -> bool {
        self.alphabet.iter().all(|symbol| {
            let destinations = self.raw_destinations(state, *symbol);
            destinations.len() == 1 && destinations.contains(state)
        })
    }
}
