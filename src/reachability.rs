//! Pruning of states that cannot be reached from the start state.

use std::collections::VecDeque;

use rustc_hash::FxHashSet as HashSet;
use tracing::{debug, info};

use crate::automaton::{Automaton, StateId, Transitions};

impl Automaton {
    /// States reachable from the start state, found by breadth-first search.
    pub fn reachable_states(&self) -> HashSet<StateId> {
        let mut seen: HashSet<StateId> = HashSet::default();
        if !self.contains_state(&self.start_state) {
            return seen;
        }
        seen.insert(self.start_state.clone());
        let mut queue: VecDeque<&str> = VecDeque::from([self.start_state.as_str()]);
        while let Some(current) = queue.pop_front() {
            for &symbol in &self.alphabet {
                for next in self.raw_destinations(current, symbol) {
                    if seen.insert(next.clone()) {
                        queue.push_back(next);
                    }
                }
            }
        }
        seen
    }

    pub fn has_unreachable_states(&self) -> bool {
        self.reachable_states().len() != self.states.len()
    }

    /// Restricts the automaton to the states reachable from the start state.
    pub fn remove_unreachable_states(mut self) -> Automaton {
        let reachable = self.reachable_states();
        if reachable.len() == self.states.len() {
            debug!("all {} states are reachable", reachable.len());
            return self;
        }
        self.states.retain(|s| reachable.contains(s));
        self.accepting_states.retain(|s| reachable.contains(s));
        self.dead_states.retain(|s| reachable.contains(s));

        let transitions: Transitions = std::mem::take(&mut self.transitions)
            .into_iter()
            .filter(|(state, _)| reachable.contains(state))
            .map(|(state, mut symbol_map)| {
                for destinations in symbol_map.values_mut() {
                    destinations.retain(|d| reachable.contains(d));
                }
                symbol_map.retain(|_, destinations| !destinations.is_empty());
                (state, symbol_map)
            })
            .filter(|(_, symbol_map)| !symbol_map.is_empty())
            .collect();
        self.transitions = transitions;
        self.refresh_determinism();

        info!(
            "Removed unreachable states. Remaining states: {}",
            self.states.join(" ")
        );
        self
    }
}
