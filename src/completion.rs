//! Completion of the transition function with a sink state.

use tracing::{debug, info};

use crate::automaton::Automaton;
use crate::Result;

impl Automaton {
    /// Makes every `(state, symbol)` pair defined by routing the undefined
    /// ones to the sink state. No sink is added when the automaton is already
    /// complete, so running this twice is the same as running it once.
    ///
    /// Fails with `InvariantViolation` if the configured sink name belongs to
    /// a state that is not a sink.
    pub fn complete_dfa(mut self) -> Result<Automaton> {
        if self.is_complete() {
            debug!("automaton is already complete");
            return Ok(self);
        }
        let existed = self.contains_state(self.config.get_sink_state());
        let sink = self.ensure_sink_state()?;
        if !existed {
            self.dead_states.insert(sink.clone());
        }
        if self.accepting_states.remove(&sink) {
            info!("Removing sink state '{sink}' from accepting states");
        }

        let mut filled = 0usize;
        for state in &self.states {
            let symbol_map = self.transitions.entry(state.clone()).or_default();
            for &symbol in &self.alphabet {
                let destinations = symbol_map.entry(symbol).or_default();
                if destinations.is_empty() {
                    destinations.insert(sink.clone());
                    filled += 1;
                }
            }
        }
        debug!("routed {filled} undefined transitions to {sink}");
        Ok(self)
    }

    /// Returns `true` if completion would add the sink state.
    pub fn needs_sink_state(&self) -> bool {
        !self.is_complete() && !self.contains_state(self.config.get_sink_state())
    }
}
