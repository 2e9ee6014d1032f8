//! Subset (powerset) construction turning a non-deterministic automaton into
//! an equivalent deterministic one.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use rustc_hash::FxHashMap as HashMap;
use tracing::{debug, info, trace};

use crate::automaton::{Automaton, StateId, StateSet, Transitions};
use crate::{Error, Result};

/// Canonical name of a set of states: the members in sorted order, separated
/// by commas and enclosed in braces. Equal sets always get equal names.
pub fn state_set_name(set: &StateSet) -> StateId {
    let members: Vec<&str> = set.iter().map(String::as_str).collect();
    format!("{{{}}}", members.join(","))
}

impl Automaton {
    /// Builds the deterministic automaton whose states are the sets of states
    /// reachable from `{start}`.
    ///
    /// Pairs whose union of destinations is empty get no transition, so the
    /// result may be partial; run [`Automaton::complete_dfa`] before anything
    /// that needs a total transition function.
    pub fn convert_to_dfa(&self) -> Result<Automaton> {
        if self.alphabet.is_empty() || self.states.is_empty() {
            return Err(Error::EmptyAutomaton);
        }
        let initial: StateSet = BTreeSet::from([self.start_state.clone()]);
        let initial_name = state_set_name(&initial);

        let mut visited: HashMap<StateId, StateSet> = HashMap::default();
        visited.insert(initial_name.clone(), initial.clone());
        let mut queue: VecDeque<StateSet> = VecDeque::from([initial]);
        let mut states: Vec<StateId> = vec![initial_name.clone()];
        let mut accepting_states: BTreeSet<StateId> = BTreeSet::new();
        let mut dead_states: BTreeSet<StateId> = BTreeSet::new();
        let mut transitions: Transitions = HashMap::default();

        while let Some(current) = queue.pop_front() {
            let current_name = state_set_name(&current);
            if current.iter().any(|s| self.accepting_states.contains(s)) {
                accepting_states.insert(current_name.clone());
            }
            if current.iter().all(|s| self.dead_states.contains(s)) {
                dead_states.insert(current_name.clone());
            }
            let mut symbol_map = BTreeMap::new();
            for &symbol in &self.alphabet {
                let union: StateSet = current
                    .iter()
                    .flat_map(|s| self.raw_destinations(s, symbol).iter().cloned())
                    .collect();
                if union.is_empty() {
                    trace!("{current_name} has no successor on {symbol:?}");
                    continue;
                }
                let name = state_set_name(&union);
                match visited.get(&name) {
                    Some(known) if *known != union => {
                        return Err(Error::InvariantViolation(format!(
                            "state set name {name} is shared by different sets"
                        )));
                    }
                    Some(_) => {}
                    None => {
                        debug!("discovered subset {name}");
                        visited.insert(name.clone(), union.clone());
                        states.push(name.clone());
                        queue.push_back(union);
                    }
                }
                symbol_map.insert(symbol, BTreeSet::from([name]));
            }
            if !symbol_map.is_empty() {
                transitions.insert(current_name, symbol_map);
            }
        }
        info!(
            "Subset construction produced {} states from {}",
            states.len(),
            self.states.len()
        );

        Ok(Automaton {
            alphabet: self.alphabet.clone(),
            states,
            start_state: initial_name,
            accepting_states,
            dead_states,
            transitions,
            is_deterministic: true,
            config: self.config.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{ambiguous_nfa, second_to_last_a_nfa, words_up_to};

    #[test]
    fn names_are_sorted_members() {
        let set: StateSet = ["q2", "q10", "q1"].iter().map(|s| s.to_string()).collect();
        assert_eq!(state_set_name(&set), "{q1,q10,q2}");
        assert_eq!(state_set_name(&StateSet::new()), "{}");
    }

    #[test_log::test]
    fn ambiguous_pair_becomes_a_set_state() {
        let nfa = ambiguous_nfa();
        assert!(!nfa.is_deterministic());
        let dfa = nfa.convert_to_dfa().unwrap();
        assert!(dfa.is_deterministic());
        assert_eq!(dfa.states(), ["{q0}", "{q1,q2}", "{q1}"]);
        assert_eq!(dfa.start_state(), "{q0}");
        assert_eq!(dfa.next_state("{q0}", 'a'), Some("{q1,q2}"));
        assert_eq!(dfa.next_state("{q0}", 'b'), None);
        assert_eq!(dfa.next_state("{q1,q2}", 'b'), Some("{q1}"));
        assert!(dfa.is_accepting_state("{q1,q2}"));
        assert!(dfa.is_accepting_state("{q1}"));
        assert!(!dfa.is_accepting_state("{q0}"));
        assert!(!dfa.is_complete());
    }

    #[test]
    fn construction_is_reproducible() {
        let nfa = second_to_last_a_nfa();
        let first = nfa.convert_to_dfa().unwrap();
        let second = nfa.convert_to_dfa().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.states(), second.states());
        assert_eq!(first.num_states(), 4);
    }

    #[test]
    fn language_is_preserved() {
        let nfa = second_to_last_a_nfa();
        let dfa = nfa.convert_to_dfa().unwrap();
        for word in words_up_to(&['a', 'b'], 6) {
            assert_eq!(nfa.accepts(&word), dfa.accepts(&word), "word {word:?}");
        }
        assert!(dfa.accepts("bab"));
        assert!(!dfa.accepts("abb"));
    }

    #[test]
    fn sets_of_dead_states_stay_dead() {
        let mut nfa = Automaton::new();
        nfa.set_alphabet(['a']).set_states(2).unwrap();
        nfa.set_transition(0, 'a', 1).unwrap();
        nfa.set_dead_transition(1, 'a').unwrap();
        let dfa = nfa.convert_to_dfa().unwrap();
        assert_eq!(dfa.states(), ["{q0}", "{q1}", "{qd}"]);
        assert!(dfa.is_dead_state("{qd}"));
        assert!(!dfa.is_dead_state("{q1}"));
    }

    #[test]
    fn degenerate_automata_are_rejected() {
        assert_eq!(
            Automaton::new().convert_to_dfa().unwrap_err(),
            Error::EmptyAutomaton
        );
        let mut no_symbols = Automaton::new();
        no_symbols.set_states(2).unwrap();
        assert_eq!(no_symbols.convert_to_dfa().unwrap_err(), Error::EmptyAutomaton);
    }
}
