//! Hopcroft style partition refinement producing the minimal DFA.
//!
//! The refinement runs on a dense copy of the automaton in which states and
//! symbols are replaced by their indices. Blocks are sets of state indices;
//! the minimal automaton is rebuilt from the final partition.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use rustc_hash::FxHashMap as HashMap;
use tracing::{debug, info, trace};

use crate::automaton::{Automaton, StateId, StateSet, Symbol, Transitions};
use crate::{Error, Result};

type Block = BTreeSet<usize>;

/// Index based view of a complete DFA.
struct DenseDfa {
    symbols: Vec<Symbol>,
    // delta[state][symbol]
    delta: Vec<Vec<usize>>,
    accepting: Vec<bool>,
    start: usize,
}

impl DenseDfa {
    fn new(dfa: &Automaton) -> Result<Self> {
        let index: HashMap<&str, usize> = dfa
            .states
            .iter()
            .enumerate()
            .map(|(i, state)| (state.as_str(), i))
            .collect();
        let symbols: Vec<Symbol> = dfa.alphabet.iter().copied().collect();
        let delta = dfa
            .states
            .iter()
            .map(|state| {
                symbols
                    .iter()
                    .map(|&symbol| {
                        let dest = dfa.next_state(state, symbol).ok_or_else(|| {
                            Error::InvariantViolation(format!(
                                "{state} has no transition on {symbol:?}"
                            ))
                        })?;
                        index
                            .get(dest)
                            .copied()
                            .ok_or_else(|| Error::UnknownState(dest.to_string()))
                    })
                    .collect::<Result<Vec<usize>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        let accepting = dfa
            .states
            .iter()
            .map(|state| dfa.accepting_states.contains(state))
            .collect();
        let start = index
            .get(dfa.start_state.as_str())
            .copied()
            .ok_or_else(|| Error::UnknownState(dfa.start_state.clone()))?;
        Ok(Self {
            symbols,
            delta,
            accepting,
            start,
        })
    }

    fn num_states(&self) -> usize {
        self.delta.len()
    }

    /// Marks the states whose successor on `symbol` lies in `target`.
    fn preimage(&self, target: &[bool], symbol: usize) -> Vec<bool> {
        self.delta.iter().map(|row| target[row[symbol]]).collect()
    }

    /// Computes the coarsest partition of the states that is stable under
    /// every symbol and separates accepting from rejecting states.
    fn refine(&self, parallel: bool) -> Vec<Block> {
        let (accepting, rejecting): (Block, Block) =
            (0..self.num_states()).partition(|&s| self.accepting[s]);

        let mut worklist: Vec<Block> = Vec::new();
        if !accepting.is_empty() && accepting.len() <= rejecting.len() {
            worklist.push(accepting.clone());
        } else if !rejecting.is_empty() {
            worklist.push(rejecting.clone());
        }
        let mut partition: Vec<Block> = [accepting, rejecting]
            .into_iter()
            .filter(|block| !block.is_empty())
            .collect();

        while let Some(splitter) = worklist.pop() {
            let mut target = vec![false; self.num_states()];
            for &s in &splitter {
                target[s] = true;
            }
            // pre-images depend only on the splitter; partition updates stay sequential
            let preimages: Vec<Vec<bool>> = if parallel {
                (0..self.symbols.len())
                    .into_par_iter()
                    .map(|symbol| self.preimage(&target, symbol))
                    .collect()
            } else {
                (0..self.symbols.len())
                    .map(|symbol| self.preimage(&target, symbol))
                    .collect()
            };

            for (symbol, preimage) in self.symbols.iter().zip(preimages) {
                let mut next_partition = Vec::with_capacity(partition.len());
                let mut splits: Vec<(Block, Block, Block)> = Vec::new();
                for block in partition {
                    let (inside, outside): (Block, Block) =
                        block.iter().copied().partition(|&s| preimage[s]);
                    if inside.is_empty() || outside.is_empty() {
                        next_partition.push(block);
                    } else {
                        trace!("splitting {block:?} on {symbol:?} into {inside:?} and {outside:?}");
                        next_partition.push(inside.clone());
                        next_partition.push(outside.clone());
                        splits.push((block, inside, outside));
                    }
                }
                partition = next_partition;

                for (block, inside, outside) in splits {
                    if let Some(pos) = worklist.iter().position(|b| *b == block) {
                        worklist.remove(pos);
                        worklist.push(inside);
                        worklist.push(outside);
                    } else if inside.len() <= outside.len() {
                        worklist.push(inside);
                    } else {
                        worklist.push(outside);
                    }
                }
            }
        }
        debug!("refinement finished with {} blocks", partition.len());
        partition
    }
}

impl Automaton {
    /// Returns the minimal DFA equivalent to `self`.
    ///
    /// Dead states are normalized first, so a dead state never makes a block
    /// accepting. A non-deterministic automaton is then determinized, and the
    /// result is completed before refinement. Unreachable states are not removed. When
    /// no two states are equivalent, the completed automaton is returned with
    /// its state names unchanged; otherwise states are renamed with the
    /// configured prefix, the block of the start state getting index 0.
    pub fn minimize_dfa(&self) -> Result<Automaton> {
        let (dfa, dense, partition) = self.refined()?;
        if partition.len() == dfa.states.len() {
            info!("The DFA is already minimized");
            return Ok(dfa);
        }
        let minimized = rebuild(&dfa, &dense, &partition);
        info!(
            "Minimized DFA from {} to {} states",
            dfa.states.len(),
            minimized.states.len()
        );
        Ok(minimized)
    }

    /// The classes of equivalent states of the completed DFA of `self`, in
    /// the order the refinement produced them.
    pub fn equivalence_classes(&self) -> Result<Vec<StateSet>> {
        let (dfa, _, partition) = self.refined()?;
        Ok(partition
            .iter()
            .map(|block| block.iter().map(|&s| dfa.states[s].clone()).collect())
            .collect())
    }

    fn refined(&self) -> Result<(Automaton, DenseDfa, Vec<Block>)> {
        if self.states.is_empty() {
            return Err(Error::EmptyAutomaton);
        }
        let normalized = self.clone().dead_state_normalize();
        let dfa = if normalized.is_deterministic {
            normalized
        } else {
            debug!("determinizing before minimization");
            normalized.convert_to_dfa()?
        };
        let dfa = dfa.complete_dfa()?;
        let dense = DenseDfa::new(&dfa)?;
        let partition = dense.refine(self.config.get_parallel_refinement());
        Ok((dfa, dense, partition))
    }
}

fn rebuild(dfa: &Automaton, dense: &DenseDfa, partition: &[Block]) -> Automaton {
    let ordered: Vec<&Block> = partition
        .iter()
        .filter(|block| block.contains(&dense.start))
        .chain(partition.iter().filter(|block| !block.contains(&dense.start)))
        .collect();
    let prefix = dfa.config.get_minimized_prefix();
    let names: Vec<StateId> = (0..ordered.len())
        .map(|i| format!("{prefix}{i}"))
        .collect();
    let mut block_of = vec![0; dense.num_states()];
    for (i, block) in ordered.iter().enumerate() {
        for &s in block.iter() {
            block_of[s] = i;
        }
    }

    let mut accepting_states = BTreeSet::new();
    let mut dead_states = BTreeSet::new();
    let mut transitions: Transitions = HashMap::default();
    for (i, block) in ordered.iter().enumerate() {
        let Some(&representative) = block.first() else {
            continue;
        };
        if block.iter().any(|&s| dense.accepting[s]) {
            accepting_states.insert(names[i].clone());
        }
        if block
            .iter()
            .all(|&s| dfa.dead_states.contains(&dfa.states[s]))
        {
            dead_states.insert(names[i].clone());
        }
        let symbol_map: BTreeMap<Symbol, StateSet> = dense
            .symbols
            .iter()
            .zip(&dense.delta[representative])
            .map(|(&symbol, &dest)| (symbol, BTreeSet::from([names[block_of[dest]].clone()])))
            .collect();
        transitions.insert(names[i].clone(), symbol_map);
    }

    Automaton {
        alphabet: dfa.alphabet.clone(),
        start_state: names[0].clone(),
        states: names,
        accepting_states,
        dead_states,
        transitions,
        is_deterministic: true,
        config: dfa.config.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::test_util::{
        mergeable_dfa, second_to_last_a_nfa, three_state_dfa, words_up_to,
    };

    fn dead_pair(both_dead: bool) -> Automaton {
        let mut dfa = Automaton::new();
        dfa.set_alphabet(['a']).set_states(4).unwrap();
        dfa.set_accepting([1]).unwrap();
        if both_dead {
            dfa.set_dead([2, 3]).unwrap();
        } else {
            dfa.set_dead([2]).unwrap();
        }
        dfa.set_transition(0, 'a', 1).unwrap();
        dfa.set_transition(1, 'a', 2).unwrap();
        dfa.set_transition(3, 'a', 3).unwrap();
        dfa.dead_state_normalize()
    }

    #[test_log::test]
    fn minimal_dfa_keeps_its_states() {
        let dfa = three_state_dfa();
        let minimized = dfa.minimize_dfa().unwrap();
        assert_eq!(minimized.num_states(), 3);
        assert_eq!(minimized, dfa);
    }

    #[test_log::test]
    fn equivalent_states_are_merged() {
        let dfa = mergeable_dfa();
        let minimized = dfa.minimize_dfa().unwrap();
        assert_eq!(minimized.states(), ["Q0", "Q1", "Q2"]);
        assert_eq!(minimized.start_state(), "Q0");
        assert_eq!(minimized.accepting_states().len(), 1);
        assert!(minimized.is_accepting_state("Q1"));
        assert_eq!(minimized.next_state("Q0", 'a'), Some("Q2"));
        assert_eq!(minimized.next_state("Q0", 'b'), Some("Q2"));
        assert_eq!(minimized.next_state("Q2", 'a'), Some("Q1"));
        assert_eq!(minimized.next_state("Q1", 'b'), Some("Q1"));
        for word in words_up_to(&['a', 'b'], 5) {
            assert_eq!(dfa.accepts(&word), minimized.accepts(&word), "word {word:?}");
        }
        // the source automaton is left as it was
        assert_eq!(dfa, mergeable_dfa());
    }

    #[test]
    fn classes_group_equivalent_states() {
        let classes = mergeable_dfa().equivalence_classes().unwrap();
        let merged: StateSet = ["q1", "q2"].iter().map(|s| s.to_string()).collect();
        assert_eq!(classes.len(), 3);
        assert!(classes.contains(&merged));
    }

    #[test]
    fn minimization_reaches_a_fixed_point() {
        let minimized = mergeable_dfa().minimize_dfa().unwrap();
        let classes = minimized.equivalence_classes().unwrap();
        assert_eq!(classes.len(), minimized.num_states());
        assert_eq!(minimized.minimize_dfa().unwrap(), minimized);
    }

    #[test]
    fn nfa_is_determinized_and_completed_first() {
        let nfa = second_to_last_a_nfa();
        let minimized = nfa.minimize_dfa().unwrap();
        assert!(minimized.is_deterministic());
        assert!(minimized.is_complete());
        assert_eq!(minimized.num_states(), 4);
        for word in words_up_to(&['a', 'b'], 6) {
            assert_eq!(nfa.accepts(&word), minimized.accepts(&word), "word {word:?}");
        }
    }

    #[test]
    fn partial_dfa_is_completed_first() {
        let mut dfa = Automaton::new();
        dfa.set_alphabet(['a', 'b']).set_states(2).unwrap();
        dfa.set_accepting([1]).unwrap();
        dfa.set_transition(0, 'a', 1).unwrap();
        let minimized = dfa.minimize_dfa().unwrap();
        assert!(minimized.is_complete());
        assert_eq!(minimized.num_states(), 3);
        assert!(minimized.is_dead_state("qd"));
    }

    #[test]
    fn dead_blocks_need_only_dead_members() {
        let minimized = dead_pair(true).minimize_dfa().unwrap();
        assert_eq!(minimized.states(), ["Q0", "Q1", "Q2"]);
        assert!(minimized.is_accepting_state("Q1"));
        assert!(minimized.is_dead_state("Q2"));
        assert!(minimized.self_loops("Q2"));
        assert_eq!(minimized.next_state("Q0", 'a'), Some("Q1"));
        assert_eq!(minimized.next_state("Q1", 'a'), Some("Q2"));

        let minimized = dead_pair(false).minimize_dfa().unwrap();
        assert_eq!(minimized.num_states(), 3);
        assert!(minimized.dead_states().is_empty());
    }

    #[test]
    fn accepting_dead_state_never_accepts() {
        let mut dfa = Automaton::new();
        dfa.set_alphabet(['a']).set_states(3).unwrap();
        dfa.set_accepting([2]).unwrap();
        dfa.set_dead([2]).unwrap();
        dfa.set_transition(0, 'a', 2).unwrap();
        let mut nfa = dfa.clone();
        nfa.set_transition(0, 'a', 1).unwrap();
        assert!(!nfa.is_deterministic());

        for automaton in [dfa, nfa] {
            let minimized = automaton.minimize_dfa().unwrap();
            assert!(!minimized.accepts("a"));
            assert!(minimized.accepting_states().is_empty());
            assert!(minimized
                .dead_states()
                .is_disjoint(minimized.accepting_states()));
            minimized.validate().unwrap();
        }
    }

    #[test]
    fn parallel_and_sequential_refinement_agree() {
        for automaton in [mergeable_dfa(), second_to_last_a_nfa(), three_state_dfa()] {
            let mut sequential = automaton.clone();
            sequential.config = Config::new().parallel_refinement(false);
            let sequential = sequential.minimize_dfa().unwrap();
            let parallel = automaton.minimize_dfa().unwrap();
            assert_eq!(sequential.states(), parallel.states());
            assert_eq!(sequential.transitions(), parallel.transitions());
            assert_eq!(sequential.accepting_states(), parallel.accepting_states());
        }
    }

    #[test]
    fn prefix_follows_config() {
        let mut dfa = mergeable_dfa();
        dfa.config = Config::new().minimized_prefix("M");
        let minimized = dfa.minimize_dfa().unwrap();
        assert_eq!(minimized.states(), ["M0", "M1", "M2"]);
    }

    #[test]
    fn empty_automaton_is_rejected() {
        assert_eq!(
            Automaton::new().minimize_dfa().unwrap_err(),
            Error::EmptyAutomaton
        );
    }

    #[test]
    fn single_block_collapses() {
        let mut dfa = Automaton::new();
        dfa.set_alphabet(['a']).set_states(3).unwrap();
        for (from, to) in [(0, 1), (1, 2), (2, 0)] {
            dfa.set_transition(from, 'a', to).unwrap();
        }
        let minimized = dfa.minimize_dfa().unwrap();
        assert_eq!(minimized.states(), ["Q0"]);
        assert!(minimized.accepting_states().is_empty());
        assert_eq!(minimized.next_state("Q0", 'a'), Some("Q0"));
    }
}
