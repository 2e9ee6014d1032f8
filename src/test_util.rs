//! Automata shared by the unit tests of several modules.

use crate::automaton::{Automaton, Symbol};

/// Already minimal DFA over {a,b}: q1 is accepting and q2 is a sink.
pub(crate) fn three_state_dfa() -> Automaton {
    let mut dfa = Automaton::new();
    dfa.set_alphabet(['a', 'b']).set_states(3).unwrap();
    dfa.set_accepting([1]).unwrap();
    for (from, symbol, to) in [
        (0, 'a', 1),
        (0, 'b', 2),
        (1, 'a', 1),
        (1, 'b', 2),
        (2, 'a', 2),
        (2, 'b', 2),
    ] {
        dfa.set_transition(from, symbol, to).unwrap();
    }
    dfa
}

/// q1 and q2 are non-accepting and both move to the accepting q3 on every
/// symbol, so they are equivalent.
pub(crate) fn mergeable_dfa() -> Automaton {
    let mut dfa = Automaton::new();
    dfa.set_alphabet(['a', 'b']).set_states(4).unwrap();
    dfa.set_accepting([3]).unwrap();
    for (from, symbol, to) in [
        (0, 'a', 1),
        (0, 'b', 2),
        (1, 'a', 3),
        (1, 'b', 3),
        (2, 'a', 3),
        (2, 'b', 3),
        (3, 'a', 3),
        (3, 'b', 3),
    ] {
        dfa.set_transition(from, symbol, to).unwrap();
    }
    dfa
}

/// NFA with the ambiguous pair q0 -a-> {q1,q2}.
pub(crate) fn ambiguous_nfa() -> Automaton {
    let mut nfa = Automaton::new();
    nfa.set_alphabet(['a', 'b']).set_states(3).unwrap();
    nfa.set_accepting([1]).unwrap();
    nfa.set_transition(0, 'a', 1).unwrap();
    nfa.set_transition(0, 'a', 2).unwrap();
    nfa.set_transition(2, 'b', 1).unwrap();
    nfa
}

/// NFA for words over {a,b} whose second to last symbol is `a`.
pub(crate) fn second_to_last_a_nfa() -> Automaton {
    let mut nfa = Automaton::new();
    nfa.set_alphabet(['a', 'b']).set_states(3).unwrap();
    nfa.set_accepting([2]).unwrap();
    for (from, symbol, to) in [(0, 'a', 0), (0, 'b', 0), (0, 'a', 1), (1, 'a', 2), (1, 'b', 2)] {
        nfa.set_transition(from, symbol, to).unwrap();
    }
    nfa
}

/// All words over `alphabet` of length at most `max_len`.
pub(crate) fn words_up_to(alphabet: &[Symbol], max_len: usize) -> Vec<String> {
    let mut words = vec![String::new()];
    let mut frontier = vec![String::new()];
    for _ in 0..max_len {
        frontier = frontier
            .iter()
            .flat_map(|word| {
                alphabet.iter().map(move |symbol| {
                    let mut next = word.clone();
                    next.push(*symbol);
                    next
                })
            })
            .collect();
        words.extend(frontier.iter().cloned());
    }
    words
}
