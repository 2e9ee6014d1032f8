//! The finite automaton model shared by every stage of the pipeline.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap as HashMap;
use tracing::{debug, info};

use crate::config::Config;
use crate::{Error, Result};

// define type alias for symbols, state names and sets of states
pub type Symbol = char;
pub type StateId = String;
pub type StateSet = BTreeSet<StateId>;
pub type Transitions = HashMap<StateId, BTreeMap<Symbol, StateSet>>;

static NO_DESTINATIONS: StateSet = BTreeSet::new();

/// A (possibly non-deterministic) finite automaton.
///
/// States are kept in insertion order, which is also the order in which they
/// are displayed and exported. A pair `(state, symbol)` maps to a set of
/// destinations; an automaton in which some pair has more than one
/// destination is non-deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Automaton {
    pub(crate) alphabet: BTreeSet<Symbol>,
    pub(crate) states: Vec<StateId>,
    pub(crate) start_state: StateId,
    pub(crate) accepting_states: BTreeSet<StateId>,
    pub(crate) dead_states: BTreeSet<StateId>,
    pub(crate) transitions: Transitions,
    pub(crate) is_deterministic: bool,
    pub(crate) config: Config,
}

/// One row of the read-only export of an automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRow {
    pub state: StateId,
    pub is_start: bool,
    pub is_accepting: bool,
    pub is_dead: bool,
    /// Destinations per alphabet symbol, in alphabet order. An empty list
    /// means the transition is undefined.
    pub destinations: Vec<(Symbol, Vec<StateId>)>,
}

impl Default for Automaton {
    fn default() -> Self {
        Self::new()
    }
}

impl Automaton {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            alphabet: BTreeSet::new(),
            states: Vec::new(),
            start_state: state_name(0),
            accepting_states: BTreeSet::new(),
            dead_states: BTreeSet::new(),
            transitions: HashMap::default(),
            is_deterministic: true,
            config,
        }
    }

    /// Returns a fresh [`Config`] to be passed to [`Automaton::with_config`].
    pub fn config() -> Config {
        Config::new()
    }

    pub fn get_config(&self) -> &Config {
        &self.config
    }

    // builders

    /// Replaces the alphabet. Transitions on symbols that are no longer part
    /// of the alphabet are dropped, and dead states get a self-loop on every
    /// new symbol.
    pub fn set_alphabet(&mut self, symbols: impl IntoIterator<Item = Symbol>) -> &mut Self {
        self.alphabet = symbols.into_iter().collect();
        let alphabet = &self.alphabet;
        for symbol_map in self.transitions.values_mut() {
            symbol_map.retain(|symbol, _| alphabet.contains(symbol));
        }
        for dead in &self.dead_states {
            let symbol_map = self.transitions.entry(dead.clone()).or_default();
            for &symbol in alphabet {
                symbol_map
                    .entry(symbol)
                    .or_insert_with(|| BTreeSet::from([dead.clone()]));
            }
        }
        self.transitions.retain(|_, symbol_map| !symbol_map.is_empty());
        self.refresh_determinism();
        self
    }

    /// Creates `count` states named `q0..q{count-1}` and makes `q0` the start
    /// state. Accepting states, dead states and transitions are reset.
    pub fn set_states(&mut self, count: usize) -> Result<&mut Self> {
        if count == 0 {
            return Err(Error::EmptyAutomaton);
        }
        self.states = (0..count).map(state_name).collect();
        self.start_state = state_name(0);
        self.accepting_states.clear();
        self.dead_states.clear();
        self.transitions.clear();
        self.is_deterministic = true;
        Ok(self)
    }

    pub fn set_start(&mut self, index: usize) -> Result<&mut Self> {
        self.start_state = self.state_at(index)?.clone();
        Ok(self)
    }

    /// Replaces the accepting set. Nothing is changed if any index is invalid.
    pub fn set_accepting(&mut self, indices: impl IntoIterator<Item = usize>) -> Result<&mut Self> {
        self.accepting_states = self.resolve_indices(indices)?;
        Ok(self)
    }

    /// Replaces the dead set. Nothing is changed if any index is invalid.
    pub fn set_dead(&mut self, indices: impl IntoIterator<Item = usize>) -> Result<&mut Self> {
        self.dead_states = self.resolve_indices(indices)?;
        Ok(self)
    }

    /// Adds `destination` to the destinations of `(state, symbol)`.
    pub fn set_transition(
        &mut self,
        state: usize,
        symbol: Symbol,
        destination: usize,
    ) -> Result<&mut Self> {
        self.check_symbol(symbol)?;
        let from = self.state_at(state)?.clone();
        let to = self.state_at(destination)?.clone();
        let destinations = self
            .transitions
            .entry(from)
            .or_default()
            .entry(symbol)
            .or_default();
        destinations.insert(to);
        if destinations.len() > 1 {
            self.is_deterministic = false;
        }
        Ok(self)
    }

    /// Routes `(state, symbol)` to the sink state, creating it on first use.
    /// Previously recorded destinations of the pair are discarded.
    pub fn set_dead_transition(&mut self, state: usize, symbol: Symbol) -> Result<&mut Self> {
        self.check_symbol(symbol)?;
        let from = self.state_at(state)?.clone();
        let sink = self.ensure_sink_state()?;
        self.dead_states.insert(sink.clone());
        self.transitions
            .entry(from)
            .or_default()
            .insert(symbol, BTreeSet::from([sink]));
        self.refresh_determinism();
        Ok(self)
    }

    // queries

    pub fn is_deterministic(&self) -> bool {
        self.is_deterministic
    }

    /// Returns `true` if every `(state, symbol)` pair has a destination.
    pub fn is_complete(&self) -> bool {
        self.states.iter().all(|state| {
            self.alphabet
                .iter()
                .all(|symbol| !self.raw_destinations(state, *symbol).is_empty())
        })
    }

    pub fn alphabet(&self) -> &BTreeSet<Symbol> {
        &self.alphabet
    }

    pub fn states(&self) -> &[StateId] {
        &self.states
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn start_state(&self) -> &str {
        &self.start_state
    }

    pub fn accepting_states(&self) -> &BTreeSet<StateId> {
        &self.accepting_states
    }

    pub fn dead_states(&self) -> &BTreeSet<StateId> {
        &self.dead_states
    }

    pub fn transitions(&self) -> &Transitions {
        &self.transitions
    }

    pub fn is_start_state(&self, state: &str) -> bool {
        state == self.start_state
    }

    pub fn is_accepting_state(&self, state: &str) -> bool {
        self.accepting_states.contains(state)
    }

    pub fn is_dead_state(&self, state: &str) -> bool {
        self.dead_states.contains(state)
    }

    pub fn contains_state(&self, state: &str) -> bool {
        self.states.iter().any(|s| s == state)
    }

    pub fn destinations(&self, state: &str, symbol: Symbol) -> Result<&StateSet> {
        if !self.contains_state(state) {
            return Err(Error::UnknownState(state.to_string()));
        }
        self.check_symbol(symbol)?;
        Ok(self.raw_destinations(state, symbol))
    }

    /// The single successor of `state` on `symbol` in a deterministic automaton.
    pub fn next_state(&self, state: &str, symbol: Symbol) -> Option<&str> {
        Some(
            self.transitions
                .get(state)?
                .get(&symbol)?
                .iter()
                .next()?
                .as_str(),
        )
    }

    /// Runs a deterministic automaton on `word` and returns the visited states,
    /// starting with the start state. Returns `None` as soon as a transition
    /// is missing.
    pub fn state_sequence(&self, word: &str) -> Option<Vec<StateId>> {
        let mut state = self.start_state.as_str();
        let mut seq = vec![state.to_string()];
        for symbol in word.chars() {
            state = self.next_state(state, symbol)?;
            seq.push(state.to_string());
        }
        Some(seq)
    }

    /// Returns `true` if some run on `word` ends in an accepting state.
    pub fn accepts(&self, word: &str) -> bool {
        if !self.contains_state(&self.start_state) {
            return false;
        }
        let mut current: BTreeSet<&str> = BTreeSet::from([self.start_state.as_str()]);
        for symbol in word.chars() {
            current = current
                .iter()
                .flat_map(|state| self.raw_destinations(state, symbol).iter())
                .map(String::as_str)
                .collect();
            if current.is_empty() {
                return false;
            }
        }
        current
            .iter()
            .any(|state| self.accepting_states.contains(*state))
    }

    /// Checks the structural invariants every stage relies on.
    pub fn validate(&self) -> Result<()> {
        let violation = |msg: String| Err(Error::InvariantViolation(msg));
        if !self.states.is_empty() && !self.contains_state(&self.start_state) {
            return violation(format!("start state {} is not a state", self.start_state));
        }
        for state in self.accepting_states.iter().chain(self.dead_states.iter()) {
            if !self.contains_state(state) {
                return violation(format!("{state} is marked but not a state"));
            }
        }
        if let Some(state) = self.dead_states.intersection(&self.accepting_states).next() {
            return violation(format!("dead state {state} is accepting"));
        }
        if let Some(state) = self.dead_states.iter().find(|s| !self.self_loops(s)) {
            return violation(format!("dead state {state} does not loop on itself"));
        }
        for (state, symbol_map) in &self.transitions {
            for destination in symbol_map.values().flatten() {
                if !self.contains_state(destination) {
                    return violation(format!("{state} targets unknown state {destination}"));
                }
            }
        }
        Ok(())
    }

    /// Read-only export of the automaton, one row per state in state order.
    pub fn table(&self) -> Vec<TransitionRow> {
        self.states
            .iter()
            .map(|state| TransitionRow {
                state: state.clone(),
                is_start: self.is_start_state(state),
                is_accepting: self.is_accepting_state(state),
                is_dead: self.is_dead_state(state),
                destinations: self
                    .alphabet
                    .iter()
                    .map(|symbol| {
                        let dests = self.raw_destinations(state, *symbol);
                        (*symbol, dests.iter().cloned().collect())
                    })
                    .collect(),
            })
            .collect()
    }

    // helpers shared by the stages

    pub(crate) fn raw_destinations(&self, state: &str, symbol: Symbol) -> &StateSet {
        self.transitions
            .get(state)
            .and_then(|symbol_map| symbol_map.get(&symbol))
            .unwrap_or(&NO_DESTINATIONS)
    }

    /// Recomputes the determinism flag from the transition relation.
    pub(crate) fn refresh_determinism(&mut self) {
        self.is_deterministic = self
            .transitions
            .values()
            .flat_map(|symbol_map| symbol_map.values())
            .all(|destinations| destinations.len() <= 1);
    }

    /// Returns the name of the sink state, appending it to the states with a
    /// self-loop on every symbol if it does not exist yet.
    ///
    /// An existing state with the sink's name is only reused if it is dead,
    /// or if it is a rejecting state that loops on itself on every symbol.
    pub(crate) fn ensure_sink_state(&mut self) -> Result<StateId> {
        let sink = self.config.get_sink_state().to_string();
        if self.contains_state(&sink) {
            let is_sink = self.dead_states.contains(&sink)
                || (self.self_loops(&sink) && !self.accepting_states.contains(&sink));
            if !is_sink {
                return Err(Error::InvariantViolation(format!(
                    "sink state name {sink} belongs to a live state"
                )));
            }
        } else {
            debug!("creating sink state {sink}");
            self.states.push(sink.clone());
            let self_loops = self
                .alphabet
                .iter()
                .map(|symbol| (*symbol, BTreeSet::from([sink.clone()])))
                .collect();
            self.transitions.insert(sink.clone(), self_loops);
            info!("Added sink state '{sink}' for undefined transitions");
        }
        Ok(sink)
    }

    fn state_at(&self, index: usize) -> Result<&StateId> {
        self.states
            .get(index)
            .ok_or(Error::InvalidIndex(index, self.states.len()))
    }

    fn check_symbol(&self, symbol: Symbol) -> Result<()> {
        if self.alphabet.contains(&symbol) {
            Ok(())
        } else {
            Err(Error::UnknownSymbol(symbol))
        }
    }

    fn resolve_indices(&self, indices: impl IntoIterator<Item = usize>) -> Result<StateSet> {
        indices
            .into_iter()
            .map(|index| self.state_at(index).cloned())
            .collect()
    }
}

fn state_name(index: usize) -> StateId {
    format!("q{index}")
}

impl std::fmt::Display for Automaton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Automaton with transitions:")?;
        for row in self.table() {
            let marker = if row.is_start { "->" } else { "  " };
            write!(f, "{marker}{}", row.state)?;
            if row.is_accepting {
                write!(f, " (accepting)")?;
            }
            if row.is_dead {
                write!(f, " (dead)")?;
            }
            write!(f, ":")?;
            for (symbol, dests) in row.destinations {
                match dests.len() {
                    0 => write!(f, " {symbol}->-")?,
                    1 => write!(f, " {symbol}->{}", dests[0])?,
                    _ => write!(f, " {symbol}->{{{}}}", dests.join(","))?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
