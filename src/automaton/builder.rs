use itertools::Itertools;

use crate::alphabet::{Symbol, STACK_START};

use super::{Automaton, AutomatonError, Label, State};

/// Helper for constructing automata from state indices instead of handles. States are numbered
/// from zero up to the highest index that is mentioned anywhere, and are labelled `q0`, `q1`, ...
/// unless labels are given explicitly.
///
/// # Example
///
/// A DFA over `a` and `b` that accepts exactly the words ending in `b`:
/// ```
/// use automata_sim::prelude::*;
///
/// let dfa = FA::builder()
///     .with_accepting([1])
///     .with_edges([(0, 'a', 0), (0, 'b', 1), (1, 'a', 0), (1, 'b', 1)])
///     .build(Some(0)) // 0 is the initial state
///     .unwrap();
/// assert!(dfa.accepts("aab"));
/// assert!(!dfa.accepts("ba"));
/// ```
pub struct AutomatonBuilder<L: Label> {
    edges: Vec<(usize, L, usize)>,
    accepting: Vec<usize>,
    labels: Vec<(usize, String)>,
    stack_start: Symbol,
}

impl<L: Label> Default for AutomatonBuilder<L> {
    fn default() -> Self {
        Self {
            edges: vec![],
            accepting: vec![],
            labels: vec![],
            stack_start: STACK_START,
        }
    }
}

impl<L: Label> AutomatonBuilder<L> {
    /// Marks the states with the given indices as accepting.
    pub fn with_accepting<I: IntoIterator<Item = usize>>(mut self, iter: I) -> Self {
        self.accepting.extend(iter);
        self
    }

    /// Adds a list of edges `(origin, operation, target)` in the given order. Edges between the
    /// same pair of states end up as one transition carrying all of their operations.
    pub fn with_edges<I: IntoIterator<Item = (usize, L, usize)>>(mut self, iter: I) -> Self {
        self.edges.extend(iter);
        self
    }

    /// Overrides the label of the state with index `idx`.
    pub fn label(mut self, idx: usize, label: impl Into<String>) -> Self {
        assert!(
            self.labels.iter().all(|(q, _)| *q != idx),
            "state {idx} is labelled twice"
        );
        self.labels.push((idx, label.into()));
        self
    }

    /// Sets the symbol that is on the stack when a run starts.
    pub fn with_stack_start(mut self, start: Symbol) -> Self {
        self.stack_start = start;
        self
    }

    /// Builds the automaton, making the state with index `initial` the initial one.
    pub fn build(self, initial: Option<usize>) -> Result<Automaton<L>, AutomatonError> {
        let num_states = self
            .edges
            .iter()
            .flat_map(|(q, _, p)| [*q, *p])
            .chain(self.accepting.iter().copied())
            .chain(self.labels.iter().map(|(q, _)| *q))
            .chain(initial)
            .max()
            .map_or(0, |max| max + 1);

        let mut automaton = Automaton::with_stack_start(self.stack_start);
        let ids = (0..num_states)
            .map(|i| {
                let label = self
                    .labels
                    .iter()
                    .find_map(|(q, l)| (*q == i).then(|| l.clone()))
                    .unwrap_or_else(|| format!("q{i}"));
                let mut state = State::new(label);
                state.accepting = self.accepting.contains(&i);
                automaton.add_state(state)
            })
            .collect_vec();

        for (q, operation, p) in self.edges {
            automaton.add_transition(ids[q], ids[p], [operation])?;
        }
        automaton.set_initial_state(initial.map(|i| ids[i]));
        Ok(automaton)
    }
}
