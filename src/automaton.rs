use std::rc::Rc;

use indexmap::IndexSet;
use thiserror::Error;
use tracing::trace;

use crate::{
    alphabet::{Alphabet, Symbol, STACK_START},
    math::{Bijection, OrderedSet},
    simulation::{SearchLimits, SimulationStep},
};

mod state;
pub use state::{State, StateId};

mod transition;
pub use transition::{Transition, TransitionId};

mod label;
pub use label::{
    EpsilonLabel, Family, Firing, Label, PdaOperation, StackAction, StackOperation, TmOperation,
};

mod cache;
pub use cache::{CacheState, Cached, DerivedCaches};

mod delta;
pub use delta::{Delta, DeltaKey, EpsilonClosures, Move};

mod classification;
pub use classification::{classify, AutomatonType, Classification};

mod builder;
pub use builder::AutomatonBuilder;

mod definition;

/// A finite automaton, possibly nondeterministic and with empty transitions.
pub type FA = Automaton<Symbol>;
/// A pushdown automaton.
pub type PDA = Automaton<PdaOperation>;
/// A Turing machine whose memory is a stack.
pub type TM = Automaton<TmOperation>;

/// Errors that can occur while editing or composing automata. Simulation never fails, it
/// rejects instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AutomatonError {
    /// The automaton has no initial state.
    #[error("the automaton has no initial state")]
    MissingInitialState,
    /// The automaton has no accepting state.
    #[error("the automaton has no accepting state")]
    MissingAcceptingState,
    /// An operation is malformed.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// A state handle does not belong to the automaton (anymore).
    #[error("state {0:?} does not belong to this automaton")]
    UnknownState(StateId),
    /// A transition handle does not belong to the automaton (anymore).
    #[error("transition {0:?} does not belong to this automaton")]
    UnknownTransition(TransitionId),
}

/// An automaton, that is a directed graph of [`State`]s connected by [`Transition`]s whose
/// operations are of type `L`. States and transitions live in arenas and are addressed through
/// [`StateId`] and [`TransitionId`]; removing one leaves a hole so that other handles remain
/// valid.
///
/// Everything derived from the graph (alphabets, the transition function, epsilon closures and
/// the classification) is computed on first read and cached until the next structural edit.
#[derive(Debug, Clone)]
pub struct Automaton<L: Label> {
    states: Vec<Option<State>>,
    transitions: Vec<Option<Transition<L>>>,
    initial: Option<StateId>,
    stack_start: Symbol,
    limits: SearchLimits,
    caches: DerivedCaches<L>,
}

impl<L: Label> Default for Automaton<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Label> Automaton<L> {
    /// Creates an automaton without states.
    pub fn new() -> Self {
        Self::with_stack_start(STACK_START)
    }

    /// Creates an automaton without states whose stack starts out holding `start`.
    pub fn with_stack_start(start: Symbol) -> Self {
        Self {
            states: vec![],
            transitions: vec![],
            initial: None,
            stack_start: start,
            limits: SearchLimits::default(),
            caches: DerivedCaches::default(),
        }
    }

    /// Returns a builder for constructing automata from state indices.
    pub fn builder() -> AutomatonBuilder<L> {
        AutomatonBuilder::default()
    }

    fn invalidate(&mut self) {
        trace!("graph changed, invalidating derived caches");
        self.caches.invalidate_all();
    }

    /// Marks every derived structure as stale.
    pub fn invalidate_all(&mut self) {
        self.invalidate()
    }

    /// The state of every derived cache.
    pub fn caches(&self) -> &DerivedCaches<L> {
        &self.caches
    }

    /// Adds a state and returns its handle. If the state is marked initial, it replaces the
    /// current initial state.
    pub fn add_state(&mut self, state: State) -> StateId {
        let id = StateId(self.states.len());
        let initial = state.initial;
        self.states.push(Some(state));
        if initial {
            self.set_initial_state(Some(id));
        }
        self.invalidate();
        id
    }

    /// Removes a state together with every transition that enters or leaves it.
    pub fn remove_state(&mut self, id: StateId) -> Option<State> {
        let mut state = self.states.get_mut(id.0)?.take()?;
        if self.initial == Some(id) {
            self.initial = None;
            state.initial = false;
        }
        for slot in self.transitions.iter_mut() {
            if matches!(slot, Some(t) if t.origin == id || t.target == id) {
                *slot = None;
            }
        }
        self.invalidate();
        Some(state)
    }

    /// Adds a transition from `origin` to `target` carrying `operations`. If a transition between
    /// the two states already exists, the operations are merged into it and its handle is
    /// returned.
    pub fn add_transition(
        &mut self,
        origin: StateId,
        target: StateId,
        operations: impl IntoIterator<Item = L>,
    ) -> Result<TransitionId, AutomatonError> {
        self.check_state(origin)?;
        self.check_state(target)?;
        let operations: IndexSet<L> = operations.into_iter().collect();
        for operation in &operations {
            operation.validate()?;
        }

        let id = match self.transition_between(origin, target) {
            Some(id) => {
                let existing = self.transitions[id.0]
                    .as_mut()
                    .expect("transition_between only returns live transitions");
                existing.operations.extend(operations);
                id
            }
            None => {
                let id = TransitionId(self.transitions.len());
                self.transitions
                    .push(Some(Transition::new(origin, target, operations)));
                id
            }
        };
        self.invalidate();
        Ok(id)
    }

    /// Removes a transition and returns it.
    pub fn remove_transition(&mut self, id: TransitionId) -> Option<Transition<L>> {
        let removed = self.transitions.get_mut(id.0)?.take()?;
        self.invalidate();
        Some(removed)
    }

    /// Replaces all operations of a transition. Replacing them with nothing removes the
    /// transition, in which case `Ok(None)` is returned.
    pub fn replace_operations(
        &mut self,
        id: TransitionId,
        operations: impl IntoIterator<Item = L>,
    ) -> Result<Option<TransitionId>, AutomatonError> {
        if self.transition(id).is_none() {
            return Err(AutomatonError::UnknownTransition(id));
        }
        let operations: IndexSet<L> = operations.into_iter().collect();
        for operation in &operations {
            operation.validate()?;
        }
        if operations.is_empty() {
            self.remove_transition(id);
            return Ok(None);
        }
        if let Some(transition) = self.transitions[id.0].as_mut() {
            transition.operations = operations;
        }
        self.invalidate();
        Ok(Some(id))
    }

    /// Makes `state` the initial state, or leaves the automaton without one for `None`. The
    /// previous initial state is demoted.
    pub fn set_initial_state(&mut self, state: Option<StateId>) {
        if let Some(previous) = self.initial.take() {
            if let Some(Some(s)) = self.states.get_mut(previous.0) {
                s.initial = false;
            }
        }
        if let Some(id) = state {
            if let Some(Some(s)) = self.states.get_mut(id.0) {
                s.initial = true;
                self.initial = Some(id);
            }
        }
        self.invalidate();
    }

    /// Marks a state as accepting or not.
    pub fn set_accepting(&mut self, state: StateId, accepting: bool) -> Result<(), AutomatonError> {
        self.state_mut(state)?.accepting = accepting;
        Ok(())
    }

    /// Changes the label of a state.
    pub fn set_label(
        &mut self,
        state: StateId,
        label: impl Into<String>,
    ) -> Result<(), AutomatonError> {
        self.state_mut(state)?.label = label.into();
        Ok(())
    }

    /// Changes the symbol that sits on the stack when a run starts.
    pub fn set_stack_start(&mut self, start: Symbol) {
        self.stack_start = start;
        self.invalidate();
    }

    /// The symbol that sits on the stack when a run starts.
    pub fn stack_start(&self) -> Symbol {
        self.stack_start
    }

    /// Bounds used by searches that may not terminate on their own.
    pub fn search_limits(&self) -> SearchLimits {
        self.limits
    }

    /// Replaces the search bounds.
    pub fn set_search_limits(&mut self, limits: SearchLimits) {
        self.limits = limits;
    }

    fn check_state(&self, id: StateId) -> Result<(), AutomatonError> {
        self.state(id)
            .map(|_| ())
            .ok_or(AutomatonError::UnknownState(id))
    }

    fn state_mut(&mut self, id: StateId) -> Result<&mut State, AutomatonError> {
        self.states
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(AutomatonError::UnknownState(id))
    }

    /// Returns the state with the given handle.
    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id.0)?.as_ref()
    }

    /// Iterates over the states in insertion order.
    pub fn states(&self) -> impl Iterator<Item = (StateId, &State)> + '_ {
        self.states
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (StateId(i), s)))
    }

    /// The handles of all states in insertion order.
    pub fn state_ids(&self) -> Vec<StateId> {
        self.states().map(|(id, _)| id).collect()
    }

    /// Returns the handle of the first state carrying `label`.
    pub fn find_state(&self, label: &str) -> Option<StateId> {
        self.states()
            .find(|(_, s)| s.label == label)
            .map(|(id, _)| id)
    }

    /// The label of a state, `?` for handles that do not belong to the automaton.
    pub fn label_of(&self, id: StateId) -> &str {
        self.state(id).map(State::label).unwrap_or("?")
    }

    /// Returns the transition with the given handle.
    pub fn transition(&self, id: TransitionId) -> Option<&Transition<L>> {
        self.transitions.get(id.0)?.as_ref()
    }

    /// Iterates over the transitions in insertion order.
    pub fn transitions(&self) -> impl Iterator<Item = (TransitionId, &Transition<L>)> + '_ {
        self.transitions
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.as_ref().map(|t| (TransitionId(i), t)))
    }

    /// Returns the transition from `origin` to `target`, if there is one.
    pub fn transition_between(&self, origin: StateId, target: StateId) -> Option<TransitionId> {
        self.transitions()
            .find(|(_, t)| t.origin == origin && t.target == target)
            .map(|(id, _)| id)
    }

    /// The initial state.
    pub fn initial_state(&self) -> Option<StateId> {
        self.initial
    }

    /// Whether a run can be started, i.e. whether there is an initial state.
    pub fn can_execute(&self) -> bool {
        self.initial.is_some()
    }

    /// The accepting (final) states in insertion order.
    pub fn accepting_states(&self) -> Vec<StateId> {
        self.states()
            .filter(|(_, s)| s.accepting)
            .map(|(id, _)| id)
            .collect()
    }

    /// Number of states.
    pub fn size(&self) -> usize {
        self.states().count()
    }

    /// Number of transitions.
    pub fn transition_count(&self) -> usize {
        self.transitions().count()
    }

    /// Returns true if the automaton has no states.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// The input symbols used by some operation, never containing the empty symbol.
    pub fn alphabet(&self) -> Rc<Alphabet> {
        self.caches.alphabet.get_or_build(|| {
            self.transitions()
                .flat_map(|(_, t)| t.operations())
                .map(Label::symbol)
                .collect()
        })
    }

    /// The stack symbols: the stack start symbol, every expected top and every pushed symbol.
    /// Empty for finite automata.
    pub fn stack_alphabet(&self) -> Rc<Alphabet> {
        self.caches.stack_alphabet.get_or_build(|| {
            let mut alphabet = Alphabet::new();
            if L::FAMILY == Family::Finite {
                return alphabet;
            }
            alphabet.insert(self.stack_start);
            for operation in self.transitions().flat_map(|(_, t)| t.operations()) {
                alphabet.insert(operation.top());
                alphabet.extend(operation.pushed().iter().copied());
            }
            alphabet
        })
    }

    /// The transition function.
    pub fn delta(&self) -> Rc<Delta<L>> {
        self.caches.delta.get_or_build(|| Delta::build(self))
    }

    /// The epsilon closure of every state.
    pub fn epsilon_closures(&self) -> Rc<EpsilonClosures> {
        let delta = self.delta();
        self.caches
            .epsilon_closures
            .get_or_build(|| EpsilonClosures::build(&delta))
    }

    /// The current classification, see [`classify`].
    pub fn classification(&self) -> Rc<Classification> {
        self.caches
            .classification
            .get_or_build(|| classify(self))
    }

    /// Clears the simulation marker of every state.
    pub fn deactivate_all_states_in_simulation(&mut self) {
        for state in self.states.iter_mut().flatten() {
            state.active_in_simulation = false;
        }
    }

    /// Marks exactly the states of `step` as active, so a consumer can display it.
    pub fn activate_step(&mut self, step: &SimulationStep) {
        self.activate_states(&step.states);
    }

    pub(crate) fn activate_states(&mut self, states: &OrderedSet<StateId>) {
        for (i, slot) in self.states.iter_mut().enumerate() {
            if let Some(state) = slot {
                state.active_in_simulation = states.contains(&StateId(i));
            }
        }
    }

    /// Moves all states and transitions of `other` into `self`. If `other` has an initial
    /// state, it becomes the initial state of `self`. Returns where each state of `other` ended
    /// up.
    pub fn merge(&mut self, other: Automaton<L>) -> Bijection<StateId, StateId> {
        let mut mapping = Bijection::new();
        for (id, state) in other.states() {
            mapping.insert(id, self.add_state(state.clone()));
        }
        for (_, transition) in other.transitions() {
            let (Some(&origin), Some(&target)) = (
                mapping.get_by_left(&transition.origin),
                mapping.get_by_left(&transition.target),
            ) else {
                unreachable!("transition endpoints always belong to their automaton");
            };
            let operations = transition.operations.iter().cloned();
            if let Err(e) = self.add_transition(origin, target, operations) {
                unreachable!("operations were validated when they were added: {e}");
            }
        }
        mapping
    }

    /// Relabels the states in iteration order: the initial state becomes `q0`, all others
    /// `q1`, `q2` and so on.
    pub fn relabel(&mut self) {
        let mut next = 1;
        for state in self.states.iter_mut().flatten() {
            if state.initial {
                state.label = "q0".to_string();
            } else {
                state.label = format!("q{next}");
                next += 1;
            }
        }
    }
}

impl<L: Label> PartialEq for Automaton<L> {
    /// Structural equality, derived caches and search limits are not compared.
    fn eq(&self, other: &Self) -> bool {
        self.states == other.states
            && self.transitions == other.transitions
            && self.initial == other.initial
            && self.stack_start == other.stack_start
    }
}

impl<L: Label> Eq for Automaton<L> {}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn two_states() -> (FA, StateId, StateId) {
        let mut fa = FA::new();
        let q0 = fa.add_state(State::new("q0").initial());
        let q1 = fa.add_state(State::new("q1").accepting());
        (fa, q0, q1)
    }

    #[test]
    fn duplicate_edges_merge() {
        let (mut fa, q0, q1) = two_states();
        let first = fa.add_transition(q0, q1, ['a']).unwrap();
        let second = fa.add_transition(q0, q1, ['b', 'a']).unwrap();
        assert_eq!(first, second);
        assert_eq!(fa.transition_count(), 1);
        let ops: Vec<_> = fa.transition(first).unwrap().operations().copied().collect();
        assert_eq!(ops, vec!['a', 'b']);
    }

    #[test]
    fn at_most_one_initial_state() {
        let (mut fa, q0, q1) = two_states();
        let q2 = fa.add_state(State::new("q2").initial());
        assert_eq!(fa.initial_state(), Some(q2));
        assert!(!fa.state(q0).unwrap().is_initial());
        fa.set_initial_state(Some(q1));
        assert_eq!(
            fa.states().filter(|(_, s)| s.is_initial()).count(),
            1,
            "only q1 may be initial"
        );
        fa.set_initial_state(None);
        assert!(!fa.can_execute());
        assert!(!fa.state(q1).unwrap().is_initial());
    }

    #[test]
    fn endpoints_must_belong_to_the_automaton() {
        let (mut fa, q0, q1) = two_states();
        fa.remove_state(q1);
        assert_eq!(
            fa.add_transition(q0, q1, ['a']),
            Err(AutomatonError::UnknownState(q1))
        );
    }

    #[test]
    fn removing_a_state_removes_its_transitions() {
        let (mut fa, q0, q1) = two_states();
        fa.add_transition(q0, q1, ['a']).unwrap();
        fa.add_transition(q1, q1, ['b']).unwrap();
        let removed = fa.remove_state(q0).unwrap();
        assert!(!removed.is_initial());
        assert_eq!(fa.initial_state(), None);
        assert_eq!(fa.transition_count(), 1);
        assert_eq!(fa.size(), 1);
    }

    #[test]
    fn mutations_invalidate_every_cache() {
        let (mut fa, q0, q1) = two_states();
        fa.add_transition(q0, q1, ['a']).unwrap();
        assert_eq!(fa.alphabet().iter().collect::<Vec<_>>(), vec!['a']);
        fa.epsilon_closures();
        fa.classification();
        assert!(fa
            .caches()
            .states()
            .iter()
            .enumerate()
            .all(|(i, s)| i == 1 || *s == CacheState::Fresh));

        fa.add_transition(q1, q0, ['b']).unwrap();
        assert!(fa.caches().states().iter().all(|s| *s == CacheState::Stale));
        assert_eq!(fa.alphabet().iter().collect::<Vec<_>>(), vec!['a', 'b']);
        assert_eq!(fa.delta().targets(q1, 'b'), vec![q0]);
        assert_eq!(fa.caches().states()[3], CacheState::Stale);
    }

    #[test]
    fn replacing_operations_with_nothing_removes_the_transition() {
        let (mut fa, q0, q1) = two_states();
        let t = fa.add_transition(q0, q1, ['a']).unwrap();
        assert_eq!(fa.replace_operations(t, ['c']), Ok(Some(t)));
        assert_eq!(fa.alphabet().iter().collect::<Vec<_>>(), vec!['c']);
        assert_eq!(fa.replace_operations(t, []), Ok(None));
        assert_eq!(fa.transition_count(), 0);
        assert_eq!(
            fa.replace_operations(t, ['a']),
            Err(AutomatonError::UnknownTransition(t))
        );
    }

    #[test]
    fn invalid_operations_are_not_added() {
        let mut pda = PDA::new();
        let q0 = pda.add_state(State::new("q0").initial());
        let op = PdaOperation::new('a', '$', StackAction::Push(vec![EMPTY]));
        assert!(matches!(
            pda.add_transition(q0, q0, [op]),
            Err(AutomatonError::InvalidOperation(_))
        ));
        assert_eq!(pda.transition_count(), 0);
    }

    #[test]
    fn stack_alphabet_collects_tops_and_pushed_symbols() {
        let mut tm = TM::with_stack_start('Z');
        let q0 = tm.add_state(State::new("q0").initial());
        tm.add_transition(q0, q0, [TmOperation::new('a', 'Z', StackAction::push("AB"))])
            .unwrap();
        tm.add_transition(q0, q0, [TmOperation::new(EMPTY, EMPTY, StackAction::Pop)])
            .unwrap();
        assert_eq!(
            tm.stack_alphabet().iter().collect::<Vec<_>>(),
            vec!['A', 'B', 'Z']
        );
        tm.set_stack_start('#');
        assert!(tm.stack_alphabet().contains('#'));
        assert!(FA::new().stack_alphabet().is_empty());
    }

    #[test]
    fn merge_keeps_operands_structure() {
        let (mut left, q0, q1) = two_states();
        left.add_transition(q0, q1, ['a']).unwrap();
        let (mut right, p0, p1) = two_states();
        right.add_transition(p0, p1, ['b']).unwrap();
        right.set_initial_state(None);

        let mapping = left.merge(right);
        assert_eq!(left.size(), 4);
        assert_eq!(left.transition_count(), 2);
        assert_eq!(left.initial_state(), Some(q0));
        let (&m0, &m1) = (
            mapping.get_by_left(&p0).unwrap(),
            mapping.get_by_left(&p1).unwrap(),
        );
        assert!(left.transition_between(m0, m1).is_some());

        left.relabel();
        let labels: Vec<_> = left.states().map(|(_, s)| s.label().to_string()).collect();
        assert_eq!(labels, vec!["q0", "q1", "q2", "q3"]);
    }
}
