use std::{cell::Cell, iter::once, rc::Rc};

use tracing::{trace, warn};

use crate::{
    alphabet::{is_empty, Symbol, EMPTY},
    automaton::{Delta, EpsilonClosures, Label, PdaOperation, StateId, FA, PDA},
    math::OrderedSet,
    stack::Stack,
};

use super::{AcceptanceMode, SearchLimits, Simulation, SimulationStep};

/// The subset construction run on the fly. A run tracks a set of configurations, closes it
/// under empty moves and advances it symbol by symbol.
trait SubsetRun {
    type Configuration: Ord + Clone;

    fn start(&self) -> Option<Self::Configuration>;

    fn close(
        &self,
        configurations: OrderedSet<Self::Configuration>,
    ) -> OrderedSet<Self::Configuration>;

    fn step(
        &self,
        configurations: &OrderedSet<Self::Configuration>,
        symbol: Symbol,
    ) -> OrderedSet<Self::Configuration>;

    fn is_accepting(&self, configuration: &Self::Configuration) -> bool;

    fn state(configuration: &Self::Configuration) -> StateId;

    fn truncated(&self) -> bool {
        false
    }
}

fn snapshot<R: SubsetRun>(
    symbol: Option<Symbol>,
    configurations: &OrderedSet<R::Configuration>,
) -> SimulationStep {
    SimulationStep {
        symbol,
        states: configurations.iter().map(R::state).collect(),
    }
}

fn run<R: SubsetRun>(engine: &R, input: &str) -> Simulation {
    let Some(start) = engine.start() else {
        trace!("no initial state, rejecting {input:?}");
        return Simulation::default();
    };

    let mut current = engine.close(once(start).collect());
    let mut steps = vec![snapshot::<R>(None, &current)];

    for symbol in input.chars() {
        let targets = if is_empty(symbol) {
            OrderedSet::new()
        } else {
            engine.step(&current, symbol)
        };
        if targets.is_empty() {
            trace!("stuck on {symbol} after {} steps, rejecting", steps.len() - 1);
            return Simulation {
                steps,
                accepted: false,
                truncated: engine.truncated(),
            };
        }
        current = engine.close(targets);
        steps.push(snapshot::<R>(Some(symbol), &current));
    }

    Simulation {
        accepted: current.iter().any(|c| engine.is_accepting(c)),
        steps,
        truncated: engine.truncated(),
    }
}

struct FiniteRun<'a> {
    automaton: &'a FA,
    delta: Rc<Delta<Symbol>>,
    closures: Rc<EpsilonClosures>,
}

impl SubsetRun for FiniteRun<'_> {
    type Configuration = StateId;

    fn start(&self) -> Option<StateId> {
        self.automaton.initial_state()
    }

    fn close(&self, states: OrderedSet<StateId>) -> OrderedSet<StateId> {
        self.closures.of_all(&states)
    }

    fn step(&self, states: &OrderedSet<StateId>, symbol: Symbol) -> OrderedSet<StateId> {
        states
            .iter()
            .flat_map(|&q| self.delta.targets(q, symbol))
            .collect()
    }

    fn is_accepting(&self, state: &StateId) -> bool {
        self.automaton
            .state(*state)
            .is_some_and(|s| s.is_accepting())
    }

    fn state(state: &StateId) -> StateId {
        *state
    }
}

struct PushdownRun<'a> {
    automaton: &'a PDA,
    delta: Rc<Delta<PdaOperation>>,
    mode: AcceptanceMode,
    limits: SearchLimits,
    truncated: Cell<bool>,
}

impl PushdownRun<'_> {
    fn truncate(&self, reason: &str) {
        if !self.truncated.replace(true) {
            warn!("pushdown simulation truncated: {reason}");
        }
    }

    /// Successors of `(state, stack)` on `symbol`. The moves expecting the current top are
    /// tried before the wildcard moves.
    fn successors(
        &self,
        (state, stack): &(StateId, Stack),
        symbol: Symbol,
    ) -> Vec<(StateId, Stack)> {
        let next = (!is_empty(symbol)).then_some(symbol);
        let tops = stack
            .top()
            .filter(|top| !is_empty(*top))
            .into_iter()
            .chain(once(EMPTY));

        let mut successors = vec![];
        for top in tops {
            for m in self.delta.moves(*state, symbol, top) {
                let Some(firing) = m.operation.fire(next, stack) else {
                    continue;
                };
                if firing.stack.len() > self.limits.max_depth {
                    self.truncate("stack height exceeds the depth limit");
                    continue;
                }
                successors.push((m.target, firing.stack));
            }
        }
        successors
    }
}

impl SubsetRun for PushdownRun<'_> {
    type Configuration = (StateId, Stack);

    fn start(&self) -> Option<Self::Configuration> {
        self.automaton
            .initial_state()
            .map(|q| (q, Stack::starting_with(self.automaton.stack_start())))
    }

    fn close(
        &self,
        configurations: OrderedSet<Self::Configuration>,
    ) -> OrderedSet<Self::Configuration> {
        let mut closed = OrderedSet::new();
        let mut work: Vec<_> = configurations.into_iter().collect();
        while let Some(configuration) = work.pop() {
            if closed.contains(&configuration) {
                continue;
            }
            if closed.len() >= self.limits.max_configurations {
                self.truncate("too many configurations");
                break;
            }
            for successor in self.successors(&configuration, EMPTY) {
                if !closed.contains(&successor) {
                    work.push(successor);
                }
            }
            closed.insert(configuration);
        }
        closed
    }

    fn step(
        &self,
        configurations: &OrderedSet<Self::Configuration>,
        symbol: Symbol,
    ) -> OrderedSet<Self::Configuration> {
        configurations
            .iter()
            .flat_map(|c| self.successors(c, symbol))
            .collect()
    }

    fn is_accepting(&self, (state, stack): &Self::Configuration) -> bool {
        match self.mode {
            AcceptanceMode::FinalState => self
                .automaton
                .state(*state)
                .is_some_and(|s| s.is_accepting()),
            AcceptanceMode::EmptyStack => stack.is_empty(),
        }
    }

    fn state((state, _): &Self::Configuration) -> StateId {
        *state
    }

    fn truncated(&self) -> bool {
        self.truncated.get()
    }
}

impl FA {
    /// Returns true if the automaton accepts `input`. An automaton without initial state
    /// rejects everything.
    pub fn accepts(&self, input: &str) -> bool {
        self.simulate(input).accepted()
    }

    /// Runs the automaton on `input` and records the active states after each symbol.
    pub fn simulate(&self, input: &str) -> Simulation {
        let engine = FiniteRun {
            automaton: self,
            delta: self.delta(),
            closures: self.epsilon_closures(),
        };
        run(&engine, input)
    }
}

impl PDA {
    /// Returns true if the automaton accepts `input` by final state.
    pub fn accepts(&self, input: &str) -> bool {
        self.accepts_by(input, AcceptanceMode::FinalState)
    }

    /// Returns true if the automaton accepts `input` in the given mode.
    pub fn accepts_by(&self, input: &str, mode: AcceptanceMode) -> bool {
        self.simulate(input, mode).accepted()
    }

    /// Runs the automaton on `input`, tracking every reachable `(state, stack)` configuration,
    /// and records the active states after each symbol.
    pub fn simulate(&self, input: &str, mode: AcceptanceMode) -> Simulation {
        let engine = PushdownRun {
            automaton: self,
            delta: self.delta(),
            mode,
            limits: self.search_limits(),
            truncated: Cell::new(false),
        };
        run(&engine, input)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use crate::prelude::*;

    fn ends_with_ab() -> FA {
        FA::builder()
            .with_accepting([3])
            .with_edges([
                (0, 'a', 0),
                (0, 'b', 0),
                (0, EMPTY, 1),
                (1, 'a', 2),
                (2, 'b', 3),
            ])
            .build(Some(0))
            .unwrap()
    }

    fn anbn(pop_at_end: bool) -> PDA {
        let end = if pop_at_end {
            StackAction::Pop
        } else {
            StackAction::Nothing
        };
        PDA::builder()
            .with_accepting([2])
            .with_edges([
                (0, PdaOperation::new('a', '$', StackAction::push("A")), 0),
                (0, PdaOperation::new('a', 'A', StackAction::push("A")), 0),
                (0, PdaOperation::new(EMPTY, '$', end.clone()), 2),
                (0, PdaOperation::new('b', 'A', StackAction::Pop), 1),
                (1, PdaOperation::new('b', 'A', StackAction::Pop), 1),
                (1, PdaOperation::new(EMPTY, '$', end), 2),
            ])
            .build(Some(0))
            .unwrap()
    }

    #[test]
    fn no_initial_state_rejects_everything() {
        let mut fa = ends_with_ab();
        fa.set_initial_state(None);
        for word in ["", "ab", "aab"] {
            assert!(!fa.accepts(word));
            assert!(fa.simulate(word).steps().is_empty());
        }
        let mut pda = anbn(false);
        pda.set_initial_state(None);
        assert!(!pda.accepts(""));
    }

    #[test_log::test]
    fn nondeterministic_finite_automaton() {
        let fa = ends_with_ab();
        for word in ["ab", "aab", "bab", "abab"] {
            assert!(fa.accepts(word), "{word} should be accepted");
        }
        for word in ["", "a", "ba", "abb", "abc"] {
            assert!(!fa.accepts(word), "{word} should be rejected");
        }
    }

    #[test]
    fn simulation_records_every_step() {
        let fa = ends_with_ab();
        let ids = fa.state_ids();
        let simulation = fa.simulate("ab");
        assert!(simulation.accepted());
        let steps = simulation.steps();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].symbol, None);
        assert_eq!(steps[0].states, BTreeSet::from([ids[0], ids[1]]));
        assert_eq!(steps[1].symbol, Some('a'));
        assert_eq!(steps[2].states, BTreeSet::from([ids[0], ids[1], ids[3]]));
    }

    #[test]
    fn stuck_runs_stop_early() {
        let fa = ends_with_ab();
        let simulation = fa.simulate("acab");
        assert!(!simulation.accepted());
        assert_eq!(simulation.steps().len(), 2);
        assert!(!fa.accepts("λ"));
    }

    #[test_log::test]
    fn pushdown_anbn_by_final_state() {
        let pda = anbn(false);
        for word in ["", "ab", "aabb", "aaabbb"] {
            assert!(pda.accepts(word), "{word} should be accepted");
        }
        for word in ["a", "b", "aab", "abb", "ba", "abab"] {
            assert!(!pda.accepts(word), "{word} should be rejected");
        }
        assert_eq!(pda.classification().acronym(), "PDA");
    }

    #[test]
    fn pushdown_anbn_by_empty_stack() {
        let pda = anbn(true);
        assert!(pda.accepts_by("aabb", AcceptanceMode::EmptyStack));
        assert!(pda.accepts_by("", AcceptanceMode::EmptyStack));
        assert!(!pda.accepts_by("aab", AcceptanceMode::EmptyStack));

        let keeps_stack = anbn(false);
        assert!(!keeps_stack.accepts_by("aabb", AcceptanceMode::EmptyStack));
    }

    #[test]
    fn wildcard_top_matches_any_stack() {
        let pda = PDA::builder()
            .with_accepting([1])
            .with_edges([(0, PdaOperation::new('x', EMPTY, StackAction::Nothing), 1)])
            .with_stack_start('Z')
            .build(Some(0))
            .unwrap();
        assert!(pda.accepts("x"));
    }

    #[test_log::test]
    fn endless_pushing_is_truncated() {
        let mut pda = PDA::builder()
            .with_accepting([0])
            .with_edges([(0, PdaOperation::new(EMPTY, EMPTY, StackAction::push("X")), 0)])
            .build(Some(0))
            .unwrap();
        pda.set_search_limits(SearchLimits::default().with_max_depth(5));
        let simulation = pda.simulate("", AcceptanceMode::FinalState);
        assert!(simulation.accepted());
        assert!(simulation.truncated());
        assert_eq!(simulation.steps()[0].states.len(), 1);

        pda.set_search_limits(SearchLimits::default().with_max_configurations(3));
        assert!(pda.simulate("", AcceptanceMode::FinalState).truncated());
    }
}
