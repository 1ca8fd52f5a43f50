use crate::{
    alphabet::Symbol,
    automaton::StateId,
    math::OrderedSet,
};

mod subset;

mod id_tree;
pub use id_tree::{IdNode, IdTree, NodeId};

/// When a run of a pushdown automaton or Turing machine accepts after all input is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AcceptanceMode {
    /// The run ends in an accepting (final) state.
    #[default]
    FinalState,
    /// The run ends with an empty stack.
    EmptyStack,
}

/// Bounds for searches that need not terminate on their own, like the exploration of a
/// nondeterministic Turing machine or the closure of a pushdown automaton that keeps pushing
/// on empty moves. Hitting a bound never fails, the search is cut short and reported as
/// truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchLimits {
    /// Maximal depth of a node in the ID tree, also the maximal stack height of a pushdown
    /// configuration.
    pub max_depth: usize,
    /// Maximal number of nodes in the ID tree.
    pub max_nodes: usize,
    /// Maximal number of configurations a pushdown automaton may be in at once.
    pub max_configurations: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_depth: 1_000,
            max_nodes: 100_000,
            max_configurations: 10_000,
        }
    }
}

impl SearchLimits {
    /// Sets the maximal depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the maximal number of ID tree nodes.
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// Sets the maximal number of simultaneous pushdown configurations.
    pub fn with_max_configurations(mut self, max_configurations: usize) -> Self {
        self.max_configurations = max_configurations;
        self
    }
}

/// One step of a run of a finite or pushdown automaton: the symbol that was consumed to get
/// here (`None` for the very first step) and the states that are active afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationStep {
    /// The consumed symbol.
    pub symbol: Option<Symbol>,
    /// The active states.
    pub states: OrderedSet<StateId>,
}

/// The replayable outcome of simulating a finite or pushdown automaton on a word.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Simulation {
    steps: Vec<SimulationStep>,
    accepted: bool,
    truncated: bool,
}

impl Simulation {
    /// Whether the word was accepted.
    pub fn accepted(&self) -> bool {
        self.accepted
    }

    /// Whether configurations had to be dropped because a [`SearchLimits`] bound was hit.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// The steps in order. Empty if the automaton has no initial state. A run that gets stuck
    /// ends with the last step that still had active states.
    pub fn steps(&self) -> &[SimulationStep] {
        &self.steps
    }

    /// The active states after the whole run.
    pub fn last_states(&self) -> Option<&OrderedSet<StateId>> {
        self.steps.last().map(|step| &step.states)
    }
}
