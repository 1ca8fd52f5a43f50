use indexmap::IndexSet;

use super::{Label, StateId};

/// Handle of a [`Transition`] inside the automaton that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionId(pub(crate) usize);

impl TransitionId {
    /// The position of the transition in the arena of its automaton.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A directed edge between two states of the same automaton. It carries a set of operations,
/// kept in the order in which they were added since the Turing machine engine tries them in
/// that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<L: Label> {
    pub(crate) origin: StateId,
    pub(crate) target: StateId,
    pub(crate) operations: IndexSet<L>,
}

impl<L: Label> Transition<L> {
    pub(crate) fn new(origin: StateId, target: StateId, operations: IndexSet<L>) -> Self {
        Self {
            origin,
            target,
            operations,
        }
    }

    /// The state the transition leaves.
    pub fn origin(&self) -> StateId {
        self.origin
    }

    /// The state the transition enters.
    pub fn target(&self) -> StateId {
        self.target
    }

    /// The operations in insertion order.
    pub fn operations(&self) -> impl Iterator<Item = &L> + '_ {
        self.operations.iter()
    }

    /// The number of operations.
    pub fn size(&self) -> usize {
        self.operations.len()
    }

    /// Returns true if the transition carries `operation`.
    pub fn contains(&self, operation: &L) -> bool {
        self.operations.contains(operation)
    }

    pub(crate) fn operation(&self, position: usize) -> Option<&L> {
        self.operations.get_index(position)
    }
}
