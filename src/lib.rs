//! Library for building and simulating finite automata, pushdown automata and stack based
//! Turing machines.
//!
//! All three families share one graph model, the [`automaton::Automaton`]. It is a collection
//! of states connected by directed transitions, where each transition carries a set of
//! operations. The type of those operations determines the family: plain symbols for finite
//! automata ([`FA`](automaton::FA)), [`automaton::PdaOperation`]s for pushdown automata
//! ([`PDA`](automaton::PDA)) and [`automaton::TmOperation`]s for Turing machines
//! ([`TM`](automaton::TM)). The only place where the families differ in how they execute is
//! [`automaton::Label::fire`], which decides whether an operation applies to the next input
//! symbol and the current stack.
//!
//! Derived structures such as the alphabet, the transition function, the epsilon closures and
//! the classification are computed lazily and cached. Every structural edit invalidates all of
//! them, so a query never sees a stale value.
//!
//! Finite and pushdown automata are simulated by tracking the set of reachable configurations
//! ([`simulation::Simulation`]); Turing machines by exploring the tree of instantaneous
//! descriptions ([`simulation::IdTree`]). The [`operations`] module combines automata into new
//! ones.
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use automata_sim::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        alphabet::{Alphabet, Symbol, EMPTY, STACK_START},
        automaton::{
            classify, Automaton, AutomatonBuilder, AutomatonError, AutomatonType, CacheState,
            Classification, Delta, EpsilonClosures, EpsilonLabel, Family, Label, PdaOperation,
            StackAction, StackOperation, State, StateId, TmOperation, Transition, TransitionId,
            FA, PDA, TM,
        },
        math,
        operations::{concatenation, kleene_star, union},
        simulation::{
            AcceptanceMode, IdNode, IdTree, NodeId, SearchLimits, Simulation, SimulationStep,
        },
        stack::Stack,
        Show,
    };
}

/// Definitions of mathematical objects which are used throughout the crate and do not really
/// fit to the top level.
pub mod math;

/// Symbols, the empty symbol and alphabets.
pub mod alphabet;

/// The stack shared by pushdown automata and Turing machines.
pub mod stack;

/// The graph model shared by all automata families, together with its derived structures.
#[allow(clippy::upper_case_acronyms)]
pub mod automaton;

/// Acceptance simulation for finite automata, pushdown automata and Turing machines.
pub mod simulation;

/// Structural composition of automata.
pub mod operations;

/// Random generation of automata and words.
#[cfg(feature = "random")]
pub mod random;

/// Helper trait which can be used to display states, operations, stacks and such.
pub trait Show {
    /// Returns a human readable representation of `self`. For a symbol this is the symbol
    /// itself, for a stack operation something like `a, $ | push A`.
    fn show(&self) -> String;

    /// Show a collection of the thing, for a collection of symbols this should be `{ a, b }`.
    /// By default the elements are shown in order, separated by commas and surrounded by
    /// brackets.
    fn show_collection<'a, I>(iter: I) -> String
    where
        Self: 'a,
        I: IntoIterator<Item = &'a Self>,
        I::IntoIter: DoubleEndedIterator,
    {
        format!(
            "[{}]",
            itertools::Itertools::join(&mut iter.into_iter().map(|x| x.show()), ", ")
        )
    }
}

impl Show for usize {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl Show for String {
    fn show(&self) -> String {
        self.clone()
    }
}

impl<S: Show> Show for Vec<S> {
    fn show(&self) -> String {
        S::show_collection(self.iter())
    }
}

impl<S: Show> Show for Option<S> {
    fn show(&self) -> String {
        match self {
            None => "-".to_string(),
            Some(x) => x.show(),
        }
    }
}
