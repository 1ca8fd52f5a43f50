use crate::{alphabet::Symbol, math::Map};

use super::{Automaton, Family, Label, StateId};

/// The coarse type of an automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AutomatonType {
    /// The automaton has no states.
    Empty,
    /// Every configuration has at most one applicable operation.
    Deterministic,
    /// Some configuration offers a choice.
    Nondeterministic,
}

/// Result of classifying an automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Classification {
    family: Family,
    kind: AutomatonType,
    nondeterminism: bool,
    epsilon_ambiguity: bool,
    epsilon_transitions: bool,
}

impl Classification {
    /// The coarse type.
    pub fn kind(&self) -> AutomatonType {
        self.kind
    }

    /// True if two operations leaving the same state share both symbol and expected top.
    pub fn has_nondeterminism(&self) -> bool {
        self.nondeterminism
    }

    /// True if some state can either consume input or not under the same expected top.
    pub fn has_epsilon_ambiguity(&self) -> bool {
        self.epsilon_ambiguity
    }

    /// True if any operation consumes no input.
    pub fn has_epsilon_transitions(&self) -> bool {
        self.epsilon_transitions
    }

    /// Shorthand for `kind() == AutomatonType::Deterministic`.
    pub fn is_deterministic(&self) -> bool {
        self.kind == AutomatonType::Deterministic
    }

    /// The usual acronym, for example `DFA` or `NTM`.
    pub fn acronym(&self) -> &'static str {
        use AutomatonType::*;
        match (self.family, self.kind) {
            (_, Empty) => "Empty",
            (Family::Finite, Deterministic) => "DFA",
            (Family::Finite, Nondeterministic) if self.epsilon_transitions => "λ-NFA",
            (Family::Finite, Nondeterministic) => "NFA",
            (Family::Pushdown, Deterministic) => "DPDA",
            (Family::Pushdown, Nondeterministic) => "PDA",
            (Family::Turing, Deterministic) => "DTM",
            (Family::Turing, Nondeterministic) => "NTM",
        }
    }

    /// A spelled out description of the acronym.
    pub fn description(&self) -> &'static str {
        use AutomatonType::*;
        match (self.family, self.kind) {
            (_, Empty) => "Empty",
            (Family::Finite, Deterministic) => "Deterministic Finite Automaton",
            (Family::Finite, Nondeterministic) if self.epsilon_transitions => {
                "Finite Automaton with λ-transitions"
            }
            (Family::Finite, Nondeterministic) => "Nondeterministic Finite Automaton",
            (Family::Pushdown, Deterministic) => "Deterministic Pushdown Automaton",
            (Family::Pushdown, Nondeterministic) => "Pushdown Automaton",
            (Family::Turing, Deterministic) => "Deterministic Turing Machine",
            (Family::Turing, Nondeterministic) => "Nondeterministic Turing Machine",
        }
    }
}

#[derive(Default)]
struct Counts {
    consuming: usize,
    epsilon: usize,
}

/// Classifies `automaton` by counting the operations that compete for the same
/// `(origin, symbol, top)` key. A key shared by more than one operation is nondeterminism; a
/// `(origin, top)` pair used by both an empty and a consuming operation is an epsilon
/// ambiguity. Either makes the automaton nondeterministic, and so does any empty move of a
/// finite automaton.
///
/// Prefer [`Automaton::classification`], which caches the result.
pub fn classify<L: Label>(automaton: &Automaton<L>) -> Classification {
    let mut per_key: Map<(StateId, Symbol, Symbol), usize> = Map::default();
    let mut per_top: Map<(StateId, Symbol), Counts> = Map::default();
    let mut epsilon_transitions = false;

    for (_, transition) in automaton.transitions() {
        for operation in transition.operations() {
            let key = (transition.origin(), operation.symbol(), operation.top());
            *per_key.entry(key).or_default() += 1;
            let counts = per_top
                .entry((transition.origin(), operation.top()))
                .or_default();
            if operation.is_epsilon() {
                counts.epsilon += 1;
                epsilon_transitions = true;
            } else {
                counts.consuming += 1;
            }
        }
    }

    let nondeterminism = per_key.values().any(|&count| count > 1);
    let epsilon_ambiguity = per_top
        .values()
        .any(|counts| counts.epsilon > 0 && counts.consuming > 0);

    // a finite automaton with empty moves is never deterministic
    let finite_epsilon = L::FAMILY == Family::Finite && epsilon_transitions;
    let kind = if automaton.is_empty() {
        AutomatonType::Empty
    } else if nondeterminism || epsilon_ambiguity || finite_epsilon {
        AutomatonType::Nondeterministic
    } else {
        AutomatonType::Deterministic
    };

    Classification {
        family: L::FAMILY,
        kind,
        nondeterminism,
        epsilon_ambiguity,
        epsilon_transitions,
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn empty_automata_are_empty() {
        assert_eq!(FA::new().classification().kind(), AutomatonType::Empty);
        assert_eq!(TM::new().classification().acronym(), "Empty");
    }

    #[test]
    fn finite_automata() {
        let mut fa = FA::builder()
            .with_accepting([1])
            .with_edges([(0, 'a', 1), (1, 'b', 0)])
            .build(Some(0))
            .unwrap();
        assert!(fa.classification().is_deterministic());
        assert_eq!(fa.classification().acronym(), "DFA");

        let ids = fa.state_ids();
        fa.add_transition(ids[0], ids[0], ['a']).unwrap();
        let classification = fa.classification();
        assert!(classification.has_nondeterminism());
        assert_eq!(classification.acronym(), "NFA");

        fa.add_transition(ids[1], ids[1], [EMPTY]).unwrap();
        assert_eq!(fa.classification().acronym(), "λ-NFA");
        assert!(fa.classification().has_epsilon_ambiguity());
    }

    #[test]
    fn sharing_symbol_and_top_is_nondeterministic() {
        let mut tm = TM::new();
        let q0 = tm.add_state(State::new("q0").initial());
        let q1 = tm.add_state(State::new("q1").accepting());
        tm.add_transition(q0, q1, [TmOperation::new('a', '$', StackAction::Pop)])
            .unwrap();
        tm.add_transition(q0, q1, [TmOperation::new('b', '$', StackAction::Nothing)])
            .unwrap();
        assert_eq!(tm.classification().acronym(), "DTM");

        tm.add_transition(q0, q0, [TmOperation::new('a', '$', StackAction::push("A"))])
            .unwrap();
        let classification = tm.classification();
        assert_eq!(classification.kind(), AutomatonType::Nondeterministic);
        assert_eq!(classification.acronym(), "NTM");
        assert!(!classification.has_epsilon_ambiguity());
    }

    #[test]
    fn consuming_or_not_under_same_top_is_ambiguous() {
        let mut pda = PDA::new();
        let q0 = pda.add_state(State::new("q0").initial());
        pda.add_transition(q0, q0, [PdaOperation::new('a', 'X', StackAction::Pop)])
            .unwrap();
        pda.add_transition(q0, q0, [PdaOperation::new(EMPTY, 'Y', StackAction::Pop)])
            .unwrap();
        assert_eq!(pda.classification().acronym(), "DPDA");

        pda.add_transition(q0, q0, [PdaOperation::new(EMPTY, 'X', StackAction::Nothing)])
            .unwrap();
        let classification = pda.classification();
        assert!(classification.has_epsilon_ambiguity());
        assert!(!classification.has_nondeterminism());
        assert_eq!(classification.description(), "Pushdown Automaton");
    }
}
