use std::collections::BTreeMap;

use bit_set::BitSet;

use crate::{
    alphabet::{Symbol, EMPTY},
    math::{Map, OrderedSet},
};

use super::{Automaton, Label, StateId, TransitionId};

/// Key of the transition function: the consumed symbol and the expected stack top. For finite
/// automata the top is always [`EMPTY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeltaKey {
    /// Consumed input symbol or [`EMPTY`].
    pub symbol: Symbol,
    /// Expected stack top or [`EMPTY`].
    pub top: Symbol,
}

/// A single entry of the transition function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move<L> {
    /// The operation that has to fire.
    pub operation: L,
    /// Where the move leads.
    pub target: StateId,
    /// The transition the operation belongs to.
    pub transition: TransitionId,
}

/// The transition function of an automaton. Every state of the automaton has an entry, even
/// if no transition leaves it, so lookups never have to deal with missing states.
#[derive(Debug, Clone)]
pub struct Delta<L> {
    outgoing: Map<StateId, Vec<TransitionId>>,
    moves: Map<StateId, BTreeMap<DeltaKey, Vec<Move<L>>>>,
}

impl<L: Label> Delta<L> {
    pub(crate) fn build(automaton: &Automaton<L>) -> Self {
        let mut outgoing: Map<StateId, Vec<TransitionId>> = Map::default();
        let mut moves: Map<StateId, BTreeMap<DeltaKey, Vec<Move<L>>>> = Map::default();
        for (id, _) in automaton.states() {
            outgoing.insert(id, vec![]);
            moves.insert(id, BTreeMap::new());
        }

        for (id, transition) in automaton.transitions() {
            outgoing
                .get_mut(&transition.origin())
                .expect("transition leaves a state that does not exist")
                .push(id);
            let table = moves
                .get_mut(&transition.origin())
                .expect("transition leaves a state that does not exist");
            for operation in transition.operations() {
                let key = DeltaKey {
                    symbol: operation.symbol(),
                    top: operation.top(),
                };
                table.entry(key).or_default().push(Move {
                    operation: operation.clone(),
                    target: transition.target(),
                    transition: id,
                });
            }
        }

        Self { outgoing, moves }
    }

    fn table(&self, state: StateId) -> &BTreeMap<DeltaKey, Vec<Move<L>>> {
        self.moves
            .get(&state)
            .unwrap_or_else(|| panic!("{state:?} has no entry in delta, the cache is stale"))
    }

    /// The moves leaving `state` on `symbol` that expect `top`. The empty symbol and the empty
    /// top are looked up literally.
    pub fn moves(&self, state: StateId, symbol: Symbol, top: Symbol) -> &[Move<L>] {
        self.table(state)
            .get(&DeltaKey { symbol, top })
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All moves leaving `state` on `symbol`, whatever top they expect.
    pub fn moves_on(&self, state: StateId, symbol: Symbol) -> impl Iterator<Item = &Move<L>> {
        let from = DeltaKey {
            symbol,
            top: char::MIN,
        };
        let to = DeltaKey {
            symbol,
            top: char::MAX,
        };
        self.table(state)
            .range(from..=to)
            .flat_map(|(_, moves)| moves.iter())
    }

    /// The states reached from `state` on `symbol`, in transition order. This is the classical
    /// transition function of a finite automaton.
    pub fn targets(&self, state: StateId, symbol: Symbol) -> Vec<StateId> {
        self.moves(state, symbol, EMPTY)
            .iter()
            .map(|m| m.target)
            .collect()
    }

    /// The transitions leaving `state` in insertion order.
    pub fn outgoing(&self, state: StateId) -> &[TransitionId] {
        self.outgoing
            .get(&state)
            .unwrap_or_else(|| panic!("{state:?} has no entry in delta, the cache is stale"))
    }

    /// All keys used by moves leaving `state`, empty symbol first.
    pub fn keys(&self, state: StateId) -> impl Iterator<Item = DeltaKey> + '_ {
        self.table(state).keys().copied()
    }

    /// The states that have an entry.
    pub fn states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.moves.keys().copied()
    }
}

/// For every state, the set of states reachable through zero or more moves that consume no
/// input. Stack conditions are ignored here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpsilonClosures(Map<StateId, OrderedSet<StateId>>);

impl EpsilonClosures {
    pub(crate) fn build<L: Label>(delta: &Delta<L>) -> Self {
        Self(
            delta
                .states()
                .map(|state| (state, closure_of(state, delta)))
                .collect(),
        )
    }

    /// The closure of a single state, always containing the state itself.
    pub fn of(&self, state: StateId) -> &OrderedSet<StateId> {
        self.0
            .get(&state)
            .unwrap_or_else(|| panic!("{state:?} has no epsilon closure, the cache is stale"))
    }

    /// The union of the closures of all given states.
    pub fn of_all<'a>(&self, states: impl IntoIterator<Item = &'a StateId>) -> OrderedSet<StateId> {
        states
            .into_iter()
            .flat_map(|&state| self.of(state).iter().copied())
            .collect()
    }

    /// The number of states with a closure.
    pub fn size(&self) -> usize {
        self.0.len()
    }
}

fn closure_of<L: Label>(state: StateId, delta: &Delta<L>) -> OrderedSet<StateId> {
    let mut visited = BitSet::new();
    let mut closure = OrderedSet::new();
    let mut stack = vec![state];

    while let Some(current) = stack.pop() {
        if !visited.insert(current.index()) {
            continue;
        }
        closure.insert(current);
        for m in delta.moves_on(current, EMPTY) {
            if !visited.contains(m.target.index()) {
                stack.push(m.target);
            }
        }
    }

    closure
}
