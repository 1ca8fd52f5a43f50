use std::{cell::RefCell, fmt::Debug, rc::Rc};

use tracing::trace;

use crate::alphabet::Alphabet;

use super::{classification::Classification, delta::Delta, delta::EpsilonClosures, Label};

/// The validity of a derived structure. A cell starts out `Stale`, moves to `Computing` while
/// it is being rebuilt and ends up `Fresh`. Any structural edit of the automaton moves it back
/// to `Stale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheState {
    /// Must be rebuilt before the next read.
    Stale,
    /// Currently being rebuilt.
    Computing,
    /// Holds a value that reflects the current graph.
    Fresh,
}

enum Slot<T> {
    Stale,
    Computing,
    Fresh(Rc<T>),
}

/// A lazily computed value behind an explicit [`CacheState`].
pub struct Cached<T> {
    name: &'static str,
    slot: RefCell<Slot<T>>,
}

impl<T> Cached<T> {
    /// Creates a stale cell, `name` only shows up in logs and panic messages.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slot: RefCell::new(Slot::Stale),
        }
    }

    /// Where the cell currently is in its life cycle.
    pub fn state(&self) -> CacheState {
        match &*self.slot.borrow() {
            Slot::Stale => CacheState::Stale,
            Slot::Computing => CacheState::Computing,
            Slot::Fresh(_) => CacheState::Fresh,
        }
    }

    /// Marks the cell as stale, dropping the cached value.
    pub fn invalidate(&mut self) {
        *self.slot.get_mut() = Slot::Stale;
    }

    /// Returns the cached value, running `build` first if the cell is stale.
    ///
    /// # Panics
    /// If `build` reads the same cell, since that means the value depends on itself.
    pub fn get_or_build(&self, build: impl FnOnce() -> T) -> Rc<T> {
        {
            let mut slot = self.slot.borrow_mut();
            match &*slot {
                Slot::Fresh(value) => return Rc::clone(value),
                Slot::Computing => panic!("{} was read while it was being rebuilt", self.name),
                Slot::Stale => *slot = Slot::Computing,
            }
        }
        trace!("rebuilding {}", self.name);
        let value = Rc::new(build());
        *self.slot.borrow_mut() = Slot::Fresh(Rc::clone(&value));
        value
    }
}

impl<T> Clone for Cached<T> {
    /// Copies start out stale, they never share cached values with the original.
    fn clone(&self) -> Self {
        Self::new(self.name)
    }
}

impl<T> Debug for Cached<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:?}", self.name, self.state())
    }
}

/// All structures an automaton derives from its graph.
#[derive(Clone, Debug)]
pub struct DerivedCaches<L: Label> {
    pub(crate) alphabet: Cached<Alphabet>,
    pub(crate) stack_alphabet: Cached<Alphabet>,
    pub(crate) delta: Cached<Delta<L>>,
    pub(crate) epsilon_closures: Cached<EpsilonClosures>,
    pub(crate) classification: Cached<Classification>,
}

impl<L: Label> Default for DerivedCaches<L> {
    fn default() -> Self {
        Self {
            alphabet: Cached::new("alphabet"),
            stack_alphabet: Cached::new("stack alphabet"),
            delta: Cached::new("delta"),
            epsilon_closures: Cached::new("epsilon closures"),
            classification: Cached::new("classification"),
        }
    }
}

impl<L: Label> DerivedCaches<L> {
    pub(crate) fn invalidate_all(&mut self) {
        self.alphabet.invalidate();
        self.stack_alphabet.invalidate();
        self.delta.invalidate();
        self.epsilon_closures.invalidate();
        self.classification.invalidate();
    }

    /// The states of all cells, in the order alphabet, stack alphabet, delta, epsilon
    /// closures, classification.
    pub fn states(&self) -> [CacheState; 5] {
        [
            self.alphabet.state(),
            self.stack_alphabet.state(),
            self.delta.state(),
            self.epsilon_closures.state(),
            self.classification.state(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn cell_life_cycle() {
        let mut cell: Cached<usize> = Cached::new("answer");
        let builds = Cell::new(0);
        assert_eq!(cell.state(), CacheState::Stale);

        let build = || {
            builds.set(builds.get() + 1);
            42
        };
        assert_eq!(*cell.get_or_build(build), 42);
        assert_eq!(cell.state(), CacheState::Fresh);
        assert_eq!(*cell.get_or_build(|| unreachable!()), 42);
        assert_eq!(builds.get(), 1);

        cell.invalidate();
        assert_eq!(cell.state(), CacheState::Stale);
        assert_eq!(*cell.get_or_build(|| 7), 7);
    }

    #[test]
    #[should_panic(expected = "was read while it was being rebuilt")]
    fn reentrant_build_panics() {
        let cell: Cached<usize> = Cached::new("loop");
        cell.get_or_build(|| *cell.get_or_build(|| 1));
    }

    #[test]
    fn clones_start_stale() {
        let cell: Cached<usize> = Cached::new("answer");
        cell.get_or_build(|| 1);
        assert_eq!(cell.clone().state(), CacheState::Stale);
    }
}
