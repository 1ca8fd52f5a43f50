use itertools::Itertools;

use crate::{alphabet::Symbol, Show};

/// The stack of a pushdown automaton or Turing machine configuration. Stacks are plain values,
/// every move works on its own copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Stack(Vec<Symbol>);

impl Stack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stack that holds exactly `start`.
    pub fn starting_with(start: Symbol) -> Self {
        Self(vec![start])
    }

    /// Returns the topmost symbol, if any.
    pub fn top(&self) -> Option<Symbol> {
        self.0.last().copied()
    }

    /// Pushes a single symbol.
    pub fn push(&mut self, symbol: Symbol) {
        self.0.push(symbol)
    }

    /// Pushes the given symbols in order, so the last one ends up on top.
    pub fn push_all(&mut self, symbols: &[Symbol]) {
        self.0.extend_from_slice(symbols)
    }

    /// Removes and returns the topmost symbol.
    pub fn pop(&mut self) -> Option<Symbol> {
        self.0.pop()
    }

    /// The number of symbols on the stack.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the stack holds no symbols.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the contents starting at the top.
    pub fn iter_top_first(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.0.iter().rev().copied()
    }
}

impl FromIterator<Symbol> for Stack {
    /// Symbols are taken bottom first.
    fn from_iter<T: IntoIterator<Item = Symbol>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Show for Stack {
    fn show(&self) -> String {
        self.iter_top_first().join("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_all_leaves_last_symbol_on_top() {
        let mut stack = Stack::starting_with('$');
        stack.push_all(&['A', 'B']);
        assert_eq!(stack.top(), Some('B'));
        assert_eq!(stack.show(), "BA$");
        assert_eq!(stack.pop(), Some('B'));
        assert_eq!(stack.len(), 2);
    }
}
