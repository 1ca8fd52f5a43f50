use std::{cmp::Ordering, collections::BTreeSet};

use itertools::Itertools;

use crate::Show;

/// A single input or stack symbol.
pub type Symbol = char;

/// The designated empty symbol. As an input symbol it means that no input is consumed, as an
/// expected stack top it means that the top of the stack is not inspected.
pub const EMPTY: Symbol = 'λ';

/// The symbol that sits alone on the stack when a pushdown automaton or Turing machine
/// starts running, unless a different one is configured.
pub const STACK_START: Symbol = '$';

/// Returns true if `symbol` is the [`EMPTY`] symbol.
pub fn is_empty(symbol: Symbol) -> bool {
    symbol == EMPTY
}

/// Compares two symbols such that [`EMPTY`] comes before everything else and all
/// remaining symbols are ordered naturally.
pub fn cmp_symbols(left: &Symbol, right: &Symbol) -> Ordering {
    match (is_empty(*left), is_empty(*right)) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => left.cmp(right),
    }
}

impl Show for Symbol {
    fn show(&self) -> String {
        self.to_string()
    }

    fn show_collection<'a, I>(iter: I) -> String
    where
        Self: 'a,
        I: IntoIterator<Item = &'a Self>,
        I::IntoIter: DoubleEndedIterator,
    {
        format!(
            "{{ {} }}",
            iter.into_iter()
                .sorted_by(|l, r| cmp_symbols(l, r))
                .join(", ")
        )
    }
}

/// A finite, ordered set of symbols. By construction it never contains [`EMPTY`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Alphabet(BTreeSet<Symbol>);

impl Alphabet {
    /// Creates an empty alphabet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `symbol` unless it is [`EMPTY`]. Returns true if the alphabet changed.
    pub fn insert(&mut self, symbol: Symbol) -> bool {
        !is_empty(symbol) && self.0.insert(symbol)
    }

    /// Returns true if `symbol` belongs to the alphabet.
    pub fn contains(&self, symbol: Symbol) -> bool {
        self.0.contains(&symbol)
    }

    /// Iterates over the symbols in their natural order.
    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.0.iter().copied()
    }

    /// The number of symbols.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no symbols.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Symbol> for Alphabet {
    fn from_iter<T: IntoIterator<Item = Symbol>>(iter: T) -> Self {
        let mut alphabet = Alphabet::new();
        for symbol in iter {
            alphabet.insert(symbol);
        }
        alphabet
    }
}

impl Extend<Symbol> for Alphabet {
    fn extend<T: IntoIterator<Item = Symbol>>(&mut self, iter: T) {
        for symbol in iter {
            self.insert(symbol);
        }
    }
}

impl Show for Alphabet {
    fn show(&self) -> String {
        Symbol::show_collection(self.0.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_symbol_sorts_first() {
        let mut symbols = vec!['b', EMPTY, 'a', '$'];
        symbols.sort_by(cmp_symbols);
        assert_eq!(symbols, vec![EMPTY, '$', 'a', 'b']);
    }

    #[test]
    fn alphabet_never_holds_empty_symbol() {
        let alphabet: Alphabet = ['b', EMPTY, 'a', 'b'].into_iter().collect();
        assert!(!alphabet.contains(EMPTY));
        assert_eq!(alphabet.iter().collect::<Vec<_>>(), vec!['a', 'b']);
        assert_eq!(alphabet.show(), "{ a, b }");
    }
}
