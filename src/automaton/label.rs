use std::{fmt::Debug, hash::Hash, ops::Deref};

use itertools::Itertools;

use crate::{
    alphabet::{is_empty, Symbol, EMPTY},
    stack::Stack,
    Show,
};

use super::AutomatonError;

/// Disambiguates between the three kinds of machines that share the graph model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Finite automata, labels are plain symbols.
    Finite,
    /// Pushdown automata, simulated by the subset engine on configurations.
    Pushdown,
    /// Stack based Turing machines, simulated by exploring the ID tree.
    Turing,
}

/// The result of successfully firing an operation: whether the next input symbol was
/// consumed and the stack after the operation was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Firing {
    /// True if the operation consumed the next input symbol.
    pub consumed: bool,
    /// The stack after applying the stack action to a copy of the original one.
    pub stack: Stack,
}

/// A label that can be put on a [`super::Transition`]. This is the only place where the
/// automaton families differ in how they execute, every other part of the crate is generic
/// over it.
pub trait Label: Clone + Eq + Hash + Debug + Show {
    /// Which family of automata uses this label.
    const FAMILY: Family;

    /// The input symbol consumed by the operation, [`EMPTY`] if it consumes nothing.
    fn symbol(&self) -> Symbol;

    /// The expected top of the stack, [`EMPTY`] if the operation does not name one.
    fn top(&self) -> Symbol {
        EMPTY
    }

    /// The symbols this operation may place on the stack.
    fn pushed(&self) -> &[Symbol] {
        &[]
    }

    /// Returns true if the operation consumes no input.
    fn is_epsilon(&self) -> bool {
        is_empty(self.symbol())
    }

    /// Attempts to fire the operation when `next` is the next unread input symbol (`None` once
    /// the input is exhausted) and `stack` is the current stack. Returns `None` if the operation
    /// does not match.
    fn fire(&self, next: Option<Symbol>, stack: &Stack) -> Option<Firing>;

    /// Checks that the operation is well formed.
    fn validate(&self) -> Result<(), AutomatonError> {
        Ok(())
    }

    /// Renders a move along this operation into `target` for transition tables.
    fn describe_move(&self, target: &str) -> String {
        target.to_string()
    }
}

/// Labels that have an unconditional move which consumes nothing and leaves the stack
/// untouched. Composition glues automata together with such moves.
pub trait EpsilonLabel: Label {
    /// Returns the unconditional empty move.
    fn epsilon() -> Self;
}

fn consumes(symbol: Symbol, next: Option<Symbol>) -> Option<bool> {
    if is_empty(symbol) {
        Some(false)
    } else if next == Some(symbol) {
        Some(true)
    } else {
        None
    }
}

impl Label for Symbol {
    const FAMILY: Family = Family::Finite;

    fn symbol(&self) -> Symbol {
        *self
    }

    fn fire(&self, next: Option<Symbol>, stack: &Stack) -> Option<Firing> {
        consumes(*self, next).map(|consumed| Firing {
            consumed,
            stack: stack.clone(),
        })
    }
}

impl EpsilonLabel for Symbol {
    fn epsilon() -> Self {
        EMPTY
    }
}

/// What an operation does to the stack once it fires.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StackAction {
    /// Leaves the stack as it is.
    Nothing,
    /// Removes the top symbol.
    Pop,
    /// Pushes the symbols in order, the last one ends up on top.
    Push(Vec<Symbol>),
    /// Pops the top symbol and then pushes the symbols in order.
    Replace(Vec<Symbol>),
}

impl StackAction {
    /// Convenience constructor for [`StackAction::Push`] from a string of symbols.
    pub fn push(symbols: &str) -> Self {
        Self::Push(symbols.chars().collect())
    }

    /// Convenience constructor for [`StackAction::Replace`] from a string of symbols.
    pub fn replace(symbols: &str) -> Self {
        Self::Replace(symbols.chars().collect())
    }

    /// Applies the action to a copy of `stack`. Fails if a symbol has to be popped from an
    /// empty stack.
    pub fn apply(&self, stack: &Stack) -> Option<Stack> {
        let mut stack = stack.clone();
        match self {
            StackAction::Nothing => {}
            StackAction::Pop => {
                stack.pop()?;
            }
            StackAction::Push(symbols) => stack.push_all(symbols),
            StackAction::Replace(symbols) => {
                stack.pop()?;
                stack.push_all(symbols);
            }
        }
        Some(stack)
    }

    fn symbols(&self) -> &[Symbol] {
        match self {
            StackAction::Push(symbols) | StackAction::Replace(symbols) => symbols,
            _ => &[],
        }
    }
}

impl Show for StackAction {
    fn show(&self) -> String {
        match self {
            StackAction::Nothing => "nothing".to_string(),
            StackAction::Pop => "pop".to_string(),
            StackAction::Push(symbols) => format!("push {}", symbols.iter().join("")),
            StackAction::Replace(symbols) => format!("replace {}", symbols.iter().join("")),
        }
    }
}

/// The operation carried by transitions of stack machines: the consumed input symbol, the
/// expected top of the stack and what to do with the stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StackOperation {
    /// Consumed input symbol, [`EMPTY`] if nothing is consumed.
    pub symbol: Symbol,
    /// Expected stack top, [`EMPTY`] if not inspected.
    pub top: Symbol,
    /// The stack mutation.
    pub action: StackAction,
}

impl StackOperation {
    /// Creates a new operation.
    pub fn new(symbol: Symbol, top: Symbol, action: StackAction) -> Self {
        Self {
            symbol,
            top,
            action,
        }
    }

    fn validate(&self) -> Result<(), AutomatonError> {
        if self.action.symbols().iter().any(|&s| is_empty(s)) {
            return Err(AutomatonError::InvalidOperation(format!(
                "{} places the empty symbol on the stack",
                self.show()
            )));
        }
        if matches!(&self.action, StackAction::Push(symbols) if symbols.is_empty()) {
            return Err(AutomatonError::InvalidOperation(format!(
                "{} pushes no symbols",
                self.show()
            )));
        }
        Ok(())
    }

    fn fire_if(&self, top_matches: bool, next: Option<Symbol>, stack: &Stack) -> Option<Firing> {
        let consumed = consumes(self.symbol, next)?;
        if !top_matches {
            return None;
        }
        self.action
            .apply(stack)
            .map(|stack| Firing { consumed, stack })
    }
}

impl Show for StackOperation {
    fn show(&self) -> String {
        format!("{}, {} | {}", self.symbol, self.top, self.action.show())
    }
}

macro_rules! stack_label {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub StackOperation);

        impl $name {
            /// Creates a new operation from its symbol, expected top and stack action.
            pub fn new(symbol: Symbol, top: Symbol, action: StackAction) -> Self {
                Self(StackOperation::new(symbol, top, action))
            }
        }

        impl Deref for $name {
            type Target = StackOperation;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl From<StackOperation> for $name {
            fn from(value: StackOperation) -> Self {
                Self(value)
            }
        }

        impl Show for $name {
            fn show(&self) -> String {
                self.0.show()
            }
        }
    };
}

stack_label!(
    PdaOperation,
    "Operation of a pushdown automaton. An expected top of [`EMPTY`] is a wildcard that matches any stack."
);
stack_label!(
    TmOperation,
    "Operation of a Turing machine. An expected top of [`EMPTY`] only matches the empty stack."
);

impl Label for PdaOperation {
    const FAMILY: Family = Family::Pushdown;

    fn symbol(&self) -> Symbol {
        self.0.symbol
    }

    fn top(&self) -> Symbol {
        self.0.top
    }

    fn pushed(&self) -> &[Symbol] {
        self.0.action.symbols()
    }

    fn fire(&self, next: Option<Symbol>, stack: &Stack) -> Option<Firing> {
        let top_matches = is_empty(self.0.top) || stack.top() == Some(self.0.top);
        self.0.fire_if(top_matches, next, stack)
    }

    fn validate(&self) -> Result<(), AutomatonError> {
        self.0.validate()
    }

    fn describe_move(&self, target: &str) -> String {
        format!("{} / {} → {}", self.0.top, self.0.action.show(), target)
    }
}

impl EpsilonLabel for PdaOperation {
    fn epsilon() -> Self {
        Self::new(EMPTY, EMPTY, StackAction::Nothing)
    }
}

impl Label for TmOperation {
    const FAMILY: Family = Family::Turing;

    fn symbol(&self) -> Symbol {
        self.0.symbol
    }

    fn top(&self) -> Symbol {
        self.0.top
    }

    fn pushed(&self) -> &[Symbol] {
        self.0.action.symbols()
    }

    fn fire(&self, next: Option<Symbol>, stack: &Stack) -> Option<Firing> {
        let top_matches = match stack.top() {
            Some(top) => top == self.0.top,
            None => is_empty(self.0.top),
        };
        self.0.fire_if(top_matches, next, stack)
    }

    fn validate(&self) -> Result<(), AutomatonError> {
        self.0.validate()
    }

    fn describe_move(&self, target: &str) -> String {
        format!("{} / {} → {}", self.0.top, self.0.action.show(), target)
    }
}
