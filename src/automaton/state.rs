use crate::Show;

/// Handle of a [`State`] inside the automaton that owns it. Handles stay valid until the state
/// is removed and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub(crate) usize);

impl StateId {
    /// The position of the state in the arena of its automaton.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A state of an automaton. Whether a state is initial is decided by the automaton, the flag
/// mirrors that decision so that a state can be inspected on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct State {
    pub(crate) label: String,
    pub(crate) initial: bool,
    pub(crate) accepting: bool,
    pub(crate) active_in_simulation: bool,
}

impl State {
    /// Creates a non-initial, non-accepting state with the given label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            initial: false,
            accepting: false,
            active_in_simulation: false,
        }
    }

    /// Marks the state as the one the automaton starts in once it is added.
    pub fn initial(mut self) -> Self {
        self.initial = true;
        self
    }

    /// Marks the state as accepting (final).
    pub fn accepting(mut self) -> Self {
        self.accepting = true;
        self
    }

    /// The label of the state.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether this is the initial state of its automaton.
    pub fn is_initial(&self) -> bool {
        self.initial
    }

    /// Whether this state is accepting.
    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    /// Turing machines call accepting states final.
    pub fn is_final(&self) -> bool {
        self.accepting
    }

    /// Whether the state is part of the simulation step that is currently displayed.
    pub fn is_active_in_simulation(&self) -> bool {
        self.active_in_simulation
    }
}

impl Show for State {
    fn show(&self) -> String {
        self.label.clone()
    }
}
