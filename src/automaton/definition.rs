use itertools::Itertools;

use crate::{
    alphabet::{cmp_symbols, Symbol, EMPTY},
    Show,
};

use super::{Automaton, AutomatonError, Family, Label, StateId};

fn braced<I: IntoIterator<Item = String>>(items: I) -> String {
    let items = items.into_iter().join(", ");
    if items.is_empty() {
        "{ }".to_string()
    } else {
        format!("{{ {items} }}")
    }
}

impl<L: Label> Automaton<L> {
    fn sorted_labels(&self, ids: impl IntoIterator<Item = StateId>) -> Vec<String> {
        ids.into_iter()
            .map(|id| self.label_of(id).to_string())
            .sorted()
            .collect()
    }

    fn delta_lines(&self) -> Vec<String> {
        let delta = self.delta();
        let mut lines = vec![];
        for id in self
            .state_ids()
            .into_iter()
            .sorted_by(|l, r| self.label_of(*l).cmp(self.label_of(*r)))
        {
            let keys = delta.keys(id).sorted_by(|l, r| {
                cmp_symbols(&l.symbol, &r.symbol).then(cmp_symbols(&l.top, &r.top))
            });
            for key in keys {
                let moves = delta.moves(id, key.symbol, key.top);
                let line = match L::FAMILY {
                    Family::Finite => format!(
                        "δ({}, {}) = {}",
                        self.label_of(id),
                        key.symbol,
                        braced(moves.iter().map(|m| self.label_of(m.target).to_string()))
                    ),
                    _ => format!(
                        "δ({}, {}, {}) = {}",
                        self.label_of(id),
                        key.symbol,
                        key.top,
                        braced(moves.iter().map(|m| format!(
                            "({}, {})",
                            self.label_of(m.target),
                            m.operation.show()
                        )))
                    ),
                };
                lines.push(line);
            }
        }
        lines
    }

    /// Returns the formal definition of the automaton in tuple notation, followed by the set of
    /// states, the alphabet(s), the transition relation and the set of accepting states. Sets
    /// of states are sorted by label.
    ///
    /// Fails with [`AutomatonError::MissingInitialState`] since the tuple names the initial
    /// state.
    pub fn formal_definition(&self) -> Result<String, AutomatonError> {
        let initial = self
            .initial_state()
            .ok_or(AutomatonError::MissingInitialState)?;
        let initial = self.label_of(initial);
        let stack_start = self.stack_start();

        let mut lines = vec![match L::FAMILY {
            Family::Finite => format!("A = {{ Q, Σ, δ, {initial}, F }}"),
            Family::Pushdown => format!("P = {{ Q, Σ, Γ, δ, {initial}, {stack_start}, F }}"),
            Family::Turing => format!("T = {{ Q, Σ, Γ, δ, {initial}, {stack_start}, F }}"),
        }];
        lines.push(format!(
            "Q = {}",
            braced(self.sorted_labels(self.state_ids()))
        ));
        lines.push(format!("Σ = {}", braced(self.alphabet().iter().map(|s| s.show()))));
        if L::FAMILY != Family::Finite {
            lines.push(format!(
                "Γ = {}",
                braced(self.stack_alphabet().iter().map(|s| s.show()))
            ));
        }
        lines.extend(self.delta_lines());
        lines.push(format!(
            "F = {}",
            braced(self.sorted_labels(self.accepting_states()))
        ));
        Ok(lines.join("\n"))
    }

    /// Renders the transition function as a table with one row per state and one column per
    /// input symbol, plus a column for [`EMPTY`] if some operation consumes nothing. The initial
    /// state is marked with `→` and accepting states with `*`.
    pub fn transition_table(&self) -> String {
        let delta = self.delta();
        let mut columns: Vec<Symbol> = vec![];
        if self
            .transitions()
            .any(|(_, t)| t.operations().any(|o| o.is_epsilon()))
        {
            columns.push(EMPTY);
        }
        columns.extend(self.alphabet().iter());

        let mut builder = tabled::builder::Builder::default();
        builder.push_record(
            std::iter::once("State".to_string()).chain(columns.iter().map(|s| s.to_string())),
        );
        for (id, state) in self.states() {
            let marker = match (state.is_initial(), state.is_accepting()) {
                (true, true) => "→*",
                (true, false) => "→",
                (false, true) => "*",
                (false, false) => "",
            };
            let mut row = vec![format!("{marker}{}", state.label())];
            for &symbol in &columns {
                let cell = delta
                    .moves_on(id, symbol)
                    .map(|m| m.operation.describe_move(self.label_of(m.target)))
                    .join(", ");
                row.push(if cell.is_empty() { "-".to_string() } else { cell });
            }
            builder.push_record(row);
        }

        builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string()
    }
}
