use crate::automaton::{Automaton, AutomatonError, Label, StateId};

mod concatenation;
pub use concatenation::concatenation;

mod union;
pub use union::union;

mod star;
pub use star::kleene_star;

/// Checks the preconditions every operand of a composition has to satisfy and returns a
/// working copy together with its initial state. The operand itself is never touched.
fn prepare<L: Label>(operand: &Automaton<L>) -> Result<(Automaton<L>, StateId), AutomatonError> {
    let initial = operand
        .initial_state()
        .ok_or(AutomatonError::MissingInitialState)?;
    if operand.accepting_states().is_empty() {
        return Err(AutomatonError::MissingAcceptingState);
    }
    let mut copy = operand.clone();
    copy.deactivate_all_states_in_simulation();
    Ok((copy, initial))
}

/// Moves `operand` into `into` without its initial flag and returns where its former initial
/// state and accepting states ended up.
fn absorb<L: Label>(
    into: &mut Automaton<L>,
    mut operand: Automaton<L>,
    initial: StateId,
) -> Result<(StateId, Vec<StateId>), AutomatonError> {
    let accepting = operand.accepting_states();
    operand.set_initial_state(None);
    let mapping = into.merge(operand);
    let translate = |q: StateId| {
        mapping
            .get_by_left(&q)
            .copied()
            .ok_or(AutomatonError::UnknownState(q))
    };
    let accepting = accepting
        .into_iter()
        .map(translate)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((translate(initial)?, accepting))
}
