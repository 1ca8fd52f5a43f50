use tracing::debug;

use crate::automaton::{Automaton, AutomatonError, EpsilonLabel, State};

use super::{absorb, prepare};

/// Builds an automaton for the union of the languages of `left` and `right`: a fresh initial
/// state with empty moves to both former initial states. Accepting states are kept.
pub fn union<L: EpsilonLabel>(
    left: &Automaton<L>,
    right: &Automaton<L>,
) -> Result<Automaton<L>, AutomatonError> {
    let (left, left_initial) = prepare(left)?;
    let (right, right_initial) = prepare(right)?;

    let mut result = Automaton::with_stack_start(left.stack_start());
    result.set_search_limits(left.search_limits());
    let start = result.add_state(State::new("q0").initial());
    for (operand, initial) in [(left, left_initial), (right, right_initial)] {
        let (former_initial, _) = absorb(&mut result, operand, initial)?;
        result.add_transition(start, former_initial, [L::epsilon()])?;
    }
    result.relabel();

    debug!("built union with {} states", result.size());
    Ok(result)
}
