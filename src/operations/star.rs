use tracing::debug;

use crate::automaton::{Automaton, AutomatonError, EpsilonLabel, State};

use super::{absorb, prepare};

/// Builds an automaton for the Kleene star of the language of `operand`. A fresh accepting
/// initial state leads to the former initial state, and every accepting state gets an empty
/// move back to it.
pub fn kleene_star<L: EpsilonLabel>(
    operand: &Automaton<L>,
) -> Result<Automaton<L>, AutomatonError> {
    let (operand, initial) = prepare(operand)?;

    let mut result = Automaton::with_stack_start(operand.stack_start());
    result.set_search_limits(operand.search_limits());
    let start = result.add_state(State::new("q0").initial().accepting());
    let (former_initial, accepting) = absorb(&mut result, operand, initial)?;
    result.add_transition(start, former_initial, [L::epsilon()])?;
    for q in accepting {
        result.add_transition(q, former_initial, [L::epsilon()])?;
    }
    result.relabel();

    debug!("built Kleene star with {} states", result.size());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use crate::operations::tests::single;
    use crate::prelude::*;

    #[test]
    fn star_accepts_repetitions() {
        let ab = concatenation(&single('a'), &single('b')).unwrap();
        let star = kleene_star(&ab).unwrap();
        for word in ["", "ab", "abab", "ababab"] {
            assert!(star.accepts(word), "{word} should be accepted");
        }
        for word in ["a", "aba", "ba", "abb"] {
            assert!(!star.accepts(word), "{word} should be rejected");
        }
    }

    #[test]
    fn star_of_union() {
        let star = kleene_star(&union(&single('a'), &single('b')).unwrap()).unwrap();
        assert!(star.accepts("abba"));
        assert!(!star.accepts("abc"));
        let labels: Vec<_> = star.states().map(|(_, s)| s.label().to_string()).collect();
        assert_eq!(labels.len(), 6);
        assert_eq!(labels[0], "q0");
    }
}
