use tracing::debug;

use crate::automaton::{Automaton, AutomatonError, EpsilonLabel};

use super::{absorb, prepare};

/// Builds an automaton for the concatenation of the languages of `first` and `second`. Every
/// accepting state of `first` loses its flag and gets an empty move to the former initial
/// state of `second`. States are relabelled `q0`, `q1`, ... afterwards.
///
/// Both operands need an initial state and at least one accepting state, neither of them is
/// modified.
pub fn concatenation<L: EpsilonLabel>(
    first: &Automaton<L>,
    second: &Automaton<L>,
) -> Result<Automaton<L>, AutomatonError> {
    let (mut result, _) = prepare(first)?;
    let (second, second_initial) = prepare(second)?;

    let glue_from = result.accepting_states();
    for &q in &glue_from {
        result.set_accepting(q, false)?;
    }
    let (glue_to, _) = absorb(&mut result, second, second_initial)?;
    for q in glue_from {
        result.add_transition(q, glue_to, [L::epsilon()])?;
    }
    result.relabel();

    debug!(
        "concatenated automata with {} and {} states",
        first.size(),
        result.size() - first.size()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use crate::operations::tests::single;
    use crate::prelude::*;

    #[test_log::test]
    fn concatenation_accepts_exactly_the_concatenated_words() {
        let a = single('a');
        let b = single('b');
        let ab = concatenation(&a, &b).unwrap();
        assert!(ab.accepts("ab"));
        for word in ["a", "b", "", "ba", "abb"] {
            assert!(!ab.accepts(word), "{word} should be rejected");
        }
        assert_eq!(ab.classification().acronym(), "λ-NFA");
    }

    #[test]
    fn result_is_relabelled() {
        let ab = concatenation(&single('a'), &single('b')).unwrap();
        let labels: Vec<_> = ab.states().map(|(_, s)| s.label().to_string()).collect();
        assert_eq!(labels, vec!["q0", "q1", "q2", "q3"]);
        assert_eq!(ab.initial_state(), Some(ab.state_ids()[0]));
        assert_eq!(ab.accepting_states(), vec![ab.state_ids()[3]]);
        assert_eq!(ab.states().filter(|(_, s)| s.is_initial()).count(), 1);
    }

    #[test]
    fn failed_concatenation_leaves_operands_alone() {
        let a = single('a');
        let mut b = single('b');
        let accepting = b.accepting_states()[0];
        b.set_accepting(accepting, false).unwrap();
        let (a_before, b_before) = (a.clone(), b.clone());

        assert_eq!(
            concatenation(&a, &b),
            Err(AutomatonError::MissingAcceptingState)
        );
        assert_eq!(a, a_before);
        assert_eq!(b, b_before);
    }

    #[test]
    fn successful_concatenation_leaves_operands_alone() {
        let mut a = single('a');
        let b = single('b');
        let step = a.simulate("a").steps()[1].clone();
        a.activate_step(&step);
        let (a_before, b_before) = (a.clone(), b.clone());

        let ab = concatenation(&a, &b).unwrap();
        assert!(ab.states().all(|(_, s)| !s.is_active_in_simulation()));
        assert_eq!(a, a_before);
        assert_eq!(b, b_before);
        assert!(a.accepts("a"));
    }

    #[test]
    fn pushdown_concatenation() {
        let push = PDA::builder()
            .with_accepting([1])
            .with_edges([(0, PdaOperation::new('a', '$', StackAction::push("A")), 1)])
            .build(Some(0))
            .unwrap();
        let pop = PDA::builder()
            .with_accepting([1])
            .with_edges([(0, PdaOperation::new('b', 'A', StackAction::Pop), 1)])
            .build(Some(0))
            .unwrap();
        let both = concatenation(&push, &pop).unwrap();
        assert!(both.accepts("ab"));
        assert!(!both.accepts("b"));
        assert!(!pop.accepts("b"));
    }
}
