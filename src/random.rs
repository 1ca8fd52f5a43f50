use fastrand::Rng;
use tracing::debug;

use crate::{
    alphabet::{Symbol, EMPTY},
    automaton::{State, FA},
};

/// Returns the `i`-th letter of the alphabet `a, b, c, ...`.
pub fn nth_symbol(i: usize) -> Symbol {
    assert!(i < 26, "only 26 symbols are supported");
    (b'a' + i as u8) as char
}

/// Uses a sprout-like algorithm to generate a random deterministic finite automaton over
/// `symbols` letters. `probability` determines the probability of an edge back to some
/// existing state. The algorithm is as follows:
/// 1. Start with a single state.
/// 2. For each symbol, go through the existing states in order and with probability
///    `probability` add an edge to that state.
/// 3. If no such edge was added, insert an edge to a new state.
/// 4. Repeat until all states and symbols have been treated.
///
/// Every state is accepting with probability one half. The initial state is the first one.
pub fn generate_random_dfa(rng: &mut Rng, symbols: usize, probability: f64) -> FA {
    let mut fa = FA::new();
    let mut states = vec![fa.add_state(State::new("q0").initial())];
    let mut current = 0;

    while current < states.len() {
        for i in 0..symbols {
            let symbol = nth_symbol(i);
            let target = match (0..=current).find(|_| rng.f64() < probability) {
                Some(target) => states[target],
                None => {
                    let target = fa.add_state(State::new(format!("q{}", states.len())));
                    states.push(target);
                    target
                }
            };
            fa.add_transition(states[current], target, [symbol])
                .unwrap_or_else(|e| unreachable!("both states were just created: {e}"));
        }
        current += 1;
    }

    for &q in &states {
        if rng.bool() {
            fa.set_accepting(q, true)
                .unwrap_or_else(|e| unreachable!("state was just created: {e}"));
        }
    }
    debug!("generated random DFA with {} states", fa.size());
    fa
}

/// Generates a random finite automaton with `size` states by drawing, for each state and each
/// symbol, up to `fan_out` targets. With probability `epsilon` a state additionally gets an
/// empty move to a random state. Every state is accepting with probability one half.
pub fn generate_random_nfa(
    rng: &mut Rng,
    symbols: usize,
    size: usize,
    fan_out: usize,
    epsilon: f64,
) -> FA {
    let mut fa = FA::new();
    let states: Vec<_> = (0..size)
        .map(|i| {
            let mut state = State::new(format!("q{i}"));
            state.accepting = rng.bool();
            fa.add_state(state)
        })
        .collect();
    if let Some(&first) = states.first() {
        fa.set_initial_state(Some(first));
    }

    for &q in &states {
        for i in 0..symbols {
            for _ in 0..rng.usize(..=fan_out) {
                let target = states[rng.usize(..size)];
                fa.add_transition(q, target, [nth_symbol(i)])
                    .unwrap_or_else(|e| unreachable!("both states were just created: {e}"));
            }
        }
        if rng.f64() < epsilon {
            let target = states[rng.usize(..size)];
            fa.add_transition(q, target, [EMPTY])
                .unwrap_or_else(|e| unreachable!("both states were just created: {e}"));
        }
    }
    fa
}

/// Draws a random word of length at most `max_length` over `symbols` letters.
pub fn random_word(rng: &mut Rng, symbols: usize, max_length: usize) -> String {
    (0..rng.usize(..=max_length))
        .map(|_| nth_symbol(rng.usize(..symbols)))
        .collect()
}
