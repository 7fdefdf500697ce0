use super::pairs::ExchangePair;
use crate::replica::{MonteCarloStep, Replica};

/// Exchanges the configurations of two replicas by value.
///
/// Each replica keeps its id and temperature; only the states move, and both
/// energies are refreshed from the swapped states.
pub fn swap_configurations<S: MonteCarloStep>(a: &mut Replica<S>, b: &mut Replica<S>) {
    let state_a = a.state();
    let state_b = b.state();
    a.set_state(state_b);
    b.set_state(state_a);
}

/// Swaps the replicas sitting at the two positions of `pair`.
pub fn swap_pair<S: MonteCarloStep>(slots: &mut [&mut Replica<S>], pair: ExchangePair) {
    let (lo, hi) = slots.split_at_mut(pair.upper);
    swap_configurations(&mut *lo[pair.lower], &mut *hi[0]);
}
