pub mod acceptance;
pub mod pairs;
pub mod stats;
pub mod swap;

pub use acceptance::{calc_delta, Acceptance, AcceptanceEvaluator, PairOutcome};
pub use pairs::{select_pairs, ExchangePair};
pub use stats::{ExchangeStats, PairSummary};

use crate::consts::EXCHANGE_SEED_OFFSET;
use crate::replica::{MonteCarloStep, Replica};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Everything that happened in one exchange round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Attempt counter value this round ran with.
    pub round: u64,
    /// Simulation step at which the round happened.
    pub step: u64,
    pub parity: usize,
    pub outcomes: Vec<PairOutcome>,
}

impl RoundRecord {
    pub fn n_accepted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.accepted).count()
    }
}

/// Seed of the exchange-phase RNG for a run seeded with `seed`.
///
/// Replica `id` uses `seed + id`; the exchange stream lies below `seed`, so no
/// ladder shorter than `2^64 - EXCHANGE_SEED_OFFSET` can share it.
pub fn exchange_seed(seed: u64) -> u64 {
    seed.wrapping_sub(EXCHANGE_SEED_OFFSET)
}

/// Exchange-phase state: attempt counter, walker order, statistics, history
/// and the exchange RNG. Only ever touched by the single exchanging thread.
#[derive(Debug)]
pub struct Exchanger {
    evaluator: AcceptanceEvaluator,
    rng: fastrand::Rng,
    attempt_count: u64,
    order: Vec<usize>,
    stats: ExchangeStats,
    history: Option<Vec<RoundRecord>>,
}

impl Exchanger {
    pub fn new(
        n_replicas: usize,
        evaluator: AcceptanceEvaluator,
        seed: Option<u64>,
        record_history: bool,
    ) -> Self {
        let rng = if let Some(s) = seed {
            fastrand::Rng::with_seed(exchange_seed(s))
        } else {
            fastrand::Rng::new()
        };

        Self {
            evaluator,
            rng,
            attempt_count: 0,
            order: (0..n_replicas).collect(),
            stats: ExchangeStats::new(n_replicas),
            history: record_history.then(Vec::new),
        }
    }

    pub fn attempt_count(&self) -> u64 {
        self.attempt_count
    }

    /// Ladder position -> id of the configuration currently sitting there.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn stats(&self) -> &ExchangeStats {
        &self.stats
    }

    pub fn history(&self) -> Option<&[RoundRecord]> {
        self.history.as_deref()
    }

    pub fn evaluator(&self) -> &AcceptanceEvaluator {
        &self.evaluator
    }

    /// Runs one full exchange round over the ladder.
    ///
    /// Caller guarantees no replica in `slots` is being stepped concurrently.
    pub fn run_round<S: MonteCarloStep>(
        &mut self,
        slots: &mut [&mut Replica<S>],
        step: u64,
    ) -> RoundRecord {
        let attempt = self.attempt_count;
        let eligible = select_pairs(attempt, slots.len());
        let mut outcomes = Vec::with_capacity(eligible.len());

        for pair in eligible {
            let lower = (slots[pair.lower].beta(), slots[pair.lower].current_energy());
            let upper = (slots[pair.upper].beta(), slots[pair.upper].current_energy());

            let outcome =
                self.evaluator
                    .evaluate(pair, lower, upper, &mut self.rng, &mut self.stats);

            if outcome.accepted {
                swap::swap_pair(slots, pair);
                self.order.swap(pair.lower, pair.upper);
            }
            outcomes.push(outcome);
        }

        self.stats.record_round(attempt);
        self.attempt_count += 1;

        let record = RoundRecord {
            round: attempt,
            step,
            parity: pairs::parity(attempt),
            outcomes,
        };

        debug!(
            "Exchange round {} @ step {}: {}/{} accepted",
            record.round,
            step,
            record.n_accepted(),
            record.outcomes.len()
        );

        if let Some(history) = &mut self.history {
            history.push(record.clone());
        }

        record
    }

    pub fn into_parts(self) -> (u64, Vec<usize>, ExchangeStats, Option<Vec<RoundRecord>>) {
        (self.attempt_count, self.order, self.stats, self.history)
    }
}
