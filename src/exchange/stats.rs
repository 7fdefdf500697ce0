use super::pairs::{parity, ExchangePair};
use serde::{Deserialize, Serialize};

/// Per-pair exchange counters. Reporting only: never read by the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeStats {
    attempted: Vec<u64>,
    accepted: Vec<u64>,
    probability_sum: Vec<f64>,
    /// Rounds attempted per parity (even, odd).
    rounds: [u64; 2],
}

/// Flattened view of one pair's counters, used by reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSummary {
    pub lower: usize,
    pub upper: usize,
    pub attempted: u64,
    pub accepted: u64,
    pub acceptance_ratio: Option<f64>,
    pub average_probability: Option<f64>,
}

impl ExchangeStats {
    pub fn new(n_replicas: usize) -> Self {
        let n_pairs = n_replicas.saturating_sub(1);
        Self {
            attempted: vec![0; n_pairs],
            accepted: vec![0; n_pairs],
            probability_sum: vec![0.0; n_pairs],
            rounds: [0; 2],
        }
    }

    pub fn n_pairs(&self) -> usize {
        self.attempted.len()
    }

    pub fn record(&mut self, pair: ExchangePair, probability: f64, accepted: bool) {
        let i = pair.index();
        self.attempted[i] += 1;
        self.probability_sum[i] += probability;
        if accepted {
            self.accepted[i] += 1;
        }
    }

    pub fn record_round(&mut self, attempt: u64) {
        self.rounds[parity(attempt)] += 1;
    }

    pub fn attempted(&self, pair: ExchangePair) -> u64 {
        self.attempted[pair.index()]
    }

    pub fn accepted(&self, pair: ExchangePair) -> u64 {
        self.accepted[pair.index()]
    }

    pub fn rounds(&self) -> [u64; 2] {
        self.rounds
    }

    pub fn total_attempted(&self) -> u64 {
        self.attempted.iter().sum()
    }

    pub fn total_accepted(&self) -> u64 {
        self.accepted.iter().sum()
    }

    /// Fraction of attempts accepted, `None` before the first attempt.
    pub fn acceptance_ratio(&self, pair: ExchangePair) -> Option<f64> {
        let i = pair.index();
        match self.attempted[i] {
            0 => None,
            n => Some(self.accepted[i] as f64 / n as f64),
        }
    }

    /// Mean acceptance probability over all attempts of the pair.
    pub fn average_probability(&self, pair: ExchangePair) -> Option<f64> {
        let i = pair.index();
        match self.attempted[i] {
            0 => None,
            n => Some(self.probability_sum[i] / n as f64),
        }
    }

    pub fn summaries(&self) -> Vec<PairSummary> {
        (1..=self.n_pairs())
            .map(ExchangePair::ending_at)
            .map(|pair| PairSummary {
                lower: pair.lower,
                upper: pair.upper,
                attempted: self.attempted(pair),
                accepted: self.accepted(pair),
                acceptance_ratio: self.acceptance_ratio(pair),
                average_probability: self.average_probability(pair),
            })
            .collect()
    }
}
