use super::pairs::ExchangePair;
use super::stats::ExchangeStats;
use crate::consts::PROBABILITY_CUTOFF;
use crate::{ReResult, ReplexError};
use serde::{Deserialize, Serialize};

/// Exchange "closeness": `-(beta_b - beta_a) * (E_b - E_a)`.
///
/// Always computed from the pre-swap energies and temperatures.
#[inline(always)]
pub fn calc_delta(beta_a: f64, energy_a: f64, beta_b: f64, energy_b: f64) -> f64 {
    let ediff = energy_b - energy_a;
    -(beta_b - beta_a) * ediff
}

/// How a delta maps onto an acceptance probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Acceptance {
    /// `delta <= 0`: accepted without a draw.
    Certain,
    /// `delta` above the cutoff: probability forced to zero.
    BelowPrecision,
    /// `exp(-delta)`, decided by a uniform draw.
    Metropolis(f64),
}

impl Acceptance {
    pub fn from_delta(delta: f64, cutoff: f64) -> Self {
        if delta <= 0.0 {
            Acceptance::Certain
        } else if delta > cutoff {
            Acceptance::BelowPrecision
        } else {
            Acceptance::Metropolis((-delta).exp())
        }
    }

    pub fn probability(&self) -> f64 {
        match *self {
            Acceptance::Certain => 1.0,
            Acceptance::BelowPrecision => 0.0,
            Acceptance::Metropolis(p) => p,
        }
    }
}

/// Result of evaluating one pair in one round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairOutcome {
    pub pair: ExchangePair,
    pub delta: f64,
    pub probability: f64,
    pub accepted: bool,
}

/// Metropolis criterion specialised to replica exchange.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptanceEvaluator {
    cutoff: f64,
}

impl Default for AcceptanceEvaluator {
    fn default() -> Self {
        Self {
            cutoff: PROBABILITY_CUTOFF,
        }
    }
}

impl AcceptanceEvaluator {
    pub fn new(cutoff: f64) -> ReResult<Self> {
        if !cutoff.is_finite() || cutoff <= 0.0 {
            return Err(ReplexError::Config(format!(
                "probability cutoff must be finite and > 0, got {}",
                cutoff
            )));
        }
        Ok(Self { cutoff })
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Accept/reject decision for a precomputed delta.
    ///
    /// `draw` yields a uniform value in `[0, 1)`. It is never called when
    /// `delta <= 0`; for any positive delta exactly one value is drawn, even
    /// past the cutoff, so the random sequence does not depend on the cutoff.
    pub fn decide_with<F>(&self, delta: f64, draw: F) -> (f64, bool)
    where
        F: FnOnce() -> f64,
    {
        match Acceptance::from_delta(delta, self.cutoff) {
            Acceptance::Certain => (1.0, true),
            other => {
                let prob = other.probability();
                let r = draw();
                (prob, r < prob)
            }
        }
    }

    /// Evaluates `pair` and records the attempt in `stats`.
    pub fn evaluate(
        &self,
        pair: ExchangePair,
        (beta_a, energy_a): (f64, f64),
        (beta_b, energy_b): (f64, f64),
        rng: &mut fastrand::Rng,
        stats: &mut ExchangeStats,
    ) -> PairOutcome {
        let delta = calc_delta(beta_a, energy_a, beta_b, energy_b);
        let (probability, accepted) = self.decide_with(delta, || rng.f64());

        stats.record(pair, probability, accepted);

        PairOutcome {
            pair,
            delta,
            probability,
            accepted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_energies_accept_without_draw() {
        let eval = AcceptanceEvaluator::default();
        let delta = calc_delta(1.0, 10.0, 0.5, 10.0);
        assert_eq!(delta, 0.0);
        let (p, ok) = eval.decide_with(delta, || panic!("draw consumed"));
        assert_eq!(p, 1.0);
        assert!(ok);
    }

    #[test]
    fn test_negative_delta_accepts_without_draw() {
        let eval = AcceptanceEvaluator::default();
        let (p, ok) = eval.decide_with(-3.5, || panic!("draw consumed"));
        assert_eq!(p, 1.0);
        assert!(ok);
    }

    #[test]
    fn test_cutoff_forces_rejection() {
        let eval = AcceptanceEvaluator::new(20.0).unwrap();
        // Even the smallest possible draw cannot beat probability zero.
        let (p, ok) = eval.decide_with(50.0, || 0.0);
        assert_eq!(p, 0.0);
        assert!(!ok);
    }

    #[test]
    fn test_metropolis_threshold() {
        let eval = AcceptanceEvaluator::default();
        let delta = 2.0_f64.ln();
        let (p, _) = eval.decide_with(delta, || 0.0);
        assert!((p - 0.5).abs() < 1e-12);
        assert!(eval.decide_with(delta, || 0.4).1);
        assert!(!eval.decide_with(delta, || 0.6).1);
    }

    #[test]
    fn test_reverse_move_negates_delta() {
        // Same slots, configurations traded.
        let forward = calc_delta(1.0, -4.0, 0.25, 7.0);
        let reverse = calc_delta(1.0, 7.0, 0.25, -4.0);
        assert_eq!(forward, -reverse);
        // Labelling the pair the other way round changes nothing.
        assert_eq!(forward, calc_delta(0.25, 7.0, 1.0, -4.0));
    }

    #[test]
    fn test_invalid_cutoff() {
        assert!(AcceptanceEvaluator::new(0.0).is_err());
        assert!(AcceptanceEvaluator::new(f64::NAN).is_err());
    }

    #[test]
    fn test_evaluate_updates_stats() {
        let eval = AcceptanceEvaluator::default();
        let mut stats = ExchangeStats::new(2);
        let mut rng = fastrand::Rng::with_seed(1);
        let pair = ExchangePair::ending_at(1);

        let out = eval.evaluate(pair, (1.0, 10.0), (0.5, 10.0), &mut rng, &mut stats);
        assert!(out.accepted);
        assert_eq!(stats.attempted(pair), 1);
        assert_eq!(stats.accepted(pair), 1);
    }
}
