#![allow(dead_code)]

use replex::config::ExchangeParams;
use replex::{MonteCarloStep, StepError};

/// Seeded random walk in a harmonic well, `E = x^2`.
#[derive(Debug, Clone)]
pub struct Walker {
    pub x: f64,
    rng: fastrand::Rng,
}

impl Walker {
    pub fn new(x: f64, seed: Option<u64>) -> Self {
        Self {
            x,
            rng: seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed),
        }
    }
}

impl MonteCarloStep for Walker {
    type State = f64;

    fn step(&mut self, _step: u64, beta: f64) -> Result<(), StepError> {
        let new = self.x + (self.rng.f64() - 0.5);
        let delta = new * new - self.x * self.x;
        if delta <= 0.0 || self.rng.f64() < (-beta * delta).exp() {
            self.x = new;
        }
        Ok(())
    }

    fn potential_energy(&self) -> f64 {
        self.x * self.x
    }

    fn state(&self) -> f64 {
        self.x
    }

    fn set_state(&mut self, state: f64) {
        self.x = state;
    }
}

/// Never moves; its energy is its state.
#[derive(Debug, Clone)]
pub struct Frozen {
    pub energy: f64,
}

impl MonteCarloStep for Frozen {
    type State = f64;

    fn step(&mut self, _step: u64, _beta: f64) -> Result<(), StepError> {
        Ok(())
    }

    fn potential_energy(&self) -> f64 {
        self.energy
    }

    fn state(&self) -> f64 {
        self.energy
    }

    fn set_state(&mut self, state: f64) {
        self.energy = state;
    }
}

/// Walker that fails on a chosen step.
#[derive(Debug, Clone)]
pub struct Faulty {
    pub inner: Walker,
    pub fail_at: Option<u64>,
}

impl MonteCarloStep for Faulty {
    type State = f64;

    fn step(&mut self, step: u64, beta: f64) -> Result<(), StepError> {
        if self.fail_at == Some(step) {
            return Err(StepError::Failed(format!("injected failure at {}", step)));
        }
        self.inner.step(step, beta)
    }

    fn potential_energy(&self) -> f64 {
        self.inner.potential_energy()
    }

    fn state(&self) -> f64 {
        self.inner.state()
    }

    fn set_state(&mut self, state: f64) {
        self.inner.set_state(state)
    }
}

pub fn params(steps: u64, interval: u64, seed: u64) -> ExchangeParams {
    ExchangeParams {
        steps,
        exchange_interval: interval,
        seed: Some(seed),
        threads: Some(64),
        history: true,
        ..Default::default()
    }
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-12
}
