use crate::replica::{MonteCarloStep, StepError};
use fastrand::Rng;

/// Particle in `d` independent double wells:
/// `V(x) = height * sum_i (x_i^2 - 1)^2`, minima at `x_i = ±1`.
///
/// One step is a single-coordinate Metropolis move. Tall barriers trap cold
/// replicas in whichever well they start in.
#[derive(Debug)]
pub struct DoubleWell {
    pub position: Vec<f64>,
    pub height: f64,
    pub max_displacement: f64,
    pub rng: Rng,
    pub accepted: u64,
}

impl DoubleWell {
    pub fn new(dim: usize, height: f64, max_displacement: f64, seed: Option<u64>) -> Self {
        let rng = if let Some(s) = seed {
            Rng::with_seed(s)
        } else {
            Rng::new()
        };
        Self {
            // Everybody starts in the left well.
            position: vec![-1.0; dim],
            height,
            max_displacement,
            rng,
            accepted: 0,
        }
    }

    #[inline(always)]
    fn site_energy(&self, x: f64) -> f64 {
        let w = x * x - 1.0;
        self.height * w * w
    }
}

impl MonteCarloStep for DoubleWell {
    type State = Vec<f64>;

    fn step(&mut self, _step: u64, beta: f64) -> Result<(), StepError> {
        if self.position.is_empty() {
            return Ok(());
        }

        let i = self.rng.usize(0..self.position.len());
        let old = self.position[i];
        let new = old + self.max_displacement * (2.0 * self.rng.f64() - 1.0);

        let delta = self.site_energy(new) - self.site_energy(old);
        if !delta.is_finite() {
            return Err(StepError::NonFiniteEnergy(delta));
        }

        if delta <= 0.0 || self.rng.f64() < (-beta * delta).exp() {
            self.position[i] = new;
            self.accepted += 1;
        }
        Ok(())
    }

    fn potential_energy(&self) -> f64 {
        self.position.iter().map(|&x| self.site_energy(x)).sum()
    }

    fn state(&self) -> Vec<f64> {
        self.position.clone()
    }

    fn set_state(&mut self, state: Vec<f64>) {
        self.position = state;
    }
}
