use crate::{ReResult, ReplexError};
use thiserror::Error;

/// Failure raised by a Monte Carlo step. Fatal for the whole run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    #[error("potential energy is not finite ({0})")]
    NonFiniteEnergy(f64),

    #[error("{0}")]
    Failed(String),
}

/// The per-replica simulation driven by the scheduler.
///
/// Implementations own their move proposals, their energy model and their
/// random source. The scheduler only steps them, reads their energy, and
/// copies configurations between ladder slots during an exchange.
pub trait MonteCarloStep: Send {
    /// Full configuration. `Clone` must produce an independent deep copy.
    type State: Clone + Send;

    /// Performs one Monte Carlo step at inverse temperature `beta`.
    fn step(&mut self, step: u64, beta: f64) -> Result<(), StepError>;

    fn potential_energy(&self) -> f64;

    fn state(&self) -> Self::State;

    fn set_state(&mut self, state: Self::State);
}

/// One ladder slot: a simulation pinned to a fixed temperature.
#[derive(Debug, Clone)]
pub struct Replica<S: MonteCarloStep> {
    id: usize,
    temperature: f64,
    beta: f64,
    energy: f64,
    steps: u64,
    system: S,
}

impl<S: MonteCarloStep> Replica<S> {
    pub fn new(id: usize, temperature: f64, system: S) -> ReResult<Self> {
        if !temperature.is_finite() || temperature <= 0.0 {
            return Err(ReplexError::InvalidTemperature {
                position: id,
                value: temperature,
            });
        }

        let energy = system.potential_energy();
        Ok(Self {
            id,
            temperature,
            beta: 1.0 / temperature,
            energy,
            steps: 0,
            system,
        })
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    #[inline]
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    #[inline]
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Energy cached after the last step or state change.
    #[inline]
    pub fn current_energy(&self) -> f64 {
        self.energy
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn system(&self) -> &S {
        &self.system
    }

    pub fn advance_one_step(&mut self, step: u64) -> Result<(), StepError> {
        self.system.step(step, self.beta)?;
        self.steps += 1;

        let energy = self.system.potential_energy();
        if !energy.is_finite() {
            return Err(StepError::NonFiniteEnergy(energy));
        }
        self.energy = energy;
        Ok(())
    }

    pub fn state(&self) -> S::State {
        self.system.state()
    }

    /// Overwrites the configuration and refreshes the cached energy.
    /// Temperature and identity are untouched.
    pub fn set_state(&mut self, state: S::State) {
        self.system.set_state(state);
        self.energy = self.system.potential_energy();
    }

    pub fn into_system(self) -> S {
        self.system
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Counter {
        value: i64,
    }

    impl MonteCarloStep for Counter {
        type State = i64;

        fn step(&mut self, _step: u64, _beta: f64) -> Result<(), StepError> {
            self.value += 1;
            Ok(())
        }

        fn potential_energy(&self) -> f64 {
            self.value as f64 * 2.0
        }

        fn state(&self) -> i64 {
            self.value
        }

        fn set_state(&mut self, state: i64) {
            self.value = state;
        }
    }

    #[test]
    fn test_beta_is_inverse_temperature() {
        let r = Replica::new(0, 4.0, Counter { value: 0 }).unwrap();
        assert_eq!(r.beta(), 0.25);
        assert_eq!(r.temperature(), 4.0);
    }

    #[test]
    fn test_rejects_non_positive_temperature() {
        for t in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = Replica::new(3, t, Counter { value: 0 }).unwrap_err();
            assert!(matches!(
                err,
                ReplexError::InvalidTemperature { position: 3, .. }
            ));
        }
    }

    #[test]
    fn test_step_refreshes_energy() {
        let mut r = Replica::new(0, 1.0, Counter { value: 1 }).unwrap();
        assert_eq!(r.current_energy(), 2.0);
        r.advance_one_step(0).unwrap();
        assert_eq!(r.current_energy(), 4.0);
        assert_eq!(r.steps(), 1);
    }

    #[test]
    fn test_set_state_refreshes_energy() {
        let mut r = Replica::new(0, 1.0, Counter { value: 1 }).unwrap();
        r.set_state(10);
        assert_eq!(r.state(), 10);
        assert_eq!(r.current_energy(), 20.0);
        assert_eq!(r.beta(), 1.0);
    }
}
