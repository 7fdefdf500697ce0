use crate::config::{validate_temperatures, ExchangeParams};
use crate::exchange::{AcceptanceEvaluator, ExchangeStats, Exchanger, RoundRecord};
use crate::replica::{MonteCarloStep, Replica};
use crate::ReResult;

/// The ladder of replicas plus the exchange bookkeeping that couples them.
///
/// Replica `i` sits at ladder position `i` for the whole run; exchanges move
/// configurations between positions, never temperatures.
#[derive(Debug)]
pub struct Ensemble<S: MonteCarloStep> {
    replicas: Vec<Replica<S>>,
    exchanger: Exchanger,
}

impl<S: MonteCarloStep> Ensemble<S> {
    /// Builds one replica per temperature.
    ///
    /// `factory(id, temperature, seed)` creates the simulation for ladder slot
    /// `id`. `seed` is `params.seed + id` when the run is seeded.
    pub fn new<F>(temperatures: &[f64], params: &ExchangeParams, mut factory: F) -> ReResult<Self>
    where
        F: FnMut(usize, f64, Option<u64>) -> S,
    {
        validate_temperatures(temperatures)?;
        let evaluator = AcceptanceEvaluator::new(params.cutoff)?;

        let replicas = temperatures
            .iter()
            .enumerate()
            .map(|(id, &t)| {
                let seed = params.seed.map(|s| s.wrapping_add(id as u64));
                Replica::new(id, t, factory(id, t, seed))
            })
            .collect::<ReResult<Vec<_>>>()?;

        let exchanger = Exchanger::new(replicas.len(), evaluator, params.seed, params.history);

        Ok(Self {
            replicas,
            exchanger,
        })
    }

    pub(crate) fn from_parts(replicas: Vec<Replica<S>>, exchanger: Exchanger) -> Self {
        Self {
            replicas,
            exchanger,
        }
    }

    pub(crate) fn into_parts(self) -> (Vec<Replica<S>>, Exchanger) {
        (self.replicas, self.exchanger)
    }

    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }

    pub fn replicas(&self) -> &[Replica<S>] {
        &self.replicas
    }

    pub fn replica(&self, position: usize) -> Option<&Replica<S>> {
        self.replicas.get(position)
    }

    pub fn temperatures(&self) -> Vec<f64> {
        self.replicas.iter().map(|r| r.temperature()).collect()
    }

    pub fn energies(&self) -> Vec<f64> {
        self.replicas.iter().map(|r| r.current_energy()).collect()
    }

    pub fn exchanger(&self) -> &Exchanger {
        &self.exchanger
    }

    pub fn attempt_count(&self) -> u64 {
        self.exchanger.attempt_count()
    }

    pub fn order(&self) -> &[usize] {
        self.exchanger.order()
    }

    pub fn stats(&self) -> &ExchangeStats {
        self.exchanger.stats()
    }

    pub fn history(&self) -> Option<&[RoundRecord]> {
        self.exchanger.history()
    }

    /// Steps every replica once, in ladder order, on the calling thread.
    pub fn advance_all(&mut self, step: u64) -> ReResult<()> {
        for r in &mut self.replicas {
            let id = r.id();
            r.advance_one_step(step)
                .map_err(|source| crate::ReplexError::Step {
                    replica: id,
                    step,
                    source,
                })?;
        }
        Ok(())
    }

    /// Runs one exchange round over the whole ladder.
    pub fn exchange(&mut self, step: u64) -> RoundRecord {
        let mut slots: Vec<&mut Replica<S>> = self.replicas.iter_mut().collect();
        self.exchanger.run_round(&mut slots, step)
    }
}
