use crate::config::{ExchangeParams, RunConfig};
use crate::ensemble::Ensemble;
use crate::exchange::{ExchangeStats, Exchanger, RoundRecord};
use crate::parallel::{lock, AbortOnPanic, RendezvousBarrier, WorkerPool};
use crate::replica::{MonteCarloStep, Replica};
use crate::report::RunReport;
use crate::{ReResult, ReplexError};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use strum_macros::{Display, EnumIter, EnumString, FromRepr};
use tracing::{debug, error, info, warn};

/// Where the ensemble is in the advance / synchronize / exchange cycle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, FromRepr, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum Phase {
    Stepping,
    BarrierWait,
    Exchanging,
    Done,
}

/// Shared, lock-free view of the current [`Phase`].
///
/// Workers that finished their segment are counted as parked. The ensemble
/// only reads as [`Phase::BarrierWait`] once every worker is parked; while any
/// replica is still inside its segment it reads as [`Phase::Stepping`].
#[derive(Debug, Clone)]
pub struct PhaseMonitor {
    phase: Arc<AtomicU8>,
    parked: Arc<AtomicUsize>,
    parties: usize,
}

impl PhaseMonitor {
    fn new(parties: usize) -> Self {
        Self {
            phase: Arc::new(AtomicU8::new(Phase::Stepping as u8)),
            parked: Arc::new(AtomicUsize::new(0)),
            parties,
        }
    }

    fn set(&self, phase: Phase) {
        self.phase.store(phase as u8, Ordering::SeqCst);
    }

    fn park(&self) {
        self.parked.fetch_add(1, Ordering::SeqCst);
    }

    /// Called by the exchanging thread while everybody is still parked.
    fn release_all(&self) {
        self.parked.store(0, Ordering::SeqCst);
    }

    /// Workers currently waiting at the barrier.
    pub fn parked(&self) -> usize {
        self.parked.load(Ordering::SeqCst)
    }

    pub fn get(&self) -> Phase {
        match Phase::from_repr(self.phase.load(Ordering::SeqCst)) {
            Some(Phase::Stepping) if self.parties > 0 && self.parked() >= self.parties => {
                Phase::BarrierWait
            }
            Some(phase) => phase,
            None => Phase::Done,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum StopReason {
    Completed,
    ObserverRequested,
    TimeLimit,
}

/// Called from the exchange phase after every round. Returning `false` stops
/// the run before the next stepping segment.
pub trait ExchangeObserver: Send + Sync {
    fn on_round(&self, round: &RoundRecord, stats: &ExchangeStats) -> bool;
}

impl<F> ExchangeObserver for F
where
    F: Fn(&RoundRecord, &ExchangeStats) -> bool + Send + Sync,
{
    fn on_round(&self, round: &RoundRecord, stats: &ExchangeStats) -> bool {
        self(round, stats)
    }
}

struct KeepGoing;

impl ExchangeObserver for KeepGoing {
    fn on_round(&self, _round: &RoundRecord, _stats: &ExchangeStats) -> bool {
        true
    }
}

/// When exchanges happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub total_steps: u64,
    pub exchange_interval: u64,
}

impl Schedule {
    pub fn new(total_steps: u64, exchange_interval: u64) -> Self {
        Self {
            total_steps,
            exchange_interval: exchange_interval.max(1),
        }
    }

    /// An exchange follows `step` on interval boundaries, except step 0 and
    /// the final step.
    #[inline]
    pub fn is_exchange_step(&self, step: u64) -> bool {
        step > 0 && step % self.exchange_interval == 0 && step + 1 != self.total_steps
    }

    /// Last step (inclusive) of the stepping segment starting at `step`.
    pub fn segment_end(&self, step: u64) -> u64 {
        let last = self.total_steps.saturating_sub(1);
        let next = if step == 0 {
            self.exchange_interval
        } else {
            step.div_ceil(self.exchange_interval) * self.exchange_interval
        };
        next.min(last)
    }

    /// Number of exchange rounds a complete run performs.
    pub fn n_rounds(&self) -> u64 {
        if self.total_steps < 2 {
            return 0;
        }
        // Boundaries in 1..=total-2.
        (self.total_steps - 2) / self.exchange_interval
    }
}

/// Stop request raised inside the exchange phase, read by every worker after
/// the barrier releases.
struct StopSignal {
    requested: AtomicBool,
    reason: Mutex<Option<StopReason>>,
}

impl StopSignal {
    fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
            reason: Mutex::new(None),
        }
    }

    fn request(&self, reason: StopReason) -> ReResult<()> {
        let mut slot = lock(&self.reason)?;
        slot.get_or_insert(reason);
        self.requested.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    fn reason(&self) -> ReResult<StopReason> {
        Ok(lock(&self.reason)?.unwrap_or(StopReason::Completed))
    }
}

/// Drives an [`Ensemble`] through the replica-exchange cycle.
pub struct Scheduler<S: MonteCarloStep> {
    ensemble: Ensemble<S>,
    schedule: Schedule,
    max_time: Option<Duration>,
    observer: Box<dyn ExchangeObserver>,
    phase: PhaseMonitor,
}

impl<S: MonteCarloStep> Scheduler<S> {
    /// Fails when fewer workers are available than there are replicas; every
    /// replica needs its own thread.
    pub fn new(ensemble: Ensemble<S>, params: &ExchangeParams) -> ReResult<Self> {
        params.validate()?;

        let replicas = ensemble.len();
        let workers = params.workers();
        if workers < replicas {
            error!(
                "Not enough threads: {} replicas, {} workers",
                replicas, workers
            );
            return Err(ReplexError::InsufficientWorkers { replicas, workers });
        }

        Ok(Self {
            ensemble,
            schedule: Schedule::new(params.steps, params.exchange_interval),
            max_time: params.time_limit(),
            observer: Box::new(KeepGoing),
            phase: PhaseMonitor::new(replicas),
        })
    }

    /// Builds the ladder from `config` and a scheduler around it.
    pub fn from_config<F>(config: &RunConfig, factory: F) -> ReResult<Self>
    where
        F: FnMut(usize, f64, Option<u64>) -> S,
    {
        config.validate()?;
        let temperatures = config.ladder.temperatures()?;
        let ensemble = Ensemble::new(&temperatures, &config.exchange, factory)?;
        Self::new(ensemble, &config.exchange)
    }

    pub fn with_observer<O: ExchangeObserver + 'static>(mut self, observer: O) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn ensemble(&self) -> &Ensemble<S> {
        &self.ensemble
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn phase_monitor(&self) -> PhaseMonitor {
        self.phase.clone()
    }

    /// Runs every replica on its own thread until the schedule completes or a
    /// stop is requested.
    ///
    /// If any replica fails, all workers are aborted and the first failure is
    /// returned.
    pub fn run(self) -> ReResult<(Ensemble<S>, RunReport)> {
        let Scheduler {
            ensemble,
            schedule,
            max_time,
            observer,
            phase,
        } = self;

        let n = ensemble.len();
        info!(
            "🔥 Spawning {} replica workers ({} steps, exchange every {})",
            n, schedule.total_steps, schedule.exchange_interval
        );

        let (replicas, exchanger) = ensemble.into_parts();
        let replicas: Vec<Mutex<Replica<S>>> = replicas.into_iter().map(Mutex::new).collect();
        let exchanger = Mutex::new(exchanger);

        let pool = WorkerPool::new(n)?;
        let barrier = RendezvousBarrier::new(n);
        let stop = StopSignal::new();
        let started = Instant::now();

        let exchange_phase = |step: u64| -> ReResult<()> {
            phase.set(Phase::Exchanging);

            let mut guards = replicas.iter().map(lock).collect::<ReResult<Vec<_>>>()?;
            let mut slots: Vec<&mut Replica<S>> = guards.iter_mut().map(|g| &mut **g).collect();

            let mut ex = lock(&exchanger)?;
            let record = ex.run_round(&mut slots, step);

            if !observer.on_round(&record, ex.stats()) {
                debug!("Observer requested stop after round {}", record.round);
                stop.request(StopReason::ObserverRequested)?;
            }
            if let Some(limit) = max_time {
                if started.elapsed() >= limit {
                    stop.request(StopReason::TimeLimit)?;
                }
            }

            phase.release_all();
            phase.set(Phase::Stepping);
            Ok(())
        };

        let worker = |id: usize| -> ReResult<()> {
            let _abort_on_panic = AbortOnPanic(&barrier);
            let mut step = 0;

            while step < schedule.total_steps {
                if barrier.is_aborted() {
                    return Err(ReplexError::Aborted);
                }
                if stop.is_requested() {
                    break;
                }

                let end = schedule.segment_end(step);
                {
                    let mut replica = lock(&replicas[id])?;
                    for s in step..=end {
                        if barrier.is_aborted() {
                            return Err(ReplexError::Aborted);
                        }
                        if let Err(source) = replica.advance_one_step(s) {
                            barrier.abort();
                            return Err(ReplexError::Step {
                                replica: id,
                                step: s,
                                source,
                            });
                        }
                    }
                }
                step = end + 1;

                if schedule.is_exchange_step(end) {
                    phase.park();
                    barrier.rendezvous(|| exchange_phase(end))?;
                }
            }
            Ok(())
        };

        let results = pool.run_parallel(worker);
        phase.set(Phase::Done);
        resolve(results)?;

        let stop_reason = stop.reason()?;
        let replicas = replicas
            .into_iter()
            .map(|m| m.into_inner().map_err(|e| ReplexError::Poisoned(e.to_string())))
            .collect::<ReResult<Vec<_>>>()?;
        let exchanger: Exchanger = exchanger
            .into_inner()
            .map_err(|e| ReplexError::Poisoned(e.to_string()))?;

        let ensemble = Ensemble::from_parts(replicas, exchanger);
        let report = RunReport::collect(&ensemble, stop_reason, started.elapsed());
        info!(
            "✅ Finished: {} steps, {} exchange rounds, {}/{} swaps accepted ({})",
            report.steps_completed,
            report.rounds,
            report.stats.total_accepted(),
            report.stats.total_attempted(),
            report.stop_reason
        );
        Ok((ensemble, report))
    }

    /// Same schedule on the calling thread: step every replica, then exchange
    /// on boundaries. For a deterministic collaborator and a fixed seed the
    /// exchange history matches [`Scheduler::run`].
    pub fn run_sequential(self) -> ReResult<(Ensemble<S>, RunReport)> {
        let Scheduler {
            mut ensemble,
            schedule,
            max_time,
            observer,
            phase,
        } = self;

        let started = Instant::now();
        let mut stop_reason = StopReason::Completed;

        for step in 0..schedule.total_steps {
            phase.set(Phase::Stepping);
            if let Err(e) = ensemble.advance_all(step) {
                phase.set(Phase::Done);
                return Err(e);
            }

            if schedule.is_exchange_step(step) {
                phase.set(Phase::Exchanging);
                let record = ensemble.exchange(step);

                if !observer.on_round(&record, ensemble.stats()) {
                    stop_reason = StopReason::ObserverRequested;
                    break;
                }
                if max_time.is_some_and(|limit| started.elapsed() >= limit) {
                    stop_reason = StopReason::TimeLimit;
                    break;
                }
            }
        }
        phase.set(Phase::Done);

        let report = RunReport::collect(&ensemble, stop_reason, started.elapsed());
        Ok((ensemble, report))
    }
}

/// First real failure wins over the `Aborted` errors it caused.
fn resolve(results: Vec<ReResult<()>>) -> ReResult<()> {
    let mut aborted = false;
    let mut first = None;
    for r in results {
        match r {
            Ok(()) => {}
            Err(ReplexError::Aborted) => aborted = true,
            Err(e) => {
                if first.is_none() {
                    first = Some(e);
                }
            }
        }
    }
    if let Some(e) = first {
        warn!("Run aborted: {}", e);
        return Err(e);
    }
    if aborted {
        return Err(ReplexError::Aborted);
    }
    Ok(())
}
