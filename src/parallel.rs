use crate::consts::FALLBACK_WORKERS;
use crate::{ReResult, ReplexError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard};

/// Number of threads the platform can run concurrently.
pub fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(FALLBACK_WORKERS)
}

/// Locks `m`, turning poisoning into a crate error.
pub(crate) fn lock<T>(m: &Mutex<T>) -> ReResult<MutexGuard<'_, T>> {
    m.lock().map_err(|e| ReplexError::Poisoned(e.to_string()))
}

/// A dedicated rayon pool where every thread hosts exactly one long-lived
/// worker. Workers block on a [`RendezvousBarrier`], so the pool must never
/// be shared with other rayon work.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> ReResult<Self> {
        if workers == 0 {
            return Err(ReplexError::Config("worker pool needs at least one thread".into()));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("replica-{}", i))
            .build()?;
        Ok(Self { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs `worker(index)` once on every pool thread, all concurrently, and
    /// returns the results ordered by index.
    pub fn run_parallel<F, R>(&self, worker: F) -> Vec<R>
    where
        F: Fn(usize) -> R + Sync,
        R: Send,
    {
        self.pool.broadcast(|ctx| worker(ctx.index()))
    }
}

struct BarrierState {
    arrived: usize,
    generation: u64,
}

/// Reusable full-rendezvous barrier. The last thread to arrive runs a block
/// exactly once while every other participant stays parked, then releases
/// them all. Can be aborted so that no participant waits forever.
pub struct RendezvousBarrier {
    parties: usize,
    state: Mutex<BarrierState>,
    cvar: Condvar,
    aborted: AtomicBool,
}

impl RendezvousBarrier {
    pub fn new(parties: usize) -> Self {
        Self {
            parties,
            state: Mutex::new(BarrierState {
                arrived: 0,
                generation: 0,
            }),
            cvar: Condvar::new(),
            aborted: AtomicBool::new(false),
        }
    }

    pub fn parties(&self) -> usize {
        self.parties
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// Releases every current and future waiter with [`ReplexError::Aborted`].
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
        // Taking the lock orders the flag with waiters checking it.
        let _state = self.state.lock();
        self.cvar.notify_all();
    }

    /// Blocks until all parties arrived. The last arrival runs `once` before
    /// anybody is released and gets `Some(result)`; everybody else gets `None`.
    ///
    /// If `once` fails the barrier is aborted and the error is returned to the
    /// caller that ran it.
    pub fn rendezvous<F, R>(&self, once: F) -> ReResult<Option<R>>
    where
        F: FnOnce() -> ReResult<R>,
    {
        if self.is_aborted() {
            return Err(ReplexError::Aborted);
        }

        let mut state = lock(&self.state)?;
        let generation = state.generation;
        state.arrived += 1;

        if state.arrived < self.parties {
            while state.generation == generation && !self.is_aborted() {
                state = self
                    .cvar
                    .wait(state)
                    .map_err(|e| ReplexError::Poisoned(e.to_string()))?;
            }
            return if state.generation == generation {
                Err(ReplexError::Aborted)
            } else {
                Ok(None)
            };
        }

        // Last to arrive. Waiters keep sleeping until the generation moves.
        drop(state);
        let result = match once() {
            Ok(r) => r,
            Err(e) => {
                self.abort();
                return Err(e);
            }
        };

        let mut state = lock(&self.state)?;
        state.arrived = 0;
        state.generation += 1;
        self.cvar.notify_all();
        Ok(Some(result))
    }
}

/// Aborts the barrier if the owning worker unwinds, so the others do not
/// wait for a rendezvous that will never complete.
pub(crate) struct AbortOnPanic<'a>(pub &'a RendezvousBarrier);

impl Drop for AbortOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.abort();
        }
    }
}
