/// Above this delta the exchange probability `exp(-delta)` is treated as zero.
/// Keeps the exponential well clear of underflow.
pub const PROBABILITY_CUTOFF: f64 = 100.0;

/// Default number of Monte Carlo steps between two exchange attempts.
pub const DEFAULT_EXCHANGE_INTERVAL: u64 = 100;

/// Default total number of Monte Carlo steps per replica.
pub const DEFAULT_TOTAL_STEPS: u64 = 100_000;

/// Offset subtracted from the run seed to derive the exchange-phase RNG seed.
/// Replica seeds count up from `seed`, so the exchange seed sits below them.
pub const EXCHANGE_SEED_OFFSET: u64 = 9999;

/// Worker count used when the platform cannot report its parallelism.
pub const FALLBACK_WORKERS: usize = 4;
