use serde::{Deserialize, Serialize};

/// Two ladder-adjacent positions, `upper == lower + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExchangePair {
    pub lower: usize,
    pub upper: usize,
}

impl ExchangePair {
    /// Pair ending at ladder position `upper` (must be >= 1).
    #[inline]
    pub fn ending_at(upper: usize) -> Self {
        debug_assert!(upper >= 1);
        Self {
            lower: upper - 1,
            upper,
        }
    }

    /// Index into per-pair statistics (`0..n_replicas - 1`).
    #[inline]
    pub fn index(&self) -> usize {
        self.lower
    }
}

#[inline]
pub fn parity(attempt: u64) -> usize {
    (attempt % 2) as usize
}

/// Pairs eligible on exchange attempt `attempt`.
///
/// Even attempts try (0,1), (2,3), ...; odd attempts try (1,2), (3,4), ...
/// Pairs of one round never share a replica.
pub fn select_pairs(attempt: u64, n_replicas: usize) -> Vec<ExchangePair> {
    let m = parity(attempt);
    (1..n_replicas)
        .filter(|i| (i - 1) % 2 == m)
        .map(ExchangePair::ending_at)
        .collect()
}
