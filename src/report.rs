use crate::ensemble::Ensemble;
use crate::exchange::{ExchangeStats, PairSummary, RoundRecord};
use crate::replica::MonteCarloStep;
use crate::scheduler::StopReason;
use crate::ReResult;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Duration;

/// Everything a finished run reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub n_replicas: usize,
    pub steps_completed: u64,
    pub rounds: u64,
    pub stop_reason: StopReason,
    pub elapsed_secs: f64,
    pub temperatures: Vec<f64>,
    pub final_energies: Vec<f64>,
    /// Ladder position -> configuration id.
    pub order: Vec<usize>,
    pub pairs: Vec<PairSummary>,
    pub stats: ExchangeStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<RoundRecord>>,
}

/// One CSV line per evaluated pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub round: u64,
    pub step: u64,
    pub lower: usize,
    pub upper: usize,
    pub delta: f64,
    pub probability: f64,
    pub accepted: bool,
}

impl RunReport {
    pub(crate) fn collect<S: MonteCarloStep>(
        ensemble: &Ensemble<S>,
        stop_reason: StopReason,
        elapsed: Duration,
    ) -> Self {
        let stats = ensemble.stats().clone();
        Self {
            n_replicas: ensemble.len(),
            steps_completed: ensemble
                .replicas()
                .iter()
                .map(|r| r.steps())
                .min()
                .unwrap_or(0),
            rounds: ensemble.attempt_count(),
            stop_reason,
            elapsed_secs: elapsed.as_secs_f64(),
            temperatures: ensemble.temperatures(),
            final_energies: ensemble.energies(),
            order: ensemble.order().to_vec(),
            pairs: stats.summaries(),
            stats,
            history: ensemble.history().map(|h| h.to_vec()),
        }
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> ReResult<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> ReResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

pub fn history_rows(history: &[RoundRecord]) -> Vec<HistoryRow> {
    history
        .iter()
        .flat_map(|r| {
            r.outcomes.iter().map(move |o| HistoryRow {
                round: r.round,
                step: r.step,
                lower: o.pair.lower,
                upper: o.pair.upper,
                delta: o.delta,
                probability: o.probability,
                accepted: o.accepted,
            })
        })
        .collect()
}

pub fn write_history_csv<P: AsRef<Path>>(path: P, history: &[RoundRecord]) -> ReResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in history_rows(history) {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_history_csv<P: AsRef<Path>>(path: P) -> ReResult<Vec<HistoryRow>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}
