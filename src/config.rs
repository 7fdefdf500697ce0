use crate::consts::{DEFAULT_EXCHANGE_INTERVAL, DEFAULT_TOTAL_STEPS, PROBABILITY_CUTOFF};
use crate::parallel::available_workers;
use crate::{ReResult, ReplexError};
use clap::parser::ValueSource;
use clap::{ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Args, Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RunConfig {
    #[command(flatten)]
    pub ladder: LadderParams,
    #[command(flatten)]
    pub exchange: ExchangeParams,
}

#[derive(Args, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LadderParams {
    /// Explicit ladder, e.g. `--temperatures 1,2,3,4`. Overrides the geometric ladder.
    #[arg(long, value_delimiter = ',')]
    pub temperatures: Vec<f64>,
    #[arg(long, default_value_t = 1.0)]
    pub temp_min: f64,
    #[arg(long, default_value_t = 10.0)]
    pub temp_max: f64,
    #[arg(short = 'r', long, default_value_t = 4)]
    pub replicas: usize,
}

#[derive(Args, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeParams {
    /// Total Monte Carlo steps per replica.
    #[arg(long, default_value_t = DEFAULT_TOTAL_STEPS)]
    pub steps: u64,
    #[arg(short = 'i', long, default_value_t = DEFAULT_EXCHANGE_INTERVAL)]
    pub exchange_interval: u64,
    #[arg(long, default_value_t = PROBABILITY_CUTOFF)]
    pub cutoff: f64,
    #[arg(short = 'S', long)]
    pub seed: Option<u64>,
    /// Available worker threads (defaults to the machine's parallelism).
    #[arg(short = 't', long)]
    pub threads: Option<usize>,
    /// Keep the per-round exchange history.
    #[arg(long, default_value_t = false)]
    pub history: bool,
    /// Wall-clock limit in seconds. Checked after each exchange round, so the
    /// run needs at least one (`steps >= exchange_interval + 2`).
    #[arg(short = 'T', long)]
    pub max_time: Option<u64>,
}

impl Default for LadderParams {
    fn default() -> Self {
        Self {
            temperatures: Vec::new(),
            temp_min: 1.0,
            temp_max: 10.0,
            replicas: 4,
        }
    }
}

impl Default for ExchangeParams {
    fn default() -> Self {
        Self {
            steps: DEFAULT_TOTAL_STEPS,
            exchange_interval: DEFAULT_EXCHANGE_INTERVAL,
            cutoff: PROBABILITY_CUTOFF,
            seed: None,
            threads: None,
            history: false,
            max_time: None,
        }
    }
}

/// `n` temperatures spaced geometrically from `t_min` to `t_max` inclusive.
pub fn geometric_ladder(t_min: f64, t_max: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![t_min],
        _ => (0..n)
            .map(|i| {
                let progress = i as f64 / (n - 1) as f64;
                t_min * (t_max / t_min).powf(progress)
            })
            .collect(),
    }
}

/// Every temperature must be finite and strictly positive.
pub fn validate_temperatures(temperatures: &[f64]) -> ReResult<()> {
    if temperatures.is_empty() {
        return Err(ReplexError::EmptyLadder);
    }
    for (position, &value) in temperatures.iter().enumerate() {
        if !value.is_finite() || value <= 0.0 {
            return Err(ReplexError::InvalidTemperature { position, value });
        }
    }
    Ok(())
}

impl LadderParams {
    /// Resolved ladder, ordered by position.
    pub fn temperatures(&self) -> ReResult<Vec<f64>> {
        let ladder = if self.temperatures.is_empty() {
            geometric_ladder(self.temp_min, self.temp_max, self.replicas)
        } else {
            self.temperatures.clone()
        };
        validate_temperatures(&ladder)?;
        Ok(ladder)
    }
}

impl ExchangeParams {
    pub fn workers(&self) -> usize {
        self.threads.unwrap_or_else(available_workers)
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.max_time.map(Duration::from_secs)
    }

    pub fn validate(&self) -> ReResult<()> {
        if self.exchange_interval == 0 {
            return Err(ReplexError::Config(
                "exchange_interval must be at least 1".into(),
            ));
        }
        if !self.cutoff.is_finite() || self.cutoff <= 0.0 {
            return Err(ReplexError::Config(format!(
                "cutoff must be finite and > 0, got {}",
                self.cutoff
            )));
        }
        // The limit is only looked at in the exchange phase.
        if self.max_time.is_some() && self.steps < self.exchange_interval.saturating_add(2) {
            return Err(ReplexError::Config(format!(
                "max_time needs at least one exchange round: steps ({}) must be >= exchange_interval ({}) + 2",
                self.steps, self.exchange_interval
            )));
        }
        Ok(())
    }
}

impl RunConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ReResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: RunConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies only the arguments the user actually typed on top of a config
    /// loaded from a file.
    pub fn merge_from_cli(&mut self, cli: &RunConfig, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($group:ident . $field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$group.$field = cli.$group.$field.clone();
                }
            };
        }

        update_if_present!(ladder.temperatures);
        update_if_present!(ladder.temp_min);
        update_if_present!(ladder.temp_max);
        update_if_present!(ladder.replicas);

        update_if_present!(exchange.steps);
        update_if_present!(exchange.exchange_interval);
        update_if_present!(exchange.cutoff);
        update_if_present!(exchange.seed);
        update_if_present!(exchange.threads);
        update_if_present!(exchange.history);
        update_if_present!(exchange.max_time);
    }

    pub fn validate(&self) -> ReResult<()> {
        self.exchange.validate()?;
        self.ladder.temperatures().map(|_| ())
    }
}
