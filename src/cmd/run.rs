use crate::reports;
use clap::{ArgMatches, Args};
use replex::config::RunConfig;
use replex::exchange::{ExchangeStats, RoundRecord};
use replex::models::DoubleWell;
use replex::report::write_history_csv;
use replex::scheduler::ExchangeObserver;
use replex::{ReResult, Scheduler};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: RunConfig,

    /// JSON run configuration. Arguments given on the command line win.
    #[arg(short = 'c', long = "config")]
    pub config_file: Option<PathBuf>,

    /// Dimensions of the double-well particle.
    #[arg(long, default_value_t = 4)]
    pub dim: usize,

    #[arg(long, default_value_t = 8.0)]
    pub well_height: f64,

    #[arg(long, default_value_t = 0.5)]
    pub max_displacement: f64,

    /// Step every replica on the calling thread instead of one thread each.
    #[arg(long, default_value_t = false)]
    pub sequential: bool,

    /// Write the full run report as JSON.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Write the exchange history as CSV (implies --history).
    #[arg(long)]
    pub history_csv: Option<PathBuf>,
}

/// Logs exchange progress at most once per second.
struct ProgressLog {
    last: Mutex<Instant>,
}

impl ExchangeObserver for ProgressLog {
    fn on_round(&self, round: &RoundRecord, stats: &ExchangeStats) -> bool {
        match self.last.lock() {
            Ok(mut last) => {
                if last.elapsed().as_secs_f32() >= 1.0 {
                    info!(
                        "🔁 Round {} (step {}): {}/{} swaps accepted so far",
                        round.round,
                        round.step,
                        stats.total_accepted(),
                        stats.total_attempted()
                    );
                    *last = Instant::now();
                }
            }
            Err(e) => warn!("⚠️ Progress log skipped round {}: {}", round.round, e),
        }
        true
    }
}

pub fn run(args: &RunArgs, matches: &ArgMatches) -> ReResult<()> {
    let mut config = match &args.config_file {
        Some(path) => {
            info!("📂 Loading run config: {}", path.display());
            let mut file_config = RunConfig::load_from_file(path)?;
            file_config.merge_from_cli(&args.config, matches);
            file_config
        }
        None => args.config.clone(),
    };
    if args.history_csv.is_some() {
        config.exchange.history = true;
    }

    let (dim, height, step) = (args.dim, args.well_height, args.max_displacement);
    let scheduler = Scheduler::from_config(&config, |_, _, seed| {
        DoubleWell::new(dim, height, step, seed)
    })?
    .with_observer(ProgressLog {
        last: Mutex::new(Instant::now()),
    });

    let (ensemble, report) = if args.sequential {
        scheduler.run_sequential()?
    } else {
        scheduler.run()?
    };

    reports::print_exchange_report(&report);
    reports::print_replica_table(&ensemble);

    if let Some(path) = &args.report {
        report.write_json(path)?;
        info!("💾 Report written to {}", path.display());
    }
    if let Some(path) = &args.history_csv {
        let history = report.history.as_deref().unwrap_or_default();
        write_history_csv(path, history)?;
        info!("💾 History written to {}", path.display());
    }
    Ok(())
}
