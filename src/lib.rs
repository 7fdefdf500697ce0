pub mod config;
pub mod consts;
pub mod ensemble;
pub mod exchange;
pub mod models;
pub mod parallel;
pub mod replica;
pub mod report;
pub mod scheduler;
// cmd and reports are binary modules (declared in main.rs).

pub use config::RunConfig;
pub use ensemble::Ensemble;
pub use replica::{MonteCarloStep, Replica, StepError};
pub use report::RunReport;
pub use scheduler::Scheduler;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReplexError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Temperature ladder is empty")]
    EmptyLadder,

    #[error("Invalid temperature {value} at ladder position {position} (must be finite and > 0)")]
    InvalidTemperature { position: usize, value: f64 },

    #[error("Not enough workers: {replicas} replicas need {replicas} threads, only {workers} available. Use a 1:1 ratio of replicas:threads")]
    InsufficientWorkers { replicas: usize, workers: usize },

    #[error("Replica {replica} failed at step {step}: {source}")]
    Step {
        replica: usize,
        step: u64,
        #[source]
        source: StepError,
    },

    #[error("Run aborted: another worker failed")]
    Aborted,

    #[error("Lock poisoned: {0}")]
    Poisoned(String),

    #[error("Thread pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

pub type ReResult<T> = Result<T, ReplexError>;
