use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for finite-difference descent runs
#[derive(Error, Debug)]
pub enum FdgdError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Objective error: {0}")]
    Objective(#[from] ObjectiveError),

    #[error("Concurrency error: {0}")]
    Concurrency(#[from] ConcurrencyError),

    #[error("Schedule error: {0}")]
    Schedule(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(String),
}

/// Where inside an epoch an objective evaluation happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvaluationSite {
    /// The single evaluation made before the run starts to learn the output width.
    Probe,
    /// The unperturbed evaluation of an epoch.
    Base,
    /// The evaluation with the given coordinate perturbed.
    Coordinate(usize),
}

impl fmt::Display for EvaluationSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Probe => write!(f, "probe evaluation"),
            Self::Base => write!(f, "base evaluation"),
            Self::Coordinate(i) => write!(f, "coordinate {i}"),
        }
    }
}

/// Invalid run configuration, detected before any epoch is evaluated
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Initial parameter vector is empty")]
    EmptyInitial,

    #[error("Epoch count must be at least 1")]
    ZeroEpochs,

    #[error("{name} schedule has {actual} values, expected {expected}")]
    ScheduleLength {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Step size at epoch {epoch} is zero")]
    ZeroStep { epoch: usize },

    #[error("{name} schedule value at epoch {epoch} is not finite")]
    NonFiniteSchedule { name: String, epoch: usize },

    #[error("parameters_used must be in 1..={n_parameters}, got {used}")]
    ParametersUsed { used: usize, n_parameters: usize },

    #[error("partial_epochs must satisfy 0 < partial_epochs < {total_epochs}, got {partial_epochs}")]
    PartialEpochs {
        partial_epochs: usize,
        total_epochs: usize,
    },

    #[error("Thread count must be at least 1")]
    ZeroThreads,

    #[error("Momentum must be finite, got {momentum}")]
    InvalidMomentum { momentum: f64 },

    #[error("Initial parameter {index} is not finite")]
    NonFiniteInitial { index: usize },

    #[error("Metaparameter mismatch: {message}")]
    Metaparameters { message: String },

    #[error("Trajectory has {outputs} output rows but {parameters} parameter rows")]
    TrajectoryShape { outputs: usize, parameters: usize },

    #[error("Expected {expected} column labels, got {actual}")]
    Columns { expected: usize, actual: usize },
}

/// Failure raised by, or malformed output returned from, the objective
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ObjectiveError {
    #[error("Objective failed at epoch {epoch}, {site}: {message}")]
    Failed {
        epoch: usize,
        site: EvaluationSite,
        message: String,
    },

    #[error("Objective returned {actual} outputs at epoch {epoch}, {site}; expected {expected}")]
    OutputWidth {
        epoch: usize,
        site: EvaluationSite,
        expected: usize,
        actual: usize,
    },

    #[error("Objective returned no outputs")]
    EmptyOutput,

    #[error("Objective returned NaN in channel {channel} at epoch {epoch}, {site}")]
    NotANumber {
        epoch: usize,
        site: EvaluationSite,
        channel: usize,
    },
}

/// Worker pool misconfiguration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConcurrencyError {
    #[error("Requested {threads} threads but an epoch only submits {evaluations} evaluations")]
    TooManyThreads { threads: usize, evaluations: usize },

    #[error("Failed to build worker pool: {message}")]
    PoolBuild { message: String },
}

/// Result type alias for descent operations
pub type FdgdResult<T> = Result<T, FdgdError>;
