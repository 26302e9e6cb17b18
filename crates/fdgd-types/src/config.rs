//! Run configuration shared by every descent variant.

use serde::{Deserialize, Serialize};

use crate::errors::{ConcurrencyError, ConfigError};

/// Seed used for coordinate sampling when the caller does not pick one.
pub const DEFAULT_RNG_SEED: u64 = 88;

/// Which coordinates get a finite-difference estimate each epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DescentVariant {
    /// Every coordinate, every epoch.
    Full,
    /// A freshly drawn subset of `parameters_used` coordinates per epoch.
    Partial { parameters_used: usize },
    /// Partial descent for `partial_epochs` epochs, full descent afterwards.
    Phased {
        parameters_used: usize,
        partial_epochs: usize,
    },
}

impl DescentVariant {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Partial { .. } => "partial",
            Self::Phased { .. } => "phased",
        }
    }

    /// Smallest number of evaluations any epoch of this variant submits.
    pub fn min_evaluations_per_epoch(&self, n_parameters: usize) -> usize {
        match self {
            Self::Full => n_parameters + 1,
            Self::Partial { parameters_used } | Self::Phased { parameters_used, .. } => {
                parameters_used + 1
            }
        }
    }
}

impl Default for DescentVariant {
    fn default() -> Self {
        Self::Full
    }
}

/// Scalars that steer a descent run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescentConfig {
    pub variant: DescentVariant,

    /// Weight of the previous velocity in the update; 0 is plain gradient descent.
    pub momentum: f64,

    /// Worker count for objective evaluations; 1 evaluates on the calling thread.
    pub threads: usize,

    /// Seed for the coordinate sampler of the partial variants.
    pub rng_seed: u64,
}

impl Default for DescentConfig {
    fn default() -> Self {
        Self {
            variant: DescentVariant::Full,
            momentum: 0.0,
            threads: 1,
            rng_seed: DEFAULT_RNG_SEED,
        }
    }
}

impl DescentConfig {
    pub fn full() -> Self {
        Self::default()
    }

    pub fn partial(parameters_used: usize) -> Self {
        Self {
            variant: DescentVariant::Partial { parameters_used },
            ..Self::default()
        }
    }

    pub fn phased(parameters_used: usize, partial_epochs: usize) -> Self {
        Self {
            variant: DescentVariant::Phased {
                parameters_used,
                partial_epochs,
            },
            ..Self::default()
        }
    }

    pub fn with_momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Checks everything that can be checked without calling the objective.
    pub fn validate(&self, initial: &[f64], epochs: usize) -> Result<(), ConfigError> {
        if initial.is_empty() {
            return Err(ConfigError::EmptyInitial);
        }
        if let Some(index) = initial.iter().position(|v| !v.is_finite()) {
            return Err(ConfigError::NonFiniteInitial { index });
        }
        if epochs == 0 {
            return Err(ConfigError::ZeroEpochs);
        }
        if self.threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }
        if !self.momentum.is_finite() {
            return Err(ConfigError::InvalidMomentum {
                momentum: self.momentum,
            });
        }

        let n_parameters = initial.len();
        match self.variant {
            DescentVariant::Full => {}
            DescentVariant::Partial { parameters_used } => {
                check_parameters_used(parameters_used, n_parameters)?;
            }
            DescentVariant::Phased {
                parameters_used,
                partial_epochs,
            } => {
                check_parameters_used(parameters_used, n_parameters)?;
                if partial_epochs == 0 || partial_epochs >= epochs {
                    return Err(ConfigError::PartialEpochs {
                        partial_epochs,
                        total_epochs: epochs,
                    });
                }
            }
        }

        Ok(())
    }

    /// A pool wider than the smallest epoch batch is rejected rather than clamped.
    pub fn validate_threads(&self, n_parameters: usize) -> Result<(), ConcurrencyError> {
        if self.threads <= 1 {
            return Ok(());
        }
        let evaluations = self.variant.min_evaluations_per_epoch(n_parameters);
        if self.threads > evaluations {
            return Err(ConcurrencyError::TooManyThreads {
                threads: self.threads,
                evaluations,
            });
        }
        Ok(())
    }
}

fn check_parameters_used(used: usize, n_parameters: usize) -> Result<(), ConfigError> {
    if used == 0 || used > n_parameters {
        return Err(ConfigError::ParametersUsed { used, n_parameters });
    }
    Ok(())
}

/// Checks a step or rate schedule against the epoch count.
///
/// Steps are divisors in the difference quotient, so `require_non_zero` is
/// set for them.
pub fn validate_schedule(
    name: &str,
    values: &[f64],
    epochs: usize,
    require_non_zero: bool,
) -> Result<(), ConfigError> {
    if values.len() != epochs {
        return Err(ConfigError::ScheduleLength {
            name: name.to_string(),
            expected: epochs,
            actual: values.len(),
        });
    }
    for (epoch, value) in values.iter().enumerate() {
        if !value.is_finite() {
            return Err(ConfigError::NonFiniteSchedule {
                name: name.to_string(),
                epoch,
            });
        }
        if require_non_zero && *value == 0.0 {
            return Err(ConfigError::ZeroStep { epoch });
        }
    }
    Ok(())
}
