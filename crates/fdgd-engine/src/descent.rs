//! The epoch loop shared by full, partial and phased descent.

use fdgd_types::{validate_schedule, ConfigError, DescentConfig, DescentVariant, FdgdResult, Trajectory};
use tracing::{debug, info};

use crate::evaluation::{strategy_for_threads, EvaluationStrategy};
use crate::gradient::{forward_difference, perturbed_points, Velocity};
use crate::objective::{Objective, ObjectiveAdapter};
use crate::sampler::CoordinateSampler;

/// Caller inputs for one run.
#[derive(Debug, Clone, Copy)]
pub struct DescentProblem<'a> {
    pub initial: &'a [f64],
    /// Finite-difference step per epoch.
    pub steps: &'a [f64],
    /// Learning rate per epoch.
    pub rates: &'a [f64],
    pub epochs: usize,
    pub metaparameters: Option<&'a [f64]>,
}

impl<'a> DescentProblem<'a> {
    pub fn new(initial: &'a [f64], steps: &'a [f64], rates: &'a [f64], epochs: usize) -> Self {
        Self {
            initial,
            steps,
            rates,
            epochs,
            metaparameters: None,
        }
    }

    pub fn with_metaparameters(mut self, metaparameters: &'a [f64]) -> Self {
        self.metaparameters = Some(metaparameters);
        self
    }
}

/// A finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct DescentOutcome {
    /// `epochs` rows; row 0 holds the initial parameters.
    pub trajectory: Trajectory,
    /// The state the update produced after the last epoch. It was never
    /// evaluated and is not a trajectory row.
    pub next_parameters: Vec<f64>,
}

/// Drives descent runs for one objective.
///
/// Every call to [`DescentEngine::run`] is independent: velocity starts at
/// zero and the coordinate sampler is reseeded. A failing objective aborts
/// the run and no partial trajectory is returned.
pub struct DescentEngine<O> {
    objective: O,
    config: DescentConfig,
    strategy: Box<dyn EvaluationStrategy>,
}

impl<O: Objective> DescentEngine<O> {
    /// Picks sequential or pooled evaluation from `config.threads`.
    pub fn new(objective: O, config: DescentConfig) -> FdgdResult<Self> {
        if config.threads == 0 {
            return Err(ConfigError::ZeroThreads.into());
        }
        let strategy = strategy_for_threads(config.threads)?;
        Ok(Self::with_strategy(objective, config, strategy))
    }

    pub fn with_strategy(
        objective: O,
        config: DescentConfig,
        strategy: Box<dyn EvaluationStrategy>,
    ) -> Self {
        Self {
            objective,
            config,
            strategy,
        }
    }

    pub fn config(&self) -> &DescentConfig {
        &self.config
    }

    pub fn run(&self, problem: DescentProblem<'_>) -> FdgdResult<DescentOutcome> {
        let DescentProblem {
            initial,
            steps,
            rates,
            epochs,
            metaparameters,
        } = problem;

        self.config.validate(initial, epochs)?;
        validate_schedule("step", steps, epochs, true)?;
        validate_schedule("rate", rates, epochs, false)?;
        self.config.validate_threads(initial.len())?;

        let adapter = ObjectiveAdapter::probe(&self.objective, initial, metaparameters)?;
        info!(
            "Starting {} descent: {} parameters, {} outputs, {} epochs, {} evaluation",
            self.config.variant.name(),
            initial.len(),
            adapter.n_outputs(),
            epochs,
            self.strategy.name()
        );

        let outcome = match self.config.variant {
            DescentVariant::Full => self.run_phase(&adapter, initial, steps, rates, 0, None)?,
            DescentVariant::Partial { parameters_used } => {
                let sampler =
                    CoordinateSampler::new(self.config.rng_seed, initial.len(), parameters_used);
                self.run_phase(&adapter, initial, steps, rates, 0, Some(sampler))?
            }
            DescentVariant::Phased {
                parameters_used,
                partial_epochs,
            } => {
                let sampler =
                    CoordinateSampler::new(self.config.rng_seed, initial.len(), parameters_used);
                let partial = self.run_phase(
                    &adapter,
                    initial,
                    &steps[..partial_epochs],
                    &rates[..partial_epochs],
                    0,
                    Some(sampler),
                )?;
                debug!("Partial phase finished after {} epochs", partial_epochs);

                // The full phase starts from the would-be next state so no
                // parameter row repeats across the boundary.
                let full = self.run_phase(
                    &adapter,
                    &partial.next_parameters,
                    &steps[partial_epochs..],
                    &rates[partial_epochs..],
                    partial_epochs,
                    None,
                )?;

                let mut trajectory = partial.trajectory;
                trajectory.append(full.trajectory);
                DescentOutcome {
                    trajectory,
                    next_parameters: full.next_parameters,
                }
            }
        };

        if let Some(last) = outcome.trajectory.final_output() {
            info!(
                "Descent completed: {} epochs, final objective {}",
                outcome.trajectory.epochs(),
                last[0]
            );
        }
        Ok(outcome)
    }

    /// One self-contained phase with its own zero velocity. `epoch_offset`
    /// only shifts the epoch numbers reported in logs and errors.
    fn run_phase(
        &self,
        adapter: &ObjectiveAdapter<'_>,
        initial: &[f64],
        steps: &[f64],
        rates: &[f64],
        epoch_offset: usize,
        mut sampler: Option<CoordinateSampler>,
    ) -> FdgdResult<DescentOutcome> {
        let n_parameters = initial.len();
        let all_coordinates: Vec<usize> = (0..n_parameters).collect();
        let mut velocity = Velocity::zeros(n_parameters);
        let mut parameters = initial.to_vec();
        let mut trajectory = Trajectory::with_capacity(steps.len());

        for (local_epoch, (&step, &rate)) in steps.iter().zip(rates).enumerate() {
            let epoch = epoch_offset + local_epoch;
            let active = match sampler.as_mut() {
                Some(sampler) => sampler.draw(),
                None => all_coordinates.clone(),
            };

            let points = perturbed_points(&parameters, &active, step);
            let mut results = self.strategy.evaluate_batch(adapter, &points, epoch)?;
            let perturbed_values: Vec<f64> = results[1..].iter().map(|o| o[0]).collect();
            let base = results.swap_remove(0);

            let gradient = forward_difference(base[0], &active, &perturbed_values, step, n_parameters);
            velocity.step(self.config.momentum, rate, &gradient);
            let next = velocity.apply(&parameters);

            debug!(
                "Epoch {}: objective {}, {} coordinates evaluated",
                epoch,
                base[0],
                active.len()
            );
            trajectory.push(base, parameters);
            parameters = next;
        }

        Ok(DescentOutcome {
            trajectory,
            next_parameters: parameters,
        })
    }
}

/// Full-coordinate descent.
pub fn descent<O: Objective>(
    objective: O,
    problem: DescentProblem<'_>,
    config: DescentConfig,
) -> FdgdResult<DescentOutcome> {
    let config = DescentConfig {
        variant: DescentVariant::Full,
        ..config
    };
    DescentEngine::new(objective, config)?.run(problem)
}

/// Descent over a fresh random subset of `parameters_used` coordinates per epoch.
pub fn partial_descent<O: Objective>(
    objective: O,
    problem: DescentProblem<'_>,
    parameters_used: usize,
    config: DescentConfig,
) -> FdgdResult<DescentOutcome> {
    let config = DescentConfig {
        variant: DescentVariant::Partial { parameters_used },
        ..config
    };
    DescentEngine::new(objective, config)?.run(problem)
}

/// Partial descent for `partial_epochs` epochs, then full descent for the rest.
pub fn partially_partial_descent<O: Objective>(
    objective: O,
    problem: DescentProblem<'_>,
    parameters_used: usize,
    partial_epochs: usize,
    config: DescentConfig,
) -> FdgdResult<DescentOutcome> {
    let config = DescentConfig {
        variant: DescentVariant::Phased {
            parameters_used,
            partial_epochs,
        },
        ..config
    };
    DescentEngine::new(objective, config)?.run(problem)
}
