//! Caller objectives and the adapter that normalizes their outputs.

use fdgd_types::{ConfigError, EvaluationSite, FdgdResult, ObjectiveError};

/// What an objective returns: a single value or a fixed-width vector.
///
/// Only channel 0 is minimized; the other channels are recorded per epoch.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl Output {
    pub fn into_vec(self) -> Vec<f64> {
        match self {
            Self::Scalar(value) => vec![value],
            Self::Vector(values) => values,
        }
    }
}

impl From<f64> for Output {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<f64>> for Output {
    fn from(values: Vec<f64>) -> Self {
        Self::Vector(values)
    }
}

impl<const N: usize> From<[f64; N]> for Output {
    fn from(values: [f64; N]) -> Self {
        Self::Vector(values.to_vec())
    }
}

/// A function scored by the descent engine.
///
/// Implementations must be free of side effects on the optimization state and
/// safe to call from several pool workers at once.
pub trait Objective: Send + Sync {
    /// Evaluates the objective. `metaparameters` is `Some` exactly when
    /// [`Objective::accepts_metaparameters`] returns true.
    fn evaluate(&self, parameters: &[f64], metaparameters: Option<&[f64]>)
        -> Result<Output, String>;

    fn accepts_metaparameters(&self) -> bool {
        false
    }
}

impl<T: Objective + ?Sized> Objective for &T {
    fn evaluate(
        &self,
        parameters: &[f64],
        metaparameters: Option<&[f64]>,
    ) -> Result<Output, String> {
        (**self).evaluate(parameters, metaparameters)
    }

    fn accepts_metaparameters(&self) -> bool {
        (**self).accepts_metaparameters()
    }
}

/// Wraps `Fn(&[f64]) -> impl Into<Output>`.
#[derive(Debug, Clone)]
pub struct FnObjective<F>(pub F);

impl<F, O> Objective for FnObjective<F>
where
    F: Fn(&[f64]) -> O + Send + Sync,
    O: Into<Output>,
{
    fn evaluate(&self, parameters: &[f64], _metaparameters: Option<&[f64]>) -> Result<Output, String> {
        Ok((self.0)(parameters).into())
    }
}

/// Wraps `Fn(&[f64], &[f64]) -> impl Into<Output>`; the second slice is the
/// metaparameter vector, identical on every call of a run.
#[derive(Debug, Clone)]
pub struct MetaFnObjective<F>(pub F);

impl<F, O> Objective for MetaFnObjective<F>
where
    F: Fn(&[f64], &[f64]) -> O + Send + Sync,
    O: Into<Output>,
{
    fn evaluate(&self, parameters: &[f64], metaparameters: Option<&[f64]>) -> Result<Output, String> {
        let metaparameters = metaparameters.ok_or("metaparameters were not supplied")?;
        Ok((self.0)(parameters, metaparameters).into())
    }

    fn accepts_metaparameters(&self) -> bool {
        true
    }
}

/// Wraps a fallible `Fn(&[f64]) -> Result<impl Into<Output>, E>`.
#[derive(Debug, Clone)]
pub struct TryFnObjective<F>(pub F);

impl<F, O, E> Objective for TryFnObjective<F>
where
    F: Fn(&[f64]) -> Result<O, E> + Send + Sync,
    O: Into<Output>,
    E: std::fmt::Display,
{
    fn evaluate(&self, parameters: &[f64], _metaparameters: Option<&[f64]>) -> Result<Output, String> {
        (self.0)(parameters)
            .map(Into::into)
            .map_err(|e| e.to_string())
    }
}

/// An objective bound to a run: metaparameters fixed, output width known.
#[derive(Clone, Copy)]
pub struct ObjectiveAdapter<'a> {
    objective: &'a dyn Objective,
    metaparameters: Option<&'a [f64]>,
    n_outputs: usize,
}

impl<'a> ObjectiveAdapter<'a> {
    /// Checks the metaparameter contract, then evaluates once at `initial` to
    /// learn how many output channels every later call must return.
    pub fn probe(
        objective: &'a dyn Objective,
        initial: &[f64],
        metaparameters: Option<&'a [f64]>,
    ) -> FdgdResult<Self> {
        match (objective.accepts_metaparameters(), metaparameters) {
            (true, None) => {
                return Err(ConfigError::Metaparameters {
                    message: "objective expects metaparameters but none were given".into(),
                }
                .into())
            }
            (false, Some(_)) => {
                return Err(ConfigError::Metaparameters {
                    message: "metaparameters were given but the objective does not accept them"
                        .into(),
                }
                .into())
            }
            _ => {}
        }

        let outputs = objective
            .evaluate(initial, metaparameters)
            .map_err(|message| ObjectiveError::Failed {
                epoch: 0,
                site: EvaluationSite::Probe,
                message,
            })?
            .into_vec();
        if outputs.is_empty() {
            return Err(ObjectiveError::EmptyOutput.into());
        }

        let adapter = Self {
            objective,
            metaparameters,
            n_outputs: outputs.len(),
        };
        adapter.check(&outputs, 0, EvaluationSite::Probe)?;
        Ok(adapter)
    }

    pub fn n_outputs(&self) -> usize {
        self.n_outputs
    }

    pub fn metaparameters(&self) -> Option<&'a [f64]> {
        self.metaparameters
    }

    /// One objective call, normalized to `n_outputs` channels.
    pub fn evaluate(
        &self,
        parameters: &[f64],
        epoch: usize,
        site: EvaluationSite,
    ) -> Result<Vec<f64>, ObjectiveError> {
        let outputs = self
            .objective
            .evaluate(parameters, self.metaparameters)
            .map_err(|message| ObjectiveError::Failed {
                epoch,
                site,
                message,
            })?
            .into_vec();
        self.check(&outputs, epoch, site)?;
        Ok(outputs)
    }

    fn check(&self, outputs: &[f64], epoch: usize, site: EvaluationSite) -> Result<(), ObjectiveError> {
        if outputs.len() != self.n_outputs {
            return Err(ObjectiveError::OutputWidth {
                epoch,
                site,
                expected: self.n_outputs,
                actual: outputs.len(),
            });
        }
        if let Some(channel) = outputs.iter().position(|v| v.is_nan()) {
            return Err(ObjectiveError::NotANumber {
                epoch,
                site,
                channel,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for ObjectiveAdapter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectiveAdapter")
            .field("metaparameters", &self.metaparameters)
            .field("n_outputs", &self.n_outputs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fdgd_types::FdgdError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn scalar_and_vector_outputs_normalize() {
        assert_eq!(Output::from(2.0).into_vec(), vec![2.0]);
        assert_eq!(Output::from(vec![1.0, 2.0]).into_vec(), vec![1.0, 2.0]);
        assert_eq!(Output::from([3.0, 4.0, 5.0]).into_vec(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn probe_learns_output_width() {
        let objective = FnObjective(|p: &[f64]| [p[0] * p[0], p[0]]);
        let adapter = ObjectiveAdapter::probe(&objective, &[3.0], None).unwrap();
        assert_eq!(adapter.n_outputs(), 2);
        assert_eq!(
            adapter.evaluate(&[2.0], 0, EvaluationSite::Base).unwrap(),
            vec![4.0, 2.0]
        );
    }

    #[test]
    fn probe_evaluates_exactly_once() {
        let calls = AtomicUsize::new(0);
        let objective = FnObjective(|_: &[f64]| {
            calls.fetch_add(1, Ordering::SeqCst);
            1.0
        });
        ObjectiveAdapter::probe(&objective, &[0.0], None).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn metaparameters_are_passed_through() {
        let objective = MetaFnObjective(|p: &[f64], m: &[f64]| p[0] * m[0]);
        let meta = [10.0];
        let adapter = ObjectiveAdapter::probe(&objective, &[1.0], Some(&meta)).unwrap();
        assert_eq!(adapter.evaluate(&[2.0], 0, EvaluationSite::Base).unwrap(), vec![20.0]);
        assert_eq!(adapter.metaparameters(), Some(&meta[..]));
    }

    #[test]
    fn metaparameter_mismatch_is_a_config_error() {
        let meta_objective = MetaFnObjective(|p: &[f64], _: &[f64]| p[0]);
        let err = ObjectiveAdapter::probe(&meta_objective, &[1.0], None).unwrap_err();
        assert!(matches!(err, FdgdError::Config(ConfigError::Metaparameters { .. })));

        let plain = FnObjective(|p: &[f64]| p[0]);
        let err = ObjectiveAdapter::probe(&plain, &[1.0], Some(&[1.0])).unwrap_err();
        assert!(matches!(err, FdgdError::Config(ConfigError::Metaparameters { .. })));
    }

    #[test]
    fn width_changes_are_rejected() {
        let objective = FnObjective(|p: &[f64]| {
            if p[0] > 0.0 {
                vec![1.0, 2.0]
            } else {
                vec![1.0]
            }
        });
        let adapter = ObjectiveAdapter::probe(&objective, &[1.0], None).unwrap();
        let err = adapter
            .evaluate(&[-1.0], 4, EvaluationSite::Coordinate(0))
            .unwrap_err();
        assert_eq!(
            err,
            ObjectiveError::OutputWidth {
                epoch: 4,
                site: EvaluationSite::Coordinate(0),
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn nan_and_empty_outputs_are_rejected() {
        let empty = FnObjective(|_: &[f64]| Vec::<f64>::new());
        let err = ObjectiveAdapter::probe(&empty, &[1.0], None).unwrap_err();
        assert!(matches!(err, FdgdError::Objective(ObjectiveError::EmptyOutput)));

        let nan = FnObjective(|_: &[f64]| [1.0, f64::NAN]);
        let err = ObjectiveAdapter::probe(&nan, &[1.0], None).unwrap_err();
        assert!(matches!(
            err,
            FdgdError::Objective(ObjectiveError::NotANumber { channel: 1, .. })
        ));
    }

    #[test]
    fn fallible_objective_reports_message() {
        let objective = TryFnObjective(|p: &[f64]| {
            if p[0] < 0.0 {
                Err("negative input")
            } else {
                Ok(p[0].sqrt())
            }
        });
        let adapter = ObjectiveAdapter::probe(&objective, &[4.0], None).unwrap();
        let err = adapter
            .evaluate(&[-1.0], 2, EvaluationSite::Base)
            .unwrap_err();
        assert_eq!(
            err,
            ObjectiveError::Failed {
                epoch: 2,
                site: EvaluationSite::Base,
                message: "negative input".to_string()
            }
        );
    }
}
