//! Strategies for running one epoch's batch of objective evaluations.

use fdgd_types::{ConcurrencyError, EvaluationSite, ObjectiveError};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::trace;

use crate::objective::ObjectiveAdapter;

/// A parameter vector queued for evaluation, tagged with what it measures.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationPoint {
    pub site: EvaluationSite,
    pub parameters: Vec<f64>,
}

/// Runs a batch of evaluations and returns the outputs in submission order.
///
/// Implementations must finish every evaluation of the batch before
/// returning; the caller folds the whole batch into one update.
pub trait EvaluationStrategy: Send + Sync {
    fn evaluate_batch(
        &self,
        adapter: &ObjectiveAdapter<'_>,
        points: &[EvaluationPoint],
        epoch: usize,
    ) -> Result<Vec<Vec<f64>>, ObjectiveError>;

    /// Number of evaluations that may run at once.
    fn threads(&self) -> usize;

    fn name(&self) -> &str;
}

// ---- Sequential ----

/// Evaluates one point at a time on the calling thread, in order, stopping at
/// the first failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl EvaluationStrategy for Sequential {
    fn evaluate_batch(
        &self,
        adapter: &ObjectiveAdapter<'_>,
        points: &[EvaluationPoint],
        epoch: usize,
    ) -> Result<Vec<Vec<f64>>, ObjectiveError> {
        trace!("Evaluating {} points sequentially at epoch {}", points.len(), epoch);
        points
            .iter()
            .map(|point| adapter.evaluate(&point.parameters, epoch, point.site))
            .collect()
    }

    fn threads(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "sequential"
    }
}

// ---- Parallel ----

/// Fans a batch out over a dedicated rayon pool of fixed size.
///
/// Results are gathered by submission index, so completion order never
/// changes which output belongs to which point. When several evaluations
/// fail, the one submitted first is reported.
pub struct Parallel {
    pool: ThreadPool,
    threads: usize,
}

impl Parallel {
    pub fn new(threads: usize) -> Result<Self, ConcurrencyError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("fdgd-worker-{index}"))
            .build()
            .map_err(|e| ConcurrencyError::PoolBuild {
                message: e.to_string(),
            })?;
        Ok(Self { pool, threads })
    }
}

impl std::fmt::Debug for Parallel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parallel")
            .field("threads", &self.threads)
            .finish()
    }
}

impl EvaluationStrategy for Parallel {
    fn evaluate_batch(
        &self,
        adapter: &ObjectiveAdapter<'_>,
        points: &[EvaluationPoint],
        epoch: usize,
    ) -> Result<Vec<Vec<f64>>, ObjectiveError> {
        trace!(
            "Evaluating {} points on {} workers at epoch {}",
            points.len(),
            self.threads,
            epoch
        );
        let results: Vec<Result<Vec<f64>, ObjectiveError>> = self.pool.install(|| {
            points
                .par_iter()
                .map(|point| adapter.evaluate(&point.parameters, epoch, point.site))
                .collect()
        });
        results.into_iter().collect()
    }

    fn threads(&self) -> usize {
        self.threads
    }

    fn name(&self) -> &str {
        "parallel"
    }
}

/// Sequential evaluation for a single thread, a pool otherwise.
pub fn strategy_for_threads(threads: usize) -> Result<Box<dyn EvaluationStrategy>, ConcurrencyError> {
    if threads <= 1 {
        Ok(Box::new(Sequential))
    } else {
        Ok(Box::new(Parallel::new(threads)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::{FnObjective, TryFnObjective};
    use std::thread;
    use std::time::Duration;

    fn points(n: usize) -> Vec<EvaluationPoint> {
        (0..n)
            .map(|i| EvaluationPoint {
                site: if i == 0 {
                    EvaluationSite::Base
                } else {
                    EvaluationSite::Coordinate(i - 1)
                },
                parameters: vec![i as f64],
            })
            .collect()
    }

    #[test]
    fn parallel_preserves_submission_order() {
        // Early points sleep longest so they finish last.
        let objective = FnObjective(|p: &[f64]| {
            thread::sleep(Duration::from_millis((8.0 - p[0]) as u64 * 2));
            [p[0], p[0] * 10.0]
        });
        let adapter = ObjectiveAdapter::probe(&objective, &[0.0], None).unwrap();
        let batch = points(8);

        let parallel = Parallel::new(4).unwrap().evaluate_batch(&adapter, &batch, 0).unwrap();
        let sequential = Sequential.evaluate_batch(&adapter, &batch, 0).unwrap();

        assert_eq!(parallel, sequential);
        for (i, output) in parallel.iter().enumerate() {
            assert_eq!(output[0], i as f64);
        }
    }

    #[test]
    fn parallel_reports_first_submitted_failure() {
        let objective = TryFnObjective(|p: &[f64]| {
            if p[0] >= 2.0 {
                Err(format!("bad point {}", p[0]))
            } else {
                Ok(p[0])
            }
        });
        let adapter = ObjectiveAdapter::probe(&objective, &[0.0], None).unwrap();

        let err = Parallel::new(3)
            .unwrap()
            .evaluate_batch(&adapter, &points(6), 5)
            .unwrap_err();
        assert_eq!(
            err,
            ObjectiveError::Failed {
                epoch: 5,
                site: EvaluationSite::Coordinate(1),
                message: "bad point 2".to_string()
            }
        );
    }

    #[test]
    fn sequential_stops_at_first_failure() {
        let objective = TryFnObjective(|p: &[f64]| {
            if p[0] >= 1.0 {
                Err("boom")
            } else {
                Ok(p[0])
            }
        });
        let adapter = ObjectiveAdapter::probe(&objective, &[0.0], None).unwrap();
        let err = Sequential.evaluate_batch(&adapter, &points(4), 0).unwrap_err();
        assert!(matches!(
            err,
            ObjectiveError::Failed {
                site: EvaluationSite::Coordinate(0),
                ..
            }
        ));
    }

    #[test]
    fn strategy_selection_follows_thread_count() {
        let single = strategy_for_threads(1).unwrap();
        assert_eq!(single.name(), "sequential");
        assert_eq!(single.threads(), 1);

        let pooled = strategy_for_threads(3).unwrap();
        assert_eq!(pooled.name(), "parallel");
        assert_eq!(pooled.threads(), 3);
    }
}
