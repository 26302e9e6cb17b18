//! Run bookkeeping: identity, lifecycle timestamps and the best epoch.

use chrono::{DateTime, Utc};
use fdgd_types::{DescentConfig, Trajectory};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Unique descent run identifier.
pub type RunId = Uuid;

/// Lifecycle state for a descent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Summary of one descent run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: RunId,
    pub name: String,
    pub config: DescentConfig,
    pub state: RunState,
    pub epochs_completed: usize,
    /// Epoch with the lowest channel-0 output.
    pub best_epoch: Option<usize>,
    pub best_objective: Option<f64>,
    pub final_output: Option<Vec<f64>>,
    pub final_parameters: Option<Vec<f64>>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl RunRecord {
    pub fn new(name: impl Into<String>, config: DescentConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            config,
            state: RunState::Pending,
            epochs_completed: 0,
            best_epoch: None,
            best_objective: None,
            final_output: None,
            final_parameters: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.state = RunState::Running;
        self.started_at = Some(Utc::now());
        info!("Run {} ({}) started", self.name, self.config.variant.name());
    }

    pub fn mark_completed(&mut self, trajectory: &Trajectory) {
        self.state = RunState::Completed;
        self.finished_at = Some(Utc::now());
        self.epochs_completed = trajectory.epochs();
        self.best_epoch = trajectory.best_epoch();
        self.best_objective = self.best_epoch.map(|epoch| trajectory.outputs[epoch][0]);
        self.final_output = trajectory.final_output().map(<[f64]>::to_vec);
        self.final_parameters = trajectory.final_parameters().map(<[f64]>::to_vec);
        info!(
            "Run {} completed after {} epochs",
            self.name, self.epochs_completed
        );
    }

    pub fn mark_failed(&mut self, error: String) {
        warn!("Run {} failed: {}", self.name, error);
        self.state = RunState::Failed;
        self.finished_at = Some(Utc::now());
        self.error = Some(error);
    }

    /// Wall-clock time between start and finish, if both happened.
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }
}
