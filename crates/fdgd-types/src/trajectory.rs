//! Row-aligned output and parameter histories of a descent run.

use serde::{Deserialize, Serialize};

/// One row per epoch: the objective outputs at the epoch's parameters and the
/// parameters themselves.
///
/// Row `e` of `outputs` is always the unperturbed evaluation of row `e` of
/// `parameters`. Rows are only ever appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub outputs: Vec<Vec<f64>>,
    pub parameters: Vec<Vec<f64>>,
}

impl Trajectory {
    pub fn with_capacity(epochs: usize) -> Self {
        Self {
            outputs: Vec::with_capacity(epochs),
            parameters: Vec::with_capacity(epochs),
        }
    }

    pub fn push(&mut self, outputs: Vec<f64>, parameters: Vec<f64>) {
        self.outputs.push(outputs);
        self.parameters.push(parameters);
    }

    pub fn epochs(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn n_outputs(&self) -> usize {
        self.outputs.first().map_or(0, Vec::len)
    }

    pub fn n_parameters(&self) -> usize {
        self.parameters.first().map_or(0, Vec::len)
    }

    pub fn final_output(&self) -> Option<&[f64]> {
        self.outputs.last().map(Vec::as_slice)
    }

    pub fn final_parameters(&self) -> Option<&[f64]> {
        self.parameters.last().map(Vec::as_slice)
    }

    /// Channel 0 of every row, the value being minimized.
    pub fn objective_values(&self) -> Vec<f64> {
        self.outputs.iter().map(|row| row[0]).collect()
    }

    /// Concatenates a later phase onto this one, preserving row order.
    pub fn append(&mut self, mut other: Trajectory) {
        self.outputs.append(&mut other.outputs);
        self.parameters.append(&mut other.parameters);
    }

    /// Epoch with the lowest channel-0 output.
    pub fn best_epoch(&self) -> Option<usize> {
        self.outputs
            .iter()
            .enumerate()
            .min_by(|a, b| a.1[0].partial_cmp(&b.1[0]).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(epoch, _)| epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Trajectory {
        let mut trajectory = Trajectory::with_capacity(3);
        trajectory.push(vec![4.0, 1.0], vec![2.0, 0.0]);
        trajectory.push(vec![1.0, 2.0], vec![1.0, 0.0]);
        trajectory.push(vec![2.0, 3.0], vec![0.5, 0.0]);
        trajectory
    }

    #[test]
    fn shape_accessors() {
        let trajectory = sample();
        assert_eq!(trajectory.epochs(), 3);
        assert_eq!(trajectory.n_outputs(), 2);
        assert_eq!(trajectory.n_parameters(), 2);
        assert_eq!(trajectory.final_output(), Some(&[2.0, 3.0][..]));
        assert_eq!(trajectory.final_parameters(), Some(&[0.5, 0.0][..]));
        assert_eq!(trajectory.objective_values(), vec![4.0, 1.0, 2.0]);
        assert_eq!(trajectory.best_epoch(), Some(1));
    }

    #[test]
    fn append_keeps_row_order() {
        let mut first = sample();
        let mut second = Trajectory::default();
        second.push(vec![0.1, 9.0], vec![0.0, 0.0]);

        first.append(second);
        assert_eq!(first.epochs(), 4);
        assert_eq!(first.outputs[3], vec![0.1, 9.0]);
        assert_eq!(first.parameters[2], vec![0.5, 0.0]);
    }

    #[test]
    fn empty_trajectory() {
        let trajectory = Trajectory::default();
        assert!(trajectory.is_empty());
        assert_eq!(trajectory.n_outputs(), 0);
        assert_eq!(trajectory.final_output(), None);
        assert_eq!(trajectory.best_epoch(), None);
    }
}
