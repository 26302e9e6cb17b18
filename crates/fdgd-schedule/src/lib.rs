//! # fdgd-schedule
//!
//! Generators for the per-epoch sequences a descent run consumes: the
//! finite-difference step size and the learning rate. Every generator
//! returns exactly `n_steps` values, value `k` belonging to epoch `k`.

use fdgd_types::{FdgdError, FdgdResult};
use serde::{Deserialize, Serialize};

/// Produces sequences of length `n_steps`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub n_steps: usize,
}

impl Schedule {
    pub fn new(n_steps: usize) -> Self {
        Self { n_steps }
    }

    fn steps(&self) -> impl Iterator<Item = f64> {
        (0..self.n_steps).map(|k| k as f64)
    }

    pub fn constant(&self, value: f64) -> Vec<f64> {
        vec![value; self.n_steps]
    }

    /// Evenly spaced values from `start` to `end`, both included.
    pub fn linear(&self, start: f64, end: f64) -> Vec<f64> {
        if self.n_steps <= 1 {
            return self.constant(start);
        }
        let last = (self.n_steps - 1) as f64;
        self.steps()
            .map(|k| start + (end - start) * k / last)
            .collect()
    }

    /// `initial * decay_rate^(k / n_steps)`: the value has decayed by a factor
    /// of `decay_rate` by the end of the schedule.
    pub fn exponential_decay(&self, initial: f64, decay_rate: f64) -> Vec<f64> {
        let n = self.n_steps as f64;
        self.steps()
            .map(|k| initial * decay_rate.powf(k / n))
            .collect()
    }

    /// Like [`Schedule::exponential_decay`] but decays in discrete jumps every
    /// `decay_steps` steps.
    pub fn stepped_exponential_decay(
        &self,
        initial: f64,
        decay_rate: f64,
        decay_steps: usize,
    ) -> FdgdResult<Vec<f64>> {
        if decay_steps == 0 {
            return Err(FdgdError::Schedule("decay_steps must be positive".into()));
        }
        Ok((0..self.n_steps)
            .map(|k| initial * decay_rate.powi((k / decay_steps) as i32))
            .collect())
    }

    /// Inverse-time decay: `initial / (1 + decay_rate * k)`.
    pub fn time_decay(&self, initial: f64, decay_rate: f64) -> Vec<f64> {
        self.steps()
            .map(|k| initial / (1.0 + decay_rate * k))
            .collect()
    }

    /// `(initial - end) * (1 - k / n_steps)^power + end`.
    pub fn polynomial_decay(&self, initial: f64, end: f64, power: f64) -> Vec<f64> {
        let n = self.n_steps as f64;
        self.steps()
            .map(|k| (initial - end) * (1.0 - k / n).powf(power) + end)
            .collect()
    }

    /// `values[i]` holds for steps below `boundaries[i]`; the last value
    /// holds from the last boundary on.
    pub fn piecewise_constant(&self, boundaries: &[usize], values: &[f64]) -> FdgdResult<Vec<f64>> {
        if values.len() != boundaries.len() + 1 {
            return Err(FdgdError::Schedule(format!(
                "piecewise schedule needs {} values for {} boundaries, got {}",
                boundaries.len() + 1,
                boundaries.len(),
                values.len()
            )));
        }
        if boundaries.windows(2).any(|w| w[0] >= w[1]) {
            return Err(FdgdError::Schedule(
                "piecewise boundaries must be strictly increasing".into(),
            ));
        }

        Ok((0..self.n_steps)
            .map(|k| {
                let segment = boundaries.iter().take_while(|b| k >= **b).count();
                values[segment]
            })
            .collect())
    }
}

/// Joins two schedules, e.g. the partial and full phases of a phased run.
pub fn concatenate(first: &[f64], second: &[f64]) -> Vec<f64> {
    let mut joined = Vec::with_capacity(first.len() + second.len());
    joined.extend_from_slice(first);
    joined.extend_from_slice(second);
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn every_generator_has_n_steps_values() {
        let schedule = Schedule::new(17);
        assert_eq!(schedule.constant(0.1).len(), 17);
        assert_eq!(schedule.linear(1.0, 0.0).len(), 17);
        assert_eq!(schedule.exponential_decay(0.01, 0.5).len(), 17);
        assert_eq!(schedule.time_decay(0.01, 0.5).len(), 17);
        assert_eq!(schedule.polynomial_decay(0.01, 0.001, 2.0).len(), 17);
        assert_eq!(schedule.stepped_exponential_decay(1.0, 0.5, 4).unwrap().len(), 17);
        assert_eq!(schedule.piecewise_constant(&[5], &[1.0, 0.1]).unwrap().len(), 17);
    }

    #[test]
    fn linear_hits_both_endpoints() {
        let values = Schedule::new(5).linear(1.0, 0.0);
        assert!(close(values[0], 1.0));
        assert!(close(values[2], 0.5));
        assert!(close(values[4], 0.0));
        assert_eq!(Schedule::new(1).linear(3.0, 0.0), vec![3.0]);
    }

    #[test]
    fn exponential_decay_reaches_rate_at_end() {
        let values = Schedule::new(1000).exponential_decay(0.01, 0.5);
        assert!(close(values[0], 0.01));
        assert!(close(values[500], 0.01 * 0.5f64.sqrt()));
        assert!(values.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn stepped_decay_jumps() {
        let values = Schedule::new(6).stepped_exponential_decay(1.0, 0.5, 2).unwrap();
        assert_eq!(values, vec![1.0, 1.0, 0.5, 0.5, 0.25, 0.25]);
        assert!(Schedule::new(6).stepped_exponential_decay(1.0, 0.5, 0).is_err());
    }

    #[test]
    fn time_and_polynomial_decay() {
        let time = Schedule::new(3).time_decay(1.0, 1.0);
        assert!(close(time[1], 0.5));
        assert!(close(time[2], 1.0 / 3.0));

        let poly = Schedule::new(4).polynomial_decay(1.0, 0.0, 1.0);
        assert!(close(poly[0], 1.0));
        assert!(close(poly[2], 0.5));
    }

    #[test]
    fn piecewise_segments() {
        let values = Schedule::new(6)
            .piecewise_constant(&[2, 4], &[1.0, 0.5, 0.1])
            .unwrap();
        assert_eq!(values, vec![1.0, 1.0, 0.5, 0.5, 0.1, 0.1]);

        assert!(Schedule::new(6).piecewise_constant(&[2], &[1.0]).is_err());
        assert!(Schedule::new(6)
            .piecewise_constant(&[4, 2], &[1.0, 0.5, 0.1])
            .is_err());
    }

    #[test]
    fn concatenate_preserves_order() {
        assert_eq!(concatenate(&[1.0, 2.0], &[3.0]), vec![1.0, 2.0, 3.0]);
    }
}
