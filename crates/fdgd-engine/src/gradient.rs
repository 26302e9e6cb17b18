//! Forward-difference gradient estimation and the momentum update.

use fdgd_types::EvaluationSite;

use crate::evaluation::EvaluationPoint;

/// The batch for one epoch: the unperturbed point first, then one point per
/// active coordinate (ascending) with that coordinate moved by `step`.
pub fn perturbed_points(base: &[f64], active: &[usize], step: f64) -> Vec<EvaluationPoint> {
    let mut points = Vec::with_capacity(active.len() + 1);
    points.push(EvaluationPoint {
        site: EvaluationSite::Base,
        parameters: base.to_vec(),
    });
    for &coordinate in active {
        let mut parameters = base.to_vec();
        parameters[coordinate] += step;
        points.push(EvaluationPoint {
            site: EvaluationSite::Coordinate(coordinate),
            parameters,
        });
    }
    points
}

/// `(f(p + step * e_i) - f(p)) / step` for each active coordinate `i`.
///
/// Inactive coordinates take the base value as their perturbed value, so
/// their estimate is exactly zero. The same `step` divides every coordinate.
pub fn forward_difference(
    base_value: f64,
    active: &[usize],
    perturbed_values: &[f64],
    step: f64,
    n_parameters: usize,
) -> Vec<f64> {
    let mut difference_objective = vec![base_value; n_parameters];
    for (&coordinate, &value) in active.iter().zip(perturbed_values) {
        difference_objective[coordinate] = value;
    }
    difference_objective
        .into_iter()
        .map(|value| (value - base_value) / step)
        .collect()
}

/// Accumulated momentum, zero at the start of every run or phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Velocity(Vec<f64>);

impl Velocity {
    pub fn zeros(n_parameters: usize) -> Self {
        Self(vec![0.0; n_parameters])
    }

    /// `v = momentum * v - rate * gradient`, element-wise.
    pub fn step(&mut self, momentum: f64, rate: f64, gradient: &[f64]) {
        for (v, g) in self.0.iter_mut().zip(gradient) {
            *v = momentum * *v - rate * g;
        }
    }

    /// Parameters for the next epoch.
    pub fn apply(&self, parameters: &[f64]) -> Vec<f64> {
        parameters.iter().zip(&self.0).map(|(p, v)| p + v).collect()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_layout() {
        let points = perturbed_points(&[1.0, 2.0, 3.0], &[0, 2], 0.5);
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].site, EvaluationSite::Base);
        assert_eq!(points[0].parameters, vec![1.0, 2.0, 3.0]);
        assert_eq!(points[1].site, EvaluationSite::Coordinate(0));
        assert_eq!(points[1].parameters, vec![1.5, 2.0, 3.0]);
        assert_eq!(points[2].site, EvaluationSite::Coordinate(2));
        assert_eq!(points[2].parameters, vec![1.0, 2.0, 3.5]);
    }

    #[test]
    fn forward_difference_matches_linear_slope() {
        // f(p) = 3 p0 - 2 p1 at p = (1, 1): f = 1
        let gradient = forward_difference(1.0, &[0, 1], &[1.3, 0.8], 0.1, 2);
        assert!((gradient[0] - 3.0).abs() < 1e-9);
        assert!((gradient[1] + 2.0).abs() < 1e-9);
    }

    #[test]
    fn inactive_coordinates_get_exactly_zero() {
        let gradient = forward_difference(5.0, &[1], &[7.0], 0.5, 3);
        assert_eq!(gradient, vec![0.0, 4.0, 0.0]);
    }

    #[test]
    fn zero_momentum_is_plain_gradient_descent() {
        let mut velocity = Velocity::zeros(2);
        velocity.step(0.0, 0.1, &[2.0, -4.0]);
        assert_eq!(velocity.as_slice(), &[-0.2, 0.4]);
        velocity.step(0.0, 0.1, &[1.0, 1.0]);
        assert_eq!(velocity.as_slice(), &[-0.1, -0.1]);
        let next = velocity.apply(&[1.0, 1.0]);
        assert!(next.iter().all(|p| (p - 0.9).abs() < 1e-12));
    }

    #[test]
    fn momentum_accumulates_history() {
        let mut velocity = Velocity::zeros(1);
        velocity.step(0.5, 1.0, &[1.0]);
        assert_eq!(velocity.as_slice(), &[-1.0]);
        velocity.step(0.5, 1.0, &[1.0]);
        assert_eq!(velocity.as_slice(), &[-1.5]);
    }
}
