//! # fdgd-engine
//!
//! Gradient-free minimization by finite differences.
//!
//! Each epoch evaluates the objective at the current parameters and once per
//! active coordinate with that coordinate nudged by the epoch's step size,
//! turns the forward differences into a gradient estimate, and moves the
//! parameters with a momentum update. Three variants share the epoch loop:
//! full descent, partial descent over a seeded random coordinate subset, and
//! phased descent that runs partial descent first and full descent after.
//! Evaluations within an epoch run either on the calling thread or on a
//! dedicated rayon pool; both produce identical trajectories.

mod descent;
mod evaluation;
mod gradient;
mod objective;
mod sampler;

pub use descent::{
    descent, partial_descent, partially_partial_descent, DescentEngine, DescentOutcome,
    DescentProblem,
};
pub use evaluation::{strategy_for_threads, EvaluationPoint, EvaluationStrategy, Parallel, Sequential};
pub use gradient::{forward_difference, perturbed_points, Velocity};
pub use objective::{FnObjective, MetaFnObjective, Objective, ObjectiveAdapter, Output, TryFnObjective};
pub use sampler::CoordinateSampler;

pub use fdgd_types::{DescentConfig, DescentVariant, FdgdError, FdgdResult, Trajectory};
