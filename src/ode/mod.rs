use ndarray::{Array1, Array2, ArrayView1};

use crate::error::Result;

pub mod dopri5;
pub mod trajectory;

/// Right-hand side of an autonomous or time-dependent ODE system `dy/dt = f(t, y)`.
///
/// Solvers may evaluate the field at many trial points per accepted step, so
/// implementations must be pure.
pub trait VectorField: Sync {
    fn dim(&self) -> usize;
    fn derivative(&self, t: f64, y: ArrayView1<f64>) -> Array1<f64>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStats {
    pub accepted: usize,
    pub rejected: usize,
    pub evaluations: usize,
}

/// Solution sampled at the requested evaluation times.
#[derive(Debug, Clone)]
pub struct Solution {
    pub t: Array1<f64>,
    pub y: Array2<f64>,
    pub stats: SolverStats,
}

pub trait OdeSolver {
    /// Integrates `field` from `span.0` to `span.1` starting at `y0`, returning
    /// the state at each of `t_eval`. Callers guarantee that `t_eval` is
    /// strictly increasing and lies within `span`.
    fn solve(
        &self,
        field: &dyn VectorField,
        span: (f64, f64),
        y0: ArrayView1<f64>,
        t_eval: &[f64],
    ) -> Result<Solution>;
}
