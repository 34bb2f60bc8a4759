use log::info;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use ndarray_stats::{QuantileExt, errors::MinMaxError};
use serde::Serialize;

use crate::error::{ForecastError, Result};

use super::{OdeSolver, SolverStats, VectorField};

/// States sampled at increasing times. Read-only once produced.
#[derive(Debug, Clone, Serialize)]
pub struct Trajectory {
    times: Array1<f64>,
    states: Array2<f64>,
    #[serde(skip)]
    stats: SolverStats,
}

/// Per-dimension (min, max) over a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Trajectory {
    pub fn new(times: Array1<f64>, states: Array2<f64>) -> Result<Self> {
        if times.len() != states.nrows() {
            return Err(ForecastError::ShapeMismatch {
                context: "trajectory samples",
                expected: times.len(),
                found: states.nrows(),
            });
        }

        Ok(Self {
            times,
            states,
            stats: SolverStats::default(),
        })
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.states.ncols()
    }

    pub fn times(&self) -> ArrayView1<'_, f64> {
        self.times.view()
    }

    pub fn states(&self) -> ArrayView2<'_, f64> {
        self.states.view()
    }

    pub fn state(&self, i: usize) -> ArrayView1<'_, f64> {
        self.states.row(i)
    }

    pub fn stats(&self) -> SolverStats {
        self.stats
    }

    fn extremum_error(&self, e: MinMaxError) -> ForecastError {
        match e {
            MinMaxError::EmptyInput => ForecastError::InsufficientSamples { needed: 1, got: 0 },
            MinMaxError::UndefinedOrder => {
                let bad = self
                    .states
                    .rows()
                    .into_iter()
                    .position(|row| row.iter().any(|v| !v.is_finite()));
                ForecastError::NonFiniteState {
                    t: bad.map_or(f64::NAN, |i| self.times[i]),
                }
            }
        }
    }

    pub fn bounds(&self) -> Result<Vec<Bounds>> {
        self.states
            .axis_iter(Axis(1))
            .map(|col| {
                let min = *col.min().map_err(|e| self.extremum_error(e))?;
                let max = *col.max().map_err(|e| self.extremum_error(e))?;
                Ok(Bounds { min, max })
            })
            .collect()
    }
}

/// `n` evenly spaced points from `start` to `end`, both included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

fn validate_grid(span: (f64, f64), t_eval: &[f64]) -> Result<()> {
    let (t0, t1) = span;

    if !(t0.is_finite() && t1.is_finite()) || t0 >= t1 {
        return Err(ForecastError::InvalidTimeGrid(format!(
            "span [{t0}, {t1}] must be finite and increasing"
        )));
    }

    if t_eval.is_empty() {
        return Err(ForecastError::InvalidTimeGrid(
            "no evaluation times requested".into(),
        ));
    }

    if let Some(t) = t_eval.iter().find(|t| !(t0..=t1).contains(*t)) {
        return Err(ForecastError::InvalidTimeGrid(format!(
            "evaluation time {t} outside span [{t0}, {t1}]"
        )));
    }

    if let Some(w) = t_eval.windows(2).find(|w| w[1] <= w[0]) {
        return Err(ForecastError::InvalidTimeGrid(format!(
            "evaluation times not strictly increasing at {} -> {}",
            w[0], w[1]
        )));
    }

    Ok(())
}

/// Integrates `field` over `span` from `y0`, sampling at `t_eval`.
///
/// All step-size control is left to `solver`; this only checks that the
/// request is well formed and wraps the result.
pub fn integrate(
    field: &dyn VectorField,
    solver: &dyn OdeSolver,
    span: (f64, f64),
    y0: ArrayView1<f64>,
    t_eval: &[f64],
) -> Result<Trajectory> {
    validate_grid(span, t_eval)?;

    if y0.len() != field.dim() {
        return Err(ForecastError::ShapeMismatch {
            context: "initial state",
            expected: field.dim(),
            found: y0.len(),
        });
    }

    if y0.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::NonFiniteState { t: span.0 });
    }

    let solution = solver.solve(field, span, y0, t_eval)?;

    info!(
        "integrated {} samples over [{}, {}] ({} steps, {} rejected, {} evaluations)",
        t_eval.len(),
        span.0,
        span.1,
        solution.stats.accepted,
        solution.stats.rejected,
        solution.stats.evaluations
    );

    Ok(Trajectory {
        times: solution.t,
        states: solution.y,
        stats: solution.stats,
    })
}
