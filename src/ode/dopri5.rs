use std::cell::Cell;

use log::debug;
use ndarray::{Array2, ArrayView1};
use ode_solvers::{DVector, System, dop_shared::IntegrationError};

use crate::error::{ForecastError, Result};

use super::{OdeSolver, Solution, SolverStats, VectorField};

/// Adaptive explicit Runge–Kutta 4(5) solver backed by `ode_solvers`'
/// Dormand–Prince integrator.
///
/// The state at each evaluation time is the endpoint of an integration
/// restarted from the previous evaluation time, so every returned sample is
/// an accepted solver state.
#[derive(Debug, Clone, Copy)]
pub struct Dopri5 {
    pub rtol: f64,
    pub atol: f64,
    pub max_steps: usize,
}

impl Default for Dopri5 {
    fn default() -> Self {
        Self {
            rtol: 1e-3,
            atol: 1e-6,
            max_steps: 1_000_000,
        }
    }
}

impl Dopri5 {
    pub fn with_tolerances(mut self, rtol: f64, atol: f64) -> Self {
        self.rtol = rtol;
        self.atol = atol;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

/// Presents a [`VectorField`] to the solver. The first time at which the field
/// returns a non-finite derivative is recorded, and a zero derivative is
/// handed to the solver instead so the segment terminates.
struct Adapter<'a> {
    field: &'a dyn VectorField,
    non_finite_at: &'a Cell<Option<f64>>,
}

impl System<f64, DVector<f64>> for Adapter<'_> {
    fn system(&self, t: f64, y: &DVector<f64>, dy: &mut DVector<f64>) {
        let d = self.field.derivative(t, ArrayView1::from(y.as_slice()));

        if d.iter().all(|v| v.is_finite()) {
            for (o, v) in dy.iter_mut().zip(d.iter()) {
                *o = *v;
            }
        } else {
            if self.non_finite_at.get().is_none() {
                self.non_finite_at.set(Some(t));
            }
            dy.fill(0.);
        }
    }
}

fn solver_error(e: IntegrationError) -> ForecastError {
    match e {
        IntegrationError::MaxNumStepReached { x, n } => ForecastError::StepBudgetExhausted {
            t: x,
            max_steps: n as usize,
        },
        IntegrationError::StepSizeUnderflow { x, .. } => ForecastError::StepSizeUnderflow { t: x },
        IntegrationError::StiffnessDetected { x, .. } => {
            ForecastError::Solver(format!("stiffness detected at t={x}"))
        }
    }
}

impl OdeSolver for Dopri5 {
    fn solve(
        &self,
        field: &dyn VectorField,
        span: (f64, f64),
        y0: ArrayView1<f64>,
        t_eval: &[f64],
    ) -> Result<Solution> {
        let non_finite_at = Cell::new(None);
        let mut stats = SolverStats::default();
        let mut out = Array2::zeros((t_eval.len(), y0.len()));

        let mut t = span.0;
        let mut y = DVector::from_iterator(y0.len(), y0.iter().copied());

        for (mut row, &at) in out.rows_mut().into_iter().zip(t_eval) {
            if at > t {
                let adapter = Adapter {
                    field,
                    non_finite_at: &non_finite_at,
                };
                let mut stepper =
                    ode_solvers::Dopri5::new(adapter, t, at, 0., y.clone(), self.rtol, self.atol);
                let result = stepper.integrate();

                if let Some(t_bad) = non_finite_at.get() {
                    return Err(ForecastError::NonFiniteState { t: t_bad });
                }
                let segment = result.map_err(solver_error)?;

                stats.accepted += segment.accepted_steps as usize;
                stats.rejected += segment.rejected_steps as usize;
                stats.evaluations += segment.num_eval as usize;

                y = match stepper.y_out().last() {
                    Some(end) => end.clone(),
                    None => return Err(ForecastError::Solver(format!("no output at t={at}"))),
                };
                t = at;

                if y.iter().any(|v| !v.is_finite()) {
                    return Err(ForecastError::NonFiniteState { t });
                }
                if stats.accepted + stats.rejected > self.max_steps {
                    return Err(ForecastError::StepBudgetExhausted {
                        t,
                        max_steps: self.max_steps,
                    });
                }
            }

            row.assign(&ArrayView1::from(y.as_slice()));
        }

        debug!(
            "dopri5 finished at t={} accepted={} rejected={} evaluations={}",
            t, stats.accepted, stats.rejected, stats.evaluations
        );

        Ok(Solution {
            t: t_eval.to_vec().into(),
            y: out,
            stats,
        })
    }
}
