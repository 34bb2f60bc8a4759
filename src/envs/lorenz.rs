use ndarray::{Array1, ArrayView1, array};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ForecastError, Result},
    ode::VectorField,
};

/// Lorenz coefficients, fixed for the duration of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LorenzParams {
    pub sigma: f64,
    pub beta: f64,
    pub rho: f64,
}

impl Default for LorenzParams {
    fn default() -> Self {
        Self {
            sigma: 10.0,
            beta: 8.0 / 3.0,
            rho: 28.0,
        }
    }
}

impl LorenzParams {
    pub fn validate(&self) -> Result<()> {
        for (name, v) in [("sigma", self.sigma), ("beta", self.beta), ("rho", self.rho)] {
            if !(v.is_finite() && v > 0.) {
                return Err(ForecastError::InvalidConfig(format!(
                    "{name} must be finite and positive, got {v}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Lorenz {
    pub params: LorenzParams,
}

impl Lorenz {
    pub fn new(params: LorenzParams) -> Self {
        Self { params }
    }

    /// Instantaneous derivative (dx/dt, dy/dt, dz/dt).
    pub fn derivative_of(&self, state: ArrayView1<f64>) -> Array1<f64> {
        let LorenzParams { sigma, beta, rho } = self.params;

        let x = state[0];
        let y = state[1];
        let z = state[2];

        array![sigma * (y - x), x * (rho - z) - y, x * y - beta * z]
    }
}

impl VectorField for Lorenz {
    fn dim(&self) -> usize {
        3
    }

    fn derivative(&self, _t: f64, y: ArrayView1<f64>) -> Array1<f64> {
        self.derivative_of(y)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;

    use super::*;

    #[test]
    fn known_derivative() {
        let l = Lorenz::default();
        let d = l.derivative(0., array![1., 2., 3.].view());

        assert_eq!(d.len(), 3);
        assert_relative_eq!(d[0], 10.);
        assert_relative_eq!(d[1], 1. * (28. - 3.) - 2.);
        assert_relative_eq!(d[2], 2. - 8.);
    }

    #[test]
    fn derivative_is_pure() {
        let l = Lorenz::new(LorenzParams {
            sigma: 3.5,
            beta: 0.7,
            rho: 11.,
        });
        let s = array![-4.2, 0.3, 17.9];

        assert_eq!(l.derivative(0., s.view()), l.derivative(5., s.view()));
        assert_eq!(l.derivative(0., s.view()), l.derivative(0., s.view()));
    }

    #[test]
    fn fixed_points_are_stationary() {
        let p = LorenzParams::default();
        let c = (p.beta * (p.rho - 1.)).sqrt();
        let l = Lorenz::new(p);

        for s in [array![0., 0., 0.], array![c, c, p.rho - 1.], array![-c, -c, p.rho - 1.]] {
            let d = l.derivative(0., s.view());
            assert!(d.iter().all(|v| v.abs() < 1e-9));
        }
    }

    #[test]
    fn rejects_non_positive_params() {
        let p = LorenzParams {
            beta: 0.,
            ..LorenzParams::default()
        };
        assert!(p.validate().is_err());
        assert!(LorenzParams::default().validate().is_ok());
    }
}
