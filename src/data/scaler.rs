use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::Serialize;

use crate::error::{ForecastError, Result};

use super::dataset::SupervisedSet;

/// Per-dimension standardization `(x - mean) / std`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandardScaler {
    pub mean: Array1<f64>,
    pub std: Array1<f64>,
}

impl StandardScaler {
    /// Fits on rows of `data`. Dimensions with zero variance keep std = 1.
    pub fn fit(data: ArrayView2<f64>) -> Result<Self> {
        let mean = data
            .mean_axis(Axis(0))
            .ok_or(ForecastError::InsufficientSamples {
                needed: 1,
                got: 0,
            })?;
        let std = data
            .std_axis(Axis(0), 0.)
            .mapv(|s| if s > f64::EPSILON { s } else { 1. });

        Ok(Self { mean, std })
    }

    /// Fits on the most recent input state of every example.
    pub fn fit_set(set: &SupervisedSet) -> Result<Self> {
        Self::fit(set.last_states().view())
    }

    pub fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        (x - &self.mean) / &self.std
    }

    pub fn inverse_transform(&self, x: &Array2<f64>) -> Array2<f64> {
        x * &self.std + &self.mean
    }

    pub fn transform_set(&self, set: &SupervisedSet) -> SupervisedSet {
        SupervisedSet {
            inputs: (&set.inputs - &self.mean) / &self.std,
            targets: self.transform(&set.targets),
            origins: set.origins.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    use super::*;

    #[test]
    fn standardizes_columns() {
        let data = array![[1., 10., 5.], [3., 30., 5.], [5., 50., 5.]];
        let scaler = StandardScaler::fit(data.view()).unwrap();
        let z = scaler.transform(&data);

        for col in z.axis_iter(Axis(1)).take(2) {
            assert_abs_diff_eq!(col.mean().unwrap(), 0., epsilon = 1e-12);
            assert_abs_diff_eq!(col.std(0.), 1., epsilon = 1e-12);
        }
        assert_eq!(scaler.std[2], 1.);
        assert!(z.column(2).iter().all(|v| *v == 0.));
    }

    #[test]
    fn inverse_restores_input() {
        let data = array![[0., 1., 1.05], [-3., 7., 20.], [12., -4., 33.]];
        let scaler = StandardScaler::fit(data.view()).unwrap();
        let back = scaler.inverse_transform(&scaler.transform(&data));

        for (a, b) in back.iter().zip(data.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn empty_data_is_an_error() {
        let data = Array2::<f64>::zeros((0, 3));
        assert!(StandardScaler::fit(data.view()).is_err());
    }
}
