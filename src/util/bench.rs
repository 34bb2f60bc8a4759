use ndarray::ArrayView1;
use ndarray_stats::DeviationExt;
use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
}

pub struct Bench {}

impl Bench {
    pub fn mae(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> Result<f64> {
        Ok(y_true.mean_abs_err(&y_pred)?)
    }

    pub fn mse(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> Result<f64> {
        Ok(y_true.mean_sq_err(&y_pred)?)
    }

    pub fn rmse(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> Result<f64> {
        Ok(y_true.root_mean_sq_err(&y_pred)?)
    }

    /// Coefficient of determination. NaN when `y_true` is constant.
    pub fn r2(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> Result<f64> {
        let mse = Bench::mse(y_true, y_pred)?;
        let var = y_true.var(0.);

        Ok(if var > 0. { 1. - mse / var } else { f64::NAN })
    }

    pub fn score(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> Result<Score> {
        Ok(Score {
            mae: Bench::mae(y_true, y_pred)?,
            rmse: Bench::rmse(y_true, y_pred)?,
            r2: Bench::r2(y_true, y_pred)?,
        })
    }
}
