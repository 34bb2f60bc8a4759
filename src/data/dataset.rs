use ndarray::{Array2, Array3, Axis, s};

use crate::{
    error::{ForecastError, Result},
    ode::trajectory::Trajectory,
};

/// Supervised (history, next state) pairs.
///
/// `inputs` is `(n, window, dim)`, `targets` is `(n, dim)`, and `origins[i]`
/// is the trajectory index of `targets[i]`, so the input history of example
/// `i` covers trajectory samples `origins[i] - window .. origins[i]`.
#[derive(Debug, Clone)]
pub struct SupervisedSet {
    pub inputs: Array3<f64>,
    pub targets: Array2<f64>,
    pub origins: Vec<usize>,
}

impl SupervisedSet {
    pub fn len(&self) -> usize {
        self.targets.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn window(&self) -> usize {
        self.inputs.len_of(Axis(1))
    }

    pub fn dim(&self) -> usize {
        self.targets.ncols()
    }

    /// Most recent state of each input history, `(n, dim)`.
    pub fn last_states(&self) -> Array2<f64> {
        self.inputs.index_axis(Axis(1), self.window() - 1).to_owned()
    }

    pub fn subset(&self, indices: &[usize]) -> SupervisedSet {
        SupervisedSet {
            inputs: self.inputs.select(Axis(0), indices),
            targets: self.targets.select(Axis(0), indices),
            origins: indices.iter().map(|&i| self.origins[i]).collect(),
        }
    }
}

/// Pairs every run of `window` consecutive samples with the sample that
/// follows it. A trajectory of length N yields N - window examples.
pub fn build_examples(trajectory: &Trajectory, window: usize) -> Result<SupervisedSet> {
    if window == 0 {
        return Err(ForecastError::InvalidConfig("window must be > 0".into()));
    }

    let n = trajectory.len();
    if n <= window {
        return Err(ForecastError::InsufficientSamples {
            needed: window + 1,
            got: n,
        });
    }

    let states = trajectory.states();
    let count = n - window;
    let mut inputs = Array3::zeros((count, window, trajectory.dim()));

    for i in 0..count {
        inputs
            .slice_mut(s![i, .., ..])
            .assign(&states.slice(s![i..i + window, ..]));
    }

    Ok(SupervisedSet {
        inputs,
        targets: states.slice(s![window.., ..]).to_owned(),
        origins: (window..n).collect(),
    })
}
