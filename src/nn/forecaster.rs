use ndarray::{Array2, Array3, Axis};

use crate::{
    config::HiddenActivation,
    error::{ForecastError, Result},
    f,
    optim::param::{Param, ToParams},
};

use super::{
    ffn::{FFN, Layer, LayerDef},
    lstm::LSTM,
};

/// Predicts the next state from a `(batch, window, dim)` history.
pub trait Forecaster: ToParams {
    fn name(&self) -> &str;
    fn input_dim(&self) -> usize;
    fn output_dim(&self) -> usize;

    /// With `grad` set, caches what [`Forecaster::backward`] needs.
    fn forward(&mut self, x: &Array3<f64>, grad: bool) -> Array2<f64>;

    /// Accumulates parameter gradients from the gradient of the last forward output.
    fn backward(&mut self, d_out: Array2<f64>);

    fn predict(&mut self, x: &Array3<f64>) -> Result<Array2<f64>> {
        let (_, window, features) = x.dim();

        if window == 0 {
            return Err(ForecastError::ShapeMismatch {
                context: "input window",
                expected: 1,
                found: 0,
            });
        }

        if features != self.input_dim() {
            return Err(ForecastError::ShapeMismatch {
                context: "input features",
                expected: self.input_dim(),
                found: features,
            });
        }

        Ok(self.forward(x, false))
    }
}

/// Memoryless dense map from the most recent state to the next one.
#[derive(Debug, Clone)]
pub struct DenseForecaster {
    pub ffn: FFN,
}

impl DenseForecaster {
    pub fn new(dim: usize, hidden: &[usize], activation: HiddenActivation, seed: u64) -> Self {
        let (a, d_a) = match activation {
            HiddenActivation::Relu => (f::relu as f::Activation, f::d_relu as f::Activation),
            HiddenActivation::Tanh => (f::tanh as f::Activation, f::d_tanh as f::Activation),
        };

        let widths: Vec<usize> = std::iter::once(dim)
            .chain(hidden.iter().copied())
            .chain(std::iter::once(dim))
            .collect();

        let last = widths.len() - 2;
        let layers: Vec<LayerDef> = widths
            .windows(2)
            .enumerate()
            .map(|(k, w)| {
                if k == last {
                    (w[0], w[1], f::ident as f::Activation, f::d_ident as f::Activation)
                } else {
                    (w[0], w[1], a, d_a)
                }
            })
            .collect();

        Self {
            ffn: FFN::new(layers, &mut f::init_rng(seed)),
        }
    }
}

impl ToParams for DenseForecaster {
    fn params(&mut self) -> Vec<Param<'_>> {
        self.ffn.params()
    }
}

impl Forecaster for DenseForecaster {
    fn name(&self) -> &str {
        "dense"
    }

    fn input_dim(&self) -> usize {
        self.ffn.layers[0].d_in()
    }

    fn output_dim(&self) -> usize {
        self.ffn.layers[self.ffn.layers.len() - 1].d_out()
    }

    fn forward(&mut self, x: &Array3<f64>, grad: bool) -> Array2<f64> {
        let last = x.index_axis(Axis(1), x.len_of(Axis(1)) - 1).to_owned();
        self.ffn.forward(last, grad)
    }

    fn backward(&mut self, d_out: Array2<f64>) {
        self.ffn.backward(d_out);
    }
}

/// LSTM over the input history followed by an affine head on the last hidden state.
#[derive(Debug, Clone)]
pub struct LstmForecaster {
    pub lstm: LSTM,
    pub head: Layer,
}

impl LstmForecaster {
    pub fn new(dim: usize, units: usize, seed: u64) -> Self {
        let mut rng = f::init_rng(seed);

        Self {
            lstm: LSTM::new(dim, units, &mut rng),
            head: Layer::new(units, dim, f::ident, f::d_ident, &mut rng),
        }
    }
}

impl ToParams for LstmForecaster {
    fn params(&mut self) -> Vec<Param<'_>> {
        let mut params = self.lstm.params();
        params.extend(self.head.params());
        params
    }
}

impl Forecaster for LstmForecaster {
    fn name(&self) -> &str {
        "lstm"
    }

    fn input_dim(&self) -> usize {
        self.lstm.d_in
    }

    fn output_dim(&self) -> usize {
        self.head.d_out()
    }

    fn forward(&mut self, x: &Array3<f64>, grad: bool) -> Array2<f64> {
        let h = self.lstm.forward(x, grad);
        self.head.forward(h, grad)
    }

    fn backward(&mut self, d_out: Array2<f64>) {
        let d_h = self.head.backward(d_out);
        self.lstm.backward(d_h);
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use ndarray_rand::{RandomExt, rand_distr::Uniform};

    use super::*;

    #[test]
    fn baseline_is_single_affine_layer_by_default() {
        let model = DenseForecaster::new(3, &[], HiddenActivation::Relu, 0);
        assert_eq!(model.ffn.layers.len(), 1);
        assert_eq!(model.ffn.layers[0].w.dim(), (3, 3));
    }

    #[test]
    fn baseline_hidden_layers() {
        let model = DenseForecaster::new(3, &[16, 8], HiddenActivation::Tanh, 0);
        let dims: Vec<_> = model.ffn.layers.iter().map(|l| l.w.dim()).collect();
        assert_eq!(dims, vec![(3, 16), (16, 8), (8, 3)]);
    }

    #[test]
    fn baseline_uses_most_recent_state() {
        let mut model = DenseForecaster::new(3, &[], HiddenActivation::Relu, 0);
        let x = array![[[100., 100., 100.], [1., 2., 3.]]];
        let last = array![[[1., 2., 3.]]];

        assert_eq!(model.predict(&x).unwrap(), model.predict(&last).unwrap());
    }

    #[test]
    fn predict_shapes() {
        let x = Array3::random((200, 1, 3), Uniform::new(-20., 20.));

        let mut dense = DenseForecaster::new(3, &[], HiddenActivation::Relu, 1);
        let mut lstm = LstmForecaster::new(3, 50, 2);

        assert_eq!(dense.predict(&x).unwrap().dim(), (200, 3));
        assert_eq!(lstm.predict(&x).unwrap().dim(), (200, 3));
    }

    #[test]
    fn predict_rejects_wrong_feature_count() {
        let mut lstm = LstmForecaster::new(3, 4, 0);
        let err = lstm.predict(&Array3::zeros((2, 1, 4))).unwrap_err();

        assert!(matches!(
            err,
            ForecastError::ShapeMismatch {
                expected: 3,
                found: 4,
                ..
            }
        ));
    }

    #[test]
    fn same_seed_same_weights() {
        let a = LstmForecaster::new(3, 8, 11);
        let b = LstmForecaster::new(3, 8, 11);
        assert_eq!(a.lstm.w, b.lstm.w);
        assert_eq!(a.head.w, b.head.w);
    }

    #[test]
    fn lstm_head_gradient_matches_finite_difference() {
        let mut rng = f::init_rng(5);
        let mut model = LstmForecaster::new(3, 6, 9);
        let x = Array3::random_using((5, 2, 3), Uniform::new(-1., 1.), &mut rng);
        let r = Array2::random_using((5, 3), Uniform::new(-1., 1.), &mut rng);

        model.forward(&x, true);
        model.backward(r.clone());

        let eps = 1e-6;
        let (a, b) = (4, 1);
        let orig = model.head.w[[a, b]];
        model.head.w[[a, b]] = orig + eps;
        let up = (model.forward(&x, false) * &r).sum();
        model.head.w[[a, b]] = orig - eps;
        let down = (model.forward(&x, false) * &r).sum();
        model.head.w[[a, b]] = orig;

        let numeric = (up - down) / (2. * eps);
        assert!((numeric - model.head.d_w[[a, b]]).abs() < 1e-6);
    }
}
