use ndarray::{Array1, Array2, Array3, Axis, concatenate, s};
use ndarray_rand::rand::Rng;

use crate::{
    f,
    optim::param::{Param, ToParams},
};

#[derive(Debug, Clone)]
struct Step {
    x: Array2<f64>,
    h_prev: Array2<f64>,
    c_prev: Array2<f64>,
    i: Array2<f64>,
    f: Array2<f64>,
    g: Array2<f64>,
    o: Array2<f64>,
    c: Array2<f64>,
}

/// Single LSTM layer over `(batch, seq, d_in)` inputs returning the last hidden
/// state. Gate columns are laid out `[input | forget | cell | output]`.
///
/// State starts at zero on every call; nothing carries over between batches.
#[derive(Debug, Clone)]
pub struct LSTM {
    pub d_in: usize,
    pub units: usize,

    pub w: Array2<f64>,
    pub u: Array2<f64>,
    pub b: Array1<f64>,

    steps: Vec<Step>,

    pub d_w: Array2<f64>,
    pub d_u: Array2<f64>,
    pub d_b: Array1<f64>,
}

impl LSTM {
    pub fn new<R: Rng + ?Sized>(d_in: usize, units: usize, rng: &mut R) -> Self {
        let mut b = Array1::zeros(4 * units);
        b.slice_mut(s![units..2 * units]).fill(1.);

        Self {
            d_in,
            units,

            w: f::xavier_uniform((d_in, 4 * units), rng),
            u: f::xavier_uniform((units, 4 * units), rng),
            b,

            steps: Vec::new(),

            d_w: Array2::zeros((d_in, 4 * units)),
            d_u: Array2::zeros((units, 4 * units)),
            d_b: Array1::zeros(4 * units),
        }
    }

    fn gate(&self, z: &Array2<f64>, k: usize) -> Array2<f64> {
        z.slice(s![.., k * self.units..(k + 1) * self.units])
            .to_owned()
    }

    pub fn forward(&mut self, x: &Array3<f64>, grad: bool) -> Array2<f64> {
        let (batch_size, seq_len, _) = x.dim();

        let mut h = Array2::zeros((batch_size, self.units));
        let mut c = Array2::zeros((batch_size, self.units));

        if grad {
            self.steps.clear();
        }

        for t in 0..seq_len {
            let x_t = x.index_axis(Axis(1), t).to_owned();
            let z = x_t.dot(&self.w) + h.dot(&self.u) + &self.b;

            let i = f::sigmoid(&self.gate(&z, 0));
            let fg = f::sigmoid(&self.gate(&z, 1));
            let g = f::tanh(&self.gate(&z, 2));
            let o = f::sigmoid(&self.gate(&z, 3));

            let c_next = &fg * &c + &i * &g;
            let h_next = &o * &f::tanh(&c_next);

            if grad {
                self.steps.push(Step {
                    x: x_t,
                    h_prev: h,
                    c_prev: c,
                    i,
                    f: fg,
                    g,
                    o,
                    c: c_next.clone(),
                });
            }

            h = h_next;
            c = c_next;
        }

        h
    }

    /// Backpropagation through time from the gradient of the last hidden
    /// state. Returns the gradient w.r.t. the input sequence.
    pub fn backward(&mut self, d_h: Array2<f64>) -> Array3<f64> {
        let steps = std::mem::take(&mut self.steps);
        let batch_size = d_h.nrows();

        self.d_w = Array2::zeros(self.w.dim());
        self.d_u = Array2::zeros(self.u.dim());
        self.d_b = Array1::zeros(self.b.len());

        let mut d_x = Array3::zeros((batch_size, steps.len(), self.d_in));
        let mut d_h_next = d_h;
        let mut d_c_next = Array2::zeros((batch_size, self.units));

        for (t, step) in steps.iter().enumerate().rev() {
            let tanh_c = f::tanh(&step.c);

            let d_o = &d_h_next * &tanh_c;
            let d_c = d_c_next + &d_h_next * &step.o * &(1. - &tanh_c * &tanh_c);

            let d_i = &d_c * &step.g;
            let d_g = &d_c * &step.i;
            let d_f = &d_c * &step.c_prev;
            d_c_next = &d_c * &step.f;

            let dz_i = d_i * &(&step.i * &(1. - &step.i));
            let dz_f = d_f * &(&step.f * &(1. - &step.f));
            let dz_g = d_g * &(1. - &step.g * &step.g);
            let dz_o = d_o * &(&step.o * &(1. - &step.o));

            let dz = concatenate![Axis(1), dz_i, dz_f, dz_g, dz_o];

            self.d_w += &step.x.t().dot(&dz);
            self.d_u += &step.h_prev.t().dot(&dz);
            self.d_b += &dz.sum_axis(Axis(0));

            d_x.index_axis_mut(Axis(1), t).assign(&dz.dot(&self.w.t()));
            d_h_next = dz.dot(&self.u.t());
        }

        d_x
    }
}

impl ToParams for LSTM {
    fn params(&mut self) -> Vec<Param<'_>> {
        vec![
            Param::from_array2(&mut self.w, &self.d_w),
            Param::from_array2(&mut self.u, &self.d_u),
            Param::from_array1(&mut self.b, &self.d_b),
        ]
    }
}
