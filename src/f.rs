use ndarray::{Array2, Zip};
use ndarray_rand::{
    RandomExt,
    rand::{Rng, SeedableRng, rngs::StdRng},
    rand_distr::Uniform,
};

pub type Activation = fn(&Array2<f64>) -> Array2<f64>;

pub fn relu(x: &Array2<f64>) -> Array2<f64> {
    x.mapv(|v| v.max(0.))
}

pub fn d_relu(x: &Array2<f64>) -> Array2<f64> {
    x.mapv(|v| v.signum().max(0.))
}

pub fn tanh(x: &Array2<f64>) -> Array2<f64> {
    x.mapv(|v| v.tanh())
}

pub fn d_tanh(x: &Array2<f64>) -> Array2<f64> {
    1. - (x.mapv(|v| v.tanh())).powi(2)
}

pub fn ident(x: &Array2<f64>) -> Array2<f64> {
    x.to_owned()
}

pub fn d_ident(x: &Array2<f64>) -> Array2<f64> {
    Array2::ones(x.dim())
}

pub fn sigmoid(x: &Array2<f64>) -> Array2<f64> {
    x.mapv(|v| 1.0 / (1.0 + (-v).exp()))
}

/// Seeded generator used for weight initialization.
pub fn init_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Glorot uniform: U(-b, b) with b = sqrt(6 / (fan_in + fan_out)).
pub fn xavier_uniform<R: Rng + ?Sized>(shape: (usize, usize), rng: &mut R) -> Array2<f64> {
    let bound = (6. / ((shape.0 + shape.1) as f64)).sqrt();
    Array2::random_using(shape, Uniform::new(-bound, bound), rng)
}

/// Mean absolute error over every element.
pub fn mae(pred: &Array2<f64>, target: &Array2<f64>) -> f64 {
    let n = pred.len().max(1) as f64;
    Zip::from(pred)
        .and(target)
        .fold(0., |acc, &p, &t| acc + (p - t).abs())
        / n
}

/// Gradient of [`mae`] w.r.t. `pred`. Zero where the residual is exactly zero.
pub fn d_mae(pred: &Array2<f64>, target: &Array2<f64>) -> Array2<f64> {
    let n = pred.len().max(1) as f64;
    Zip::from(pred).and(target).map_collect(|&p, &t| {
        let r = p - t;
        if r > 0. {
            1. / n
        } else if r < 0. {
            -1. / n
        } else {
            0.
        }
    })
}

pub fn clip_grad(mut grad: Array2<f64>, clip: f64) -> Array2<f64> {
    let norm_sq = grad.mapv(|x| x * x).sum();
    let norm = norm_sq.sqrt();

    if norm > clip {
        grad.mapv_inplace(|x| x * (clip / (norm + 1e-6)));
    }

    grad
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    use super::*;

    #[test]
    fn mae_averages_over_all_elements() {
        let pred = array![[1., 2., 3.], [0., 0., 0.]];
        let target = array![[0., 2., 5.], [1., 0., 0.]];
        assert_abs_diff_eq!(mae(&pred, &target), 4. / 6., epsilon = 1e-12);
    }

    #[test]
    fn d_mae_is_signed_and_scaled() {
        let pred = array![[1., 2.], [0., -1.]];
        let target = array![[0., 2.], [1., -1.]];
        let g = d_mae(&pred, &target);
        assert_eq!(g, array![[0.25, 0.], [-0.25, 0.]]);
    }

    #[test]
    fn xavier_uniform_is_bounded_and_seeded() {
        let a = xavier_uniform((3, 50), &mut init_rng(7));
        let b = xavier_uniform((3, 50), &mut init_rng(7));
        let bound = (6. / 53f64).sqrt();

        assert_eq!(a, b);
        assert!(a.iter().all(|v| v.abs() <= bound));
    }

    #[test]
    fn clip_grad_caps_norm() {
        let g = clip_grad(array![[3., 4.]], 1.);
        let norm = g.mapv(|v| v * v).sum().sqrt();
        assert!(norm <= 1.);
    }
}
