use ndarray::{Array1, Array2, Axis};

use crate::f;

use super::{
    optimizer::Optimizer,
    param::{Param, ToParams},
};

#[derive(Debug, Clone)]
pub enum AdamParam {
    Vector { m: Array1<f64>, v: Array1<f64> },
    Matrix { m: Array2<f64>, v: Array2<f64> },
}

/// Adam with optional decoupled weight decay and optional gradient norm clipping.
#[derive(Debug, Clone)]
pub struct Adam {
    pub learning_rate: f64,
    pub clip_grad: Option<f64>,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    pub weight_decay: f64,
    pub t: usize,

    pub params: Vec<AdamParam>,
}

impl Default for Adam {
    fn default() -> Self {
        Self {
            beta1: 0.9,
            beta2: 0.999,
            learning_rate: 1e-3,
            clip_grad: None,
            weight_decay: 0.,
            epsilon: 1e-7,
            t: 0,
            params: vec![],
        }
    }
}

impl Adam {
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }
}

impl Optimizer for Adam {
    fn with(mut self, optimizable: &mut (impl ToParams + ?Sized)) -> Self {
        self.params = optimizable
            .params()
            .into_iter()
            .map(|param| match param {
                Param::Vector { target, .. } => AdamParam::Vector {
                    m: Array1::zeros(target.len()),
                    v: Array1::zeros(target.len()),
                },
                Param::Matrix { target, .. } => AdamParam::Matrix {
                    m: Array2::zeros(target.dim()),
                    v: Array2::zeros(target.dim()),
                },
            })
            .collect();

        self
    }

    fn step(&mut self, optimizable: &mut (impl ToParams + ?Sized)) {
        self.t += 1;
        let bc1 = 1. - self.beta1.powi(self.t as i32);
        let bc2 = 1. - self.beta2.powi(self.t as i32);

        for (param, adam_param) in optimizable.params().into_iter().zip(self.params.iter_mut()) {
            match (adam_param, param) {
                (AdamParam::Vector { m, v }, Param::Vector { target, grad }) => {
                    let g = match self.clip_grad {
                        Some(clip) => f::clip_grad(grad.to_owned().insert_axis(Axis(0)), clip)
                            .remove_axis(Axis(0)),
                        None => grad.to_owned(),
                    };

                    *m = self.beta1 * &*m + (1. - self.beta1) * &g;
                    *v = self.beta2 * &*v + (1. - self.beta2) * g.powi(2);

                    let m_hat = &*m / bc1;
                    let v_hat = &*v / bc2;

                    let delta = m_hat / (v_hat.sqrt() + self.epsilon);
                    let update = self.learning_rate * (delta + self.weight_decay * &*target);
                    *target -= &update;
                }
                (AdamParam::Matrix { m, v }, Param::Matrix { target, grad }) => {
                    let g = match self.clip_grad {
                        Some(clip) => f::clip_grad(grad.to_owned(), clip),
                        None => grad.to_owned(),
                    };

                    *m = self.beta1 * &*m + (1. - self.beta1) * &g;
                    *v = self.beta2 * &*v + (1. - self.beta2) * g.powi(2);

                    let m_hat = &*m / bc1;
                    let v_hat = &*v / bc2;

                    let delta = m_hat / (v_hat.sqrt() + self.epsilon);
                    let update = self.learning_rate * (delta + self.weight_decay * &*target);
                    *target -= &update;
                }
                _ => (),
            }
        }
    }
}
