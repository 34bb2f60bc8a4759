use ndarray::{Array1, Array2};

/// A trainable tensor paired with the gradient accumulated for it by the last
/// backward pass.
pub enum Param<'a> {
    Vector {
        target: &'a mut Array1<f64>,
        grad: &'a Array1<f64>,
    },
    Matrix {
        target: &'a mut Array2<f64>,
        grad: &'a Array2<f64>,
    },
}

impl<'a> Param<'a> {
    pub fn from_array1(target: &'a mut Array1<f64>, grad: &'a Array1<f64>) -> Param<'a> {
        Param::Vector { target, grad }
    }

    pub fn from_array2(target: &'a mut Array2<f64>, grad: &'a Array2<f64>) -> Param<'a> {
        Param::Matrix { target, grad }
    }
}

pub trait ToParams {
    /// Parameters in a stable order; optimizers zip their moment state by index.
    fn params(&mut self) -> Vec<Param<'_>>;
}
