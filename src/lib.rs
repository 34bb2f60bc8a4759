pub mod compare;
pub mod config;
pub mod data;
pub mod envs;
pub mod error;
pub mod f;
pub mod nn;
pub mod ode;
pub mod optim;
pub mod pipeline;
pub mod train;
pub mod util;

pub use error::{ForecastError, Result};
