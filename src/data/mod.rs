pub mod dataset;
pub mod scaler;
pub mod split;
