pub mod adam;
pub mod optimizer;
pub mod param;
