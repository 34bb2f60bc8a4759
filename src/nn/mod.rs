pub mod ffn;
pub mod forecaster;
pub mod lstm;
