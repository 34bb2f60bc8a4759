use thiserror::Error;

pub type Result<T> = std::result::Result<T, ForecastError>;

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("solver exhausted its budget of {max_steps} steps at t={t}")]
    StepBudgetExhausted { t: f64, max_steps: usize },

    #[error("step size underflowed at t={t}")]
    StepSizeUnderflow { t: f64 },

    #[error("state became non-finite at t={t}")]
    NonFiniteState { t: f64 },

    #[error("solver failed: {0}")]
    Solver(String),

    #[error("invalid time grid: {0}")]
    InvalidTimeGrid(String),

    #[error("shape mismatch in {context}: expected {expected}, found {found}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("need at least {needed} samples, got {got}")]
    InsufficientSamples { needed: usize, got: usize },

    #[error("invalid split: {0}")]
    InvalidSplit(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to write report: {0}")]
    Report(#[from] serde_json::Error),

    #[error("metric: {0}")]
    Metric(#[from] ndarray_stats::errors::MultiInputError),
}
