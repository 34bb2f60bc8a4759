use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    data::split::SplitStrategy,
    envs::lorenz::LorenzParams,
    error::{ForecastError, Result},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub initial_state: [f64; 3],
    pub t_start: f64,
    pub t_end: f64,
    pub samples: usize,
    pub rtol: f64,
    pub atol: f64,
    pub max_steps: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_state: [0., 1., 1.05],
            t_start: 0.,
            t_end: 100.,
            samples: 1000,
            rtol: 1e-3,
            atol: 1e-6,
            max_steps: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub test_fraction: f64,
    pub seed: u64,
    pub split: SplitStrategy,
    pub normalize: bool,
    /// History length fed to the models; 1 pairs each state with its successor.
    pub window: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            split: SplitStrategy::Shuffled,
            normalize: false,
            window: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub validation_split: f64,
    pub learning_rate: f64,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 50,
            batch_size: 32,
            validation_split: 0.2,
            learning_rate: 1e-3,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HiddenActivation {
    Relu,
    Tanh,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Hidden layer widths; empty gives a single affine map.
    pub hidden: Vec<usize>,
    pub activation: HiddenActivation,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            hidden: vec![],
            activation: HiddenActivation::Relu,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurrentConfig {
    pub units: usize,
}

impl Default for RecurrentConfig {
    fn default() -> Self {
        Self { units: 50 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub system: LorenzParams,
    pub simulation: SimulationConfig,
    pub dataset: DatasetConfig,
    pub training: TrainingConfig,
    pub baseline: BaselineConfig,
    pub recurrent: RecurrentConfig,
}

fn fraction(name: &str, v: f64) -> Result<()> {
    if v > 0. && v < 1. {
        Ok(())
    } else {
        Err(ForecastError::InvalidConfig(format!(
            "{name} must lie in (0, 1), got {v}"
        )))
    }
}

fn nonzero(name: &str, v: usize) -> Result<()> {
    if v == 0 {
        Err(ForecastError::InvalidConfig(format!("{name} must be > 0")))
    } else {
        Ok(())
    }
}

impl ExperimentConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.system.validate()?;

        let sim = &self.simulation;
        if !(sim.t_start.is_finite() && sim.t_end.is_finite()) || sim.t_start >= sim.t_end {
            return Err(ForecastError::InvalidConfig(format!(
                "simulation span [{}, {}] must be finite and increasing",
                sim.t_start, sim.t_end
            )));
        }
        if sim.initial_state.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidConfig(
                "initial state must be finite".into(),
            ));
        }
        if !(sim.rtol > 0. && sim.atol > 0.) {
            return Err(ForecastError::InvalidConfig(
                "solver tolerances must be positive".into(),
            ));
        }
        nonzero("simulation.samples", sim.samples)?;
        nonzero("simulation.max_steps", sim.max_steps)?;

        fraction("dataset.test_fraction", self.dataset.test_fraction)?;
        nonzero("dataset.window", self.dataset.window)?;

        let train = &self.training;
        nonzero("training.epochs", train.epochs)?;
        nonzero("training.batch_size", train.batch_size)?;
        if !(0.0..1.0).contains(&train.validation_split) {
            return Err(ForecastError::InvalidConfig(format!(
                "training.validation_split must lie in [0, 1), got {}",
                train.validation_split
            )));
        }
        if !(train.learning_rate.is_finite() && train.learning_rate > 0.) {
            return Err(ForecastError::InvalidConfig(
                "training.learning_rate must be positive".into(),
            ));
        }

        if self.baseline.hidden.contains(&0) {
            return Err(ForecastError::InvalidConfig(
                "baseline.hidden widths must be > 0".into(),
            ));
        }
        nonzero("recurrent.units", self.recurrent.units)?;

        Ok(())
    }
}
