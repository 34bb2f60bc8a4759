use log::info;
use ndarray::Array1;
use serde::Serialize;

use crate::{
    compare::{ComparisonReport, Comparator},
    config::ExperimentConfig,
    data::{
        dataset::{SupervisedSet, build_examples},
        scaler::StandardScaler,
        split::{DatasetSplit, split},
    },
    envs::lorenz::Lorenz,
    error::Result,
    nn::forecaster::{DenseForecaster, Forecaster, LstmForecaster},
    ode::{
        dopri5::Dopri5,
        trajectory::{Bounds, Trajectory, integrate, linspace},
    },
    train::{History, Trainer},
};

/// Everything a run produced, in pipeline order.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub bounds: Vec<Bounds>,
    pub examples: usize,
    pub train_examples: usize,
    pub test_examples: usize,
    pub baseline: History,
    pub recurrent: History,
    pub report: ComparisonReport,
}

/// integrate → build dataset → train baseline → train recurrent → compare.
///
/// Each stage takes its inputs explicitly, so stages can also be driven one at
/// a time.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: ExperimentConfig,
}

impl Pipeline {
    pub fn new(config: ExperimentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn simulate(&self) -> Result<Trajectory> {
        let sim = &self.config.simulation;
        let solver = Dopri5::default()
            .with_tolerances(sim.rtol, sim.atol)
            .with_max_steps(sim.max_steps);
        let t_eval = linspace(sim.t_start, sim.t_end, sim.samples);
        let y0 = Array1::from(sim.initial_state.to_vec());

        integrate(
            &Lorenz::new(self.config.system),
            &solver,
            (sim.t_start, sim.t_end),
            y0.view(),
            &t_eval,
        )
    }

    pub fn build_dataset(&self, trajectory: &Trajectory) -> Result<(SupervisedSet, DatasetSplit)> {
        let ds = &self.config.dataset;
        let examples = build_examples(trajectory, ds.window)?;
        let parts = split(&examples, ds.test_fraction, ds.seed, ds.split)?;

        info!(
            "built {} examples (window {}), {} train / {} test",
            examples.len(),
            ds.window,
            parts.train.len(),
            parts.test.len()
        );

        Ok((examples, parts))
    }

    /// Scaler fitted on the training partition, when normalization is enabled.
    pub fn scaler(&self, parts: &DatasetSplit) -> Result<Option<StandardScaler>> {
        if !self.config.dataset.normalize {
            return Ok(None);
        }

        let scaler = StandardScaler::fit_set(&parts.train)?;
        info!(
            "standardizing with mean={} std={}",
            scaler.mean, scaler.std
        );
        Ok(Some(scaler))
    }

    pub fn baseline(&self, dim: usize) -> DenseForecaster {
        let b = &self.config.baseline;
        DenseForecaster::new(dim, &b.hidden, b.activation, self.config.training.seed)
    }

    pub fn recurrent(&self, dim: usize) -> LstmForecaster {
        LstmForecaster::new(dim, self.config.recurrent.units, self.config.training.seed)
    }

    pub fn train(
        &self,
        model: &mut dyn Forecaster,
        train: &SupervisedSet,
        scaler: Option<&StandardScaler>,
    ) -> Result<History> {
        let trainer = Trainer::new(self.config.training.clone());

        match scaler {
            Some(s) => trainer.fit(model, &s.transform_set(train)),
            None => trainer.fit(model, train),
        }
    }

    pub fn run(&self) -> Result<Outcome> {
        let trajectory = self.simulate()?;
        let bounds = trajectory.bounds()?;
        for (name, b) in ["x", "y", "z"].iter().zip(&bounds) {
            info!("{name} in [{:.3}, {:.3}]", b.min, b.max);
        }

        let (examples, parts) = self.build_dataset(&trajectory)?;
        let scaler = self.scaler(&parts)?;
        let dim = trajectory.dim();

        let mut baseline = self.baseline(dim);
        let baseline_history = self.train(&mut baseline, &parts.train, scaler.as_ref())?;

        let mut recurrent = self.recurrent(dim);
        let recurrent_history = self.train(&mut recurrent, &parts.train, scaler.as_ref())?;

        let report = Comparator::new(scaler)
            .compare(&mut [&mut baseline, &mut recurrent], &parts.test)?;

        Ok(Outcome {
            bounds,
            examples: examples.len(),
            train_examples: parts.train.len(),
            test_examples: parts.test.len(),
            baseline: baseline_history,
            recurrent: recurrent_history,
            report,
        })
    }
}
