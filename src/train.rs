use log::{debug, info, warn};
use ndarray::Axis;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::Serialize;

use crate::{
    config::TrainingConfig,
    data::dataset::SupervisedSet,
    error::{ForecastError, Result},
    f,
    nn::forecaster::Forecaster,
    optim::{adam::Adam, optimizer::Optimizer},
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpochStats {
    pub epoch: usize,
    pub loss: f64,
    pub val_loss: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct History {
    pub model: String,
    pub train_samples: usize,
    pub val_samples: usize,
    pub epochs: Vec<EpochStats>,
}

impl History {
    pub fn last(&self) -> Option<&EpochStats> {
        self.epochs.last()
    }
}

/// Minibatch MAE training with Adam.
///
/// The trailing `validation_split` fraction of the data (in the order given)
/// is held out and only reported per epoch.
#[derive(Debug, Clone)]
pub struct Trainer {
    pub config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    fn holdout(&self, n: usize) -> Result<usize> {
        let n_train = ((n as f64) * (1. - self.config.validation_split)).floor() as usize;
        let n_train = n_train.min(n);

        if n_train == 0 {
            return Err(ForecastError::InsufficientSamples { needed: 1, got: 0 });
        }

        Ok(n_train)
    }

    pub fn fit<M: Forecaster + ?Sized>(
        &self,
        model: &mut M,
        data: &SupervisedSet,
    ) -> Result<History> {
        if data.is_empty() {
            return Err(ForecastError::InsufficientSamples { needed: 1, got: 0 });
        }
        if data.window() == 0 {
            return Err(ForecastError::ShapeMismatch {
                context: "training window",
                expected: 1,
                found: 0,
            });
        }
        if data.dim() != model.input_dim() {
            return Err(ForecastError::ShapeMismatch {
                context: "training inputs",
                expected: model.input_dim(),
                found: data.dim(),
            });
        }
        if data.targets.ncols() != model.output_dim() {
            return Err(ForecastError::ShapeMismatch {
                context: "training targets",
                expected: model.output_dim(),
                found: data.targets.ncols(),
            });
        }
        if self.config.batch_size == 0 {
            return Err(ForecastError::InvalidConfig("batch size must be > 0".into()));
        }

        let n = data.len();
        let n_train = self.holdout(n)?;
        let train = data.subset(&(0..n_train).collect::<Vec<_>>());
        let val = (n_train < n).then(|| data.subset(&(n_train..n).collect::<Vec<_>>()));

        let mut optim = Adam::default()
            .with_learning_rate(self.config.learning_rate)
            .with(&mut *model);
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut indices: Vec<usize> = (0..n_train).collect();

        let mut history = History {
            model: model.name().to_string(),
            train_samples: n_train,
            val_samples: n - n_train,
            epochs: Vec::with_capacity(self.config.epochs),
        };
        let mut warned = false;

        for epoch in 1..=self.config.epochs {
            indices.shuffle(&mut rng);
            let mut total = 0.;

            for batch in indices.chunks(self.config.batch_size) {
                let x = train.inputs.select(Axis(0), batch);
                let y = train.targets.select(Axis(0), batch);

                let pred = model.forward(&x, true);
                total += f::mae(&pred, &y) * batch.len() as f64;

                model.backward(f::d_mae(&pred, &y));
                optim.step(&mut *model);
            }

            let loss = total / n_train as f64;
            let val_loss = val
                .as_ref()
                .map(|v| f::mae(&model.forward(&v.inputs, false), &v.targets));

            if !loss.is_finite() && !warned {
                warn!(
                    "{}: training loss became non-finite at epoch {}",
                    history.model, epoch
                );
                warned = true;
            }

            debug!(
                "{} epoch {}/{} loss={:.5} val_loss={}",
                history.model,
                epoch,
                self.config.epochs,
                loss,
                val_loss.map_or("-".to_string(), |v| format!("{v:.5}"))
            );

            history.epochs.push(EpochStats {
                epoch,
                loss,
                val_loss,
            });
        }

        if let Some(last) = history.last() {
            info!(
                "{}: trained {} epochs on {} samples, loss={:.5} val_loss={}",
                history.model,
                self.config.epochs,
                n_train,
                last.loss,
                last.val_loss
                    .map_or("-".to_string(), |v| format!("{v:.5}"))
            );
        }

        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, Array3, array};
    use ndarray_rand::{RandomExt, rand_distr::Uniform};

    use super::*;
    use crate::{
        compare::Comparator,
        config::HiddenActivation,
        nn::forecaster::{DenseForecaster, LstmForecaster},
    };

    fn affine_set(n: usize) -> SupervisedSet {
        let inputs = Array3::random_using((n, 1, 3), Uniform::new(-1., 1.), &mut f::init_rng(0));
        let m = array![[0.9, 0.1, 0.], [-0.2, 1.0, 0.3], [0., 0.5, 0.8]];
        let targets = inputs.index_axis(Axis(1), 0).dot(&m) + &array![0.1, -0.2, 0.05];

        SupervisedSet {
            inputs,
            targets,
            origins: (1..=n).collect(),
        }
    }

    fn config(epochs: usize) -> TrainingConfig {
        TrainingConfig {
            epochs,
            batch_size: 32,
            validation_split: 0.2,
            learning_rate: 1e-2,
            seed: 1,
        }
    }

    #[test]
    fn dense_learns_affine_map() {
        let data = affine_set(400);
        let mut model = DenseForecaster::new(3, &[], HiddenActivation::Relu, 3);
        let history = Trainer::new(config(200)).fit(&mut model, &data).unwrap();

        let first = history.epochs[0];
        let last = *history.last().unwrap();

        assert_eq!(history.epochs.len(), 200);
        assert_eq!(history.train_samples, 320);
        assert_eq!(history.val_samples, 80);
        assert!(last.loss < first.loss);
        assert!(last.val_loss.unwrap() < 0.1);
    }

    #[test]
    fn lstm_loss_decreases() {
        let data = affine_set(200);
        let mut model = LstmForecaster::new(3, 8, 4);
        let history = Trainer::new(config(30)).fit(&mut model, &data).unwrap();

        assert!(history.last().unwrap().loss < history.epochs[0].loss);
    }

    #[test]
    fn same_seed_same_history() {
        let data = affine_set(100);
        let trainer = Trainer::new(config(3));

        let mut a = DenseForecaster::new(3, &[], HiddenActivation::Relu, 3);
        let mut b = DenseForecaster::new(3, &[], HiddenActivation::Relu, 3);

        let ha = trainer.fit(&mut a, &data).unwrap();
        let hb = trainer.fit(&mut b, &data).unwrap();

        assert_eq!(ha.epochs, hb.epochs);
        assert_eq!(a.ffn.layers[0].w, b.ffn.layers[0].w);
    }

    #[test]
    fn holdout_rounds_train_size_down() {
        let trainer = Trainer::new(config(1));

        assert_eq!(trainer.holdout(799).unwrap(), 639);
        assert_eq!(trainer.holdout(400).unwrap(), 320);
        assert!(trainer.holdout(1).is_err());
    }

    #[test]
    fn rejects_empty_window() {
        let data = SupervisedSet {
            inputs: Array3::zeros((4, 0, 3)),
            targets: Array2::zeros((4, 3)),
            origins: vec![1, 2, 3, 4],
        };
        let mut model = DenseForecaster::new(3, &[], HiddenActivation::Relu, 0);

        assert!(matches!(
            Trainer::new(config(1)).fit(&mut model, &data),
            Err(ForecastError::ShapeMismatch {
                context: "training window",
                ..
            })
        ));
    }

    #[test]
    fn non_finite_loss_does_not_abort() {
        let mut data = affine_set(100);
        data.targets[[3, 1]] = f64::NAN;
        let test = affine_set(20);

        let mut model = DenseForecaster::new(3, &[], HiddenActivation::Relu, 3);
        let history = Trainer::new(config(3)).fit(&mut model, &data).unwrap();

        assert_eq!(history.epochs.len(), 3);
        assert!(history.epochs.iter().all(|e| e.loss.is_nan()));

        let report = Comparator::default()
            .compare(&mut [&mut model], &test)
            .unwrap();
        assert_eq!(report.len(), 20);
        assert!(report.model_mae("dense").is_some_and(f64::is_finite));
    }

    #[test]
    fn rejects_feature_mismatch() {
        let data = SupervisedSet {
            inputs: Array3::zeros((4, 1, 2)),
            targets: Array2::zeros((4, 2)),
            origins: vec![1, 2, 3, 4],
        };
        let mut model = LstmForecaster::new(3, 4, 0);

        assert!(matches!(
            Trainer::new(config(1)).fit(&mut model, &data),
            Err(ForecastError::ShapeMismatch { .. })
        ));
    }
}
