use log::info;
use ndarray::{Array2, Axis};
use serde::Serialize;

use crate::{
    data::{dataset::SupervisedSet, scaler::StandardScaler},
    error::{ForecastError, Result},
    nn::forecaster::Forecaster,
    util::bench::{Bench, Score},
};

pub const DIMENSIONS: [&str; 3] = ["x", "y", "z"];

#[derive(Debug, Clone, Serialize)]
pub struct ModelSeries {
    pub model: String,
    pub predicted: Vec<f64>,
    pub score: Score,
}

/// Ground truth and every model's prediction for one state dimension,
/// aligned by index.
#[derive(Debug, Clone, Serialize)]
pub struct DimensionComparison {
    pub dimension: String,
    pub actual: Vec<f64>,
    pub models: Vec<ModelSeries>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub model: String,
    pub mae: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    /// Trajectory index of each compared sample, in increasing order.
    pub origins: Vec<usize>,
    pub dimensions: Vec<DimensionComparison>,
    pub summary: Vec<ModelSummary>,
}

impl ComparisonReport {
    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    pub fn model_mae(&self, model: &str) -> Option<f64> {
        self.summary.iter().find(|s| s.model == model).map(|s| s.mae)
    }
}

/// Runs trained models on held-out examples and scores them against the
/// recorded next states.
///
/// With a scaler, models are assumed to operate in standardized space: inputs
/// are transformed before prediction and outputs mapped back before scoring.
#[derive(Debug, Clone, Default)]
pub struct Comparator {
    pub scaler: Option<StandardScaler>,
}

impl Comparator {
    pub fn new(scaler: Option<StandardScaler>) -> Self {
        Self { scaler }
    }

    pub fn predict(&self, model: &mut dyn Forecaster, test: &SupervisedSet) -> Result<Array2<f64>> {
        let pred = match &self.scaler {
            Some(scaler) => {
                let scaled = scaler.transform_set(test);
                scaler.inverse_transform(&model.predict(&scaled.inputs)?)
            }
            None => model.predict(&test.inputs)?,
        };

        if pred.dim() != test.targets.dim() {
            return Err(ForecastError::ShapeMismatch {
                context: "predictions",
                expected: test.targets.ncols(),
                found: pred.ncols(),
            });
        }

        Ok(pred)
    }

    pub fn compare(
        &self,
        models: &mut [&mut dyn Forecaster],
        test: &SupervisedSet,
    ) -> Result<ComparisonReport> {
        if test.is_empty() {
            return Err(ForecastError::InsufficientSamples { needed: 1, got: 0 });
        }

        let mut order: Vec<usize> = (0..test.len()).collect();
        order.sort_by_key(|&i| test.origins[i]);
        let test = test.subset(&order);

        let predictions = models
            .iter_mut()
            .map(|m| Ok((m.name().to_string(), self.predict(&mut **m, &test)?)))
            .collect::<Result<Vec<_>>>()?;

        let mut dimensions = Vec::with_capacity(test.dim());
        for (d, actual) in test.targets.axis_iter(Axis(1)).enumerate() {
            let models = predictions
                .iter()
                .map(|(name, pred)| {
                    let predicted = pred.column(d);
                    Ok(ModelSeries {
                        model: name.clone(),
                        predicted: predicted.to_vec(),
                        score: Bench::score(actual, predicted)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            dimensions.push(DimensionComparison {
                dimension: DIMENSIONS.get(d).map_or(format!("d{d}"), |s| s.to_string()),
                actual: actual.to_vec(),
                models,
            });
        }

        let summary = predictions
            .iter()
            .map(|(name, pred)| ModelSummary {
                model: name.clone(),
                mae: crate::f::mae(pred, &test.targets),
            })
            .collect::<Vec<_>>();

        for s in &summary {
            info!("{}: test MAE={:.5} over {} samples", s.model, s.mae, test.len());
        }

        Ok(ComparisonReport {
            origins: test.origins,
            dimensions,
            summary,
        })
    }
}
