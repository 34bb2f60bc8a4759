use log::debug;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

use super::dataset::SupervisedSet;

/// How examples are assigned to the held-out partition.
///
/// `Shuffled` draws a seeded random permutation, so test examples are
/// interleaved in time with training examples and neighbouring states leak
/// between the partitions. `Chronological` holds out the latest block instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitStrategy {
    #[default]
    Shuffled,
    Chronological,
}

#[derive(Debug, Clone)]
pub struct DatasetSplit {
    pub train: SupervisedSet,
    pub test: SupervisedSet,
}

/// Sizes of a (train, test) partition of `n` examples: the test side takes
/// `ceil(n * test_fraction)`.
pub fn partition_sizes(n: usize, test_fraction: f64) -> Result<(usize, usize)> {
    if !(test_fraction > 0. && test_fraction < 1.) {
        return Err(ForecastError::InvalidSplit(format!(
            "test fraction {test_fraction} must lie in (0, 1)"
        )));
    }

    let n_test = (n as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(ForecastError::InvalidSplit(format!(
            "{n} examples cannot be split with test fraction {test_fraction}"
        )));
    }

    Ok((n - n_test, n_test))
}

/// Index partition (train, test) of `0..n`.
pub fn split_indices(
    n: usize,
    test_fraction: f64,
    seed: u64,
    strategy: SplitStrategy,
) -> Result<(Vec<usize>, Vec<usize>)> {
    let (n_train, n_test) = partition_sizes(n, test_fraction)?;

    let (train, test) = match strategy {
        SplitStrategy::Shuffled => {
            let mut indices: Vec<usize> = (0..n).collect();
            indices.shuffle(&mut StdRng::seed_from_u64(seed));
            let train = indices.split_off(n_test);
            (train, indices)
        }
        SplitStrategy::Chronological => ((0..n_train).collect(), (n_train..n).collect()),
    };

    debug!(
        "split {} examples into {} train / {} test ({:?})",
        n,
        train.len(),
        test.len(),
        strategy
    );

    Ok((train, test))
}

pub fn split(
    set: &SupervisedSet,
    test_fraction: f64,
    seed: u64,
    strategy: SplitStrategy,
) -> Result<DatasetSplit> {
    let (train, test) = split_indices(set.len(), test_fraction, seed, strategy)?;

    Ok(DatasetSplit {
        train: set.subset(&train),
        test: set.subset(&test),
    })
}
