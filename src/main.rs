use std::{error::Error, fs::File, io::BufWriter, path::PathBuf};

use clap::{Parser, ValueEnum};
use log::info;

use lorenz_forecast::{
    config::ExperimentConfig,
    data::split::SplitStrategy,
    pipeline::{Outcome, Pipeline},
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SplitArg {
    Shuffled,
    Chronological,
}

impl From<SplitArg> for SplitStrategy {
    fn from(s: SplitArg) -> Self {
        match s {
            SplitArg::Shuffled => SplitStrategy::Shuffled,
            SplitArg::Chronological => SplitStrategy::Chronological,
        }
    }
}

/// Simulate the Lorenz system and compare dense and LSTM one-step forecasters.
#[derive(Parser, Debug)]
#[command(name = "lorenz-forecast", version)]
struct Cli {
    /// TOML experiment config; defaults reproduce the reference run.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    epochs: Option<usize>,

    /// Number of evenly spaced trajectory samples.
    #[arg(long)]
    samples: Option<usize>,

    /// History length fed to both models.
    #[arg(long)]
    window: Option<usize>,

    /// Standardize states before training.
    #[arg(long, overrides_with = "no_normalize")]
    normalize: bool,

    /// Train on raw states even if the config enables normalization.
    #[arg(long, overrides_with = "normalize")]
    no_normalize: bool,

    #[arg(long, value_enum)]
    split: Option<SplitArg>,

    /// Seed for the split, weight init and batch order.
    #[arg(long)]
    seed: Option<u64>,

    /// Write the comparison report and training histories as JSON.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn experiment(&self) -> lorenz_forecast::Result<ExperimentConfig> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::load(path)?,
            None => ExperimentConfig::default(),
        };

        if let Some(epochs) = self.epochs {
            config.training.epochs = epochs;
        }
        if let Some(samples) = self.samples {
            config.simulation.samples = samples;
        }
        if let Some(window) = self.window {
            config.dataset.window = window;
        }
        if self.normalize {
            config.dataset.normalize = true;
        }
        if self.no_normalize {
            config.dataset.normalize = false;
        }
        if let Some(split) = self.split {
            config.dataset.split = split.into();
        }
        if let Some(seed) = self.seed {
            config.dataset.seed = seed;
            config.training.seed = seed;
        }

        config.validate()?;
        Ok(config)
    }
}

fn print_summary(outcome: &Outcome) {
    println!(
        "\n=== {} examples: {} train / {} test ===",
        outcome.examples, outcome.train_examples, outcome.test_examples
    );
    println!("{:<6} {:<8} {:>10} {:>10} {:>10}", "dim", "model", "MAE", "RMSE", "R^2");

    for dim in &outcome.report.dimensions {
        for series in &dim.models {
            println!(
                "{:<6} {:<8} {:>10.4} {:>10.4} {:>10.4}",
                dim.dimension, series.model, series.score.mae, series.score.rmse, series.score.r2
            );
        }
    }

    for s in &outcome.report.summary {
        println!("{:<15} overall MAE = {:.4}", s.model, s.mae);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let pipeline = Pipeline::new(cli.experiment()?)?;
    let outcome = pipeline.run()?;

    print_summary(&outcome);

    if let Some(path) = &cli.report {
        serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), &outcome)?;
        info!("report written to {}", path.display());
    }

    Ok(())
}
