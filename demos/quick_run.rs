use lorenz_forecast::{compare::Comparator, config::ExperimentConfig, pipeline::Pipeline};

fn main() -> lorenz_forecast::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = ExperimentConfig::default();
    config.training.epochs = 10;
    config.dataset.window = 4;
    config.dataset.normalize = true;

    let pipeline = Pipeline::new(config)?;

    let trajectory = pipeline.simulate()?;
    let (_, parts) = pipeline.build_dataset(&trajectory)?;
    let scaler = pipeline.scaler(&parts)?;

    let mut dense = pipeline.baseline(trajectory.dim());
    let mut lstm = pipeline.recurrent(trajectory.dim());
    pipeline.train(&mut dense, &parts.train, scaler.as_ref())?;
    let history = pipeline.train(&mut lstm, &parts.train, scaler.as_ref())?;

    for e in &history.epochs {
        println!("epoch={} loss={:.5} val_loss={:?}", e.epoch, e.loss, e.val_loss);
    }

    let report = Comparator::new(scaler).compare(&mut [&mut dense, &mut lstm], &parts.test)?;
    for s in &report.summary {
        println!("{} test MAE = {:.4}", s.model, s.mae);
    }

    Ok(())
}
