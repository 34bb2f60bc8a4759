use lorenz_forecast::{
    compare::Comparator,
    config::ExperimentConfig,
    data::{dataset::build_examples, split::SplitStrategy},
    envs::lorenz::{Lorenz, LorenzParams},
    nn::forecaster::Forecaster,
    ode::{
        dopri5::Dopri5,
        trajectory::{integrate, linspace},
    },
    pipeline::Pipeline,
};
use ndarray::{Array1, array};

fn quick_config() -> ExperimentConfig {
    let mut config = ExperimentConfig::default();
    config.training.epochs = 2;
    config
}

#[test]
fn reference_trajectory_stays_on_attractor() {
    let pipeline = Pipeline::new(ExperimentConfig::default()).unwrap();
    let traj = pipeline.simulate().unwrap();

    assert_eq!(traj.len(), 1000);
    assert_eq!(traj.state(0), array![0., 1., 1.05]);
    assert_eq!(traj.times()[999], 100.);

    for s in traj.states().rows() {
        assert!(s[0].abs() < 40.);
        assert!(s[1].abs() < 40.);
        assert!(s[2] > 0. && s[2] < 60.);
    }
}

#[test]
fn nearby_initial_states_diverge() {
    let lorenz = Lorenz::new(LorenzParams::default());
    let solver = Dopri5::default().with_tolerances(1e-10, 1e-10);
    let t_eval = linspace(0., 100., 1000);

    let a = integrate(&lorenz, &solver, (0., 100.), array![0., 1., 1.05].view(), &t_eval).unwrap();
    let b = integrate(
        &lorenz,
        &solver,
        (0., 100.),
        array![1e-4, 1., 1.05].view(),
        &t_eval,
    )
    .unwrap();

    let distance: Array1<f64> = a
        .states()
        .rows()
        .into_iter()
        .zip(b.states().rows())
        .map(|(p, q)| (&p - &q).mapv(|v| v * v).sum().sqrt())
        .collect();

    // t <= 0.4
    assert!(distance.iter().take(5).all(|d| *d < 5e-2));
    assert!(distance.iter().any(|d| *d > 1.));
}

#[test]
fn labels_follow_inputs_after_split() {
    let pipeline = Pipeline::new(quick_config()).unwrap();
    let traj = pipeline.simulate().unwrap();
    let (examples, parts) = pipeline.build_dataset(&traj).unwrap();

    assert_eq!(examples.len(), 999);

    for set in [&parts.train, &parts.test] {
        for (i, &origin) in set.origins.iter().enumerate() {
            assert_eq!(set.targets.row(i), traj.state(origin));
            assert_eq!(set.last_states().row(i), traj.state(origin - 1));
        }
    }
}

#[test]
fn chronological_split_keeps_test_after_train() {
    let mut config = quick_config();
    config.dataset.split = SplitStrategy::Chronological;
    let pipeline = Pipeline::new(config).unwrap();
    let traj = pipeline.simulate().unwrap();
    let (_, parts) = pipeline.build_dataset(&traj).unwrap();

    let last_train = parts.train.origins.iter().max().unwrap();
    let first_test = parts.test.origins.iter().min().unwrap();
    assert!(last_train < first_test);
}

#[test]
fn end_to_end_reference_shapes() {
    let pipeline = Pipeline::new(quick_config()).unwrap();
    let outcome = pipeline.run().unwrap();

    assert_eq!(outcome.examples, 999);
    assert_eq!(outcome.train_examples, 799);
    assert_eq!(outcome.test_examples, 200);
    assert_eq!(outcome.baseline.epochs.len(), 2);
    assert_eq!(outcome.recurrent.epochs.len(), 2);
    assert_eq!(outcome.baseline.train_samples, 639);
    assert_eq!(outcome.baseline.val_samples, 160);

    assert_eq!(outcome.report.len(), 200);
    assert_eq!(outcome.report.dimensions.len(), 3);
    for dim in &outcome.report.dimensions {
        assert_eq!(dim.actual.len(), 200);
        assert_eq!(dim.models.len(), 2);
        for series in &dim.models {
            assert_eq!(series.predicted.len(), 200);
            assert!(series.score.mae.is_finite());
        }
    }
}

#[test]
fn both_models_predict_test_inputs() {
    let pipeline = Pipeline::new(quick_config()).unwrap();
    let traj = pipeline.simulate().unwrap();
    let (_, parts) = pipeline.build_dataset(&traj).unwrap();

    let mut baseline = pipeline.baseline(3);
    let mut recurrent = pipeline.recurrent(3);
    pipeline.train(&mut baseline, &parts.train, None).unwrap();
    pipeline.train(&mut recurrent, &parts.train, None).unwrap();

    assert_eq!(baseline.predict(&parts.test.inputs).unwrap().dim(), (200, 3));
    assert_eq!(recurrent.predict(&parts.test.inputs).unwrap().dim(), (200, 3));

    let pred = Comparator::default().predict(&mut recurrent, &parts.test).unwrap();
    assert_eq!(pred.dim(), (200, 3));
}

#[test]
fn normalized_sliding_window_run() {
    let mut config = quick_config();
    config.dataset.normalize = true;
    config.dataset.window = 4;
    config.simulation.samples = 400;
    let outcome = Pipeline::new(config).unwrap().run().unwrap();

    assert_eq!(outcome.examples, 396);
    assert_eq!(outcome.train_examples + outcome.test_examples, 396);
    assert!(outcome.report.summary.iter().all(|s| s.mae.is_finite()));
}

#[test]
fn windowed_examples_from_trajectory() {
    let pipeline = Pipeline::new(quick_config()).unwrap();
    let traj = pipeline.simulate().unwrap();
    let set = build_examples(&traj, 5).unwrap();

    assert_eq!(set.len(), 995);
    assert_eq!(set.inputs.dim(), (995, 5, 3));
}
