mod common;

use camino::Utf8PathBuf;
use duosat::{
    integrator::rkf45::StepOutcome, DuoSatError, RKF45Params, SatelliteState, Simulation,
    ThreeBodyDynamics, Trajectory,
};
use nalgebra::Vector3;

use crate::common::{scenario, scenario_physical, scenario_state, SCENARIO_END};

#[test]
fn test_scenario_completes_and_stays_bound() {
    let sim = scenario(SCENARIO_END, 1e-8);
    let result = sim.run().unwrap();
    let trajectory = &result.trajectory;

    assert_eq!(trajectory.start_time(), 0.0);
    assert_eq!(trajectory.end_time(), SCENARIO_END);
    assert!(trajectory.is_strictly_increasing());
    assert_eq!(trajectory.first().state, scenario_state().to_vector());
    assert!(trajectory.iter().all(|s| s.state.iter().all(|v| v.is_finite())));

    let (r1, r2) = trajectory.max_radii();
    assert!(r1 < 5.0 * 500_000.0, "body 1 reached {r1} km");
    assert!(r2 < 5.0 * 600_000.0, "body 2 reached {r2} km");
    assert!(trajectory.min_separation() > 0.0);

    assert_eq!(trajectory.len(), result.stats.accepted_steps + 1);
    assert!(result.stats.max_accepted_error <= 1.0);
}

#[test]
fn test_every_accepted_step_meets_tolerance() {
    let sim = scenario(20_000.0, 1e-8);
    let mut accepted = 0;
    let result = sim
        .run_with_monitor(|report| {
            if report.outcome == StepOutcome::Accepted {
                assert!(report.error <= 1.0);
                accepted += 1;
            }
        })
        .unwrap();
    assert_eq!(accepted, result.stats.accepted_steps);
}

/// 1e-11 solution of the scenario on a 1000 s grid over `[0, 20000]`, two orbits of body 1.
fn reference_path() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/scenario_reference.csv")
}

#[test]
fn test_drift_against_stored_reference() {
    let dynamics = ThreeBodyDynamics::new(scenario_physical());
    let reference = Trajectory::read_csv_file(&reference_path(), &dynamics).unwrap();
    assert_eq!(reference.len(), 21);
    assert_eq!(reference.end_time(), 20_000.0);
    assert_eq!(reference.first().state, scenario_state().to_vector());

    // Each grid time is the end of its own run so no dense output error enters the comparison.
    // The largest drift, about 1.3 km, is at the periapsis passage of body 1 near t = 16000.
    for sample in reference.iter().skip(1) {
        let run = scenario(sample.t, 1e-8).run().unwrap();
        assert_eq!(run.trajectory.end_time(), sample.t);

        let actual = SatelliteState::from_vector(&run.trajectory.last().state);
        let expected = SatelliteState::from_vector(&sample.state);
        let t = sample.t;
        let d1 = (actual.body1_position - expected.body1_position).norm();
        let d2 = (actual.body2_position - expected.body2_position).norm();
        assert!(d1 < 2.0, "body 1 drifted {d1} km at t = {t}");
        assert!(d2 < 2.0, "body 2 drifted {d2} km at t = {t}");
        assert!((actual.body1_velocity - expected.body1_velocity).norm() < 1e-2);
        assert!((actual.body2_velocity - expected.body2_velocity).norm() < 1e-2);
    }
}

#[test]
fn test_tight_run_reproduces_stored_reference() {
    let dynamics = ThreeBodyDynamics::new(scenario_physical());
    let reference = Trajectory::read_csv_file(&reference_path(), &dynamics).unwrap();
    let run = scenario(20_000.0, 1e-11).run().unwrap();
    assert_eq!(run.stats.accepted_steps, 1464);

    let actual = SatelliteState::from_vector(&run.trajectory.last().state);
    let expected = SatelliteState::from_vector(&reference.last().state);
    assert!((actual.body1_position - expected.body1_position).norm() < 1e-3);
    assert!((actual.body2_position - expected.body2_position).norm() < 1e-3);

    // Dense output of the tight run against the stored grid, away from periapsis
    for t in [2_000.0, 7_000.0, 12_000.0] {
        let a = SatelliteState::from_vector(&run.trajectory.interpolate(t).unwrap());
        let b = SatelliteState::from_vector(&reference.interpolate(t).unwrap());
        assert!((a.body1_position - b.body1_position).norm() < 1e-2);
        assert!((a.body2_position - b.body2_position).norm() < 1e-2);
    }
}

#[test]
fn test_body_at_origin_is_singular() {
    for body in [1, 2] {
        let mut state = scenario_state();
        if body == 1 {
            state.body1_position = Vector3::zeros();
        } else {
            state.body2_position = Vector3::zeros();
        }
        let sim = Simulation::new(
            scenario_physical(),
            state,
            0.0,
            SCENARIO_END,
            RKF45Params::default(),
        )
        .unwrap();

        match sim.run() {
            Err(DuoSatError::SingularConfiguration { t, state }) => {
                assert_eq!(t, 0.0);
                assert_eq!(state.len(), 12);
            }
            other => panic!("body {body} at the origin should be singular, got {other:?}"),
        }
    }
}

#[test]
fn test_output_grid_ends_on_tf() {
    let params = RKF45Params::builder().output_step(300.0).build().unwrap();
    let sim = scenario(1_000.0, 1e-8).with_params(params).unwrap();
    let times: Vec<f64> = sim.run().unwrap().trajectory.times().collect();
    assert_eq!(times, vec![0.0, 300.0, 600.0, 900.0, 1_000.0]);
}

#[test]
fn test_step_budget_reports_partial_result() {
    let params = RKF45Params::builder().max_steps(10).build().unwrap();
    let sim = scenario(SCENARIO_END, 1e-8).with_params(params).unwrap();

    match sim.run() {
        Err(DuoSatError::StepBudgetExceeded { partial, t, .. }) => {
            assert!(t < SCENARIO_END);
            assert!(!partial.is_empty());
            assert!(partial.len() <= 11);
            assert!(partial.iter().all(|(_, y)| y.len() == 12));
        }
        other => panic!("expected a step budget failure, got {other:?}"),
    }
}
