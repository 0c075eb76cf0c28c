#![allow(dead_code)]

use approx::assert_relative_eq;
use duosat::{
    keplerian_element::KeplerianElements, PhysicalParams, RKF45Params, SatelliteState, Simulation,
};
use nalgebra::Vector3;

pub const SCENARIO_END: f64 = 100_000.0;

pub fn scenario_physical() -> PhysicalParams {
    PhysicalParams::builder()
        .central_mass(1e29)
        .body1_mass(2e27)
        .body2_mass(1e26)
        .build()
        .unwrap()
}

pub fn scenario_state() -> SatelliteState {
    SatelliteState::new(
        Vector3::new(500_000.0, 0.0, 0.0),
        Vector3::new(0.0, 45.0, 5.0),
        Vector3::new(600_000.0, 0.0, 0.0),
        Vector3::new(0.0, 72.0, 10.0),
    )
}

/// The reference two-satellite scenario over `[0, tf]` at the given tolerance.
pub fn scenario(tf: f64, tolerance: f64) -> Simulation {
    let params = RKF45Params::builder().tolerance(tolerance).build().unwrap();
    Simulation::new(scenario_physical(), scenario_state(), 0.0, tf, params).unwrap()
}

pub fn assert_vec3_close(actual: &Vector3<f64>, expected: &Vector3<f64>, max_relative: f64) {
    for i in 0..3 {
        assert_relative_eq!(
            actual[i],
            expected[i],
            epsilon = max_relative * expected.norm(),
            max_relative = max_relative
        );
    }
}

pub fn assert_orbit_close(actual: &KeplerianElements, expected: &KeplerianElements, epsilon: f64) {
    assert_relative_eq!(
        actual.semi_major_axis,
        expected.semi_major_axis,
        max_relative = epsilon
    );
    assert_relative_eq!(actual.eccentricity, expected.eccentricity, epsilon = epsilon);
    assert_relative_eq!(actual.inclination, expected.inclination, epsilon = epsilon);
    assert!(
        angle_distance(
            actual.ascending_node_longitude,
            expected.ascending_node_longitude
        ) < epsilon
    );
    assert!(angle_distance(actual.periapsis_argument, expected.periapsis_argument) < epsilon);
}

/// Distance between two angles on the circle, in `[0, π]`.
pub fn angle_distance(a: f64, b: f64) -> f64 {
    let tau = std::f64::consts::TAU;
    let d = (a - b).rem_euclid(tau);
    d.min(tau - d)
}
