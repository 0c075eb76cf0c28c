mod common;

use camino::{Utf8Path, Utf8PathBuf};
use duosat::{config::SimulationConfig, DuoSatError, Trajectory};

use crate::common::{scenario_physical, scenario_state};

fn demo_config() -> SimulationConfig {
    SimulationConfig::from_path(Utf8Path::new("demos/two_satellites.yaml")).unwrap()
}

#[test]
fn test_demo_config_matches_scenario() {
    let sim = demo_config().build().unwrap();

    assert_eq!(sim.dynamics().params(), &scenario_physical());
    assert_eq!(sim.initial_state(), &scenario_state());
    assert_eq!(sim.span(), (0.0, 100_000.0));
    assert_eq!(sim.params().relative_tolerance, 1e-8);
    assert_eq!(sim.params().output_step, Some(100.0));
}

#[test]
fn test_missing_file() {
    let res = SimulationConfig::from_path(Utf8Path::new("demos/does_not_exist.yaml"));
    assert!(matches!(res, Err(DuoSatError::IoError(_))));
}

#[test]
fn test_csv_export_reloads() {
    let mut config = demo_config();
    config.tf = 2_000.0;
    let sim = config.build().unwrap();
    let result = sim.run().unwrap();
    assert_eq!(result.trajectory.len(), 21);

    let dir = Utf8PathBuf::from_path_buf(std::env::temp_dir()).unwrap();
    let path = dir.join(format!("duosat_config_yaml_{}.csv", std::process::id()));
    result.trajectory.write_csv_file(&path).unwrap();

    let header = std::fs::read_to_string(&path).unwrap();
    assert!(header.starts_with("t,x1,y1,z1,x2,y2,z2,vx1,vy1,vz1,vx2,vy2,vz2"));

    let loaded = Trajectory::read_csv_file(&path, sim.dynamics()).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded.len(), result.trajectory.len());
    for (a, b) in loaded.iter().zip(result.trajectory.iter()) {
        assert_eq!(a.t, b.t);
        assert_eq!(a.state, b.state);
    }
}
