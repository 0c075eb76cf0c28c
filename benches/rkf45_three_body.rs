use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::{Vector2, Vector3};

use duosat::{integrate, DuoSatError, PhysicalParams, RKF45Params, SatelliteState, Simulation};

fn scenario(tf: f64, tolerance: f64) -> Simulation {
    let physical = PhysicalParams::builder()
        .central_mass(1e29)
        .body1_mass(2e27)
        .body2_mass(1e26)
        .build()
        .unwrap();
    let initial = SatelliteState::new(
        Vector3::new(500_000.0, 0.0, 0.0),
        Vector3::new(0.0, 45.0, 5.0),
        Vector3::new(600_000.0, 0.0, 0.0),
        Vector3::new(0.0, 72.0, 10.0),
    );
    let params = RKF45Params::builder().tolerance(tolerance).build().unwrap();
    Simulation::new(physical, initial, 0.0, tf, params).unwrap()
}

fn bench_harmonic(c: &mut Criterion) {
    let params = RKF45Params::builder().tolerance(1e-10).build().unwrap();
    let y0 = Vector2::new(1.0, 0.0);

    c.bench_function("rkf45/harmonic_oscillator_10_periods", |b| {
        b.iter(|| {
            let res = integrate(
                |_t, y: &Vector2<f64>| Ok::<_, DuoSatError>(Vector2::new(y[1], -y[0])),
                0.0,
                black_box(20.0 * std::f64::consts::PI),
                &y0,
                &params,
            )
            .unwrap();
            black_box(res.trajectory.len())
        })
    });
}

fn bench_scenario(c: &mut Criterion) {
    let mut group = c.benchmark_group("rkf45/two_satellites");
    group.sample_size(10);

    for (name, tolerance) in [("tol=1e-6", 1e-6), ("tol=1e-8", 1e-8)] {
        let sim = scenario(100_000.0, tolerance);
        group.bench_function(name, |b| {
            b.iter(|| {
                let res = black_box(&sim).run().unwrap();
                black_box(res.stats.accepted_steps)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_harmonic, bench_scenario);
criterion_main!(benches);
