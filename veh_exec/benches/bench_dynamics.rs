//! # Dynamics and Perception Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use veh_lib::{
    dyn_model::{DynamicsIntegrator, VehicleParams},
    loc::Pose,
    per::{SectorSweepSensor, SweepParams},
    world::{Rect, RectWorld},
};

fn dynamics_benchmark(c: &mut Criterion) {
    // ---- Force model step ----

    let mut integrator = DynamicsIntegrator::from_params(&VehicleParams::default());
    integrator.bus_mut().set_throttle01(0.5);
    integrator.bus_mut().set_steer_deg(2.0);
    let mut pose = Pose::default();

    c.bench_function("DynamicsIntegrator::step", |b| {
        b.iter(|| integrator.step(black_box(1.0 / 120.0), &mut pose))
    });

    // ---- Sector sweep in a corridor ----

    let world = RectWorld::new(
        vec![
            Rect::new(-1.0, 1.5, 60.0, 1.0),
            Rect::new(-1.0, -2.5, 60.0, 1.0),
            Rect::new(20.0, -2.5, 1.0, 5.0),
        ],
        vec![],
    );

    let mut sweep = SectorSweepSensor::new(&SweepParams::default());
    sweep.set_pose(Pose::new(0.0, 0.0, 0.1));

    c.bench_function("SectorSweepSensor::detect", |b| {
        b.iter(|| sweep.detect(black_box(&world)))
    });
}

criterion_group!(benches, dynamics_benchmark);
criterion_main!(benches);
