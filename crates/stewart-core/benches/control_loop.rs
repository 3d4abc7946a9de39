//! Benchmarks for the IK solver and the teleop tick
//!
//! Run with: cargo bench --bench control_loop

use std::sync::Arc;
use std::time::{Duration, Instant};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stewart_core::{
    interpret, ActuatorState, HeadAxis, HeadPose, InputMapping, InputSnapshot, SimulatedBackend,
    StewartIk, TeleopConfig, TeleopLoop,
};

/// Benchmark a single IK solve at several poses
fn bench_ik_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("IK");
    let ik = StewartIk::default();

    let poses = [
        ("startup", HeadPose::STARTUP),
        ("lifted", HeadPose::new(0.0, 0.0, 0.05)),
        ("tilted", HeadPose::new(0.3, -0.2, 0.02)),
    ];
    for (name, pose) in poses {
        group.bench_with_input(BenchmarkId::new("solve", name), &pose, |b, pose| {
            b.iter(|| black_box(ik.solve(black_box(pose))))
        });
    }

    group.finish();
}

/// Benchmark head-pose mutation including the IK re-solve
fn bench_head_pose(c: &mut Criterion) {
    let mut group = c.benchmark_group("Actuator State");

    group.bench_function("adjust_head_pose Z", |b| {
        let mut state = ActuatorState::default();
        let mut direction = 1.0;
        b.iter(|| {
            if state.head_pose().z_translation > 0.2 {
                direction = -1.0;
            } else if state.head_pose().z_translation < 0.0 {
                direction = 1.0;
            }
            state.adjust_head_pose(HeadAxis::Z, black_box(direction));
        })
    });

    group.finish();
}

/// Benchmark input arbitration and a full dispatched tick
fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("Teleop Tick");

    let snapshot = InputSnapshot::neutral()
        .with_button(7)
        .with_axis(1, -0.4)
        .with_axis(3, 0.3);
    let mapping = InputMapping::default();

    group.bench_function("interpret", |b| {
        b.iter(|| black_box(interpret(black_box(&snapshot), &mapping)))
    });

    group.bench_function("dispatched tick", |b| {
        let backend = Arc::new(SimulatedBackend::new());
        let config = TeleopConfig::default().with_update_interval(Duration::ZERO);
        let mut teleop = TeleopLoop::new(backend, ActuatorState::default(), config);
        let now = Instant::now();
        b.iter(|| black_box(teleop.tick_at(&snapshot, now)))
    });

    group.finish();
}

criterion_group!(benches, bench_ik_solve, bench_head_pose, bench_tick);
criterion_main!(benches);
