//! Benchmarks for the CPU side of a frame.
//!
//! Run with: `cargo bench`

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use lumenscroll::camera::LightBounds;
use lumenscroll::config::{BeamConfig, BeamLayout, ShapeKind, SwarmConfig};
use lumenscroll::control::ControlField;
use lumenscroll::driver::{FrameDriver, NullRenderer};
use lumenscroll::families::beam::{BeamShape, BeamSystem};
use lumenscroll::families::swarm::SwarmSystem;
use lumenscroll::families::FrameInput;
use lumenscroll::input::{MouseTrail, Pointer};
use lumenscroll::path::PathTable;
use lumenscroll::presets;
use lumenscroll::spawn::SpawnContext;

fn bench_path_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_table");

    group.bench_function("from_svg", |b| {
        b.iter(|| black_box(PathTable::from_svg(black_box(presets::PATH_LEFT))))
    });

    let table = PathTable::from_svg(presets::PATH_LEFT);
    group.bench_function("offset_at", |b| {
        b.iter(|| {
            let mut sum = 0.0;
            for px in 0..1000 {
                sum += table.offset_at(px as f32 * 0.93);
            }
            black_box(sum)
        })
    });

    group.finish();
}

fn bench_beam_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("beam_update");
    let bounds = LightBounds::with_range(-400.0, 400.0, 1.0);
    let left = Arc::new(PathTable::from_svg(presets::PATH_LEFT));
    let right = Arc::new(PathTable::from_svg(presets::PATH_RIGHT));
    let pointer = Pointer::default();
    let trail = MouseTrail::new(1);

    for shape in [ShapeKind::Straight, ShapeKind::Left, ShapeKind::Helix] {
        let config = BeamConfig {
            count: 2000,
            shape,
            noise: 4.0,
            ..BeamConfig::default()
        };
        let beam_shape = BeamShape::from_config(&config, &left, &right);
        let mut spawn = SpawnContext::from_seed(3);
        let mut beam =
            BeamSystem::new(config, beam_shape, &bounds, &BeamLayout::default(), &mut spawn);
        beam.control.set(ControlField::Density, 1.0);
        beam.control.set(ControlField::FlowLimit, 1.0);

        group.bench_with_input(
            BenchmarkId::new("shape", format!("{shape:?}")),
            &shape,
            |b, _| {
                let mut frame = 0u32;
                b.iter(|| {
                    frame = frame.wrapping_add(1);
                    beam.update(&FrameInput {
                        time: frame as f32 * 0.015,
                        step: 0.015,
                        scatter: 0.0,
                        bounds,
                        scroll: 0.0,
                        pointer: &pointer,
                        trail: &trail,
                    });
                })
            },
        );
    }

    group.finish();
}

fn bench_swarm_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("swarm_update");
    let bounds = LightBounds::with_range(-400.0, 400.0, 1.0);
    let pointer = Pointer::default();

    for count in [10_000, 60_000] {
        let mut spawn = SpawnContext::from_seed(5);
        let mut swarm = SwarmSystem::new(
            SwarmConfig {
                count,
                ..SwarmConfig::default()
            },
            &mut spawn,
        );
        let mut trail = MouseTrail::new(90);
        for i in 0..90 {
            trail.push(glam::Vec3::new(i as f32 * 4.0, 100.0, 0.0));
        }

        group.bench_with_input(BenchmarkId::new("particles", count), &count, |b, _| {
            let mut frame = 0u32;
            b.iter(|| {
                frame = frame.wrapping_add(1);
                swarm.update(&FrameInput {
                    time: frame as f32 * 0.015,
                    step: 0.015,
                    scatter: 0.0,
                    bounds,
                    scroll: 0.0,
                    pointer: &pointer,
                    trail: &trail,
                });
            })
        });
    }

    group.finish();
}

fn bench_portfolio_frame(c: &mut Criterion) {
    let mut scene = presets::portfolio();
    scene.seed = Some(1);
    let mut driver = FrameDriver::from_scene(&scene, 1280.0, 720.0);
    let max = driver.max_scroll();

    c.bench_function("portfolio_frame", |b| {
        let mut scroll = 0.0;
        b.iter(|| {
            scroll = (scroll + 37.0) % max;
            driver.tick(black_box(scroll), 1.0 / 60.0, &mut NullRenderer);
        })
    });
}

criterion_group!(
    benches,
    bench_path_table,
    bench_beam_update,
    bench_swarm_update,
    bench_portfolio_frame
);
criterion_main!(benches);
