//! Integration tests for the falling-beam cycle.
//!
//! These drive a [`BeamSystem`] through many frames with fixed bounds and
//! check the respawn and visibility rules from the outside.

use std::sync::Arc;

use lumenscroll::camera::LightBounds;
use lumenscroll::config::{BeamConfig, BeamLayout, ShapeKind};
use lumenscroll::control::ControlField;
use lumenscroll::families::beam::{BeamShape, BeamSystem, MAX_OVERSHOOT};
use lumenscroll::families::FrameInput;
use lumenscroll::input::{MouseTrail, Pointer};
use lumenscroll::path::PathTable;
use lumenscroll::spawn::SpawnContext;

const FLOOR: f32 = -50.0;
const CEILING: f32 = 50.0;

fn bounds() -> LightBounds {
    LightBounds::with_range(FLOOR, CEILING, 1.0)
}

fn layout() -> BeamLayout {
    BeamLayout {
        spawn_headroom: 0.0,
        ..BeamLayout::default()
    }
}

fn beam(config: BeamConfig, seed: u64) -> BeamSystem {
    let left = Arc::new(PathTable::from_svg("M0 0 C40 20 60 60 10 100"));
    let right = Arc::new(PathTable::from_svg("M0 0 L 30 100"));
    let shape = BeamShape::from_config(&config, &left, &right);
    let mut spawn = SpawnContext::from_seed(seed);
    BeamSystem::new(config, shape, &bounds(), &layout(), &mut spawn)
}

fn step(system: &mut BeamSystem, frame: usize) {
    let pointer = Pointer::default();
    let trail = MouseTrail::new(1);
    system.update(&FrameInput {
        time: frame as f32 * 0.015,
        step: 0.015,
        scatter: 0.0,
        bounds: bounds(),
        scroll: 0.0,
        pointer: &pointer,
        trail: &trail,
    });
}

// ============================================================================
// Respawn
// ============================================================================

#[test]
fn test_hundred_particles_wrap_within_bounds() {
    let mut b = beam(
        BeamConfig {
            count: 100,
            speed: 1.0,
            ..BeamConfig::default()
        },
        42,
    );

    let start: Vec<f32> = b.heights().to_vec();
    let mut wrapped = vec![false; 100];
    let mut previous = start.clone();

    for frame in 0..100 {
        step(&mut b, frame);
        for (i, h) in b.heights().iter().enumerate() {
            assert!(
                *h >= FLOOR && *h <= CEILING + MAX_OVERSHOOT,
                "particle {i} at {h} after frame {frame}"
            );
            if *h > previous[i] {
                wrapped[i] = true;
            }
            previous[i] = *h;
        }
    }

    // Anyone whose total fall exceeds its distance to the floor has respawned
    for (i, seed) in b.seeds().iter().enumerate() {
        if 100.0 * seed.speed > start[i] - FLOOR + 1e-3 {
            assert!(wrapped[i], "particle {i} never wrapped");
        }
    }
    assert!(wrapped.iter().filter(|w| **w).count() > 50);
}

#[test]
fn test_fast_shapes_never_leave_range() {
    for (shape, seed) in [
        (ShapeKind::Straight, 1),
        (ShapeKind::Left, 2),
        (ShapeKind::Right, 3),
        (ShapeKind::Helix, 4),
    ] {
        let mut b = beam(
            BeamConfig {
                count: 300,
                speed: 7.5,
                shape,
                arm_radius: 20.0,
                ..BeamConfig::default()
            },
            seed,
        );
        b.control.set(ControlField::Density, 1.0);
        b.control.set(ControlField::FlowLimit, 1.0);
        for frame in 0..250 {
            step(&mut b, frame);
            assert!(b
                .heights()
                .iter()
                .all(|h| *h >= FLOOR && *h <= CEILING + MAX_OVERSHOOT));
        }
    }
}

// ============================================================================
// Visibility
// ============================================================================

#[test]
fn test_density_cutoff_is_a_prefix() {
    let mut b = beam(
        BeamConfig {
            count: 120,
            speed: 0.3,
            ..BeamConfig::default()
        },
        9,
    );
    b.control.set(ControlField::Density, 0.5);
    b.control.set(ControlField::FlowLimit, 1.0);
    step(&mut b, 0);

    let buffer = b.buffer();
    assert!((60..120).all(|i| buffer.is_hidden(i)));

    // With the flow fully open, only the soft edge above the floor can hide
    // a particle below the cutoff
    let layout = layout();
    for i in 0..60 {
        let h = b.heights()[i];
        let threshold = FLOOR + b.seeds()[i].fade_random * layout.fade_range;
        assert_eq!(buffer.is_hidden(i), h < threshold, "particle {i}");
    }
}

#[test]
fn test_closed_flow_hides_everything() {
    let mut b = beam(
        BeamConfig {
            count: 80,
            speed: 1.0,
            ..BeamConfig::default()
        },
        11,
    );
    b.control.set(ControlField::Density, 1.0);
    b.control.set(ControlField::FlowLimit, 0.0);
    for frame in 0..20 {
        step(&mut b, frame);
        let buffer = b.buffer();
        for (i, h) in b.heights().iter().enumerate() {
            // Threshold sits at or above the ceiling
            if *h < CEILING {
                assert!(buffer.is_hidden(i));
            }
        }
    }
}

#[test]
fn test_same_seed_same_frames() {
    let config = BeamConfig {
        count: 64,
        speed: 2.0,
        shape: ShapeKind::Left,
        ..BeamConfig::default()
    };
    let mut a = beam(config.clone(), 77);
    let mut b = beam(config, 77);
    for s in [&mut a, &mut b] {
        s.control.set(ControlField::Density, 1.0);
        s.control.set(ControlField::FlowLimit, 1.0);
    }
    for frame in 0..50 {
        step(&mut a, frame);
        step(&mut b, frame);
        assert_eq!(a.buffer().positions(), b.buffer().positions());
    }
}
