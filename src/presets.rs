//! Hand-tuned scenes.
//!
//! [`portfolio`] is the full scroll-driven landing page: the pointer swarm,
//! two pairs of starfield/streak layers, seven light beams and three brain
//! layers, tied to five page regions. [`dna`] is a standalone double helix.
//! Both serialize to TOML, so they double as scene file templates:
//!
//! ```ignore
//! std::fs::write("scene.toml", presets::portfolio().to_toml_string()?)?;
//! ```

use glam::Vec3;

use crate::binder::{Action, Binding, Mapping, Offset, Target, Transition, TriggerPoint, BODY};
use crate::config::{
    BeamConfig, BeamLayout, BrainConfig, BrainMode, Color, DriftConfig, Pass, RegionConfig,
    SceneConfig, ShapeKind, StreakConfig, SwarmConfig, SystemConfig, SystemKind,
};
use crate::control::ControlField;

pub const PATH_LEFT: &str = "M119.986 0.0078125C119.155 44.5477 109.781 413.008 109.781 443.508C109.781 460.008 103.486 546.947 103.486 558.508C103.486 587.508 95.0459 613.147 59.7812 622.508C-21.2188 644.008 -14.9053 740.008 52.5947 763.008C82.7812 773.294 88.7812 783.008 88.7812 842.008C88.7812 882.408 88.7812 913.841 88.7812 924.508";
pub const PATH_RIGHT: &str = "M0.5 0.0078125C1.65413 61.898 17 410.008 17 431.008C17 452.008 14.8664 499.521 17 519.008C24.5 587.508 95.7826 581.99 149.5 587.508C500 623.508 397 758.008 164.5 774.508C119.235 777.72 50.5 807.508 50.5 864.008C50.5 904.408 50.5 912.841 50.5 923.508";

// Region names
pub const ABOUT: &str = "about";
pub const COMPETENCIES_1: &str = "competencies-1";
pub const COMPETENCIES_2: &str = "competencies-2";
pub const PORTFOLIO: &str = "portfolio";

// System names
pub const SWARM: &str = "swarm";
pub const DRIFT: &str = "drift";
pub const STREAKS: &str = "streaks";
pub const DEEP_DRIFT: &str = "deep-drift";
pub const DEEP_STREAKS: &str = "deep-streaks";
pub const BEAMS: [&str; 6] = ["beam1", "beam2", "beam3", "beam4", "beam5", "beam6"];
pub const BRAIN_BEAM: &str = "brain-beam7";
pub const BRAIN_BASE: &str = "brain-base";
pub const BRAIN_NETWORK: &str = "brain-network";
pub const BRAIN_HIGHLIGHT: &str = "brain-highlight";

/// The scroll-driven landing page.
pub fn portfolio() -> SceneConfig {
    SceneConfig {
        seed: None,
        clock_step: crate::time::DEFAULT_STEP,
        document_height: 8400.0,
        beams: BeamLayout {
            spawn_headroom: 200.0,
            path_left: PATH_LEFT.to_string(),
            path_right: PATH_RIGHT.to_string(),
            ..BeamLayout::default()
        },
        regions: vec![
            region(ABOUT, 2400.0, 1200.0),
            region(COMPETENCIES_1, 3600.0, 1000.0),
            region(COMPETENCIES_2, 4600.0, 1200.0),
            region(PORTFOLIO, 5800.0, 1800.0),
        ],
        systems: portfolio_systems(),
        bindings: portfolio_bindings(),
    }
}

fn portfolio_systems() -> Vec<SystemConfig> {
    let mut systems = vec![
        SystemConfig::new(SWARM, Pass::Backdrop, SystemKind::Swarm(SwarmConfig::default()))
            .running(),
        SystemConfig::new(
            DRIFT,
            Pass::Backdrop,
            SystemKind::Drift(DriftConfig::default()),
        ),
        SystemConfig::new(
            STREAKS,
            Pass::Backdrop,
            SystemKind::Streak(StreakConfig::default()),
        ),
        SystemConfig::new(
            DEEP_DRIFT,
            Pass::Backdrop,
            SystemKind::Drift(DriftConfig {
                count: 10_000,
                color: Color::from_hex(0x5db6ff),
                size: 8.9,
                speed: 60.0,
                max_speed: Some(100.0),
                range_xy: 2500.0,
                range_z: 2800.0,
                bias: Vec3::new(0.3, 0.4, 0.2),
                gated: true,
                ..DriftConfig::default()
            }),
        ),
        SystemConfig::new(
            DEEP_STREAKS,
            Pass::Backdrop,
            SystemKind::Streak(StreakConfig {
                count: 9,
                speed: 80.0,
                max_speed: Some(120.0),
                range_xy: 2000.0,
                range_z: 2800.0,
                gated: true,
                ..StreakConfig::default()
            }),
        ),
    ];

    let beams = [
        (0x7df2ff, 110, 10.0, 0.9, 10.0, 3.0, 0.8, 360.0, 0.8, 1.0, ShapeKind::Straight),
        (0x008cff, 0, 12.0, 1.0, 30.0, 10.0, 0.7, 0.0, 0.5, -0.5, ShapeKind::Straight),
        (0x008cff, 1900, 8.0, 0.6, 25.0, 0.0, 0.8, 600.0, 0.6, 0.0, ShapeKind::Left),
        (0x008cff, 4000, 8.0, 1.2, 25.0, 0.0, 0.9, 800.0, 1.0, 0.0, ShapeKind::Left),
        (0x004aea, 1900, 9.4, 0.9, 90.0, 0.0, 0.6, 1800.0, 0.4, 0.0, ShapeKind::Right),
        (0x379ef3, 100, 14.0, 0.01, 835.0, 75.0, 0.6, 1520.0, 0.9, 0.0, ShapeKind::Right),
    ];
    for (name, b) in BEAMS.iter().zip(beams) {
        let (color, count, size, speed, thickness, noise, opacity, spread, blur, rotation, shape) = b;
        systems.push(light(
            name,
            BeamConfig {
                count,
                color: Color::from_hex(color),
                size,
                speed,
                thickness,
                noise,
                opacity,
                spread,
                blur,
                rotation_speed: rotation,
                shape,
                ..BeamConfig::default()
            },
        ));
    }
    systems.push(light(
        BRAIN_BEAM,
        BeamConfig {
            count: 2000,
            color: Color::from_hex(0x10acb7),
            size: 10.0,
            speed: 0.01,
            thickness: 200.0,
            noise: 105.0,
            opacity: 0.9,
            spread: 0.0,
            blur: 0.8,
            rotation_speed: 0.0,
            shape: ShapeKind::Right,
            ..BeamConfig::default()
        },
    ));

    systems.extend([
        brain(
            BRAIN_BASE,
            BrainConfig {
                image: "assets/brain01.png".into(),
                count: 8000,
                color: Color::from_hex(0x008cff),
                size: 5.5,
                blur: 1.0,
                opacity: 1.0,
                z_offset: 0.0,
                scatter_range: 2500.0,
                mode: BrainMode::Locked,
                ..BrainConfig::default()
            },
        ),
        brain(
            BRAIN_NETWORK,
            BrainConfig {
                image: "assets/brain02.png".into(),
                count: 700,
                color: Color::from_hex(0x005aa4),
                size: 40.5,
                blur: 0.3,
                opacity: 0.6,
                z_offset: 0.0,
                scatter_range: 2000.0,
                mode: BrainMode::Morph,
                ..BrainConfig::default()
            },
        ),
        brain(
            BRAIN_HIGHLIGHT,
            BrainConfig {
                image: "assets/brain03.png".into(),
                count: 2000,
                color: Color::from_hex(0x008c9b),
                size: 8.0,
                blur: 0.0,
                opacity: 0.9,
                z_offset: 1.0,
                scatter_range: 3000.0,
                mode: BrainMode::Flash,
                flash_speed: 7.0,
            },
        ),
    ]);
    systems
}

fn portfolio_bindings() -> Vec<Binding> {
    use ControlField::*;
    use Transition::*;

    let mut bindings = Vec::new();

    // Swarm: grow, then fade and stop
    bindings.push(
        Binding::new(BODY, at(Offset::Px(500.0), Offset::Top), at(Offset::Px(1200.0), Offset::Top), 0.1)
            .write(field(SWARM, Scale), Mapping::EaseIn { from: 1.0, to: 4.0 }),
    );
    bindings.push(
        Binding::new(BODY, at(Offset::Px(1100.0), Offset::Top), at(Offset::Px(1200.0), Offset::Top), 0.1)
            .write(field(SWARM, Opacity), Mapping::Complement)
            .on(Leave, run(SWARM, false))
            .on(EnterBack, run(SWARM, true)),
    );

    // First starfield and streaks fade in
    for (system, start, end) in [(DRIFT, 1000.0, 1300.0), (STREAKS, 800.0, 1700.0)] {
        bindings.push(
            Binding::new(BODY, at(Offset::Px(start), Offset::Top), at(Offset::Px(end), Offset::Top), 0.1)
                .write(field(system, Opacity), Mapping::Identity)
                .on(Enter, run(system, true))
                .on(LeaveBack, run(system, false))
                .on(LeaveBack, set(system, Opacity, 0.0)),
        );
    }

    // About: hand over from the first pair to the deep pair
    let mut about = Binding::new(
        ABOUT,
        at(Offset::Top, Offset::Percent(-25.0)),
        at(Offset::Top, Offset::Percent(-145.0)),
        0.1,
    );
    for (system, knee, base, max) in [(DEEP_DRIFT, 0.375, 60.0, 100.0), (DEEP_STREAKS, 0.2, 80.0, 120.0)] {
        about = about
            .write(field(system, VisibleFraction), Mapping::Rescale { span: 0.72 })
            .write(field(system, Speed), Mapping::SpeedRamp { knee, base, max, span: 0.72 })
            .on(Enter, run(system, true))
            .on(Enter, set(system, Opacity, 1.0))
            .on(LeaveBack, run(system, false))
            .on(LeaveBack, set(system, VisibleFraction, 0.0))
            .on(LeaveBack, set(system, Bend, 0.0))
            .on(LeaveBack, set(system, Opacity, 0.0));
    }
    for system in [DRIFT, STREAKS] {
        about = about
            .write(field(system, Opacity), Mapping::Complement)
            .on(Leave, run(system, false))
            .on(Leave, set(system, Opacity, 0.0))
            .on(EnterBack, run(system, true));
    }
    bindings.push(about);

    // Competencies: deep pair thins out and bends upward
    let mut thin = Binding::new(
        COMPETENCIES_1,
        at(Offset::Top, Offset::Px(-80.0)),
        at(Offset::Top, Offset::Px(-680.0)),
        0.1,
    );
    let mut bend = Binding::new(
        COMPETENCIES_1,
        at(Offset::Top, Offset::Percent(97.0)),
        at(Offset::Top, Offset::Px(-120.0)),
        0.1,
    );
    for system in [DEEP_DRIFT, DEEP_STREAKS] {
        thin = thin
            .write(field(system, VisibleFraction), Mapping::Complement)
            .write(field(system, Opacity), Mapping::Constant { value: 1.0 });
        bend = bend
            .write(field(system, Bend), Mapping::Identity)
            .on(LeaveBack, set(system, Bend, 0.0));
    }
    bindings.push(thin);
    bindings.push(bend);

    // Beams switch on past the first competencies block
    let mut switch = Binding::new(
        COMPETENCIES_1,
        at(Offset::Bottom, Offset::Px(100.0)),
        TriggerPoint::Max,
        0.0,
    );
    for beam in BEAMS {
        switch = switch.on(Enter, run(beam, true)).on(LeaveBack, run(beam, false));
    }
    bindings.push(switch.on(LeaveBack, run(BRAIN_BEAM, false)));

    // Scatter toward the portfolio, brain beam grows in
    bindings.push(
        Binding::new(PORTFOLIO, at(Offset::Top, Offset::Px(320.0)), at(Offset::Top, Offset::Px(100.0)), 0.1)
            .write(Target::Scatter, Mapping::Identity)
            .write(field(BRAIN_BEAM, Density), Mapping::Identity)
            .write(field(BRAIN_BEAM, Opacity), Mapping::Identity)
            .on(Enter, run(BRAIN_BEAM, true))
            .on(LeaveBack, run(BRAIN_BEAM, false))
            .on(LeaveBack, set(BRAIN_BEAM, Density, 0.0))
            .on(LeaveBack, set(BRAIN_BEAM, Opacity, 0.0)),
    );

    // Beams fade out and stop drawing
    let mut fade = Binding::new(
        PORTFOLIO,
        at(Offset::Top, Offset::Px(-20.0)),
        at(Offset::Top, Offset::Px(-320.0)),
        0.1,
    );
    for beam in ["beam1", "beam3", "beam5", "beam6", "beam4"] {
        fade = fade
            .write(field(beam, Opacity), Mapping::Complement)
            .on(Leave, draw(beam, false))
            .on(EnterBack, draw(beam, true));
    }
    bindings.push(fade);

    // Staggered beam entry: density and opacity, then flow
    let stages: [(&[&str], f32, f32, f32); 3] = [
        (&["beam1", "beam2"], 100.0, -200.0, 100.0),
        (&["beam3", "beam4"], 0.0, -340.0, -100.0),
        (&["beam5", "beam6"], -200.0, -400.0, -200.0),
    ];
    for (i, (pair, start, end, flow_start)) in stages.into_iter().enumerate() {
        let mut density = Binding::new(
            COMPETENCIES_2,
            at(Offset::Top, Offset::Px(start)),
            at(Offset::Top, Offset::Px(end)),
            0.0,
        );
        let mut flow = Binding::new(
            COMPETENCIES_2,
            at(Offset::Top, Offset::Px(flow_start)),
            at(Offset::Bottom, Offset::Top),
            0.0,
        );
        for beam in pair {
            density = density
                .write(field(beam, Density), Mapping::Identity)
                .write(field(beam, Opacity), Mapping::Identity);
            flow = flow.write(field(beam, FlowLimit), Mapping::Identity);
        }
        if i == 2 {
            flow = flow.write(field(BRAIN_BEAM, FlowLimit), Mapping::Identity);
        }
        bindings.push(density);
        bindings.push(flow);
    }

    // Brain layers
    let layers = [
        (BRAIN_BASE, -320.0, -440.0),
        (BRAIN_NETWORK, 100.0, -300.0),
        (BRAIN_HIGHLIGHT, -400.0, -480.0),
    ];
    for (layer, start, end) in layers {
        let mut binding = Binding::new(
            PORTFOLIO,
            at(Offset::Top, Offset::Px(start)),
            at(Offset::Top, Offset::Px(end)),
            0.1,
        )
        .write(field(layer, Opacity), Mapping::Identity);
        if layer == BRAIN_NETWORK {
            binding = binding.write(field(layer, Mix), Mapping::Identity);
        }
        bindings.push(
            binding
                .on(Enter, run(layer, true))
                .on(LeaveBack, run(layer, false))
                .on(LeaveBack, set(layer, Opacity, 0.0)),
        );
    }

    bindings
}

/// Two glowing helix arms turning around the light camera's axis.
pub fn dna() -> SceneConfig {
    let arm = |color, count, size, speed, rotation, radius: f32, noise, opacity| BeamConfig {
        count,
        color: Color::from_hex(color),
        size,
        speed,
        thickness: radius * 0.4,
        noise,
        opacity,
        spread: 360.0,
        blur: 0.8,
        rotation_speed: rotation,
        shape: ShapeKind::Helix,
        arm_radius: radius,
        twist: 0.005,
    };

    let arms = [
        ("arm-inner", arm(0x7cf4ff, 2000, 3.5, 4.0, 1.33, 60.0, 5.0, 0.8)),
        ("arm-outer", arm(0x26c2ff, 4000, 2.5, 5.5, 2.0, 90.0, 8.0, 0.7)),
    ];

    let mut show = Binding::new(
        BODY,
        at(Offset::Top, Offset::Top),
        TriggerPoint::Max,
        0.0,
    );
    let mut systems = Vec::new();
    for (name, cfg) in arms {
        systems.push(light(name, cfg).running());
        for f in [ControlField::Density, ControlField::FlowLimit, ControlField::Opacity] {
            show = show.on(Transition::Enter, set(name, f, 1.0));
        }
    }

    SceneConfig {
        seed: None,
        clock_step: crate::time::DEFAULT_STEP,
        document_height: 0.0,
        beams: BeamLayout::default(),
        regions: Vec::new(),
        systems,
        bindings: vec![show],
    }
}

fn region(name: &str, top: f32, height: f32) -> RegionConfig {
    RegionConfig {
        name: name.to_string(),
        top,
        height,
    }
}

fn light(name: &str, cfg: BeamConfig) -> SystemConfig {
    SystemConfig::new(name, Pass::Light, SystemKind::Beam(cfg))
}

fn brain(name: &str, cfg: BrainConfig) -> SystemConfig {
    SystemConfig::new(name, Pass::Backdrop, SystemKind::Brain(cfg))
}

fn at(element: Offset, viewport: Offset) -> TriggerPoint {
    TriggerPoint::align(element, viewport)
}

fn field(system: &str, field: ControlField) -> Target {
    Target::system(system, field)
}

fn run(system: &str, value: bool) -> Action {
    Action::SetRunning {
        system: system.to_string(),
        value,
    }
}

fn draw(system: &str, value: bool) -> Action {
    Action::SetDrawn {
        system: system.to_string(),
        value,
    }
}

fn set(system: &str, field: ControlField, value: f32) -> Action {
    Action::Write {
        target: Target::system(system, field),
        value,
    }
}
