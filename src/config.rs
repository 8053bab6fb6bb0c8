//! Typed configuration records for every particle family.
//!
//! Each family gets one record with named fields. Records derive serde so a
//! whole scene can live in a TOML file; `#[serde(default)]` on every record
//! means a scene file only has to spell out what differs from the defaults.
//!
//! ```toml
//! [[systems]]
//! name = "beam1"
//! pass = "light"
//!
//! [systems.kind]
//! family = "beam"
//! count = 110
//! color = "#7df2ff"
//! shape = "straight"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::binder::Binding;
use crate::error::{ColorError, SceneError};

// ========== Color ==========

/// An RGB color written as `#rrggbb` in scene files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
}

impl Color {
    /// Color from a packed `0xRRGGBB` value.
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn parse(s: &str) -> Result<Self, ColorError> {
        let digits = s.trim().trim_start_matches('#');
        if digits.len() != 6 {
            return Err(ColorError(s.to_string()));
        }
        u32::from_str_radix(digits, 16)
            .map(Self::from_hex)
            .map_err(|_| ColorError(s.to_string()))
    }

    /// Linear 0-1 RGB components.
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r as f32, self.g as f32, self.b as f32) / 255.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::from_hex(0x008cff)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Color {
    type Error = ColorError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

// ========== Shared enums ==========

/// Which of the two camera/scene pairs a system is drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pass {
    /// Wide-angle backdrop camera (swarm, starfields, streaks, brain clouds).
    #[default]
    Backdrop,
    /// Narrow light camera whose bounds define the beam column.
    Light,
}

/// Sprite used to draw each point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sprite {
    /// White core fading to transparent; `blur` widens the falloff.
    #[default]
    Blurry,
    /// Tighter core used by the brain clouds.
    Brain,
    /// White core with a blue-green halo.
    Glowing,
    /// Soft disc with a `(1 - 2d)^1.5` falloff.
    SoftDisc,
}

/// How a blended system combines with what is already drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Blend {
    /// Source-over alpha blending.
    #[default]
    Normal,
    /// Additive glow.
    Additive,
}

/// Geometry family of a beam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    /// Vertical column with no lateral offset.
    #[default]
    Straight,
    /// Follows the left path table, mirrored to the left.
    Left,
    /// Follows the right path table.
    Right,
    /// Fixed-radius twisting arm.
    Helix,
}

// ========== Family records ==========

/// A falling/spiral/arc beam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamConfig {
    pub count: usize,
    pub color: Color,
    /// Attenuated point size. The rendered sprite edge is
    /// `size * tan(fov / 2)` world units, for every family.
    pub size: f32,
    /// Height lost per frame, in world units.
    pub speed: f32,
    /// Width of the radius jitter band.
    pub thickness: f32,
    /// Amplitude of the sinusoidal wobble.
    pub noise: f32,
    pub opacity: f32,
    /// Total angular spread of particle phases, in degrees.
    pub spread: f32,
    pub blur: f32,
    /// Radians per unit of clock time.
    pub rotation_speed: f32,
    pub shape: ShapeKind,
    /// Arm radius for [`ShapeKind::Helix`].
    pub arm_radius: f32,
    /// Extra twist per unit of height for [`ShapeKind::Helix`].
    pub twist: f32,
}

impl Default for BeamConfig {
    fn default() -> Self {
        Self {
            count: 1000,
            color: Color::default(),
            size: 8.0,
            speed: 1.0,
            thickness: 10.0,
            noise: 0.0,
            opacity: 0.8,
            spread: 360.0,
            blur: 0.5,
            rotation_speed: 0.0,
            shape: ShapeKind::Straight,
            arm_radius: 60.0,
            twist: 0.005,
        }
    }
}

/// Settings shared by every beam: the curves and the light camera layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamLayout {
    /// Light camera distance from the origin plane.
    pub camera_z: f32,
    /// Vertical field of view of the light camera, in degrees.
    pub fov: f32,
    /// Distance of the beam floor above the viewport bottom, in screen pixels.
    pub floor_offset: f32,
    /// Height band over which particles fade out near the flow cutoff.
    pub fade_range: f32,
    /// Extra height above the ceiling that initial spawns may use.
    pub spawn_headroom: f32,
    /// SVG path for [`ShapeKind::Left`] beams.
    pub path_left: String,
    /// SVG path for [`ShapeKind::Right`] beams.
    pub path_right: String,
}

impl Default for BeamLayout {
    fn default() -> Self {
        Self {
            camera_z: 1000.0,
            fov: 60.0,
            floor_offset: 80.0,
            fade_range: 300.0,
            spawn_headroom: 0.0,
            path_left: String::new(),
            path_right: String::new(),
        }
    }
}

/// The mouse-following swarm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    pub count: usize,
    pub color: Color,
    pub size: f32,
    pub opacity: f32,
    /// Capacity of the pointer history.
    pub trail_length: usize,
    /// Follow speed of particles near the head of the trail.
    pub speed_fast: f32,
    /// Follow speed of particles near the tail.
    pub speed_slow: f32,
    pub scatter_head: f32,
    pub scatter_tail: f32,
    pub sphere_radius: f32,
    /// Seconds without pointer movement before the swarm goes idle.
    pub idle_timeout: f32,
    pub return_speed: f32,
    pub ripple_intensity: f32,
    pub ripple_speed: f32,
    pub ripple_frequency: f32,
    /// Scroll offset past which the swarm ignores the pointer.
    pub unbind_scroll: f32,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            count: 60_000,
            color: Color::from_hex(0x008cff),
            size: 4.4,
            opacity: 0.7,
            trail_length: 90,
            speed_fast: 0.6,
            speed_slow: 0.3,
            scatter_head: 1.0,
            scatter_tail: 200.0,
            sphere_radius: 800.0,
            idle_timeout: 0.8,
            return_speed: 0.02,
            ripple_intensity: 255.0,
            ripple_speed: 1.7,
            ripple_frequency: 0.026,
            unbind_scroll: 680.0,
        }
    }
}

/// A wrapping starfield drifting along Z.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    pub count: usize,
    pub color: Color,
    pub size: f32,
    pub opacity: f32,
    pub speed: f32,
    /// Upper bound for scroll-ramped speed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_speed: Option<f32>,
    pub range_xy: f32,
    pub range_z: f32,
    /// Shift of the spawn box per axis, as a fraction of the half extent.
    pub bias: Vec3,
    /// `1.0` flies toward the camera, `-1.0` away.
    pub direction: f32,
    /// Hide particles whose random rank exceeds the visible fraction.
    pub gated: bool,
    /// Height gained at the far end of the field at full bend.
    pub bend_lift: f32,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            count: 4000,
            color: Color::default(),
            size: 4.4,
            opacity: 1.0,
            speed: 20.0,
            max_speed: None,
            range_xy: 2500.0,
            range_z: 600.0,
            bias: Vec3::ZERO,
            direction: 1.0,
            gated: false,
            bend_lift: 3600.0,
        }
    }
}

/// Comet lines: head/tail vertex pairs drifting along Z.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreakConfig {
    pub count: usize,
    pub color: Color,
    pub opacity: f32,
    pub speed: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_speed: Option<f32>,
    pub range_xy: f32,
    pub range_z: f32,
    /// Base tail length; each streak stretches it by `1 + r.x`.
    pub streak_length: f32,
    pub direction: f32,
    pub gated: bool,
    pub bend_lift: f32,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            count: 6,
            color: Color::default(),
            opacity: 1.0,
            speed: 40.0,
            max_speed: None,
            range_xy: 2000.0,
            range_z: 3000.0,
            streak_length: 200.0,
            direction: 1.0,
            gated: false,
            bend_lift: 30000.0,
        }
    }
}

/// Update rule of an image-sampled cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrainMode {
    /// Points sit on their image targets.
    #[default]
    Locked,
    /// Points blend from their scatter start to the target by `mix`.
    Morph,
    /// Locked, with per-point twinkling alpha.
    Flash,
}

/// An image-sampled point cloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainConfig {
    /// Image to sample. Relative paths resolve against the scene file.
    pub image: PathBuf,
    /// Maximum number of sampled points.
    pub count: usize,
    pub color: Color,
    pub size: f32,
    pub blur: f32,
    pub opacity: f32,
    pub z_offset: f32,
    /// Width of the random start box in X and Y.
    pub scatter_range: f32,
    pub mode: BrainMode,
    pub flash_speed: f32,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            image: PathBuf::new(),
            count: 2000,
            color: Color::default(),
            size: 8.0,
            blur: 0.5,
            opacity: 1.0,
            z_offset: 0.0,
            scatter_range: 2500.0,
            mode: BrainMode::Locked,
            flash_speed: 7.0,
        }
    }
}

// ========== Scene ==========

/// Family-specific configuration of one system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum SystemKind {
    Beam(BeamConfig),
    Swarm(SwarmConfig),
    Drift(DriftConfig),
    Streak(StreakConfig),
    Brain(BrainConfig),
}

/// A named system in a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Name the binder addresses the system by.
    pub name: String,
    #[serde(default)]
    pub pass: Pass,
    /// Whether the system updates from the first frame.
    #[serde(default)]
    pub running: bool,
    pub kind: SystemKind,
}

impl SystemConfig {
    pub fn new(name: impl Into<String>, pass: Pass, kind: SystemKind) -> Self {
        Self {
            name: name.into(),
            pass,
            running: false,
            kind,
        }
    }

    /// Mark the system as running from the first frame.
    pub fn running(mut self) -> Self {
        self.running = true;
        self
    }
}

/// Host page geometry: named regions the bindings refer to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub name: String,
    /// Document offset of the region's top edge.
    pub top: f32,
    pub height: f32,
}

/// A complete scene: systems, bindings and layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Seed for every random draw. `None` seeds from entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Per-frame clock increment.
    pub clock_step: f32,
    /// Total scrollable document height.
    pub document_height: f32,
    pub beams: BeamLayout,
    pub regions: Vec<RegionConfig>,
    pub systems: Vec<SystemConfig>,
    pub bindings: Vec<Binding>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            seed: None,
            clock_step: crate::time::DEFAULT_STEP,
            document_height: 0.0,
            beams: BeamLayout::default(),
            regions: Vec::new(),
            systems: Vec::new(),
            bindings: Vec::new(),
        }
    }
}

impl SceneConfig {
    /// Parse a scene from TOML text.
    ///
    /// Numeric fields outside their domain are clamped, see
    /// [`SceneConfig::clamped`].
    pub fn from_toml_str(text: &str) -> Result<Self, SceneError> {
        let scene: Self = toml::from_str(text)?;
        Ok(scene.clamped())
    }

    /// Load a scene file. Relative brain image paths are resolved against
    /// the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut scene = Self::from_toml_str(&text)?;
        if let Some(dir) = path.parent() {
            scene.resolve_images(dir);
        }
        Ok(scene)
    }

    /// Serialize to TOML text.
    pub fn to_toml_string(&self) -> Result<String, SceneError> {
        Ok(toml::to_string(self)?)
    }

    /// Look up a system by name.
    pub fn system(&self, name: &str) -> Option<&SystemConfig> {
        self.systems.iter().find(|s| s.name == name)
    }

    fn resolve_images(&mut self, dir: &Path) {
        for system in &mut self.systems {
            if let SystemKind::Brain(brain) = &mut system.kind {
                if brain.image.is_relative() && !brain.image.as_os_str().is_empty() {
                    brain.image = dir.join(&brain.image);
                }
            }
        }
    }
}

// ========== Validation ==========

/// `v` clamped to `[0, ∞)`. NaN becomes 0.
fn non_negative(v: f32) -> f32 {
    v.max(0.0)
}

/// `v` clamped to `[0, 1]`. NaN becomes 0.
fn unit(v: f32) -> f32 {
    v.max(0.0).min(1.0)
}

/// Smallest Z extent of a wrapping field.
const MIN_RANGE_Z: f32 = 1.0;

impl BeamConfig {
    /// Clamp every field to its domain.
    pub fn clamped(self) -> Self {
        Self {
            size: non_negative(self.size),
            speed: non_negative(self.speed),
            thickness: non_negative(self.thickness),
            noise: non_negative(self.noise),
            opacity: unit(self.opacity),
            spread: non_negative(self.spread),
            blur: unit(self.blur),
            rotation_speed: if self.rotation_speed.is_finite() {
                self.rotation_speed
            } else {
                0.0
            },
            arm_radius: non_negative(self.arm_radius),
            ..self
        }
    }
}

impl BeamLayout {
    pub fn clamped(self) -> Self {
        Self {
            camera_z: self.camera_z.max(1.0),
            fov: self.fov.max(1.0).min(179.0),
            floor_offset: non_negative(self.floor_offset),
            fade_range: non_negative(self.fade_range),
            spawn_headroom: non_negative(self.spawn_headroom),
            ..self
        }
    }
}

impl SwarmConfig {
    pub fn clamped(self) -> Self {
        Self {
            size: non_negative(self.size),
            opacity: unit(self.opacity),
            trail_length: self.trail_length.max(1),
            speed_fast: unit(self.speed_fast),
            speed_slow: unit(self.speed_slow),
            scatter_head: non_negative(self.scatter_head),
            scatter_tail: non_negative(self.scatter_tail),
            sphere_radius: non_negative(self.sphere_radius),
            idle_timeout: non_negative(self.idle_timeout),
            return_speed: unit(self.return_speed),
            ripple_intensity: non_negative(self.ripple_intensity),
            ripple_speed: non_negative(self.ripple_speed),
            ripple_frequency: non_negative(self.ripple_frequency),
            ..self
        }
    }
}

/// `-1.0` for negative directions, `1.0` otherwise.
fn direction_sign(direction: f32) -> f32 {
    if direction < 0.0 {
        -1.0
    } else {
        1.0
    }
}

impl DriftConfig {
    pub fn clamped(self) -> Self {
        let speed = non_negative(self.speed);
        Self {
            size: non_negative(self.size),
            opacity: unit(self.opacity),
            speed,
            max_speed: self.max_speed.map(|m| m.max(speed)),
            range_xy: non_negative(self.range_xy),
            range_z: self.range_z.max(MIN_RANGE_Z),
            direction: direction_sign(self.direction),
            bend_lift: non_negative(self.bend_lift),
            ..self
        }
    }
}

impl StreakConfig {
    pub fn clamped(self) -> Self {
        let speed = non_negative(self.speed);
        Self {
            opacity: unit(self.opacity),
            speed,
            max_speed: self.max_speed.map(|m| m.max(speed)),
            range_xy: non_negative(self.range_xy),
            range_z: self.range_z.max(MIN_RANGE_Z),
            streak_length: non_negative(self.streak_length),
            direction: direction_sign(self.direction),
            bend_lift: non_negative(self.bend_lift),
            ..self
        }
    }
}

impl BrainConfig {
    pub fn clamped(self) -> Self {
        Self {
            size: non_negative(self.size),
            blur: unit(self.blur),
            opacity: unit(self.opacity),
            scatter_range: non_negative(self.scatter_range),
            flash_speed: non_negative(self.flash_speed),
            ..self
        }
    }
}

impl SystemKind {
    pub fn clamped(self) -> Self {
        match self {
            Self::Beam(c) => Self::Beam(c.clamped()),
            Self::Swarm(c) => Self::Swarm(c.clamped()),
            Self::Drift(c) => Self::Drift(c.clamped()),
            Self::Streak(c) => Self::Streak(c.clamped()),
            Self::Brain(c) => Self::Brain(c.clamped()),
        }
    }
}

impl SceneConfig {
    /// Clamp every numeric field of the scene, its layout and its systems
    /// to its domain. Valid scenes come back unchanged.
    pub fn clamped(self) -> Self {
        Self {
            clock_step: non_negative(self.clock_step),
            document_height: non_negative(self.document_height),
            beams: self.beams.clamped(),
            regions: self
                .regions
                .into_iter()
                .map(|r| RegionConfig {
                    height: non_negative(r.height),
                    ..r
                })
                .collect(),
            systems: self
                .systems
                .into_iter()
                .map(|s| SystemConfig {
                    kind: s.kind.clamped(),
                    ..s
                })
                .collect(),
            ..self
        }
    }
}
