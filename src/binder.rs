//! Scroll-to-parameter bindings.
//!
//! A [`Binding`] ties a scroll range, expressed as two [`TriggerPoint`]s
//! against a named page region, to a list of control writes and a list of
//! transition callbacks. The [`Binder`] evaluates every binding once per
//! frame:
//!
//! 1. Resolve start and end to scroll offsets. Bindings whose region is
//!    unknown are skipped.
//! 2. Raw progress is `clamp((scroll - start) / (end - start), 0, 1)`.
//! 3. Smoothed progress approaches raw progress with time constant `scrub`
//!    seconds (`0` follows immediately).
//! 4. If the smoothed progress changed, every write is applied through its
//!    [`Mapping`].
//! 5. Crossing the start or end fires `Enter`, `Leave`, `EnterBack` or
//!    `LeaveBack` callbacks, based on raw scroll.
//!
//! Writes run before callbacks, so a `LeaveBack` reset wins over the last
//! progress write of the same frame.
//!
//! ```ignore
//! let mut binder = Binder::new(scene.bindings.clone());
//! binder.update(scroll, dt, &regions, &mut context);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::RegionConfig;
use crate::control::ControlField;
use crate::error::TriggerError;

/// Distance below which smoothed progress snaps to the raw value.
const SNAP_EPSILON: f32 = 1e-4;

/// Name of the implicit region spanning the whole document.
pub const BODY: &str = "body";

// ========== Trigger points ==========

/// A position along an element or the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Offset {
    Top,
    Center,
    Bottom,
    /// Pixels below the top.
    Px(f32),
    /// Percent of the extent below the top.
    Percent(f32),
}

impl Offset {
    /// Distance from the top for an extent of `extent` pixels.
    pub fn resolve(self, extent: f32) -> f32 {
        match self {
            Offset::Top => 0.0,
            Offset::Center => extent * 0.5,
            Offset::Bottom => extent,
            Offset::Px(px) => px,
            Offset::Percent(pct) => extent * pct / 100.0,
        }
    }
}

impl FromStr for Offset {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => return Ok(Offset::Top),
            "center" => return Ok(Offset::Center),
            "bottom" => return Ok(Offset::Bottom),
            _ => {}
        }
        if let Some(pct) = s.strip_suffix('%') {
            return pct.parse().map(Offset::Percent).map_err(|_| ());
        }
        s.strip_suffix("px")
            .unwrap_or(s)
            .parse()
            .map(Offset::Px)
            .map_err(|_| ())
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Offset::Top => f.write_str("top"),
            Offset::Center => f.write_str("center"),
            Offset::Bottom => f.write_str("bottom"),
            Offset::Px(px) => write!(f, "{px}px"),
            Offset::Percent(pct) => write!(f, "{pct}%"),
        }
    }
}

/// Where a binding starts or ends.
///
/// Written as `"<element> <viewport>"`: the binding is at this point when the
/// given position on the region lines up with the given position on the
/// viewport. `"top 320px"` is reached when the region's top is 320px below
/// the viewport top; `"500px top"` when the point 500px into the region
/// reaches the viewport top. `"max"` is the end of the document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TriggerPoint {
    Align { element: Offset, viewport: Offset },
    Max,
}

impl TriggerPoint {
    pub const fn align(element: Offset, viewport: Offset) -> Self {
        TriggerPoint::Align { element, viewport }
    }

    /// Scroll offset at which this point is reached.
    pub fn resolve(&self, region: Region, viewport_height: f32, max_scroll: f32) -> f32 {
        match self {
            TriggerPoint::Align { element, viewport } => {
                region.top + element.resolve(region.height) - viewport.resolve(viewport_height)
            }
            TriggerPoint::Max => max_scroll,
        }
    }
}

impl FromStr for TriggerPoint {
    type Err = TriggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || TriggerError(s.to_string());
        let mut parts = s.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some("max"), None, None) => Ok(TriggerPoint::Max),
            (Some(element), Some(viewport), None) => Ok(TriggerPoint::Align {
                element: element.parse().map_err(|_| err())?,
                viewport: viewport.parse().map_err(|_| err())?,
            }),
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for TriggerPoint {
    type Error = TriggerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TriggerPoint> for String {
    fn from(t: TriggerPoint) -> Self {
        t.to_string()
    }
}

impl fmt::Display for TriggerPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerPoint::Align { element, viewport } => write!(f, "{element} {viewport}"),
            TriggerPoint::Max => f.write_str("max"),
        }
    }
}

// ========== Regions ==========

/// Document geometry of one page region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub top: f32,
    pub height: f32,
}

/// Named regions plus the viewport and document size.
///
/// A `body` region covering the whole document is always present.
#[derive(Debug, Clone)]
pub struct Regions {
    regions: HashMap<String, Region>,
    viewport_height: f32,
    document_height: f32,
}

impl Regions {
    pub fn new(viewport_height: f32, document_height: f32) -> Self {
        let mut regions = HashMap::new();
        regions.insert(
            BODY.to_string(),
            Region {
                top: 0.0,
                height: document_height,
            },
        );
        Self {
            regions,
            viewport_height,
            document_height,
        }
    }

    pub fn from_config(configs: &[RegionConfig], viewport_height: f32, document_height: f32) -> Self {
        let mut regions = Self::new(viewport_height, document_height);
        for c in configs {
            regions.insert(&c.name, c.top, c.height);
        }
        regions
    }

    pub fn insert(&mut self, name: &str, top: f32, height: f32) {
        self.regions.insert(name.to_string(), Region { top, height });
    }

    pub fn get(&self, name: &str) -> Option<Region> {
        self.regions.get(name).copied()
    }

    pub fn viewport_height(&self) -> f32 {
        self.viewport_height
    }

    pub fn set_viewport_height(&mut self, height: f32) {
        self.viewport_height = height;
    }

    /// Largest reachable scroll offset.
    pub fn max_scroll(&self) -> f32 {
        (self.document_height - self.viewport_height).max(0.0)
    }
}

// ========== Writes and callbacks ==========

/// Progress → value mapping of a write.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mapping {
    #[default]
    Identity,
    /// `1 - p`.
    Complement,
    /// `clamp(p / span, 0, 1)`: reaches 1 after `span` of the range.
    Rescale { span: f32 },
    Scale { factor: f32 },
    Lerp { from: f32, to: f32 },
    /// Quadratic ease-in from `from` to `to`.
    EaseIn { from: f32, to: f32 },
    Constant { value: f32 },
    /// Rescaled progress below `knee` holds `base`; above it the value ramps
    /// linearly to `max`.
    SpeedRamp { knee: f32, base: f32, max: f32, span: f32 },
}

impl Mapping {
    pub fn apply(&self, p: f32) -> f32 {
        match *self {
            Mapping::Identity => p,
            Mapping::Complement => 1.0 - p,
            Mapping::Rescale { span } => rescale(p, span),
            Mapping::Scale { factor } => p * factor,
            Mapping::Lerp { from, to } => from + (to - from) * p,
            Mapping::EaseIn { from, to } => from + (to - from) * p * p,
            Mapping::Constant { value } => value,
            Mapping::SpeedRamp {
                knee,
                base,
                max,
                span,
            } => {
                let ratio = rescale(p, span);
                if ratio < knee {
                    base
                } else {
                    let t = if knee < 1.0 { (ratio - knee) / (1.0 - knee) } else { 1.0 };
                    base + t * (max - base)
                }
            }
        }
    }
}

fn rescale(p: f32, span: f32) -> f32 {
    if span <= 0.0 {
        1.0
    } else {
        (p / span).clamp(0.0, 1.0)
    }
}

/// What a write or action addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Target {
    System { system: String, field: ControlField },
    /// The scene-wide beam scatter ratio.
    Scatter,
}

impl Target {
    pub fn system(system: &str, field: ControlField) -> Self {
        Target::System {
            system: system.to_string(),
            field,
        }
    }
}

/// A progress-driven write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldWrite {
    pub target: Target,
    #[serde(default)]
    pub mapping: Mapping,
}

impl FieldWrite {
    pub fn new(target: Target, mapping: Mapping) -> Self {
        Self { target, mapping }
    }
}

/// A crossing of a binding's start or end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Scrolling down past the start.
    Enter,
    /// Scrolling down past the end.
    Leave,
    /// Scrolling up past the end.
    EnterBack,
    /// Scrolling up past the start.
    LeaveBack,
}

/// A discrete effect of a transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    SetRunning { system: String, value: bool },
    SetDrawn { system: String, value: bool },
    Write { target: Target, value: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Callback {
    pub on: Transition,
    pub action: Action,
}

impl Callback {
    pub fn new(on: Transition, action: Action) -> Self {
        Self { on, action }
    }
}

/// One scroll range and everything it drives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub region: String,
    pub start: TriggerPoint,
    pub end: TriggerPoint,
    /// Smoothing time constant in seconds.
    #[serde(default)]
    pub scrub: f32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub writes: Vec<FieldWrite>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub callbacks: Vec<Callback>,
}

impl Binding {
    pub fn new(region: &str, start: TriggerPoint, end: TriggerPoint, scrub: f32) -> Self {
        Self {
            region: region.to_string(),
            start,
            end,
            scrub,
            writes: Vec::new(),
            callbacks: Vec::new(),
        }
    }

    pub fn write(mut self, target: Target, mapping: Mapping) -> Self {
        self.writes.push(FieldWrite::new(target, mapping));
        self
    }

    pub fn on(mut self, transition: Transition, action: Action) -> Self {
        self.callbacks.push(Callback::new(transition, action));
        self
    }
}

// ========== Sink ==========

/// Receiver of binder output.
///
/// Methods that address a system return `false` when the name is unknown.
pub trait ControlSink {
    fn set_control(&mut self, system: &str, field: ControlField, value: f32) -> bool;
    fn set_running(&mut self, system: &str, running: bool) -> bool;
    fn set_drawn(&mut self, system: &str, drawn: bool) -> bool;
    fn set_scatter(&mut self, value: f32);
}

// ========== Binder ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Before,
    Active,
    After,
}

#[derive(Debug, Clone)]
struct BindingState {
    zone: Zone,
    progress: f32,
    started: bool,
    reported_region: bool,
    reported_system: bool,
}

impl Default for BindingState {
    fn default() -> Self {
        Self {
            zone: Zone::Before,
            progress: 0.0,
            started: false,
            reported_region: false,
            reported_system: false,
        }
    }
}

/// Evaluates a binding table against the scroll position.
#[derive(Debug, Clone)]
pub struct Binder {
    bindings: Vec<Binding>,
    states: Vec<BindingState>,
}

impl Binder {
    pub fn new(bindings: Vec<Binding>) -> Self {
        let states = vec![BindingState::default(); bindings.len()];
        Self { bindings, states }
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Smoothed progress of binding `index`.
    pub fn progress(&self, index: usize) -> Option<f32> {
        self.states.get(index).map(|s| s.progress)
    }

    pub fn update<S: ControlSink + ?Sized>(
        &mut self,
        scroll: f32,
        dt: f32,
        regions: &Regions,
        sink: &mut S,
    ) {
        for (binding, state) in self.bindings.iter().zip(self.states.iter_mut()) {
            let Some(region) = regions.get(&binding.region) else {
                if !state.reported_region {
                    log::debug!("skipping binding on unknown region '{}'", binding.region);
                    state.reported_region = true;
                }
                continue;
            };

            let vh = regions.viewport_height();
            let max = regions.max_scroll();
            let start = binding.start.resolve(region, vh, max);
            let end = binding.end.resolve(region, vh, max);

            let raw = raw_progress(scroll, start, end);
            let previous = state.progress;
            state.progress = if !state.started || binding.scrub <= 0.0 {
                raw
            } else {
                smooth(previous, raw, dt, binding.scrub)
            };
            state.started = true;

            let mut missing = false;
            if state.progress != previous {
                for write in &binding.writes {
                    let value = write.mapping.apply(state.progress);
                    missing |= !apply_write(sink, &write.target, value);
                }
            }

            let zone = if scroll < start {
                Zone::Before
            } else if scroll > end {
                Zone::After
            } else {
                Zone::Active
            };
            for transition in transitions(state.zone, zone) {
                for cb in binding.callbacks.iter().filter(|cb| cb.on == *transition) {
                    missing |= !apply_action(sink, &cb.action);
                }
            }
            state.zone = zone;

            if missing && !state.reported_system {
                log::debug!(
                    "binding on '{}' addresses a system that does not exist",
                    binding.region
                );
                state.reported_system = true;
            }
        }
    }
}

fn raw_progress(scroll: f32, start: f32, end: f32) -> f32 {
    if end <= start {
        return if scroll >= start { 1.0 } else { 0.0 };
    }
    ((scroll - start) / (end - start)).clamp(0.0, 1.0)
}

fn smooth(current: f32, target: f32, dt: f32, scrub: f32) -> f32 {
    let next = current + (target - current) * (1.0 - (-dt / scrub).exp());
    if (target - next).abs() < SNAP_EPSILON {
        target
    } else {
        next
    }
}

fn transitions(from: Zone, to: Zone) -> &'static [Transition] {
    use Transition::*;
    match (from, to) {
        (Zone::Before, Zone::Active) => &[Enter],
        (Zone::Active, Zone::After) => &[Leave],
        (Zone::Before, Zone::After) => &[Enter, Leave],
        (Zone::After, Zone::Active) => &[EnterBack],
        (Zone::Active, Zone::Before) => &[LeaveBack],
        (Zone::After, Zone::Before) => &[EnterBack, LeaveBack],
        _ => &[],
    }
}

fn apply_write<S: ControlSink + ?Sized>(sink: &mut S, target: &Target, value: f32) -> bool {
    match target {
        Target::System { system, field } => sink.set_control(system, *field, value),
        Target::Scatter => {
            sink.set_scatter(value.clamp(0.0, 1.0));
            true
        }
    }
}

fn apply_action<S: ControlSink + ?Sized>(sink: &mut S, action: &Action) -> bool {
    match action {
        Action::SetRunning { system, value } => sink.set_running(system, *value),
        Action::SetDrawn { system, value } => sink.set_drawn(system, *value),
        Action::Write { target, value } => apply_write(sink, target, *value),
    }
}
