//! The two perspective cameras and the world-space bounds derived from them.
//!
//! The backdrop camera frames the swarm, the starfields and the brain clouds.
//! The light camera is fixed at `camera_z` and its visible height at the
//! origin plane defines the beam column: [`LightBounds`] converts between
//! screen pixels and world units for the path tables.

use glam::{Mat4, Vec3, Vec4};

use crate::config::BeamLayout;

/// Vertical field of view of the backdrop camera, in degrees.
pub const BACKDROP_FOV: f32 = 75.0;
/// Backdrop camera distance before the first resize.
pub const BACKDROP_START_Z: f32 = 750.0;

const NEAR: f32 = 0.1;
const FAR: f32 = 5000.0;

/// A perspective camera on the +Z axis looking at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Width over height.
    pub aspect: f32,
    /// Distance from the origin along +Z.
    pub distance: f32,
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, distance: f32) -> Self {
        Self {
            fov,
            aspect,
            distance,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.distance)
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), Vec3::ZERO, Vec3::Y)
    }

    /// Projection with a `[0, 1]` depth range.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect.max(1e-6), NEAR, FAR)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Visible height of the `z = 0` plane.
    pub fn visible_height(&self) -> f32 {
        2.0 * (self.fov.to_radians() / 2.0).tan() * self.distance
    }

    /// Cast a ray through a screen pixel and intersect it with `z = 0`.
    ///
    /// Screen coordinates have their origin at the top-left corner.
    pub fn screen_to_plane(&self, x: f32, y: f32, width: f32, height: f32) -> Vec3 {
        if width <= 0.0 || height <= 0.0 {
            return Vec3::ZERO;
        }
        let ndc_x = (x / width) * 2.0 - 1.0;
        let ndc_y = 1.0 - (y / height) * 2.0;

        let inv = self.view_proj().inverse();
        let far = inv * Vec4::new(ndc_x, ndc_y, 0.5, 1.0);
        if far.w.abs() < f32::EPSILON {
            return Vec3::ZERO;
        }
        let origin = self.position();
        let dir = (far.truncate() / far.w - origin).normalize_or_zero();
        if dir.z.abs() < f32::EPSILON {
            return Vec3::ZERO;
        }
        let t = -origin.z / dir.z;
        let hit = origin + dir * t;
        Vec3::new(hit.x, hit.y, 0.0)
    }
}

/// Backdrop camera distance for a viewport width.
///
/// Narrow screens pull the camera back to 1200. Wider screens scale from
/// 800 at 1920px, with widths 768-1440 treated as 1440 and 1661-1920 treated
/// as 1660, capped at 2500.
pub fn backdrop_distance(width: f32) -> f32 {
    if width < 768.0 {
        return 1200.0;
    }
    let effective = if width <= 1440.0 {
        1440.0
    } else if width > 1660.0 && width <= 1920.0 {
        1660.0
    } else {
        width
    };
    (800.0 * 1920.0 / effective).min(2500.0)
}

/// World-space extent of the light camera's view at the origin plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightBounds {
    pub height: f32,
    pub top: f32,
    pub bottom: f32,
    /// World units per screen pixel.
    pub pixel_scale: f32,
    /// Lowest height a beam particle lives at.
    pub floor: f32,
}

impl LightBounds {
    /// Bounds for a camera `distance` away with vertical `fov` degrees,
    /// on a viewport `viewport_height` pixels tall.
    pub fn compute(fov: f32, distance: f32, viewport_height: f32, floor_offset_px: f32) -> Self {
        let height = 2.0 * (fov.to_radians() / 2.0).tan() * distance;
        let pixel_scale = height / viewport_height.max(1.0);
        let bottom = -height / 2.0;
        Self {
            height,
            top: height / 2.0,
            bottom,
            pixel_scale,
            floor: bottom + floor_offset_px * pixel_scale,
        }
    }

    /// Explicit bounds, mostly for tests.
    pub fn with_range(floor: f32, top: f32, pixel_scale: f32) -> Self {
        Self {
            height: top - floor,
            top,
            bottom: floor,
            pixel_scale,
            floor,
        }
    }
}

/// Both cameras plus the derived beam bounds, kept in sync on resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    pub backdrop: PerspectiveCamera,
    pub light: PerspectiveCamera,
    pub bounds: LightBounds,
    floor_offset: f32,
    width: f32,
    height: f32,
}

impl CameraRig {
    pub fn new(layout: &BeamLayout, width: f32, height: f32) -> Self {
        let aspect = width / height.max(1.0);
        let mut rig = Self {
            backdrop: PerspectiveCamera::new(BACKDROP_FOV, aspect, BACKDROP_START_Z),
            light: PerspectiveCamera::new(layout.fov, aspect, layout.camera_z),
            bounds: LightBounds::compute(layout.fov, layout.camera_z, height, layout.floor_offset),
            floor_offset: layout.floor_offset,
            width,
            height,
        };
        rig.resize(width, height);
        rig
    }

    /// Recompute aspect ratios, the backdrop distance and the beam bounds.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
        let aspect = self.width / self.height;
        self.backdrop.aspect = aspect;
        self.backdrop.distance = backdrop_distance(self.width);
        self.light.aspect = aspect;
        self.bounds = LightBounds::compute(
            self.light.fov,
            self.light.distance,
            self.height,
            self.floor_offset,
        );
    }

    /// Viewport size in pixels.
    pub fn viewport(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Unproject a pointer position through the backdrop camera.
    pub fn pointer_to_world(&self, x: f32, y: f32) -> Vec3 {
        self.backdrop.screen_to_plane(x, y, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backdrop_distance_rules() {
        assert_eq!(backdrop_distance(500.0), 1200.0);
        // 768..=1440 snaps to 1440
        let snapped = 800.0 * 1920.0 / 1440.0;
        assert!((backdrop_distance(768.0) - snapped).abs() < 1e-3);
        assert!((backdrop_distance(1440.0) - snapped).abs() < 1e-3);
        // 1661..=1920 snaps to 1660
        assert!((backdrop_distance(1800.0) - 800.0 * 1920.0 / 1660.0).abs() < 1e-3);
        // Unsnapped widths scale directly
        assert!((backdrop_distance(1600.0) - 960.0).abs() < 1e-3);
        assert!((backdrop_distance(3840.0) - 400.0).abs() < 1e-3);
    }

    #[test]
    fn test_light_bounds() {
        let b = LightBounds::compute(60.0, 1000.0, 1000.0, 80.0);
        let expected = 2.0 * 30f32.to_radians().tan() * 1000.0;
        assert!((b.height - expected).abs() < 1e-2);
        assert!((b.top + b.bottom).abs() < 1e-4);
        assert!((b.pixel_scale - expected / 1000.0).abs() < 1e-5);
        assert!((b.floor - (b.bottom + 80.0 * b.pixel_scale)).abs() < 1e-4);
    }

    #[test]
    fn test_screen_center_hits_origin() {
        let cam = PerspectiveCamera::new(75.0, 16.0 / 9.0, 750.0);
        let p = cam.screen_to_plane(960.0, 540.0, 1920.0, 1080.0);
        assert!(p.length() < 1e-2);
    }

    #[test]
    fn test_screen_top_edge_matches_frustum() {
        let cam = PerspectiveCamera::new(75.0, 1.0, 750.0);
        let p = cam.screen_to_plane(500.0, 0.0, 1000.0, 1000.0);
        let expected = cam.visible_height() / 2.0;
        assert!((p.y - expected).abs() < 0.5, "{} vs {}", p.y, expected);
        assert!(p.x.abs() < 1e-2);
        assert_eq!(p.z, 0.0);
    }

    #[test]
    fn test_rig_resize_updates_bounds() {
        let layout = BeamLayout::default();
        let mut rig = CameraRig::new(&layout, 1920.0, 1080.0);
        let before = rig.bounds.pixel_scale;
        rig.resize(600.0, 540.0);
        assert_eq!(rig.backdrop.distance, 1200.0);
        assert!((rig.bounds.pixel_scale - before * 2.0).abs() < 1e-4);
    }
}
