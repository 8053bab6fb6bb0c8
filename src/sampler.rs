//! Raster image → point cloud sampling for the brain layers.

use std::path::Path;

use glam::Vec3;
use image::RgbaImage;

use crate::error::SampleError;
use crate::spawn::SpawnContext;

/// Pixels at or below this alpha are treated as background.
pub const ALPHA_THRESHOLD: u8 = 10;

/// Depth of the random start box (the box spans `±SCATTER_DEPTH / 2`).
pub const SCATTER_DEPTH: f32 = 800.0;

const GOLDEN_RATIO: f64 = 1.618033988749895;

/// One sampled pixel: where it settles and where it starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledPoint {
    pub target: Vec3,
    pub initial: Vec3,
}

/// Decode an image file into RGBA8.
pub fn load_image(path: &Path) -> Result<RgbaImage, SampleError> {
    let img = image::open(path).map_err(|source| SampleError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.into_rgba8())
}

/// Turn every opaque pixel of `image` into a point.
///
/// Targets are centered on the image with Y pointing up and sit at depth
/// `z_offset`. Start positions are uniform in a box `scatter_range` wide in X
/// and Y and [`SCATTER_DEPTH`] deep. At most `max_count` points are kept, picked
/// with [`golden_ratio_samples`].
pub fn sample_points(
    image: &RgbaImage,
    max_count: usize,
    scatter_range: f32,
    z_offset: f32,
    spawn: &mut SpawnContext,
) -> Vec<SampledPoint> {
    let (width, height) = image.dimensions();
    let (half_w, half_h) = (width as f32 / 2.0, height as f32 / 2.0);

    let mut points = Vec::new();
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[3] <= ALPHA_THRESHOLD {
            continue;
        }
        points.push(SampledPoint {
            target: Vec3::new(x as f32 - half_w, -(y as f32 - half_h), z_offset),
            initial: Vec3::new(
                spawn.signed(scatter_range),
                spawn.signed(scatter_range),
                spawn.signed(SCATTER_DEPTH),
            ),
        });
    }

    golden_ratio_samples(&points, max_count)
}

/// Deterministically pick `max_count` items spread over `items`.
///
/// Index `i` reads `items[floor((i * φ * len) mod len)]`. If there are no more
/// items than requested, all of them are returned in order.
pub fn golden_ratio_samples<T: Clone>(items: &[T], max_count: usize) -> Vec<T> {
    let total = items.len();
    if total <= max_count {
        return items.to_vec();
    }
    let len = total as f64;
    (0..max_count)
        .map(|i| {
            let index = ((i as f64 * GOLDEN_RATIO * len) % len).floor() as usize;
            items[index.min(total - 1)].clone()
        })
        .collect()
}
