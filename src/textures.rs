//! Procedural sprite textures for point particles.
//!
//! Every sprite is a 64×64 RGBA radial gradient, white or tinted, that the
//! renderer multiplies by the system color and opacity. The gradients are
//! described as color stops over the normalized radius, the way a 2-D canvas
//! radial gradient is: the stop list is sorted by offset, pixels between two
//! stops interpolate linearly, and pixels past the last stop take its color.
//!
//! ```ignore
//! let sprite = SpriteTexture::for_style(Sprite::Blurry, 0.4);
//! queue.write_texture(..., &sprite.data, ...);
//! ```

use image::{Rgba, RgbaImage};

use crate::config::Sprite;

/// Edge length of every generated sprite.
pub const SPRITE_SIZE: u32 = 64;

/// A color stop: normalized radius and straight (non-premultiplied) RGBA.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub rgba: [f32; 4],
}

impl GradientStop {
    pub const fn new(offset: f32, rgba: [f32; 4]) -> Self {
        Self { offset, rgba }
    }

    /// Stop from 8-bit RGB plus a 0-1 alpha.
    pub fn rgb(offset: f32, r: u8, g: u8, b: u8, a: f32) -> Self {
        Self::new(
            offset,
            [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a],
        )
    }
}

/// Raw RGBA sprite pixels ready for upload.
#[derive(Debug, Clone)]
pub struct SpriteTexture {
    /// `width * height * 4` bytes, row-major.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl SpriteTexture {
    /// Solid white core that fades to transparent over the outer `blur` of
    /// the radius.
    pub fn blurry_dot(blur: f32) -> Self {
        let fade_start = (1.0 - blur).max(0.0);
        Self::radial(&[
            GradientStop::new(0.0, [1.0; 4]),
            GradientStop::new(fade_start, [1.0; 4]),
            GradientStop::new(1.0, [1.0, 1.0, 1.0, 0.0]),
        ])
    }

    /// Like [`blurry_dot`](Self::blurry_dot), but the solid core is at most
    /// half the radius: `max(0, 0.5 * (1 - blur))`.
    pub fn brain_dot(blur: f32) -> Self {
        let core = (0.5 * (1.0 - blur)).max(0.0);
        Self::radial(&[
            GradientStop::new(0.0, [1.0; 4]),
            GradientStop::new(core, [1.0; 4]),
            GradientStop::new(1.0, [1.0, 1.0, 1.0, 0.0]),
        ])
    }

    /// White core, blue middle band, faint teal rim.
    pub fn glowing_dot() -> Self {
        Self::radial(&[
            GradientStop::new(0.0, [1.0; 4]),
            GradientStop::rgb(0.3, 43, 152, 211, 0.5),
            GradientStop::rgb(1.0, 28, 178, 153, 0.03),
        ])
    }

    /// White disc with a `(1 - r)^1.5` alpha falloff.
    pub fn soft_disc() -> Self {
        Self::generate(|r| {
            let a = (1.0 - r).max(0.0).powf(1.5);
            [1.0, 1.0, 1.0, a]
        })
    }

    /// The sprite a draw style asks for.
    pub fn for_style(sprite: Sprite, blur: f32) -> Self {
        match sprite {
            Sprite::Blurry => Self::blurry_dot(blur),
            Sprite::Brain => Self::brain_dot(blur),
            Sprite::Glowing => Self::glowing_dot(),
            Sprite::SoftDisc => Self::soft_disc(),
        }
    }

    /// Build a sprite from color stops over the normalized radius.
    pub fn radial(stops: &[GradientStop]) -> Self {
        let mut sorted = stops.to_vec();
        sorted.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        Self::generate(|r| sample_stops(&sorted, r))
    }

    fn generate(shade: impl Fn(f32) -> [f32; 4]) -> Self {
        let center = SPRITE_SIZE as f32 / 2.0;
        let img = RgbaImage::from_fn(SPRITE_SIZE, SPRITE_SIZE, |x, y| {
            let dx = x as f32 + 0.5 - center;
            let dy = y as f32 + 0.5 - center;
            let r = (dx * dx + dy * dy).sqrt() / center;
            let c = shade(r);
            Rgba(c.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8))
        });
        let (width, height) = img.dimensions();
        Self {
            data: img.into_raw(),
            width,
            height,
        }
    }

    /// RGBA of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }
}

fn sample_stops(stops: &[GradientStop], r: f32) -> [f32; 4] {
    let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
        return [0.0; 4];
    };
    if r <= first.offset {
        return first.rgba;
    }
    if r >= last.offset {
        return last.rgba;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if r <= b.offset {
            let span = b.offset - a.offset;
            let t = if span > 0.0 { (r - a.offset) / span } else { 1.0 };
            return std::array::from_fn(|k| a.rgba[k] + (b.rgba[k] - a.rgba[k]) * t);
        }
    }
    last.rgba
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alpha(t: &SpriteTexture, x: u32, y: u32) -> u8 {
        t.pixel(x, y)[3]
    }

    #[test]
    fn test_every_sprite_has_clear_corners_and_solid_center() {
        for sprite in [Sprite::Blurry, Sprite::Brain, Sprite::Glowing, Sprite::SoftDisc] {
            let t = SpriteTexture::for_style(sprite, 0.5);
            assert_eq!(t.data.len(), 64 * 64 * 4);
            assert!(alpha(&t, 0, 0) <= 8, "{sprite:?} corner");
            assert!(alpha(&t, 63, 63) <= 8, "{sprite:?} corner");
            assert!(alpha(&t, 32, 32) >= 240, "{sprite:?} center");
        }
    }

    #[test]
    fn test_blur_shrinks_solid_core() {
        let sharp = SpriteTexture::blurry_dot(0.1);
        let soft = SpriteTexture::blurry_dot(0.9);
        // Three quarters of the way out
        assert_eq!(alpha(&sharp, 32 + 24, 32), 255);
        assert!(alpha(&soft, 32 + 24, 32) < 128);
    }

    #[test]
    fn test_brain_core_clamps_at_zero() {
        let t = SpriteTexture::brain_dot(2.0);
        assert!(alpha(&t, 32, 32) > 240);
        assert!(alpha(&t, 32 + 16, 32) < 160);
    }

    #[test]
    fn test_glowing_middle_band_is_blue() {
        let t = SpriteTexture::glowing_dot();
        let [r, g, b, _] = t.pixel(32 + 10, 32);
        assert!(b > r && b > g, "{r} {g} {b}");
    }

    #[test]
    fn test_stop_order_does_not_matter() {
        let a = SpriteTexture::radial(&[
            GradientStop::new(0.0, [1.0; 4]),
            GradientStop::new(1.0, [0.0; 4]),
        ]);
        let b = SpriteTexture::radial(&[
            GradientStop::new(1.0, [0.0; 4]),
            GradientStop::new(0.0, [1.0; 4]),
        ]);
        assert_eq!(a.data, b.data);
    }
}
