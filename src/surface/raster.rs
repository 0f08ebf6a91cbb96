//! Owned RGBA raster for the scratch overlay
//!
//! Explicit paint / erase / sample / clear operations on a private buffer.
//! There is no shared drawing context: each surface owns its pixels.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::font;
use crate::error::SurfaceError;

/// One straight-alpha RGBA pixel, laid out as a canvas `ImageData` expects
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from 0xRRGGBB
    pub const fn from_hex(rgb: u32) -> Self {
        Self::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8, 255)
    }

    /// Scale RGB by `factor` (>1 lightens, <1 darkens), alpha untouched
    pub fn shade(self, factor: f32) -> Self {
        let f = |c: u8| (c as f32 * factor).round().clamp(0.0, 255.0) as u8;
        Self::new(f(self.r), f(self.g), f(self.b), self.a)
    }

    /// Linear blend toward `other` by `t` in [0, 1]
    pub fn lerp(self, other: Rgba, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

/// Fixed-size pixel buffer
#[derive(Debug, Clone)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
    /// Bumped on every mutation so hosts can skip redundant uploads
    revision: u64,
}

impl RasterSurface {
    /// Allocate a transparent raster. Fails on empty or oversized dimensions,
    /// or when the allocator refuses the buffer.
    pub fn new(width: u32, height: u32, max_pixels: usize) -> Result<Self, SurfaceError> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::InvalidSize { width, height });
        }
        let count = width as u64 * height as u64;
        if count > max_pixels as u64 {
            return Err(SurfaceError::TooLarge {
                pixels: count,
                limit: max_pixels,
            });
        }

        let count = count as usize;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(count)
            .map_err(|e| SurfaceError::Allocation(e.to_string()))?;
        pixels.resize(count, Rgba::TRANSPARENT);

        Ok(Self {
            width,
            height,
            pixels,
            revision: 0,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.index(x, y)).copied()
    }

    /// Raw RGBA bytes, row-major
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Overwrite every pixel with a top-to-bottom gradient
    pub fn fill_vertical_gradient(&mut self, top: Rgba, bottom: Rgba) {
        let span = (self.height.saturating_sub(1)).max(1) as f32;
        let width = self.width as usize;
        for (y, row) in self.pixels.chunks_exact_mut(width).enumerate() {
            let color = top.lerp(bottom, y as f32 / span);
            row.fill(color);
        }
        self.revision += 1;
    }

    /// Sprinkle deterministic light/dark specks over opaque pixels
    pub fn speckle(&mut self, seed: u64, density: f32, strength: f32) {
        let mut rng = Pcg32::seed_from_u64(seed);
        for px in self.pixels.iter_mut().filter(|p| p.a > 0) {
            if rng.random::<f32>() < density {
                let factor = 1.0 + rng.random_range(-strength..=strength);
                *px = px.shade(factor);
            }
        }
        self.revision += 1;
    }

    /// Paint `text` with its top-left corner at (x, y), with a one-cell drop shadow
    pub fn draw_text(&mut self, text: &str, x: u32, y: u32, scale: u32, color: Rgba, shadow: Rgba) {
        let scale = scale.max(1);
        font::for_each_pixel(text, scale, |dx, dy| {
            self.put(x + dx + scale, y + dy + scale, shadow);
        });
        font::for_each_pixel(text, scale, |dx, dy| {
            self.put(x + dx, y + dy, color);
        });
        self.revision += 1;
    }

    /// Paint `text` centered, shrinking the scale until it fits.
    /// Returns false if it cannot fit even at scale 1.
    pub fn draw_text_centered(&mut self, text: &str, scale: u32, color: Rgba, shadow: Rgba) -> bool {
        let mut scale = scale.max(1);
        while scale > 1 && font::text_width(text, scale) + scale > self.width {
            scale -= 1;
        }
        let w = font::text_width(text, scale) + scale;
        let h = (font::HEIGHT + 1) * scale;
        if w > self.width || h > self.height {
            return false;
        }
        let x = (self.width - w) / 2;
        let y = (self.height - h) / 2;
        self.draw_text(text, x, y, scale, color, shadow);
        true
    }

    #[inline]
    fn put(&mut self, x: u32, y: u32, color: Rgba) {
        if x < self.width && y < self.height {
            let i = self.index(x, y);
            self.pixels[i] = color;
        }
    }

    /// Cut a filled circle out of the raster ("destination-out").
    ///
    /// Alpha is multiplied by `1 - coverage` with a one-pixel soft edge, so a
    /// pixel can only become more transparent. Returns the number of pixels
    /// whose alpha changed.
    pub fn erase_circle(&mut self, center: Vec2, radius: f32) -> usize {
        if !(radius > 0.0) || !center.is_finite() {
            return 0;
        }

        let reach = radius + 0.5;
        let min_x = (center.x - reach).floor().max(0.0) as i64;
        let min_y = (center.y - reach).floor().max(0.0) as i64;
        let max_x = ((center.x + reach).ceil() as i64).min(self.width as i64 - 1);
        let max_y = ((center.y + reach).ceil() as i64).min(self.height as i64 - 1);
        if min_x > max_x || min_y > max_y {
            return 0;
        }

        let mut changed = 0;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let pixel_center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let coverage = (reach - pixel_center.distance(center)).clamp(0.0, 1.0);
                if coverage <= 0.0 {
                    continue;
                }
                let i = self.index(x as u32, y as u32);
                let px = &mut self.pixels[i];
                let alpha = (px.a as f32 * (1.0 - coverage)).floor() as u8;
                if alpha < px.a {
                    px.a = alpha;
                    if alpha == 0 {
                        *px = Rgba::TRANSPARENT;
                    }
                    changed += 1;
                }
            }
        }

        if changed > 0 {
            self.revision += 1;
        }
        changed
    }

    /// Fraction of sampled pixels whose alpha is below `alpha_cutoff`.
    ///
    /// Samples every `stride`th pixel. This is a proxy for cleared area, not
    /// an exact geometric measure.
    pub fn erased_fraction(&self, alpha_cutoff: u8, stride: usize) -> Result<f32, SurfaceError> {
        let expected = self.width as usize * self.height as usize;
        if self.pixels.len() != expected || expected == 0 {
            return Err(SurfaceError::Sampling {
                expected,
                actual: self.pixels.len(),
            });
        }

        let stride = stride.max(1);
        let mut sampled = 0usize;
        let mut erased = 0usize;
        for px in self.pixels.iter().step_by(stride) {
            sampled += 1;
            if px.a < alpha_cutoff {
                erased += 1;
            }
        }
        Ok(erased as f32 / sampled as f32)
    }

    /// Make every pixel fully transparent
    pub fn clear(&mut self) {
        self.pixels.fill(Rgba::TRANSPARENT);
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque(width: u32, height: u32) -> RasterSurface {
        let mut raster = RasterSurface::new(width, height, usize::MAX).unwrap();
        raster.fill_vertical_gradient(Rgba::from_hex(0xFFFFFF), Rgba::from_hex(0x000000));
        raster
    }

    #[test]
    fn test_new_rejects_bad_sizes() {
        assert_eq!(
            RasterSurface::new(0, 10, 100).unwrap_err(),
            SurfaceError::InvalidSize {
                width: 0,
                height: 10
            }
        );
        assert!(matches!(
            RasterSurface::new(100, 100, 50),
            Err(SurfaceError::TooLarge { pixels: 10_000, .. })
        ));
    }

    #[test]
    fn test_gradient_endpoints() {
        let raster = opaque(4, 11);
        assert_eq!(raster.pixel(0, 0), Some(Rgba::from_hex(0xFFFFFF)));
        assert_eq!(raster.pixel(3, 10), Some(Rgba::from_hex(0x000000)));
        assert_eq!(raster.pixel(4, 0), None);
    }

    #[test]
    fn test_erase_circle_clears_center_and_spares_far_pixels() {
        let mut raster = opaque(100, 100);
        let changed = raster.erase_circle(Vec2::new(50.0, 50.0), 10.0);
        assert!(changed > 0);
        assert_eq!(raster.pixel(50, 50).unwrap().a, 0);
        assert_eq!(raster.pixel(49, 45).unwrap().a, 0);
        assert_eq!(raster.pixel(80, 80).unwrap().a, 255);
        assert_eq!(raster.pixel(50, 62).unwrap().a, 255);
    }

    #[test]
    fn test_erase_never_reopacifies() {
        let mut raster = opaque(40, 40);
        raster.erase_circle(Vec2::new(20.0, 20.0), 8.0);
        let before: Vec<u8> = raster.as_bytes().iter().skip(3).step_by(4).copied().collect();

        raster.erase_circle(Vec2::new(24.0, 20.0), 8.0);
        let after: Vec<u8> = raster.as_bytes().iter().skip(3).step_by(4).copied().collect();

        assert!(before.iter().zip(&after).all(|(b, a)| a <= b));
        // Erasing the same spot again changes nothing new in the core
        assert_eq!(raster.erase_circle(Vec2::new(20.0, 20.0), 2.0), 0);
    }

    #[test]
    fn test_erase_off_canvas_is_clipped() {
        let mut raster = opaque(20, 20);
        assert_eq!(raster.erase_circle(Vec2::new(-50.0, -50.0), 10.0), 0);
        assert!(raster.erase_circle(Vec2::new(0.0, 0.0), 5.0) > 0);
        assert_eq!(raster.erase_circle(Vec2::new(f32::NAN, 3.0), 5.0), 0);
        assert_eq!(raster.erase_circle(Vec2::new(5.0, 5.0), 0.0), 0);
    }

    #[test]
    fn test_erased_fraction() {
        let mut raster = opaque(10, 10);
        assert_eq!(raster.erased_fraction(64, 1).unwrap(), 0.0);

        raster.erase_circle(Vec2::new(5.0, 5.0), 100.0);
        assert_eq!(raster.erased_fraction(64, 1).unwrap(), 1.0);

        let mut raster = opaque(10, 10);
        raster.clear();
        assert_eq!(raster.erased_fraction(64, 3).unwrap(), 1.0);
    }

    #[test]
    fn test_label_fits_or_reports() {
        let mut raster = opaque(200, 60);
        let rev = raster.revision();
        assert!(raster.draw_text_centered(
            "SCRATCH HERE",
            4,
            Rgba::from_hex(0xFFFFFF),
            Rgba::from_hex(0x202020)
        ));
        assert!(raster.revision() > rev);

        let mut tiny = opaque(8, 8);
        assert!(!tiny.draw_text_centered(
            "SCRATCH HERE",
            1,
            Rgba::from_hex(0xFFFFFF),
            Rgba::from_hex(0x202020)
        ));
    }

    #[test]
    fn test_speckle_is_deterministic() {
        let mut a = opaque(32, 32);
        let mut b = opaque(32, 32);
        a.speckle(7, 0.2, 0.1);
        b.speckle(7, 0.2, 0.1);
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_eq!(a.erased_fraction(64, 1).unwrap(), 0.0);
    }

    #[test]
    fn test_as_bytes_layout() {
        let mut raster = RasterSurface::new(2, 1, 16).unwrap();
        raster.fill_vertical_gradient(Rgba::new(1, 2, 3, 255), Rgba::new(1, 2, 3, 255));
        assert_eq!(raster.as_bytes(), &[1, 2, 3, 255, 1, 2, 3, 255]);
    }
}
