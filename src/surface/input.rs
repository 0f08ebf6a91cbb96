//! Input normalization
//!
//! Mouse and touch events are reduced to one [`PointerInput`] stream in
//! viewport coordinates. [`SurfaceRect`] maps those into raster pixels.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::CardGeometry;

/// Where an input came from (informational; never changes erasure behavior)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputSource {
    Mouse,
    Touch,
}

/// Normalized pointer event, coordinates in viewport (client) space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    /// mousedown / touchstart
    Down { source: InputSource, at: Vec2 },
    /// mousemove / touchmove
    Move { source: InputSource, at: Vec2 },
    /// mouseup / touchend
    Up { source: InputSource },
    /// Pointer left the surface or the touch was cancelled
    Cancel,
}

impl PointerInput {
    pub fn down(source: InputSource, x: f32, y: f32) -> Self {
        PointerInput::Down {
            source,
            at: Vec2::new(x, y),
        }
    }

    pub fn moved(source: InputSource, x: f32, y: f32) -> Self {
        PointerInput::Move {
            source,
            at: Vec2::new(x, y),
        }
    }

    pub fn up(source: InputSource) -> Self {
        PointerInput::Up { source }
    }
}

/// On-screen placement of the surface, as reported by layout
/// (e.g. `getBoundingClientRect`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Surface displayed at its logical size at the viewport origin
    pub fn at_origin(geometry: CardGeometry) -> Self {
        Self::new(0.0, 0.0, geometry.width as f32, geometry.height as f32)
    }

    /// Convert a viewport point into raster pixel coordinates.
    ///
    /// Subtracts the on-screen offset, then scales X and Y independently by
    /// raster size over display size, which folds in the pixel ratio used at
    /// allocation. Returns `None` while the surface has no displayed area.
    pub fn to_raster(&self, point: Vec2, raster_width: u32, raster_height: u32) -> Option<Vec2> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return None;
        }
        let scale = Vec2::new(
            raster_width as f32 / self.width,
            raster_height as f32 / self.height,
        );
        Some((point - Vec2::new(self.left, self.top)) * scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_raster_offset_and_density() {
        // 300x200 card drawn at (40, 100), raster allocated at 2x
        let rect = SurfaceRect::new(40.0, 100.0, 300.0, 200.0);
        let p = rect.to_raster(Vec2::new(190.0, 200.0), 600, 400).unwrap();
        assert!((p.x - 300.0).abs() < 1e-4);
        assert!((p.y - 200.0).abs() < 1e-4);
    }

    #[test]
    fn test_to_raster_independent_axes() {
        // CSS squashed the canvas horizontally only
        let rect = SurfaceRect::new(0.0, 0.0, 150.0, 200.0);
        let p = rect.to_raster(Vec2::new(75.0, 100.0), 300, 200).unwrap();
        assert!((p.x - 150.0).abs() < 1e-4);
        assert!((p.y - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_to_raster_zero_area() {
        let rect = SurfaceRect::new(0.0, 0.0, 0.0, 200.0);
        assert!(rect.to_raster(Vec2::ZERO, 300, 200).is_none());
    }
}
