//! Scratch surface
//!
//! Everything about the erasable overlay lives here. This module is pure and
//! deterministic:
//! - No platform dependencies (the host feeds input and frame times)
//! - Seeded texture only
//! - All delays go through the explicit clock in `crate::clock`

pub mod controller;
pub mod font;
pub mod input;
pub mod raster;
pub mod state;

pub use controller::{AutoReveal, ScratchSurface};
pub use input::{InputSource, PointerInput, SurfaceRect};
pub use raster::{RasterSurface, Rgba};
pub use state::{CardGeometry, FadeTrigger, ScratchEvent, ScratchPhase, ScratchState};
