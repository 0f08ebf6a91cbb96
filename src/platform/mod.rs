//! Platform abstraction layer
//!
//! The engine itself is platform-free; this module adapts it to a host.
//! Only the browser host exists today:
//! - Mouse/touch normalization into `PointerInput`
//! - `requestAnimationFrame` as the animation clock
//! - Canvas upload of the overlay raster

#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(target_arch = "wasm32")]
pub use web::{ScratchCardHandle, mount_scratch_card};
