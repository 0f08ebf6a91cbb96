//! Scratch Reveal - scratch-off prize card engine
//!
//! Core modules:
//! - `surface`: Erasable raster overlay, stroke input, completion detection, fade-out
//! - `card`: Prize presentation and the one-time reveal sequence
//! - `clock`: Animation ticker and timer queue driven by the host frame loop
//! - `celebration`: Confetti burst for winning reveals
//! - `platform`: Browser bindings (wasm32 only)
//! - `settings`: Tunable constants and host environment description

pub mod card;
pub mod celebration;
pub mod clock;
pub mod error;
pub mod platform;
pub mod settings;
pub mod surface;

pub use card::{
    CelebrationEffect, Decoration, DisplayMetadata, MountProps, PrizeContent, PrizeResult,
    QueuedCelebration, RevealCard, RevealObserver, RevealState,
};
pub use celebration::ConfettiBurst;
pub use error::{ConfigError, EffectError, SurfaceError};
pub use settings::{Environment, Settings};
pub use surface::{
    AutoReveal, CardGeometry, InputSource, PointerInput, RasterSurface, Rgba, ScratchEvent,
    ScratchPhase, ScratchState, ScratchSurface, SurfaceRect,
};

/// Engine defaults (every value is overridable through [`Settings`])
pub mod consts {
    /// Erased fraction at which the overlay starts fading
    pub const ERASE_THRESHOLD: f32 = 0.5;
    /// Pixels with alpha below this count as erased
    pub const ALPHA_CUTOFF: u8 = 64;
    /// Overlay opacity removed per animation frame while fading
    pub const FADE_STEP: f32 = 0.045;

    /// Delay between the overlay clearing and the surface reporting completion
    pub const POST_FADE_DELAY_MS: f64 = 100.0;
    /// Delay between completion and the external notification
    pub const NOTIFY_DELAY_MS: f64 = 500.0;

    /// Brush radius (logical px) below the breakpoint - finger sized
    pub const BRUSH_RADIUS_NARROW: f32 = 20.0;
    /// Brush radius (logical px) at or above the breakpoint
    pub const BRUSH_RADIUS_WIDE: f32 = 30.0;
    /// Viewport width separating the two brush tiers
    pub const NARROW_BREAKPOINT: f32 = 640.0;

    /// Device pixel ratio cap (keeps raster memory bounded on 4x displays)
    pub const MAX_DEVICE_PIXEL_RATIO: f32 = 3.0;
    /// Hard cap on raster size
    pub const MAX_RASTER_PIXELS: usize = 16 * 1024 * 1024;

    /// Default overlay color (silver foil)
    pub const OVERLAY_COLOR: u32 = 0xB8_B8_C0;

    /// Confetti particles spawned per unit of intensity
    pub const CONFETTI_PER_INTENSITY: f32 = 120.0;
    /// Maximum live confetti particles
    pub const MAX_CONFETTI: usize = 600;

    /// Nominal animation frame length (60 Hz)
    pub const FRAME_MS: f64 = 1000.0 / 60.0;
}
