//! Scratch surface state types

use serde::{Deserialize, Serialize};

/// Card size in logical pixels, fixed for the life of one card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardGeometry {
    pub width: u32,
    pub height: u32,
}

impl CardGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Overlay lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScratchPhase {
    /// Untouched overlay
    Intact,
    /// At least one stroke has been sampled
    Eroding,
    /// Overlay opacity animating toward zero; input ignored
    Fading,
    /// Overlay gone
    Cleared,
}

impl ScratchPhase {
    /// Whether strokes still erase (and auto-reveal can still start a fade)
    pub fn accepts_erasure(self) -> bool {
        matches!(self, ScratchPhase::Intact | ScratchPhase::Eroding)
    }
}

/// What started the fade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FadeTrigger {
    /// Erased fraction crossed the threshold
    Threshold,
    /// Skip / auto-reveal request
    AutoReveal,
}

/// Controller-owned scratch state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScratchState {
    /// Last sampled erased fraction in [0, 1]
    pub erased_fraction: f32,
    pub phase: ScratchPhase,
    /// Overlay opacity, animated during `Fading`
    pub fade_alpha: f32,
}

impl Default for ScratchState {
    fn default() -> Self {
        Self {
            erased_fraction: 0.0,
            phase: ScratchPhase::Intact,
            fade_alpha: 1.0,
        }
    }
}

/// Events emitted by the surface, drained by the owner each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScratchEvent {
    FadeStarted(FadeTrigger),
    /// Fade reached zero and the raster was cleared
    Cleared,
    /// Completion report, delivered after the post-fade delay
    Revealed,
}
