//! Scratch surface controller
//!
//! Owns the overlay raster and the scratch state machine:
//!
//! ```text
//! Intact --stroke--> Eroding --fraction >= threshold--> Fading --alpha <= 0--> Cleared
//!    \________________________ trigger() ______________/
//! ```
//!
//! Every transition into `Fading` goes through [`ScratchSurface::begin_fade`],
//! so the threshold path and the auto-reveal path share one fade routine.

use glam::Vec2;

use super::input::{PointerInput, SurfaceRect};
use super::raster::{RasterSurface, Rgba};
use super::state::{CardGeometry, FadeTrigger, ScratchEvent, ScratchPhase, ScratchState};
use crate::clock::{FrameTicker, TimerHandle, Timers};
use crate::error::SurfaceError;
use crate::settings::{Environment, Settings};

/// Capability to force the reveal without manual erasure
pub trait AutoReveal {
    /// Start the fade if the overlay is still `Intact`/`Eroding`.
    /// Returns false (and does nothing) otherwise.
    fn trigger(&mut self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SurfaceTimer {
    Reveal,
}

/// Erasable overlay for one card instance
#[derive(Debug)]
pub struct ScratchSurface {
    geometry: CardGeometry,
    settings: Settings,
    /// None when allocation failed; the surface then only clears via `trigger()`
    raster: Option<RasterSurface>,
    rect: SurfaceRect,
    pixel_ratio: f32,
    /// Brush radius in raster pixels
    brush_radius: f32,
    state: ScratchState,
    stroking: bool,
    /// Set after a sampling failure; erasure still paints but never completes
    sampling_failed: bool,
    ticker: FrameTicker,
    timers: Timers<SurfaceTimer>,
    reveal_timer: Option<TimerHandle>,
    events: Vec<ScratchEvent>,
    mounted: bool,
}

impl ScratchSurface {
    /// Allocate and paint the overlay.
    ///
    /// Allocation failures are logged and leave the surface degraded rather
    /// than failing the mount.
    pub fn new(
        geometry: CardGeometry,
        base_color: Rgba,
        env: &Environment,
        settings: &Settings,
    ) -> Self {
        let pixel_ratio = env.effective_pixel_ratio(settings.max_device_pixel_ratio);
        let raster = match allocate_overlay(geometry, base_color, pixel_ratio, env, settings) {
            Ok(raster) => {
                log::debug!(
                    "Scratch surface {}x{} allocated at {}x{} (ratio {:.2})",
                    geometry.width,
                    geometry.height,
                    raster.width(),
                    raster.height(),
                    pixel_ratio
                );
                Some(raster)
            }
            Err(e) => {
                log::warn!("Scratch surface degraded, overlay will only clear on skip: {}", e);
                None
            }
        };

        Self {
            geometry,
            settings: settings.clone(),
            raster,
            rect: SurfaceRect::at_origin(geometry),
            pixel_ratio,
            brush_radius: settings.brush_radius_for(env.viewport_width) * pixel_ratio,
            state: ScratchState::default(),
            stroking: false,
            sampling_failed: false,
            ticker: FrameTicker::default(),
            timers: Timers::new(),
            reveal_timer: None,
            events: Vec::new(),
            mounted: true,
        }
    }

    pub fn geometry(&self) -> CardGeometry {
        self.geometry
    }

    pub fn state(&self) -> ScratchState {
        self.state
    }

    pub fn phase(&self) -> ScratchPhase {
        self.state.phase
    }

    pub fn raster(&self) -> Option<&RasterSurface> {
        self.raster.as_ref()
    }

    /// Opacity the host should composite the overlay at
    pub fn overlay_opacity(&self) -> f32 {
        self.state.fade_alpha
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    pub fn brush_radius(&self) -> f32 {
        self.brush_radius
    }

    pub fn is_stroking(&self) -> bool {
        self.stroking
    }

    /// True if the overlay can no longer clear through erasure alone
    pub fn is_degraded(&self) -> bool {
        self.raster.is_none() || self.sampling_failed
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Update the on-screen placement (scroll, layout shift)
    pub fn set_surface_rect(&mut self, rect: SurfaceRect) {
        self.rect = rect;
    }

    /// Feed one normalized pointer event
    pub fn handle_input(&mut self, input: PointerInput) {
        if !self.mounted {
            return;
        }
        match input {
            PointerInput::Down { .. } => {
                if self.state.phase.accepts_erasure() {
                    self.stroking = true;
                }
            }
            PointerInput::Move { at, .. } => {
                if !self.stroking {
                    return;
                }
                let Some((w, h)) = self.raster.as_ref().map(|r| (r.width(), r.height())) else {
                    return;
                };
                if let Some(point) = self.rect.to_raster(at, w, h) {
                    self.erase_at(point);
                }
            }
            PointerInput::Up { .. } | PointerInput::Cancel => {
                self.stroking = false;
            }
        }
    }

    /// Erase one brush dab at a raster-space point, then sample.
    ///
    /// Sampling happens in the same call as the paint, so the erased
    /// fraction always reflects the latest dab.
    pub fn erase_at(&mut self, point: Vec2) {
        if !self.mounted || !self.state.phase.accepts_erasure() {
            return;
        }
        let Some(raster) = self.raster.as_mut() else {
            return;
        };

        raster.erase_circle(point, self.brush_radius);
        if self.sampling_failed {
            return;
        }

        let sample = raster.erased_fraction(self.settings.alpha_cutoff, self.settings.sample_stride);
        match sample {
            Ok(fraction) => {
                if self.state.phase == ScratchPhase::Intact {
                    self.state.phase = ScratchPhase::Eroding;
                    log::debug!("Scratch surface eroding");
                }
                self.state.erased_fraction = self.state.erased_fraction.max(fraction);
                log::trace!("Erased fraction {:.3}", self.state.erased_fraction);

                if self.state.erased_fraction >= self.settings.erase_threshold {
                    self.begin_fade(FadeTrigger::Threshold);
                }
            }
            Err(e) => {
                log::warn!("Erasure sampling failed, manual reveal disabled: {}", e);
                self.sampling_failed = true;
            }
        }
    }

    /// The single transition into `Fading`. Idempotent.
    fn begin_fade(&mut self, trigger: FadeTrigger) -> bool {
        if !self.state.phase.accepts_erasure() {
            return false;
        }
        self.state.phase = ScratchPhase::Fading;
        self.stroking = false;
        self.ticker.start();
        self.events.push(ScratchEvent::FadeStarted(trigger));
        log::info!(
            "Scratch surface fading ({:?}, erased {:.0}%)",
            trigger,
            self.state.erased_fraction * 100.0
        );
        true
    }

    /// Advance one animation frame at host time `now_ms`
    pub fn frame(&mut self, now_ms: f64) {
        if !self.mounted {
            return;
        }

        if self.ticker.tick() {
            self.step_fade(now_ms);
        }

        for timer in self.timers.drain_due(now_ms) {
            match timer {
                SurfaceTimer::Reveal => {
                    self.reveal_timer = None;
                    self.events.push(ScratchEvent::Revealed);
                    log::info!("Scratch surface revealed");
                }
            }
        }
    }

    fn step_fade(&mut self, now_ms: f64) {
        if self.state.phase != ScratchPhase::Fading {
            self.ticker.cancel();
            return;
        }

        self.state.fade_alpha = (self.state.fade_alpha - self.settings.fade_step).max(0.0);
        if self.state.fade_alpha <= 0.0 {
            self.finish_fade(now_ms);
        }
    }

    fn finish_fade(&mut self, now_ms: f64) {
        if let Some(raster) = self.raster.as_mut() {
            raster.clear();
        }
        self.ticker.cancel();
        self.state.phase = ScratchPhase::Cleared;
        self.state.erased_fraction = 1.0;
        self.events.push(ScratchEvent::Cleared);
        log::debug!("Scratch surface cleared after {} fade frames", self.ticker.ticks());

        let due = now_ms + self.settings.post_fade_delay_ms;
        self.reveal_timer = Some(self.timers.schedule(due, SurfaceTimer::Reveal));
    }

    /// Take events emitted since the last call
    pub fn take_events(&mut self) -> Vec<ScratchEvent> {
        std::mem::take(&mut self.events)
    }

    /// Stop the ticker and drop pending timers. Terminal.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.stroking = false;
        self.ticker.cancel();
        if let Some(handle) = self.reveal_timer.take() {
            self.timers.cancel(handle);
        }
        self.timers.cancel_all();
        self.events.clear();
        log::debug!("Scratch surface unmounted in {:?}", self.state.phase);
    }
}

impl AutoReveal for ScratchSurface {
    fn trigger(&mut self) -> bool {
        if !self.mounted {
            return false;
        }
        self.begin_fade(FadeTrigger::AutoReveal)
    }
}

fn allocate_overlay(
    geometry: CardGeometry,
    base_color: Rgba,
    pixel_ratio: f32,
    env: &Environment,
    settings: &Settings,
) -> Result<RasterSurface, SurfaceError> {
    if !env.raster_supported {
        return Err(SurfaceError::Unsupported);
    }

    let width = (geometry.width as f32 * pixel_ratio).ceil() as u32;
    let height = (geometry.height as f32 * pixel_ratio).ceil() as u32;
    let mut raster = RasterSurface::new(width, height, settings.max_raster_pixels)?;

    raster.fill_vertical_gradient(base_color.shade(1.15), base_color.shade(0.8));
    let seed = (((geometry.width as u64) << 32) | geometry.height as u64)
        ^ env.seed.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    raster.speckle(seed, 0.12, 0.06);

    let scale = (2.0 * pixel_ratio).round().max(1.0) as u32;
    if !settings.label.is_empty()
        && !raster.draw_text_centered(
            &settings.label,
            scale,
            base_color.shade(1.35),
            base_color.shade(0.6),
        )
    {
        log::debug!("Overlay label does not fit {}x{}", width, height);
    }

    Ok(raster)
}
