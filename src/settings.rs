//! Engine settings and host environment
//!
//! Read from LocalStorage on wasm, kept apart from anything card-specific.
//! Scratch progress itself is never persisted.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Coarsest sampling allowed when measuring erasure
const MAX_SAMPLE_STRIDE: usize = 64;
/// Upper bound on live confetti
const CONFETTI_LIMIT: usize = 10_000;

/// Tunable engine constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Completion detection ===
    /// Erased fraction that starts the fade (0, 1]
    pub erase_threshold: f32,
    /// Alpha below which a pixel counts as erased
    pub alpha_cutoff: u8,
    /// Sample every Nth pixel when measuring erasure
    pub sample_stride: usize,

    // === Fade ===
    /// Opacity removed per animation frame
    pub fade_step: f32,
    /// Delay from overlay cleared to completion report
    pub post_fade_delay_ms: f64,
    /// Delay from completion to external notification
    pub notify_delay_ms: f64,

    // === Brush ===
    pub brush_radius_narrow: f32,
    pub brush_radius_wide: f32,
    /// Viewports narrower than this use the narrow brush
    pub narrow_breakpoint: f32,

    // === Raster ===
    pub max_device_pixel_ratio: f32,
    pub max_raster_pixels: usize,
    /// Overlay base color (0xRRGGBB)
    pub overlay_color: u32,
    /// Instruction painted on the overlay
    pub label: String,

    // === Celebration ===
    pub max_confetti: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            erase_threshold: ERASE_THRESHOLD,
            alpha_cutoff: ALPHA_CUTOFF,
            sample_stride: 1,

            fade_step: FADE_STEP,
            post_fade_delay_ms: POST_FADE_DELAY_MS,
            notify_delay_ms: NOTIFY_DELAY_MS,

            brush_radius_narrow: BRUSH_RADIUS_NARROW,
            brush_radius_wide: BRUSH_RADIUS_WIDE,
            narrow_breakpoint: NARROW_BREAKPOINT,

            max_device_pixel_ratio: MAX_DEVICE_PIXEL_RATIO,
            max_raster_pixels: MAX_RASTER_PIXELS,
            overlay_color: OVERLAY_COLOR,
            label: "SCRATCH HERE".to_string(),

            max_confetti: MAX_CONFETTI,
        }
    }
}

impl Settings {
    /// Parse settings from JSON and validate them
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check every numeric setting is in range
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn check(field: &'static str, value: f64, ok: bool) -> Result<(), ConfigError> {
            if ok && value.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::OutOfRange { field, value })
            }
        }

        let t = self.erase_threshold as f64;
        check("erase_threshold", t, t > 0.0 && t <= 1.0)?;
        let step = self.fade_step as f64;
        check("fade_step", step, step > 0.0 && step <= 1.0)?;
        let stride = self.sample_stride as f64;
        check(
            "sample_stride",
            stride,
            (1..=MAX_SAMPLE_STRIDE).contains(&self.sample_stride),
        )?;
        // Zero would make every pixel count as intact forever
        let cutoff = self.alpha_cutoff as f64;
        check("alpha_cutoff", cutoff, self.alpha_cutoff >= 1)?;
        let delay = self.post_fade_delay_ms;
        check("post_fade_delay_ms", delay, delay >= 0.0)?;
        let delay = self.notify_delay_ms;
        check("notify_delay_ms", delay, delay >= 0.0)?;
        let r = self.brush_radius_narrow as f64;
        check("brush_radius_narrow", r, r > 0.0)?;
        let r = self.brush_radius_wide as f64;
        check("brush_radius_wide", r, r > 0.0)?;
        let bp = self.narrow_breakpoint as f64;
        check("narrow_breakpoint", bp, bp >= 0.0)?;
        let dpr = self.max_device_pixel_ratio as f64;
        check("max_device_pixel_ratio", dpr, dpr >= 1.0)?;
        let px = self.max_raster_pixels as f64;
        check("max_raster_pixels", px, self.max_raster_pixels > 0)?;
        let color = self.overlay_color as f64;
        check("overlay_color", color, self.overlay_color <= 0xFF_FF_FF)?;
        let confetti = self.max_confetti as f64;
        check("max_confetti", confetti, self.max_confetti <= CONFETTI_LIMIT)?;
        Ok(())
    }

    /// Brush radius in logical pixels for a viewport width
    ///
    /// Keyed on width only: a wide touch screen still gets the wide brush.
    pub fn brush_radius_for(&self, viewport_width: f32) -> f32 {
        if viewport_width < self.narrow_breakpoint {
            self.brush_radius_narrow
        } else {
            self.brush_radius_wide
        }
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "scratch_reveal_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}

/// What the host display can do, sampled once at mount
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Environment {
    /// Physical pixels per logical pixel
    pub device_pixel_ratio: f32,
    /// Viewport width in logical pixels (picks the brush tier)
    pub viewport_width: f32,
    /// False when the host has no usable 2D raster API
    pub raster_supported: bool,
    /// Per-mount seed for the overlay texture and confetti
    pub seed: u64,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            device_pixel_ratio: 1.0,
            viewport_width: 1024.0,
            raster_supported: true,
            seed: 0,
        }
    }
}

impl Environment {
    /// Pixel ratio used for raster allocation, capped at `max`
    pub fn effective_pixel_ratio(&self, max: f32) -> f32 {
        let dpr = self.device_pixel_ratio;
        if !dpr.is_finite() || dpr <= 0.0 {
            1.0
        } else {
            dpr.min(max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_from_json_partial_uses_defaults() {
        let settings = Settings::from_json(r#"{"erase_threshold": 0.6, "fade_step": 0.1}"#).unwrap();
        assert!((settings.erase_threshold - 0.6).abs() < f32::EPSILON);
        assert!((settings.fade_step - 0.1).abs() < f32::EPSILON);
        assert_eq!(settings.alpha_cutoff, ALPHA_CUTOFF);
        assert_eq!(settings.label, "SCRATCH HERE");
    }

    #[test]
    fn test_from_json_rejects_out_of_range() {
        let err = Settings::from_json(r#"{"erase_threshold": 1.5}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                field: "erase_threshold",
                ..
            }
        ));

        let err = Settings::from_json(r#"{"sample_stride": 0}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                field: "sample_stride",
                ..
            }
        ));
    }

    fn rejected_field(json: &str) -> Option<&'static str> {
        match Settings::from_json(json) {
            Err(ConfigError::OutOfRange { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn test_zero_alpha_cutoff_rejected() {
        assert_eq!(rejected_field(r#"{"alpha_cutoff": 0}"#), Some("alpha_cutoff"));
        assert!(Settings::from_json(r#"{"alpha_cutoff": 1}"#).is_ok());
    }

    #[test]
    fn test_sample_stride_bounded() {
        assert_eq!(rejected_field(r#"{"sample_stride": 65}"#), Some("sample_stride"));
        assert_eq!(rejected_field(r#"{"sample_stride": 1000000}"#), Some("sample_stride"));
        assert!(Settings::from_json(r#"{"sample_stride": 64}"#).is_ok());
    }

    #[test]
    fn test_overlay_color_must_be_rgb() {
        assert_eq!(rejected_field(r#"{"overlay_color": 16777216}"#), Some("overlay_color"));
        assert!(Settings::from_json(r#"{"overlay_color": 16777215}"#).is_ok());
    }

    #[test]
    fn test_max_confetti_bounded() {
        assert_eq!(rejected_field(r#"{"max_confetti": 10001}"#), Some("max_confetti"));
        assert!(Settings::from_json(r#"{"max_confetti": 0}"#).is_ok());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            Settings::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_brush_radius_tiers() {
        let settings = Settings::default();
        assert_eq!(settings.brush_radius_for(375.0), BRUSH_RADIUS_NARROW);
        assert_eq!(settings.brush_radius_for(NARROW_BREAKPOINT), BRUSH_RADIUS_WIDE);
        assert_eq!(settings.brush_radius_for(1920.0), BRUSH_RADIUS_WIDE);
        assert!(BRUSH_RADIUS_NARROW < BRUSH_RADIUS_WIDE);
    }

    #[test]
    fn test_effective_pixel_ratio() {
        let env = Environment {
            device_pixel_ratio: 2.0,
            ..Default::default()
        };
        assert_eq!(env.effective_pixel_ratio(3.0), 2.0);

        let env = Environment {
            device_pixel_ratio: 4.0,
            ..Default::default()
        };
        assert_eq!(env.effective_pixel_ratio(3.0), 3.0);

        let env = Environment {
            device_pixel_ratio: f32::NAN,
            ..Default::default()
        };
        assert_eq!(env.effective_pixel_ratio(3.0), 1.0);
    }
}
