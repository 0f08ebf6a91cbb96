//! Error types
//!
//! Nothing in the engine retries. Surface errors degrade the overlay, effect
//! errors are logged and swallowed, config errors are returned to the host.

/// Raster allocation or sampling failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("raster surface not supported by host environment")]
    Unsupported,

    #[error("invalid raster size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("raster of {pixels} pixels exceeds limit of {limit}")]
    TooLarge { pixels: u64, limit: usize },

    #[error("raster allocation failed: {0}")]
    Allocation(String),

    #[error("pixel buffer holds {actual} pixels, expected {expected}")]
    Sampling { expected: usize, actual: usize },
}

/// Celebration effect failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EffectError {
    #[error("celebration effect disabled")]
    Disabled,

    #[error("invalid effect intensity: {0}")]
    InvalidIntensity(f32),

    #[error("host effect failed: {0}")]
    Host(String),
}

/// Settings parse/validation failure
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("settings parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("setting `{field}` out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}
