// THEORY:
// Errors are layered the same way the engine is. Per-sample problems (a color string
// that does not parse, an unknown deficiency identifier) are values handled locally and
// never reach this module. What does reach it are the things a caller must act on:
// an invalid configuration, an I/O or codec failure at the crate's edges, or a worker
// pool that went away.

use crate::core_modules::simulation::simulation::DeficiencyType;
use thiserror::Error;

/// A configuration that cannot drive the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("threshold must be a finite positive number, got {0}")]
    InvalidThreshold(f64),
    #[error("severity must lie in [0, 1], got {0}")]
    SeverityOutOfRange(f64),
    #[error("palette needs at least 2 entries, got {0}")]
    PaletteTooSmall(usize),
    #[error("fix_order must name at least one deficiency type")]
    NoDeficiencyTypes,
    #[error("deficiency type `{0}` appears more than once in fix_order")]
    DuplicateDeficiencyType(DeficiencyType),
    #[error("filter bounds are inverted: near_black_max {near_black_max} > near_white_min {near_white_min}")]
    InvalidFilterBounds { near_black_max: u8, near_white_min: u8 },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),
    #[error("logging setup failed: {0}")]
    Logging(String),
    #[error("worker pool is not accepting tasks")]
    WorkerUnavailable,
    #[error("worker dropped the task before replying")]
    WorkerDropped,
    #[error("{len} bytes do not fill a {width}x{height} RGBA image")]
    BufferSize { width: u32, height: u32, len: usize },
}

pub type Result<T> = std::result::Result<T, EngineError>;
