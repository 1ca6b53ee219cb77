use std::path::PathBuf;
use thiserror::Error;

/// Fatal problems detected while validating a batch.
///
/// Any of these aborts the batch before the first certificate is drawn.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("font size must be positive, got {0}")]
    InvalidFontSize(u32),
    #[error("y position {y} is outside the template height 0..={height}")]
    PositionOutOfRange { y: u32, height: u32 },
    #[error("template canvas is empty ({width}x{height})")]
    EmptyCanvas { width: u32, height: u32 },
    #[error("font file not found: {}", .0.display())]
    FontNotFound(PathBuf),
    #[error("font {} could not be loaded: {reason}", .path.display())]
    FontUnloadable { path: PathBuf, reason: String },
    #[error("invalid color {0:?}, expected #RRGGBB")]
    InvalidColor(String),
    #[error("worker pool could not be started: {0}")]
    WorkerPool(String),
}

impl ConfigError {
    /// Name of the configuration field the error is about.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidFontSize(_) => "font_size",
            Self::PositionOutOfRange { .. } => "y_position",
            Self::EmptyCanvas { .. } => "template",
            Self::FontNotFound(_) | Self::FontUnloadable { .. } => "font_path",
            Self::InvalidColor(_) => "color",
            Self::WorkerPool(_) => "workers",
        }
    }
}
