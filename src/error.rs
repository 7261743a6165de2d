//! Error type for pipeline construction.
//!
//! Span driving never fails; only building a pipeline over borrowed pixels
//! or respecializing one for a destination can be refused.

use crate::blend_mode::BlendMode;
use crate::pixmap::ColorType;

/// Result alias used throughout the crate.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors raised while assembling or respecializing a pipeline.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// No blit blender exists for this destination and blend mode.
    #[error("unsupported blit: {color_type:?} destination with {blend_mode:?}")]
    UnsupportedBlit {
        color_type: ColorType,
        blend_mode: BlendMode,
    },
    /// A pixel buffer is smaller than its dimensions and stride require.
    #[error("invalid pixmap: {0}")]
    InvalidPixmap(String),
    /// The embedding storage already holds a pipeline.
    #[error("pipeline storage is already initialized")]
    StorageOccupied,
}

impl PipelineError {
    pub fn invalid_pixmap(msg: impl Into<String>) -> Self {
        Self::InvalidPixmap(msg.into())
    }
}
