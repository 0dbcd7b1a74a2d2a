use intensify_palette::PaletteError;
use thiserror::Error;

use crate::models::config::ConfigError;

/// Everything a generation call can fail with.
#[derive(Debug, Error)]
pub enum IntensifyError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl From<PaletteError> for IntensifyError {
    fn from(e: PaletteError) -> Self {
        IntensifyError::Encoding(EncodingError::Palette(e))
    }
}

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("Palette error: {0}")]
    Palette(#[from] PaletteError),

    #[error("GIF encode error: {0}")]
    Gif(String),

    #[error("Recompress error: {0}")]
    Recompress(String),

    #[error("Failed to allocate pixmap")]
    PixmapAllocation,

    #[error("Frame size mismatch: got {width}x{height}, document is {expected_width}x{expected_height}")]
    FrameSize {
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },

    #[error("Render task failed: {0}")]
    Task(String),
}

impl From<gif::EncodingError> for EncodingError {
    fn from(e: gif::EncodingError) -> Self {
        EncodingError::Gif(e.to_string())
    }
}
