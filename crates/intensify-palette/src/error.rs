//! Error types for palette construction and pixel indexing.

use thiserror::Error;

/// Error type for palette validation and indexing.
///
/// Returned when a palette would be empty or exceed the 256 entries a GIF
/// color table can hold, or when a pixel buffer does not match the
/// dimensions it was declared with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaletteError {
    /// No colors provided in palette
    #[error("palette cannot be empty")]
    EmptyPalette,

    /// More entries than a GIF color table can address
    #[error("palette has {len} colors (max {max})")]
    TooManyColors {
        /// Number of entries requested
        len: usize,
        /// Maximum number of entries allowed
        max: usize,
    },

    /// Requested quantizer color count is outside `1..=255`
    #[error("invalid color count {0} (expected 1..=255)")]
    InvalidColorCount(usize),

    /// RGBA buffer length does not match `width * height * 4`
    #[error("pixel buffer has {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferSize {
        /// Declared width in pixels
        width: usize,
        /// Declared height in pixels
        height: usize,
        /// Expected byte length
        expected: usize,
        /// Actual byte length
        actual: usize,
    },

    /// An index buffer refers past the end of its palette
    #[error("index {index} out of range for palette of {len} colors")]
    IndexOutOfRange {
        /// Offending index value
        index: u8,
        /// Palette length
        len: usize,
    },
}
