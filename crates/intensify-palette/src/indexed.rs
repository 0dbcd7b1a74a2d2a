//! Indexed frames: one palette index per pixel plus the palette itself.
//!
//! [`IndexedFrame`] is the canonical output of quantization and the input to
//! the GIF encoder. [`index_pixels`] maps RGBA pixels onto an existing
//! palette, routing low-alpha pixels to the transparency sentinel.

use crate::error::PaletteError;
use crate::palette::Palette;

/// Palette indices for one frame, row-major, with the palette they refer to.
///
/// # Example
///
/// ```
/// use intensify_palette::{index_pixels, Palette};
///
/// let palette = Palette::new(vec![[0, 0, 0, 255], [255, 255, 255, 255]])
///     .unwrap()
///     .with_transparency_sentinel()
///     .unwrap();
///
/// // white, black, transparent, near-white
/// let rgba = [255, 255, 255, 255, 0, 0, 0, 255, 9, 9, 9, 0, 250, 250, 250, 255];
/// let frame = index_pixels(&rgba, 2, 2, palette, 128).unwrap();
///
/// assert_eq!(frame.indices(), &[1, 0, 2, 1]);
/// assert_eq!(frame.transparent_index(), Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFrame {
    indices: Vec<u8>,
    width: usize,
    height: usize,
    palette: Palette,
}

impl IndexedFrame {
    /// Wrap precomputed indices.
    ///
    /// # Errors
    ///
    /// [`PaletteError::BufferSize`] if `indices.len() != width * height`,
    /// [`PaletteError::IndexOutOfRange`] if an index is not below `palette.len()`.
    pub fn new(
        indices: Vec<u8>,
        width: usize,
        height: usize,
        palette: Palette,
    ) -> Result<Self, PaletteError> {
        if indices.len() != width * height {
            return Err(PaletteError::BufferSize {
                width,
                height,
                expected: width * height,
                actual: indices.len(),
            });
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= palette.len()) {
            return Err(PaletteError::IndexOutOfRange {
                index,
                len: palette.len(),
            });
        }
        Ok(Self {
            indices,
            width,
            height,
            palette,
        })
    }

    #[inline]
    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    #[inline]
    pub fn transparent_index(&self) -> Option<usize> {
        self.palette.transparent_index()
    }

    /// Split into indices and palette.
    pub fn into_parts(self) -> (Vec<u8>, Palette) {
        (self.indices, self.palette)
    }

    /// Reconstruct RGBA bytes by looking every index up in the palette.
    ///
    /// The buffer has length `width * height * 4`.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.indices.len() * 4);
        for &idx in &self.indices {
            rgba.extend_from_slice(&self.palette.get(idx as usize));
        }
        rgba
    }
}

/// Map every RGBA pixel onto `palette`.
///
/// Pixels with `alpha < alpha_threshold` get the palette's transparency
/// sentinel. If the palette has no sentinel they fall through to the
/// nearest-color scan like any other pixel.
///
/// # Errors
///
/// [`PaletteError::BufferSize`] if `rgba.len() != width * height * 4`.
pub fn index_pixels(
    rgba: &[u8],
    width: usize,
    height: usize,
    palette: Palette,
    alpha_threshold: u8,
) -> Result<IndexedFrame, PaletteError> {
    let expected = width * height * 4;
    if rgba.len() != expected {
        return Err(PaletteError::BufferSize {
            width,
            height,
            expected,
            actual: rgba.len(),
        });
    }

    let transparent = palette.transparent_index();
    let indices = rgba
        .chunks_exact(4)
        .map(|px| match transparent {
            Some(sentinel) if px[3] < alpha_threshold => sentinel as u8,
            _ => palette.find_nearest([px[0], px[1], px[2]]) as u8,
        })
        .collect();

    IndexedFrame::new(indices, width, height, palette)
}
