//! Color quantization via NeuQuant.
//!
//! Wraps [`color_quant::NeuQuant`] behind the `quantize(pixels, max_colors,
//! options)` contract the pipeline expects, and provides [`quantize_frame`]
//! which chains quantization, the transparency sentinel and indexing.

use color_quant::NeuQuant;

use crate::error::PaletteError;
use crate::indexed::{index_pixels, IndexedFrame};
use crate::palette::{Palette, Rgba, MAX_PALETTE_LEN};

/// NeuQuant sampling factor: 1 samples every pixel, 30 is fastest.
pub const DEFAULT_SAMPLE_FACTOR: i32 = 10;

/// Pixels with alpha below this are treated as fully transparent.
pub const DEFAULT_ALPHA_THRESHOLD: u8 = 128;

/// Real colors per frame; one more slot is kept for the sentinel.
pub const DEFAULT_MAX_COLORS: usize = MAX_PALETTE_LEN - 1;

/// Hints for the color quantizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizeOptions {
    /// Zero the RGB of fully transparent pixels before clustering.
    pub clear_alpha: bool,
    /// Force every returned entry fully opaque.
    ///
    /// NeuQuant seeds its network with a grey ramp that includes alpha, so
    /// neurons no pixel ever pulled on keep a partial alpha. Clustering only
    /// sees opaque pixels, so with this set the table is binary: opaque
    /// entries here, transparency through the sentinel.
    pub one_bit_alpha: bool,
}

impl Default for QuantizeOptions {
    fn default() -> Self {
        Self {
            clear_alpha: false,
            one_bit_alpha: true,
        }
    }
}

/// Settings for [`quantize_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizeConfig {
    pub max_colors: usize,
    pub alpha_threshold: u8,
    pub sample_factor: i32,
    pub options: QuantizeOptions,
}

impl Default for QuantizeConfig {
    fn default() -> Self {
        Self {
            max_colors: DEFAULT_MAX_COLORS,
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            sample_factor: DEFAULT_SAMPLE_FACTOR,
            options: QuantizeOptions::default(),
        }
    }
}

/// Reduce RGBA pixels to at most `max_colors` representative colors.
///
/// Clustering runs over every pixel but ignores alpha: each pixel is fed to
/// NeuQuant as opaque.
///
/// # Errors
///
/// - [`PaletteError::InvalidColorCount`] if `max_colors` is not in `1..=255`
/// - [`PaletteError::BufferSize`] if `pixels` is not a whole number of RGBA pixels
pub fn quantize(
    pixels: &[u8],
    max_colors: usize,
    options: QuantizeOptions,
) -> Result<Vec<Rgba>, PaletteError> {
    quantize_with_sample_factor(pixels, max_colors, options, DEFAULT_SAMPLE_FACTOR)
}

/// [`quantize`] with an explicit NeuQuant sampling factor.
pub fn quantize_with_sample_factor(
    pixels: &[u8],
    max_colors: usize,
    options: QuantizeOptions,
    sample_factor: i32,
) -> Result<Vec<Rgba>, PaletteError> {
    if max_colors == 0 || max_colors >= MAX_PALETTE_LEN {
        return Err(PaletteError::InvalidColorCount(max_colors));
    }
    if pixels.len() % 4 != 0 {
        let count = pixels.len() / 4;
        return Err(PaletteError::BufferSize {
            width: count,
            height: 1,
            expected: count * 4,
            actual: pixels.len(),
        });
    }

    let opaque: Vec<u8> = pixels
        .chunks_exact(4)
        .flat_map(|p| {
            if options.clear_alpha && p[3] == 0 {
                [0, 0, 0, 255]
            } else {
                [p[0], p[1], p[2], 255]
            }
        })
        .collect();

    let nq = NeuQuant::new(sample_factor.clamp(1, 30), max_colors, &opaque);

    let colors = nq
        .color_map_rgba()
        .chunks_exact(4)
        .map(|c| {
            let alpha = if options.one_bit_alpha { 255 } else { c[3] };
            [c[0], c[1], c[2], alpha]
        })
        .collect();

    Ok(colors)
}

/// Quantize one RGBA frame into a fresh palette plus index buffer.
///
/// The palette gets the transparency sentinel appended, so its length is
/// `max_colors + 1` at most.
pub fn quantize_frame(
    pixels: &[u8],
    width: usize,
    height: usize,
    config: &QuantizeConfig,
) -> Result<IndexedFrame, PaletteError> {
    let expected = width * height * 4;
    if pixels.len() != expected {
        return Err(PaletteError::BufferSize {
            width,
            height,
            expected,
            actual: pixels.len(),
        });
    }

    let colors = quantize_with_sample_factor(
        pixels,
        config.max_colors,
        config.options,
        config.sample_factor,
    )?;
    let palette = Palette::new(colors)?.with_transparency_sentinel()?;

    index_pixels(pixels, width, height, palette, config.alpha_threshold)
}
