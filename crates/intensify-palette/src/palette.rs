//! Palette struct with a reserved transparency slot and nearest-color matching.
//!
//! A [`Palette`] holds up to 256 RGBA entries. After quantization the caller
//! appends a fully transparent sentinel with
//! [`Palette::with_transparency_sentinel`]; that entry is excluded from
//! nearest-color matching so opaque pixels can never land on it.

use crate::error::PaletteError;

/// One palette entry as `[R, G, B, A]`.
pub type Rgba = [u8; 4];

/// The color stored in the transparency slot.
pub const TRANSPARENT_SENTINEL: Rgba = [0, 0, 0, 0];

/// Largest palette a GIF local color table can hold.
pub const MAX_PALETTE_LEN: usize = 256;

/// An ordered color table with an optional transparency sentinel.
///
/// # Example
///
/// ```
/// use intensify_palette::Palette;
///
/// let palette = Palette::new(vec![[255, 0, 0, 255], [0, 0, 255, 255]])
///     .unwrap()
///     .with_transparency_sentinel()
///     .unwrap();
///
/// assert_eq!(palette.len(), 3);
/// assert_eq!(palette.transparent_index(), Some(2));
/// assert_eq!(palette.find_nearest([200, 10, 10]), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgba>,
    transparent_index: Option<usize>,
}

impl Palette {
    /// Create a palette from quantized colors.
    ///
    /// Duplicate entries are allowed; the quantizer may return them and the
    /// nearest-color scan resolves ties to the lowest index.
    ///
    /// # Errors
    ///
    /// - [`PaletteError::EmptyPalette`] if `colors` is empty
    /// - [`PaletteError::TooManyColors`] if `colors` has more than 256 entries
    pub fn new(colors: Vec<Rgba>) -> Result<Self, PaletteError> {
        if colors.is_empty() {
            return Err(PaletteError::EmptyPalette);
        }
        if colors.len() > MAX_PALETTE_LEN {
            return Err(PaletteError::TooManyColors {
                len: colors.len(),
                max: MAX_PALETTE_LEN,
            });
        }
        Ok(Self {
            colors,
            transparent_index: None,
        })
    }

    /// Append the `(0, 0, 0, 0)` sentinel and record its index.
    ///
    /// After this call `transparent_index() == Some(len() - 1)`. Calling it on
    /// a palette that already has a sentinel returns the palette unchanged.
    ///
    /// # Errors
    ///
    /// [`PaletteError::TooManyColors`] if the palette is already full.
    pub fn with_transparency_sentinel(mut self) -> Result<Self, PaletteError> {
        if self.transparent_index.is_some() {
            return Ok(self);
        }
        if self.colors.len() >= MAX_PALETTE_LEN {
            return Err(PaletteError::TooManyColors {
                len: self.colors.len() + 1,
                max: MAX_PALETTE_LEN,
            });
        }
        self.colors.push(TRANSPARENT_SENTINEL);
        self.transparent_index = Some(self.colors.len() - 1);
        Ok(self)
    }

    /// Number of entries, including the sentinel if present.
    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always `false`; empty palettes are rejected at construction.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Index of the transparency sentinel, if one was appended.
    #[inline]
    pub fn transparent_index(&self) -> Option<usize> {
        self.transparent_index
    }

    /// Entry at `idx`.
    #[inline]
    pub fn get(&self, idx: usize) -> Rgba {
        self.colors[idx]
    }

    /// All entries in order.
    #[inline]
    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    /// Entries that take part in nearest-color matching.
    #[inline]
    pub fn opaque_colors(&self) -> &[Rgba] {
        match self.transparent_index {
            Some(idx) => &self.colors[..idx],
            None => &self.colors,
        }
    }

    /// Find the entry closest to `rgb` by squared Euclidean RGB distance.
    ///
    /// Scans the non-sentinel entries in order; the first minimum wins.
    /// O(palette size) per call, which is fine at 128x128 frames with 255
    /// colors. Swap for a k-d tree if frames or palettes grow.
    #[inline]
    pub fn find_nearest(&self, rgb: [u8; 3]) -> usize {
        let [r, g, b] = rgb.map(i32::from);

        let mut best_idx = 0;
        let mut best_dist = i32::MAX;

        for (i, entry) in self.opaque_colors().iter().enumerate() {
            let dr = r - entry[0] as i32;
            let dg = g - entry[1] as i32;
            let db = b - entry[2] as i32;
            let dist = dr * dr + dg * dg + db * db;
            if dist < best_dist {
                best_dist = dist;
                best_idx = i;
                if dist == 0 {
                    break;
                }
            }
        }

        best_idx
    }

    /// Flatten to `[R, G, B, R, G, B, ...]`, the layout GIF color tables use.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.colors
            .iter()
            .flat_map(|&[r, g, b, _]| [r, g, b])
            .collect()
    }
}
