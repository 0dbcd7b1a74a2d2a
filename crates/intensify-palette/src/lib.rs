//! intensify-palette: per-frame palettes and transparent indexing for GIFs
//!
//! Reduces a true-color RGBA frame to a GIF-ready local color table plus one
//! index byte per pixel, reserving the last palette slot as a fully
//! transparent sentinel.
//!
//! # Quick Start
//!
//! ```
//! use intensify_palette::{quantize_frame, QuantizeConfig};
//!
//! // 16x16 opaque gradient with a transparent first row
//! let mut rgba = Vec::new();
//! for y in 0..16u8 {
//!     for x in 0..16u8 {
//!         let alpha = if y == 0 { 0 } else { 255 };
//!         rgba.extend_from_slice(&[x * 16, y * 16, 128, alpha]);
//!     }
//! }
//!
//! let frame = quantize_frame(&rgba, 16, 16, &QuantizeConfig::default()).unwrap();
//! let sentinel = frame.transparent_index().unwrap();
//!
//! assert_eq!(sentinel, frame.palette().len() - 1);
//! assert!(frame.indices()[..16].iter().all(|&i| i as usize == sentinel));
//! ```
//!
//! # Pipeline
//!
//! ```text
//! RGBA frame
//!     |
//!     v
//! quantize()            NeuQuant over all pixels, alpha ignored (<= 255 colors)
//!     |
//!     v
//! Palette::new()
//!   .with_transparency_sentinel()   appends (0,0,0,0) at len - 1
//!     |
//!     v
//! index_pixels()        alpha < threshold -> sentinel
//!                       otherwise nearest entry by squared RGB distance
//!     |
//!     v
//! IndexedFrame          indices + palette, ready for a GIF local color table
//! ```
//!
//! Palettes are never shared between frames: every frame is clustered on its
//! own, which keeps colors accurate while the animation moves.
//!
//! # Nearest-color search
//!
//! [`Palette::find_nearest`] is a linear scan, O(pixels x palette) per frame.
//! At 128x128 pixels and 255 colors that is about four million distance
//! evaluations per frame, which is fast enough here.

mod error;
mod indexed;
mod palette;
mod quantize;

pub use error::PaletteError;
pub use indexed::{index_pixels, IndexedFrame};
pub use palette::{Palette, Rgba, MAX_PALETTE_LEN, TRANSPARENT_SENTINEL};
pub use quantize::{
    quantize, quantize_frame, quantize_with_sample_factor, QuantizeConfig, QuantizeOptions,
    DEFAULT_ALPHA_THRESHOLD, DEFAULT_MAX_COLORS, DEFAULT_SAMPLE_FACTOR,
};
