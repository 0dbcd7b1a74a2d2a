//! Decodes caller-supplied image bytes and fits them into the canvas.

use image::error::{LimitError, LimitErrorKind};
use image::imageops::FilterType;
use image::{ImageError, ImageReader, RgbaImage};
use std::io::Cursor;

use crate::error::IntensifyError;

/// The source image resized so its longer side equals the canvas size.
///
/// Pixels are straight (non-premultiplied) RGBA.
#[derive(Debug, Clone)]
pub struct ResizedImage {
    image: RgbaImage,
}

impl ResizedImage {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Raw RGBA bytes, row-major
    #[inline]
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn into_inner(self) -> RgbaImage {
        self.image
    }
}

/// Dimensions that fit `width x height` into a `size` bounding square.
///
/// The longer side becomes `size`, the shorter one is scaled by the aspect
/// ratio and rounded to the nearest pixel (never below 1).
pub fn fit_dimensions(width: u32, height: u32, size: u32) -> (u32, u32) {
    let aspect = width as f64 / height as f64;
    if aspect > 1.0 {
        let resized = (size as f64 / aspect).round() as u32;
        (size, resized.max(1))
    } else {
        let resized = (size as f64 * aspect).round() as u32;
        (resized.max(1), size)
    }
}

/// Read the image dimensions from the header without decoding pixels
pub fn probe_dimensions(bytes: &[u8]) -> Result<(u32, u32), IntensifyError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let (width, height) = reader.into_dimensions()?;
    if width == 0 || height == 0 {
        let kind = LimitErrorKind::DimensionError;
        return Err(ImageError::Limits(LimitError::from_kind(kind)).into());
    }
    Ok((width, height))
}

/// Decode `bytes` and resize to fit a `size x size` box, keeping the aspect ratio.
///
/// Uses Lanczos3 resampling.
pub fn load_resized(bytes: &[u8], size: u32) -> Result<ResizedImage, IntensifyError> {
    let (width, height) = probe_dimensions(bytes)?;
    let (resize_width, resize_height) = fit_dimensions(width, height, size);

    let decoded = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?
        .to_rgba8();

    tracing::debug!(
        width,
        height,
        resize_width,
        resize_height,
        "Decoded source image"
    );

    let resized = if (width, height) == (resize_width, resize_height) {
        decoded
    } else {
        image::imageops::resize(&decoded, resize_width, resize_height, FilterType::Lanczos3)
    };

    Ok(ResizedImage::new(resized))
}
