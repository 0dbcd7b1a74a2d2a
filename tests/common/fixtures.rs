//! Test images and pipeline builders.

use async_trait::async_trait;
use image::{ImageFormat, Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use intensifies::error::EncodingError;
use intensifies::models::{DataUri, IntensifyConfig};
use intensifies::services::{GifRecompressor, IntensifyPipeline, PaletteReducer};

pub const RED: [u8; 4] = [255, 0, 0, 255];

fn encode_png(img: &RgbaImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .expect("PNG encoding should not fail");
    out.into_inner()
}

/// Solid color PNG
pub fn solid_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    encode_png(&RgbaImage::from_pixel(width, height, Rgba(color)))
}

/// Seeded per-pixel noise, hard to compress
pub fn noise_png(width: u32, height: u32, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let img = RgbaImage::from_fn(width, height, |_, _| {
        Rgba([rng.gen(), rng.gen(), rng.gen(), 255])
    });
    encode_png(&img)
}

/// Horizontal gradient with a transparent right half
pub fn half_transparent_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgba([(x * 255 / width.max(1)) as u8, 80, 160, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    encode_png(&img)
}

pub fn png_data_uri(png: &[u8]) -> String {
    DataUri::encode("image/png", png)
}

pub fn pipeline() -> IntensifyPipeline {
    IntensifyPipeline::new(IntensifyConfig::default())
}

pub fn pipeline_with_budget(max_bytes: usize) -> IntensifyPipeline {
    IntensifyPipeline::new(IntensifyConfig {
        max_file_size_bytes: max_bytes,
        ..IntensifyConfig::default()
    })
}

/// Wraps [`PaletteReducer`] and records every level and input size it sees
#[derive(Default)]
pub struct RecordingRecompressor {
    inner: PaletteReducer,
    calls: Mutex<Vec<(u32, usize)>>,
}

impl RecordingRecompressor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn levels(&self) -> Vec<u32> {
        self.calls.lock().unwrap().iter().map(|(l, _)| *l).collect()
    }

    pub fn input_sizes(&self) -> Vec<usize> {
        self.calls.lock().unwrap().iter().map(|(_, n)| *n).collect()
    }
}

#[async_trait]
impl GifRecompressor for RecordingRecompressor {
    async fn recompress(&self, gif: &[u8], level: u32) -> Result<Vec<u8>, EncodingError> {
        self.calls.lock().unwrap().push((level, gif.len()));
        self.inner.recompress(gif, level).await
    }

    fn name(&self) -> &str {
        "recording"
    }
}
