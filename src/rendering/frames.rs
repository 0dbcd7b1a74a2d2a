//! Wobble frame synthesis.
//!
//! Each frame draws the same bitmap about the canvas center with a small
//! alternating rotation, a random jitter offset and a slowly growing scale.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::iter::FusedIterator;
use tiny_skia::Pixmap;

use crate::error::EncodingError;
use crate::models::MotionConfig;
use crate::rendering::canvas::{pixmap_from_rgba, Canvas};
use crate::rendering::loader::ResizedImage;

/// One rendered RGBA frame (straight alpha).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        debug_assert_eq!(rgba.len(), width as usize * height as usize * 4);
        Self {
            width,
            height,
            rgba,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.rgba[i],
            self.rgba[i + 1],
            self.rgba[i + 2],
            self.rgba[i + 3],
        ]
    }

    pub fn into_rgba(self) -> Vec<u8> {
        self.rgba
    }
}

/// Source of per-frame jitter offsets.
pub trait JitterSource {
    /// Return `(dx, dy)`, each within `[-max, max]`.
    fn offset(&mut self, max: f32) -> (f32, f32);
}

/// Uniform random jitter.
#[derive(Debug, Clone)]
pub struct RandomJitter<R> {
    rng: R,
}

impl<R: Rng> RandomJitter<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomJitter<StdRng> {
    /// Unseeded, every run wobbles differently
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> JitterSource for RandomJitter<R> {
    fn offset(&mut self, max: f32) -> (f32, f32) {
        if max <= 0.0 {
            return (0.0, 0.0);
        }
        let dx = self.rng.gen_range(-max..=max);
        let dy = self.rng.gen_range(-max..=max);
        (dx, dy)
    }
}

/// The same offset every frame, clamped to the allowed range.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedJitter {
    pub dx: f32,
    pub dy: f32,
}

impl FixedJitter {
    pub fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }
}

impl JitterSource for FixedJitter {
    fn offset(&mut self, max: f32) -> (f32, f32) {
        let max = max.max(0.0);
        (self.dx.clamp(-max, max), self.dy.clamp(-max, max))
    }
}

impl<J: JitterSource + ?Sized> JitterSource for Box<J> {
    fn offset(&mut self, max: f32) -> (f32, f32) {
        (**self).offset(max)
    }
}

/// Geometry of a single frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransform {
    /// Radians, positive is clockwise
    pub rotation: f32,
    pub jitter_x: f32,
    pub jitter_y: f32,
    pub scale: f32,
}

impl FrameTransform {
    /// Even frames tilt one way, odd frames the other. Scale grows linearly
    /// from 1 toward `1 + scale_growth` over the loop.
    pub fn for_frame(
        index: usize,
        frame_count: usize,
        jitter: (f32, f32),
        motion: &MotionConfig,
    ) -> Self {
        let direction = if index % 2 == 0 { 1.0 } else { -1.0 };
        let progress = if frame_count == 0 {
            0.0
        } else {
            index as f32 / frame_count as f32
        };
        Self {
            rotation: direction * motion.rotation,
            jitter_x: jitter.0,
            jitter_y: jitter.1,
            scale: 1.0 + progress * motion.scale_growth,
        }
    }

    /// Apply on top of the canvas transform: center, rotate, jitter, scale.
    pub fn apply(&self, canvas: &mut Canvas) {
        canvas.translate(canvas.width() as f32 / 2.0, canvas.height() as f32 / 2.0);
        canvas.rotate(self.rotation);
        canvas.translate(self.jitter_x, self.jitter_y);
        canvas.scale(self.scale, self.scale);
    }
}

/// Lazily renders `frame_count` frames, one per `next()`.
///
/// The canvas is reused between frames and cleared before each draw. Once
/// exhausted the iterator keeps returning `None`.
pub struct FrameSynthesizer<J> {
    canvas: Canvas,
    sprite: Pixmap,
    draw_width: f32,
    draw_height: f32,
    frame_count: usize,
    next_index: usize,
    motion: MotionConfig,
    jitter: J,
}

impl<J: JitterSource> FrameSynthesizer<J> {
    pub fn new(
        image: &ResizedImage,
        size: u32,
        frame_count: usize,
        motion: MotionConfig,
        jitter: J,
    ) -> Result<Self, EncodingError> {
        let canvas = Canvas::new(size, size)?;
        let sprite = pixmap_from_rgba(image.width(), image.height(), image.as_raw())?;
        Ok(Self {
            canvas,
            sprite,
            draw_width: image.width() as f32,
            draw_height: image.height() as f32,
            frame_count,
            next_index: 0,
            motion,
            jitter,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }
}

impl<J: JitterSource> Iterator for FrameSynthesizer<J> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if self.next_index >= self.frame_count {
            return None;
        }
        let index = self.next_index;
        self.next_index += 1;

        let jitter = self.jitter.offset(self.motion.jitter);
        let transform = FrameTransform::for_frame(index, self.frame_count, jitter, &self.motion);
        tracing::trace!(index, ?transform, "Rendering frame");

        let (w, h) = (self.draw_width, self.draw_height);
        let sprite = &self.sprite;
        self.canvas.clear();
        self.canvas.with_saved(|canvas| {
            transform.apply(canvas);
            canvas.draw_image(sprite, -w / 2.0, -h / 2.0, w, h);
        });

        Some(self.canvas.snapshot())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.frame_count.saturating_sub(self.next_index);
        (remaining, Some(remaining))
    }
}

impl<J: JitterSource> ExactSizeIterator for FrameSynthesizer<J> {}

impl<J: JitterSource> FusedIterator for FrameSynthesizer<J> {}
