//! A small 2D canvas over a tiny-skia pixmap.
//!
//! tiny-skia draws with an explicit transform per call and has no context
//! state, so the canvas keeps the current transform itself together with a
//! save/restore stack. Transform calls compose the way a 2D canvas context
//! does: each one applies to coordinates before everything set up earlier.

use tiny_skia::{Color, ColorU8, FilterQuality, Pixmap, PixmapPaint, Transform};

use crate::error::EncodingError;
use crate::rendering::frames::Frame;

/// Build a premultiplied pixmap from straight RGBA bytes
pub fn pixmap_from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Pixmap, EncodingError> {
    let mut pixmap = Pixmap::new(width, height).ok_or(EncodingError::PixmapAllocation)?;
    if rgba.len() != pixmap.pixels().len() * 4 {
        return Err(EncodingError::FrameSize {
            width: width as usize,
            height: rgba.len() / 4 / (width.max(1) as usize),
            expected_width: width as usize,
            expected_height: height as usize,
        });
    }

    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(rgba.chunks_exact(4)) {
        *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }
    Ok(pixmap)
}

pub struct Canvas {
    pixmap: Pixmap,
    transform: Transform,
    stack: Vec<Transform>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self, EncodingError> {
        let pixmap = Pixmap::new(width, height).ok_or(EncodingError::PixmapAllocation)?;
        Ok(Self {
            pixmap,
            transform: Transform::identity(),
            stack: Vec::new(),
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Current transform
    #[inline]
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Number of saved states not yet restored
    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Reset every pixel to transparent black. The transform is untouched.
    pub fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    pub fn save(&mut self) {
        self.stack.push(self.transform);
    }

    /// Pop the last saved transform. Without a matching `save` this does nothing.
    pub fn restore(&mut self) {
        match self.stack.pop() {
            Some(transform) => self.transform = transform,
            None => tracing::trace!("restore() without matching save()"),
        }
    }

    /// Run `f` between `save()` and `restore()`
    pub fn with_saved<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.save();
        let result = f(self);
        self.restore();
        result
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.transform = self.transform.pre_translate(dx, dy);
    }

    /// Rotate clockwise (y axis points down) by `radians`
    pub fn rotate(&mut self, radians: f32) {
        self.transform = self
            .transform
            .pre_concat(Transform::from_rotate(radians.to_degrees()));
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.transform = self.transform.pre_scale(sx, sy);
    }

    /// Draw `image` into the rectangle `(x, y, width, height)` of the current
    /// coordinate system, with bicubic filtering.
    pub fn draw_image(&mut self, image: &Pixmap, x: f32, y: f32, width: f32, height: f32) {
        let sx = width / image.width() as f32;
        let sy = height / image.height() as f32;
        let transform = self.transform.pre_translate(x, y).pre_scale(sx, sy);

        let paint = PixmapPaint {
            quality: FilterQuality::Bicubic,
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, image.as_ref(), &paint, transform, None);
    }

    /// Copy the pixels out as straight RGBA
    pub fn snapshot(&self) -> Frame {
        let rgba = self
            .pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();
        Frame::new(self.width(), self.height(), rgba)
    }
}
