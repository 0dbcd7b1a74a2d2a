//! Animated GIF assembly on top of the `gif` crate.

use gif::{DisposalMethod, Encoder, Repeat};
use intensify_palette::IndexedFrame;

use crate::error::EncodingError;

/// Per-frame encoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOptions {
    pub delay_ms: u32,
    /// Emit the palette's transparency sentinel as the frame's transparent index
    pub transparent: bool,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            delay_ms: 50,
            transparent: true,
        }
    }
}

/// GIF delays are in hundredths of a second; round to the nearest.
pub fn delay_centiseconds(delay_ms: u32) -> u16 {
    let cs = (delay_ms.saturating_add(5)) / 10;
    cs.min(u16::MAX as u32) as u16
}

/// An infinitely looping GIF89a being written frame by frame.
///
/// Every frame carries its own local color table, there is no global one.
pub struct GifDocument {
    encoder: Encoder<Vec<u8>>,
    width: u16,
    height: u16,
    frames: usize,
}

impl GifDocument {
    pub fn new(width: u16, height: u16) -> Result<Self, EncodingError> {
        let mut encoder = Encoder::new(Vec::new(), width, height, &[])?;
        encoder.set_repeat(Repeat::Infinite)?;
        Ok(Self {
            encoder,
            width,
            height,
            frames: 0,
        })
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frames
    }

    pub fn write_frame(
        &mut self,
        frame: &IndexedFrame,
        options: FrameOptions,
    ) -> Result<(), EncodingError> {
        if frame.width() != self.width as usize || frame.height() != self.height as usize {
            return Err(EncodingError::FrameSize {
                width: frame.width(),
                height: frame.height(),
                expected_width: self.width as usize,
                expected_height: self.height as usize,
            });
        }

        let transparent = if options.transparent {
            frame.transparent_index().map(|i| i as u8)
        } else {
            None
        };

        let gif_frame = gif::Frame {
            width: self.width,
            height: self.height,
            delay: delay_centiseconds(options.delay_ms),
            dispose: DisposalMethod::Background,
            transparent,
            palette: Some(frame.palette().to_rgb_bytes()),
            buffer: std::borrow::Cow::Borrowed(frame.indices()),
            ..gif::Frame::default()
        };
        self.encoder.write_frame(&gif_frame)?;
        self.frames += 1;
        Ok(())
    }

    /// Write the trailer and hand back the bytes
    pub fn finish(self) -> Result<Vec<u8>, EncodingError> {
        self.encoder
            .into_inner()
            .map_err(|e| EncodingError::Gif(e.to_string()))
    }
}
