//! Assertion helpers for GIF output.

use gif::{ColorOutput, DecodeOptions, Repeat};
use pretty_assertions::assert_eq;

/// A decoded frame, expanded to RGBA by the decoder
pub struct DecodedFrame {
    pub width: u16,
    pub height: u16,
    pub delay: u16,
    pub rgba: Vec<u8>,
}

impl DecodedFrame {
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.width as usize + x) * 4;
        [
            self.rgba[i],
            self.rgba[i + 1],
            self.rgba[i + 2],
            self.rgba[i + 3],
        ]
    }
}

/// Decode every frame and the loop setting
pub fn decode_gif(bytes: &[u8]) -> (Vec<DecodedFrame>, Repeat) {
    let mut options = DecodeOptions::new();
    options.set_color_output(ColorOutput::RGBA);
    let mut decoder = options.read_info(bytes).expect("output should be a readable GIF");

    let mut frames = Vec::new();
    while let Some(frame) = decoder.read_next_frame().expect("frame should decode") {
        frames.push(DecodedFrame {
            width: frame.width,
            height: frame.height,
            delay: frame.delay,
            rgba: frame.buffer.to_vec(),
        });
    }
    (frames, decoder.repeat())
}

/// Assert the bytes start with the GIF89a signature
pub fn assert_gif89a(bytes: &[u8]) {
    assert!(
        bytes.len() > 6,
        "Expected a GIF, got {} bytes",
        bytes.len()
    );
    assert_eq!(&bytes[..6], b"GIF89a", "Expected GIF89a signature");
}

/// Assert the NETSCAPE2.0 extension asks for an infinite loop
pub fn assert_loops_forever(bytes: &[u8]) {
    let marker = b"NETSCAPE2.0";
    let pos = bytes
        .windows(marker.len())
        .position(|w| w == marker)
        .expect("Expected a NETSCAPE2.0 loop extension");
    let sub_block = &bytes[pos + marker.len()..pos + marker.len() + 4];
    assert_eq!(sub_block, &[0x03, 0x01, 0x00, 0x00], "Expected loop count 0");
}

/// Assert a GIF has `count` frames of `size x size`
pub fn assert_frames(bytes: &[u8], count: usize, size: u16) -> Vec<DecodedFrame> {
    let (frames, repeat) = decode_gif(bytes);
    assert_eq!(repeat, Repeat::Infinite);
    assert_eq!(frames.len(), count, "Unexpected frame count");
    for frame in &frames {
        assert_eq!((frame.width, frame.height), (size, size));
        assert!(!frame.rgba.is_empty());
    }
    frames
}
