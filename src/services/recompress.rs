use async_trait::async_trait;
use gif::{ColorOutput, DecodeOptions, Encoder};
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::EncodingError;

/// Lossy GIF re-encoder used by the size optimizer
#[async_trait]
pub trait GifRecompressor: Send + Sync {
    /// Re-encode `gif` at `level`. Higher levels give up more quality for size.
    async fn recompress(&self, gif: &[u8], level: u32) -> Result<Vec<u8>, EncodingError>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Pure Rust lossy pass over the local color tables and index runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaletteReducer;

impl PaletteReducer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GifRecompressor for PaletteReducer {
    async fn recompress(&self, gif: &[u8], level: u32) -> Result<Vec<u8>, EncodingError> {
        let input = gif.to_vec();
        tokio::task::spawn_blocking(move || reduce_gif(&input, level))
            .await
            .map_err(|e| EncodingError::Task(e.to_string()))?
    }

    fn name(&self) -> &str {
        "palette-reducer"
    }
}

fn decode_error(e: gif::DecodingError) -> EncodingError {
    EncodingError::Recompress(format!("failed to decode GIF: {e}"))
}

/// Decode `gif`, reduce every frame at `level` and encode it again.
///
/// Frame delays, disposal, transparency and the loop count are carried over.
pub fn reduce_gif(gif: &[u8], level: u32) -> Result<Vec<u8>, EncodingError> {
    let mut options = DecodeOptions::new();
    options.set_color_output(ColorOutput::Indexed);
    let mut decoder = options.read_info(gif).map_err(decode_error)?;

    let width = decoder.width();
    let height = decoder.height();
    let global_palette = decoder.global_palette().map(<[u8]>::to_vec);

    let mut frames = Vec::new();
    while let Some(frame) = decoder.read_next_frame().map_err(decode_error)? {
        frames.push(frame.clone());
    }
    // The loop extension is only known once the decoder has walked past it
    let repeat = decoder.repeat();

    let mut encoder = Encoder::new(Vec::new(), width, height, &[])?;
    encoder.set_repeat(repeat)?;

    for mut frame in frames {
        let palette = frame
            .palette
            .take()
            .or_else(|| global_palette.clone())
            .ok_or_else(|| EncodingError::Recompress("frame has no color table".to_string()))?;

        let reduced = reduce_frame(
            &palette,
            &frame.buffer,
            frame.width as usize,
            frame.transparent,
            level,
        );
        frame.palette = Some(reduced.palette);
        frame.transparent = reduced.transparent;
        frame.buffer = Cow::Owned(reduced.indices);
        encoder.write_frame(&frame)?;
    }

    encoder
        .into_inner()
        .map_err(|e| EncodingError::Gif(e.to_string()))
}

/// One frame after reduction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReducedFrame {
    /// Packed RGB
    pub palette: Vec<u8>,
    pub indices: Vec<u8>,
    pub transparent: Option<u8>,
}

/// Posterize step for a lossy level
#[inline]
pub fn posterize_step(level: u32) -> u32 {
    1 + level / 10
}

fn posterize(channel: u8, step: u32) -> u8 {
    let c = channel as u32;
    (((c + step / 2) / step) * step).min(255) as u8
}

fn distance_sq(a: [u8; 3], b: [u8; 3]) -> u32 {
    let dr = a[0] as i32 - b[0] as i32;
    let dg = a[1] as i32 - b[1] as i32;
    let db = a[2] as i32 - b[2] as i32;
    (dr * dr + dg * dg + db * db) as u32
}

/// Reduce one frame's color table and smooth its rows.
///
/// 1. Every channel is snapped to a multiple of [`posterize_step`].
/// 2. Entries that became identical are merged. The transparent entry is
///    never merged.
/// 3. Along each row, a pixel takes its left neighbour's index when the two
///    colors are within squared distance `level * 8`. Transparent pixels
///    neither take nor give an index.
pub fn reduce_frame(
    palette: &[u8],
    indices: &[u8],
    width: usize,
    transparent: Option<u8>,
    level: u32,
) -> ReducedFrame {
    let step = posterize_step(level);

    // Cover every index in use even if the table is short
    let max_index = indices.iter().copied().max().unwrap_or(0) as usize;
    let entries = (palette.len() / 3)
        .max(max_index + 1)
        .max(transparent.map_or(0, |t| t as usize + 1))
        .min(256);
    let color_at = |i: usize| -> [u8; 3] {
        palette
            .get(i * 3..i * 3 + 3)
            .map_or([0, 0, 0], |c| [c[0], c[1], c[2]])
    };

    let mut remap = vec![0u8; entries];
    let mut merged: Vec<[u8; 3]> = Vec::with_capacity(entries);
    let mut seen: HashMap<[u8; 3], u8> = HashMap::new();
    let mut new_transparent = None;

    for (i, slot) in remap.iter_mut().enumerate() {
        let c = color_at(i);
        if transparent == Some(i as u8) {
            *slot = merged.len() as u8;
            new_transparent = Some(*slot);
            merged.push(c);
            continue;
        }
        let posterized = [posterize(c[0], step), posterize(c[1], step), posterize(c[2], step)];
        *slot = *seen.entry(posterized).or_insert_with(|| {
            merged.push(posterized);
            (merged.len() - 1) as u8
        });
    }

    let threshold = level.saturating_mul(8);
    let mut out: Vec<u8> = indices.iter().map(|&i| remap[i as usize]).collect();
    if width > 0 {
        for row in out.chunks_mut(width) {
            for x in 1..row.len() {
                let prev = row[x - 1];
                let cur = row[x];
                if prev == cur || Some(prev) == new_transparent || Some(cur) == new_transparent {
                    continue;
                }
                if distance_sq(merged[prev as usize], merged[cur as usize]) <= threshold {
                    row[x] = prev;
                }
            }
        }
    }

    ReducedFrame {
        palette: merged.into_iter().flatten().collect(),
        indices: out,
        transparent: new_transparent,
    }
}

/// Shells out to `gifsicle -O3 --lossy=N`, piping the GIF through stdin/stdout.
#[derive(Debug, Clone)]
pub struct GifsicleRecompressor {
    program: PathBuf,
}

impl GifsicleRecompressor {
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for GifsicleRecompressor {
    fn default() -> Self {
        Self::new("gifsicle")
    }
}

#[async_trait]
impl GifRecompressor for GifsicleRecompressor {
    async fn recompress(&self, gif: &[u8], level: u32) -> Result<Vec<u8>, EncodingError> {
        let mut child = Command::new(&self.program)
            .arg("-O3")
            .arg(format!("--lossy={level}"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                EncodingError::Recompress(format!(
                    "failed to start {}: {e}",
                    self.program.display()
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| EncodingError::Recompress("gifsicle stdin unavailable".to_string()))?;

        // stdout must be drained while stdin is written or large GIFs deadlock
        let write = async move {
            let result = stdin.write_all(gif).await;
            drop(stdin);
            result
        };
        let (written, output) = tokio::join!(write, child.wait_with_output());

        let output = output.map_err(|e| EncodingError::Recompress(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EncodingError::Recompress(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }
        written.map_err(|e| EncodingError::Recompress(e.to_string()))?;

        Ok(output.stdout)
    }

    fn name(&self) -> &str {
        "gifsicle"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::{FrameOptions, GifDocument};
    use intensify_palette::{IndexedFrame, Palette};

    /// A two-frame 16x4 GIF with a gradient palette and a transparent column
    fn sample_gif() -> Vec<u8> {
        let colors: Vec<[u8; 4]> = (0..16u8).map(|i| [i * 16, 100, 200 - i * 4, 255]).collect();
        let palette = Palette::new(colors)
            .unwrap()
            .with_transparency_sentinel()
            .unwrap();
        let indices: Vec<u8> = (0..64)
            .map(|i| if i % 16 == 0 { 16 } else { (i % 16) as u8 })
            .collect();
        let frame = IndexedFrame::new(indices, 16, 4, palette).unwrap();

        let mut doc = GifDocument::new(16, 4).unwrap();
        doc.write_frame(&frame, FrameOptions::default()).unwrap();
        doc.write_frame(
            &frame,
            FrameOptions {
                delay_ms: 80,
                transparent: true,
            },
        )
        .unwrap();
        doc.finish().unwrap()
    }

    #[test]
    fn test_posterize_step() {
        assert_eq!(posterize_step(0), 1);
        assert_eq!(posterize_step(30), 4);
        assert_eq!(posterize_step(190), 20);
    }

    #[test]
    fn test_posterize_stays_in_range() {
        for step in [1, 4, 20] {
            for c in 0..=255u8 {
                let p = posterize(c, step);
                assert!((p as i32 - c as i32).abs() <= step as i32);
            }
        }
        assert_eq!(posterize(255, 20), 255);
        assert_eq!(posterize(7, 1), 7);
    }

    #[test]
    fn test_reduce_frame_merges_duplicates() {
        // 10,10,10 and 11,11,11 land on the same posterized color at step 4
        let palette = [10, 10, 10, 11, 11, 11, 200, 0, 0];
        let reduced = reduce_frame(&palette, &[0, 1, 2], 3, None, 30);
        assert_eq!(reduced.palette.len(), 6);
        assert_eq!(reduced.indices[0], reduced.indices[1]);
        assert_ne!(reduced.indices[1], reduced.indices[2]);
    }

    #[test]
    fn test_reduce_frame_keeps_transparent_entry_separate() {
        // Opaque black and the transparent sentinel share RGB
        let palette = [0, 0, 0, 255, 255, 255, 0, 0, 0];
        let reduced = reduce_frame(&palette, &[0, 2, 2, 1], 4, Some(2), 50);
        let t = reduced.transparent.unwrap();
        assert_eq!(reduced.indices[1], t);
        assert_eq!(reduced.indices[2], t);
        assert_ne!(reduced.indices[0], t);
        assert_ne!(reduced.indices[3], t);
    }

    #[test]
    fn test_reduce_frame_smooths_runs() {
        // Two close greys get merged into one run; red is too far away
        let palette = [100, 100, 100, 108, 108, 108, 255, 0, 0];
        let reduced = reduce_frame(&palette, &[0, 1, 0, 1, 2], 5, None, 0);
        assert_ne!(reduced.indices[0], reduced.indices[1]);

        let reduced = reduce_frame(&palette, &[0, 1, 0, 1, 2], 5, None, 30);
        let first = reduced.indices[0];
        assert_eq!(&reduced.indices[..4], &[first; 4]);
        assert_ne!(reduced.indices[4], first);
    }

    #[test]
    fn test_reduce_frame_smoothing_stops_at_row_end() {
        let palette = [100, 100, 100, 104, 104, 104];
        let reduced = reduce_frame(&palette, &[0, 0, 1, 1], 2, None, 30);
        // Second row starts fresh
        assert_eq!(reduced.indices[2], reduced.indices[3]);
        assert_eq!(reduced.indices[0], reduced.indices[1]);
    }

    #[test]
    fn test_reduce_frame_covers_short_palette() {
        let reduced = reduce_frame(&[1, 2, 3], &[0, 3], 2, None, 0);
        assert_eq!(reduced.indices.len(), 2);
        assert!(reduced.palette.len() / 3 >= 2);
    }

    #[test]
    fn test_reduce_gif_preserves_structure() {
        let input = sample_gif();
        let output = reduce_gif(&input, 50).unwrap();

        let mut options = DecodeOptions::new();
        options.set_color_output(ColorOutput::Indexed);
        let mut decoder = options.read_info(output.as_slice()).unwrap();
        assert_eq!((decoder.width(), decoder.height()), (16, 4));

        let mut delays = Vec::new();
        while let Some(frame) = decoder.read_next_frame().unwrap() {
            delays.push(frame.delay);
            let t = frame.transparent.expect("transparency kept");
            assert_eq!(frame.buffer[0], t);
            assert_eq!(frame.dispose, gif::DisposalMethod::Background);
        }
        assert_eq!(delays, vec![5, 8]);
        assert_eq!(decoder.repeat(), gif::Repeat::Infinite);
    }

    #[test]
    fn test_reduce_gif_shrinks_palette() {
        let input = sample_gif();
        let output = reduce_gif(&input, 190).unwrap();

        let mut options = DecodeOptions::new();
        options.set_color_output(ColorOutput::Indexed);
        let mut decoder = options.read_info(output.as_slice()).unwrap();
        let frame = decoder.read_next_frame().unwrap().unwrap();
        let entries = frame.palette.as_ref().unwrap().len() / 3;
        assert!(entries < 17, "{entries} entries");
    }

    #[test]
    fn test_reduce_gif_rejects_garbage() {
        assert!(matches!(
            reduce_gif(b"nope", 30),
            Err(EncodingError::Recompress(_))
        ));
    }

    #[tokio::test]
    async fn test_palette_reducer_trait() {
        let reducer = PaletteReducer::new();
        let output = reducer.recompress(&sample_gif(), 30).await.unwrap();
        assert_eq!(&output[..6], b"GIF89a");
        assert_eq!(reducer.name(), "palette-reducer");
    }

    #[tokio::test]
    async fn test_gifsicle_missing_binary() {
        let gifsicle = GifsicleRecompressor::new("/nonexistent/bin/gifsicle");
        let err = gifsicle.recompress(&sample_gif(), 30).await.unwrap_err();
        match err {
            EncodingError::Recompress(msg) => assert!(msg.contains("failed to start")),
            other => panic!("Expected Recompress variant, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_gifsicle_non_zero_exit() {
        let gifsicle = GifsicleRecompressor::new("/bin/false");
        let err = gifsicle.recompress(&sample_gif(), 30).await.unwrap_err();
        match err {
            EncodingError::Recompress(msg) => assert!(msg.contains("exited with"), "{msg}"),
            other => panic!("Expected Recompress variant, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_gifsicle_pipes_stdin_to_stdout() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let program = dir.path().join("fake-gifsicle");
        std::fs::write(&program, "#!/bin/sh\ncat\n").unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();

        // Larger than a pipe buffer, so stdin and stdout must overlap
        let input: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
        let gifsicle = GifsicleRecompressor::new(&program);
        let output = gifsicle.recompress(&input, 90).await.unwrap();

        assert_eq!(output.len(), input.len());
        assert!(output == input);
    }
}
