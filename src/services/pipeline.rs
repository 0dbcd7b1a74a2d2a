use regex::Regex;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use intensify_palette::quantize_frame;

use crate::error::{EncodingError, IntensifyError};
use crate::models::{DataUri, GenerationResult, IntensifyConfig};
use crate::rendering::{
    load_resized, FrameOptions, FrameSynthesizer, GifDocument, JitterSource, RandomJitter,
};
use crate::services::optimizer::SizeOptimizer;
use crate::services::recompress::{GifRecompressor, PaletteReducer};

static EXTENSION: OnceLock<Regex> = OnceLock::new();

/// `cat.png` -> `cat_intensifies.gif`. Only the last extension is dropped.
pub fn derive_output_name(file_name: &str) -> String {
    let extension =
        EXTENSION.get_or_init(|| Regex::new(r"\.[^/.]+$").expect("extension pattern is valid"));
    format!("{}_intensifies.gif", extension.replace(file_name, ""))
}

/// Decode, animate, quantize and encode. Runs synchronously.
///
/// Returns the GIF as written, before any lossy re-compression.
pub fn render_gif<J: JitterSource>(
    bytes: &[u8],
    config: &IntensifyConfig,
    jitter: J,
) -> Result<Vec<u8>, IntensifyError> {
    let edge = u16::try_from(config.size).map_err(|_| {
        IntensifyError::Validation(format!("size {} does not fit a GIF", config.size))
    })?;

    let image = load_resized(bytes, config.size)?;
    let frames = FrameSynthesizer::new(
        &image,
        config.size,
        config.frame_count,
        config.motion,
        jitter,
    )?;

    let quantize = config.quantize_config();
    let options = FrameOptions {
        delay_ms: config.frame_delay_ms,
        transparent: true,
    };
    let mut document = GifDocument::new(edge, edge)?;
    for frame in frames {
        let indexed = quantize_frame(
            frame.rgba(),
            frame.width() as usize,
            frame.height() as usize,
            &quantize,
        )?;
        document.write_frame(&indexed, options)?;
    }

    tracing::debug!(frames = document.frame_count(), "Frames encoded");
    Ok(document.finish()?)
}

/// Turns an image into a size-capped "intensifies" GIF.
///
/// Holds no per-call state; share it behind an `Arc` to serve concurrent
/// requests.
pub struct IntensifyPipeline {
    config: IntensifyConfig,
    recompressor: Arc<dyn GifRecompressor>,
}

impl IntensifyPipeline {
    pub fn new(config: IntensifyConfig) -> Self {
        Self::with_recompressor(config, Arc::new(PaletteReducer::new()))
    }

    pub fn with_recompressor(
        config: IntensifyConfig,
        recompressor: Arc<dyn GifRecompressor>,
    ) -> Self {
        Self {
            config,
            recompressor,
        }
    }

    pub fn config(&self) -> &IntensifyConfig {
        &self.config
    }

    /// Generate from an `image/*` data URI
    pub async fn generate(
        &self,
        image_data_uri: &str,
        file_name: &str,
    ) -> Result<GenerationResult, IntensifyError> {
        if !image_data_uri.starts_with("data:image/") {
            return Err(IntensifyError::Validation(
                "expected an image data URI (data:image/...)".to_string(),
            ));
        }
        let uri = DataUri::parse(image_data_uri)?;
        self.generate_from_bytes(uri.data, file_name).await
    }

    /// Generate from raw encoded image bytes with random jitter
    pub async fn generate_from_bytes(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<GenerationResult, IntensifyError> {
        self.generate_with_jitter(bytes, file_name, RandomJitter::from_entropy())
            .await
    }

    /// Generate with a caller-supplied jitter source.
    ///
    /// Rendering runs on the blocking pool; lossy re-compression runs
    /// afterwards through the configured [`GifRecompressor`].
    pub async fn generate_with_jitter<J>(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        jitter: J,
    ) -> Result<GenerationResult, IntensifyError>
    where
        J: JitterSource + Send + 'static,
    {
        self.config.validate()?;
        let started = Instant::now();
        tracing::info!(
            file_name,
            input_bytes = bytes.len(),
            size = self.config.size,
            frames = self.config.frame_count,
            "Generating intensified GIF"
        );

        let config = self.config.clone();
        let raw = tokio::task::spawn_blocking(move || render_gif(&bytes, &config, jitter))
            .await
            .map_err(|e| EncodingError::Task(e.to_string()))??;
        tracing::debug!(
            bytes = raw.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Rendered GIF"
        );

        let optimizer = SizeOptimizer::from_config(&self.config);
        let optimized = optimizer.optimize(self.recompressor.as_ref(), &raw).await?;

        let output_name = derive_output_name(file_name);
        tracing::info!(
            file_name = %output_name,
            bytes = optimized.bytes.len(),
            lossy_level = optimized.lossy_level,
            attempts = optimized.attempts,
            within_budget = optimized.within_budget,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Generated intensified GIF"
        );

        Ok(GenerationResult {
            gif_url: DataUri::encode("image/gif", &optimized.bytes),
            file_name: output_name,
            gif_bytes: optimized.bytes,
            frame_count: self.config.frame_count,
            lossy_level: optimized.lossy_level,
        })
    }
}
