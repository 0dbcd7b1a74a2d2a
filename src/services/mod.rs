pub mod optimizer;
pub mod pipeline;
pub mod recompress;

pub use optimizer::{OptimizedGif, SizeOptimizer, DEFAULT_MAX_BYTES};
pub use pipeline::{derive_output_name, render_gif, IntensifyPipeline};
pub use recompress::{GifRecompressor, GifsicleRecompressor, PaletteReducer};
