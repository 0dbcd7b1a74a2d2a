pub mod canvas;
pub mod frames;
pub mod gif_encoder;
pub mod loader;

pub use canvas::{pixmap_from_rgba, Canvas};
pub use frames::{FixedJitter, Frame, FrameSynthesizer, FrameTransform, JitterSource, RandomJitter};
pub use gif_encoder::{delay_centiseconds, FrameOptions, GifDocument};
pub use loader::{fit_dimensions, load_resized, probe_dimensions, ResizedImage};
