use intensify_palette::{QuantizeConfig, QuantizeOptions, DEFAULT_SAMPLE_FACTOR};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Generation settings, loadable from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensifyConfig {
    /// Canvas edge length in pixels (frames are square)
    #[serde(default = "default_size")]
    pub size: u32,

    /// Number of frames in the loop
    #[serde(default = "default_frame_count")]
    pub frame_count: usize,

    /// Per-frame display time in milliseconds
    #[serde(default = "default_frame_delay_ms")]
    pub frame_delay_ms: u32,

    /// Pixels with alpha below this become transparent
    #[serde(default = "default_alpha_threshold")]
    pub alpha_threshold: u8,

    /// Real colors per frame palette (the sentinel takes one more slot)
    #[serde(default = "default_max_colors")]
    pub max_colors: usize,

    /// Byte budget for the optimized GIF
    #[serde(default = "default_max_file_size_bytes")]
    pub max_file_size_bytes: usize,

    #[serde(default)]
    pub motion: MotionConfig,

    #[serde(default)]
    pub lossy: LossyConfig,
}

fn default_size() -> u32 {
    128
}

fn default_frame_count() -> usize {
    8
}

fn default_frame_delay_ms() -> u32 {
    50
}

fn default_alpha_threshold() -> u8 {
    128
}

fn default_max_colors() -> usize {
    255
}

fn default_max_file_size_bytes() -> usize {
    128 * 1024
}

/// Wobble amplitudes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Rotation in radians, alternating sign per frame
    #[serde(default = "default_rotation")]
    pub rotation: f32,

    /// Maximum jitter offset in pixels along each axis
    #[serde(default = "default_jitter")]
    pub jitter: f32,

    /// Scale added over the whole loop (frame i scales by 1 + i/N * growth)
    #[serde(default = "default_scale_growth")]
    pub scale_growth: f32,
}

fn default_rotation() -> f32 {
    0.08
}

fn default_jitter() -> f32 {
    8.0
}

fn default_scale_growth() -> f32 {
    0.1
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            rotation: default_rotation(),
            jitter: default_jitter(),
            scale_growth: default_scale_growth(),
        }
    }
}

/// Lossy level ladder for the size optimizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LossyConfig {
    /// First level tried
    #[serde(default = "default_lossy_start")]
    pub start: u32,

    /// Increment per retry
    #[serde(default = "default_lossy_step")]
    pub step: u32,

    /// No attempt is made at or above this level
    #[serde(default = "default_lossy_ceiling")]
    pub ceiling: u32,
}

fn default_lossy_start() -> u32 {
    30
}

fn default_lossy_step() -> u32 {
    20
}

fn default_lossy_ceiling() -> u32 {
    200
}

impl Default for LossyConfig {
    fn default() -> Self {
        Self {
            start: default_lossy_start(),
            step: default_lossy_step(),
            ceiling: default_lossy_ceiling(),
        }
    }
}

impl LossyConfig {
    /// Every level the optimizer may try, in order.
    ///
    /// Each level is tried only while it stays below the ceiling. A config
    /// whose `start` is already at the ceiling fails [`IntensifyConfig::validate`].
    pub fn levels(&self) -> impl Iterator<Item = u32> {
        let LossyConfig {
            start,
            step,
            ceiling,
        } = *self;
        std::iter::successors(Some(start), move |&level| {
            level
                .checked_add(step)
                .filter(|&next| step > 0 && next < ceiling)
        })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl IntensifyConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Load from `path` if given, falling back to defaults on any error
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match Self::load(path) {
            Ok(config) => {
                tracing::info!(
                    path = %path.display(),
                    size = config.size,
                    frames = config.frame_count,
                    max_bytes = config.max_file_size_bytes,
                    "Loaded configuration"
                );
                config
            }
            Err(e) => {
                tracing::warn!(%e, path = %path.display(), "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    /// Serialize back to YAML
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 || self.size > u16::MAX as u32 {
            return Err(ConfigError::Invalid(format!(
                "size must be in 1..=65535, got {}",
                self.size
            )));
        }
        if !(8..=12).contains(&self.frame_count) {
            return Err(ConfigError::Invalid(format!(
                "frame_count must be in 8..=12, got {}",
                self.frame_count
            )));
        }
        if self.max_colors == 0 || self.max_colors > 255 {
            return Err(ConfigError::Invalid(format!(
                "max_colors must be in 1..=255, got {}",
                self.max_colors
            )));
        }
        if self.lossy.step == 0 {
            return Err(ConfigError::Invalid("lossy.step must be > 0".to_string()));
        }
        if self.lossy.start >= self.lossy.ceiling {
            return Err(ConfigError::Invalid(format!(
                "lossy.start must be below lossy.ceiling, got {} >= {}",
                self.lossy.start, self.lossy.ceiling
            )));
        }
        if !self.motion.jitter.is_finite() || self.motion.jitter < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "motion.jitter must be a non-negative number, got {}",
                self.motion.jitter
            )));
        }
        if !self.motion.rotation.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "motion.rotation must be a finite number, got {}",
                self.motion.rotation
            )));
        }
        // The last frame scales by 1 + (N-1)/N * growth, which must stay positive
        if !self.motion.scale_growth.is_finite() || self.motion.scale_growth <= -1.0 {
            return Err(ConfigError::Invalid(format!(
                "motion.scale_growth must be a number above -1, got {}",
                self.motion.scale_growth
            )));
        }
        Ok(())
    }

    /// Settings for the per-frame quantizer
    pub fn quantize_config(&self) -> QuantizeConfig {
        QuantizeConfig {
            max_colors: self.max_colors,
            alpha_threshold: self.alpha_threshold,
            sample_factor: DEFAULT_SAMPLE_FACTOR,
            options: QuantizeOptions {
                clear_alpha: false,
                one_bit_alpha: true,
            },
        }
    }
}

impl Default for IntensifyConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            frame_count: default_frame_count(),
            frame_delay_ms: default_frame_delay_ms(),
            alpha_threshold: default_alpha_threshold(),
            max_colors: default_max_colors(),
            max_file_size_bytes: default_max_file_size_bytes(),
            motion: MotionConfig::default(),
            lossy: LossyConfig::default(),
        }
    }
}
