use crate::error::EncodingError;
use crate::models::{IntensifyConfig, LossyConfig};
use crate::services::recompress::GifRecompressor;

/// Default byte budget (128 KiB)
pub const DEFAULT_MAX_BYTES: usize = 128 * 1024;

/// A re-compressed GIF and how it was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizedGif {
    pub bytes: Vec<u8>,
    pub lossy_level: u32,
    /// Number of re-compressions performed
    pub attempts: usize,
    pub within_budget: bool,
}

/// Walks the lossy ladder until the output fits the byte budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeOptimizer {
    pub max_bytes: usize,
    pub lossy: LossyConfig,
}

impl Default for SizeOptimizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BYTES, LossyConfig::default())
    }
}

impl SizeOptimizer {
    pub fn new(max_bytes: usize, lossy: LossyConfig) -> Self {
        Self { max_bytes, lossy }
    }

    pub fn from_config(config: &IntensifyConfig) -> Self {
        Self::new(config.max_file_size_bytes, config.lossy)
    }

    /// Re-compress `gif` at increasing lossy levels until it fits.
    ///
    /// Each attempt starts from the original `gif`, never from the previous
    /// candidate. When the ladder runs out the last candidate is returned
    /// with `within_budget == false`.
    pub async fn optimize(
        &self,
        recompressor: &dyn GifRecompressor,
        gif: &[u8],
    ) -> Result<OptimizedGif, EncodingError> {
        let mut candidate: Option<OptimizedGif> = None;

        for (attempt, level) in self.lossy.levels().enumerate() {
            let bytes = recompressor.recompress(gif, level).await?;
            let within_budget = bytes.len() <= self.max_bytes;
            tracing::debug!(
                recompressor = recompressor.name(),
                level,
                bytes = bytes.len(),
                max_bytes = self.max_bytes,
                "Lossy attempt"
            );

            candidate = Some(OptimizedGif {
                bytes,
                lossy_level: level,
                attempts: attempt + 1,
                within_budget,
            });
            if within_budget {
                break;
            }
        }

        let result = candidate
            .ok_or_else(|| EncodingError::Recompress("lossy ladder is empty".to_string()))?;

        if !result.within_budget {
            tracing::warn!(
                bytes = result.bytes.len(),
                max_bytes = self.max_bytes,
                level = result.lossy_level,
                "GIF still exceeds size budget at the highest lossy level"
            );
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Output size shrinks by `per_level` bytes per lossy level.
    struct ShrinkingRecompressor {
        base: usize,
        per_level: usize,
        seen: Mutex<Vec<(u32, usize)>>,
    }

    impl ShrinkingRecompressor {
        fn new(base: usize, per_level: usize) -> Self {
            Self {
                base,
                per_level,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn levels(&self) -> Vec<u32> {
            self.seen.lock().unwrap().iter().map(|(l, _)| *l).collect()
        }
    }

    #[async_trait]
    impl GifRecompressor for ShrinkingRecompressor {
        async fn recompress(&self, gif: &[u8], level: u32) -> Result<Vec<u8>, EncodingError> {
            self.seen.lock().unwrap().push((level, gif.len()));
            let len = self
                .base
                .saturating_sub(self.per_level * level as usize)
                .max(1);
            Ok(vec![level as u8; len])
        }

        fn name(&self) -> &str {
            "shrinking"
        }
    }

    struct FailingRecompressor;

    #[async_trait]
    impl GifRecompressor for FailingRecompressor {
        async fn recompress(&self, _gif: &[u8], _level: u32) -> Result<Vec<u8>, EncodingError> {
            Err(EncodingError::Recompress("boom".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_stops_at_first_level_when_within_budget() {
        let recompressor = ShrinkingRecompressor::new(1000, 0);
        let optimizer = SizeOptimizer::new(2000, LossyConfig::default());

        let result = optimizer.optimize(&recompressor, b"GIF89a").await.unwrap();
        assert_eq!(result.lossy_level, 30);
        assert_eq!(result.attempts, 1);
        assert!(result.within_budget);
        assert_eq!(recompressor.levels(), vec![30]);
    }

    #[tokio::test]
    async fn test_escalates_until_fit() {
        // 10_000 - 50 * level <= 5_000 first holds at level 110
        let recompressor = ShrinkingRecompressor::new(10_000, 50);
        let optimizer = SizeOptimizer::new(5_000, LossyConfig::default());

        let result = optimizer.optimize(&recompressor, b"GIF89a").await.unwrap();
        assert_eq!(result.lossy_level, 110);
        assert_eq!(result.bytes.len(), 4_500);
        assert!(result.within_budget);
        assert_eq!(recompressor.levels(), vec![30, 50, 70, 90, 110]);
    }

    #[tokio::test]
    async fn test_ladder_is_bounded() {
        let recompressor = ShrinkingRecompressor::new(1_000_000, 0);
        let optimizer = SizeOptimizer::new(1024, LossyConfig::default());

        let result = optimizer.optimize(&recompressor, b"GIF89a").await.unwrap();
        assert!(!result.within_budget);
        assert_eq!(result.attempts, 9);
        assert_eq!(result.lossy_level, 190);
        assert_eq!(
            recompressor.levels(),
            vec![30, 50, 70, 90, 110, 130, 150, 170, 190]
        );
        assert!(recompressor.levels().iter().all(|&l| l <= 200));
    }

    #[tokio::test]
    async fn test_every_attempt_uses_original_input() {
        let recompressor = ShrinkingRecompressor::new(1_000_000, 0);
        let optimizer = SizeOptimizer::new(1, LossyConfig::default());
        let input = vec![7u8; 321];

        optimizer.optimize(&recompressor, &input).await.unwrap();
        let seen = recompressor.seen.lock().unwrap();
        assert!(seen.iter().all(|(_, len)| *len == 321));
    }

    #[tokio::test]
    async fn test_custom_ladder() {
        let recompressor = ShrinkingRecompressor::new(1_000_000, 0);
        let optimizer = SizeOptimizer::new(
            1,
            LossyConfig {
                start: 10,
                step: 45,
                ceiling: 100,
            },
        );

        let result = optimizer.optimize(&recompressor, b"x").await.unwrap();
        assert_eq!(recompressor.levels(), vec![10, 55]);
        assert_eq!(result.lossy_level, 55);
    }

    #[tokio::test]
    async fn test_recompressor_error_propagates() {
        let optimizer = SizeOptimizer::default();
        let err = optimizer
            .optimize(&FailingRecompressor, b"GIF89a")
            .await
            .unwrap_err();
        assert!(matches!(err, EncodingError::Recompress(_)));
    }

    #[test]
    fn test_from_config() {
        let config = IntensifyConfig {
            max_file_size_bytes: 4096,
            ..IntensifyConfig::default()
        };
        let optimizer = SizeOptimizer::from_config(&config);
        assert_eq!(optimizer.max_bytes, 4096);
        assert_eq!(optimizer.lossy, LossyConfig::default());
    }
}
