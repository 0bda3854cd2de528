//! Pipeline configuration.

use std::time::Duration;

/// Tunables for the export pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Sample rate for extracted PCM (Silero VAD requires 8k or 16k).
    pub pcm_sample_rate: u32,
    /// Timeout for VAD inference over the full source.
    pub vad_timeout: Duration,
    /// Timeout per vision oracle frame request.
    pub vision_timeout: Duration,
    /// Retries per vision frame after the initial attempt.
    pub vision_retries: u32,
    /// Frames sampled across the clip range for subject localization.
    pub vision_frame_samples: usize,
    /// Longest edge of frames sent to the vision oracle.
    pub vision_frame_max_dim: u32,
    /// Maximum words per caption chunk.
    pub max_words_per_chunk: usize,
    /// Maximum caption chunk duration in seconds.
    pub max_chunk_duration_s: f64,
    /// Output-time word gap that forces a new caption chunk.
    pub max_intra_chunk_gap_s: f64,
    /// Subject confidence below which the crop is flagged for review.
    pub review_confidence_threshold: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pcm_sample_rate: 16_000,
            vad_timeout: Duration::from_secs(60),
            vision_timeout: Duration::from_secs(10),
            vision_retries: 2,
            vision_frame_samples: 5,
            vision_frame_max_dim: 720,
            max_words_per_chunk: 5,
            max_chunk_duration_s: 3.0,
            max_intra_chunk_gap_s: 0.7,
            review_confidence_threshold: 0.70,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            pcm_sample_rate: env_parse("CLIPFORGE_PCM_RATE", defaults.pcm_sample_rate),
            vad_timeout: Duration::from_secs(env_parse(
                "CLIPFORGE_VAD_TIMEOUT_SECS",
                defaults.vad_timeout.as_secs(),
            )),
            vision_timeout: Duration::from_secs(env_parse(
                "CLIPFORGE_VISION_TIMEOUT_SECS",
                defaults.vision_timeout.as_secs(),
            )),
            vision_retries: env_parse("CLIPFORGE_VISION_RETRIES", defaults.vision_retries),
            max_words_per_chunk: env_parse(
                "CLIPFORGE_CAPTION_MAX_WORDS",
                defaults.max_words_per_chunk,
            ),
            ..defaults
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.pcm_sample_rate, 16_000);
        assert_eq!(cfg.vad_timeout, Duration::from_secs(60));
        assert_eq!(cfg.vision_retries, 2);
        assert_eq!(cfg.vision_frame_samples, 5);
    }
}
