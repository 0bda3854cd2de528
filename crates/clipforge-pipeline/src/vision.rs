//! Subject localization via the vision oracle.
//!
//! Five frames are sampled across the clip range and sent to the oracle;
//! the positions come back normalized with a confidence each and are
//! aggregated by confidence-weighted mean. The oracle is non-essential:
//! when it is down or fewer than three frames resolve, the pipeline
//! degrades to a centre crop with zero confidence and flags the result
//! for review.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use clipforge_models::SubjectPosition;

use crate::config::PipelineConfig;
use crate::services::FrameGrabber;

/// Errors from the vision oracle. Always degraded, never fatal for a
/// request.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("vision oracle request failed: {0}")]
    RequestFailed(String),

    #[error("vision oracle returned an unusable response: {0}")]
    BadResponse(String),

    #[error("vision oracle timed out")]
    Timeout,
}

/// The §6 `VisionOracle.locate` contract: one JPEG in, one normalized
/// point with confidence out.
#[async_trait]
pub trait VisionOracle: Send + Sync {
    async fn locate(&self, jpeg: &[u8]) -> Result<SubjectPosition, VisionError>;
}

/// Retry backoff schedule per frame: initial attempt plus two retries.
const RETRY_BACKOFF: [Duration; 2] = [Duration::from_millis(100), Duration::from_millis(400)];

/// Fractions of the clip range where frames are sampled.
const SAMPLE_FRACTIONS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// Minimum successful frames for a trustworthy aggregate.
const MIN_SUCCESSFUL_FRAMES: usize = 3;

/// Localize the subject across a clip range.
///
/// Returns the confidence-weighted mean position with the mean confidence;
/// falls back to centre/zero when fewer than three frames resolve.
pub async fn localize_subject(
    grabber: &dyn FrameGrabber,
    oracle: &dyn VisionOracle,
    source: &Path,
    clip_start: f64,
    clip_end: f64,
    scratch_dir: &Path,
    config: &PipelineConfig,
) -> SubjectPosition {
    let range = (clip_end - clip_start).max(0.0);
    let mut observations: Vec<SubjectPosition> = Vec::new();

    for fraction in SAMPLE_FRACTIONS.iter().take(config.vision_frame_samples) {
        // Sample just inside the end so the last frame exists.
        let timestamp = (clip_start + fraction * range).min(clip_end - 0.05).max(clip_start);

        let jpeg = match grabber
            .grab(source, timestamp, config.vision_frame_max_dim, scratch_dir)
            .await
        {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(timestamp = timestamp, error = %e, "Frame sampling failed");
                continue;
            }
        };

        match locate_with_retry(oracle, &jpeg, config).await {
            Ok(position) if position.is_valid() => {
                debug!(
                    timestamp = timestamp,
                    nx = position.nx,
                    ny = position.ny,
                    confidence = position.confidence,
                    "Subject observed"
                );
                observations.push(position);
            }
            Ok(position) => {
                warn!(timestamp = timestamp, ?position, "Discarding out-of-range observation");
            }
            Err(e) => {
                warn!(timestamp = timestamp, error = %e, "Vision oracle failed for frame");
            }
        }
    }

    aggregate(&observations)
}

/// One frame with the fixed backoff schedule (100 ms, 400 ms).
async fn locate_with_retry(
    oracle: &dyn VisionOracle,
    jpeg: &[u8],
    config: &PipelineConfig,
) -> Result<SubjectPosition, VisionError> {
    let mut attempt = 0u32;
    loop {
        let result = tokio::time::timeout(config.vision_timeout, oracle.locate(jpeg))
            .await
            .map_err(|_| VisionError::Timeout)
            .and_then(|r| r);

        match result {
            Ok(position) => return Ok(position),
            Err(e) if attempt < config.vision_retries => {
                let backoff = RETRY_BACKOFF[(attempt as usize).min(RETRY_BACKOFF.len() - 1)];
                debug!(attempt = attempt + 1, error = %e, "Retrying vision oracle in {backoff:?}");
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Confidence-weighted mean of the observations; centre fallback below the
/// minimum frame count.
fn aggregate(observations: &[SubjectPosition]) -> SubjectPosition {
    if observations.len() < MIN_SUCCESSFUL_FRAMES {
        return SubjectPosition::centered();
    }

    let weight: f64 = observations.iter().map(|o| o.confidence).sum();
    let mean_confidence = weight / observations.len() as f64;

    if weight <= f64::EPSILON {
        return SubjectPosition::centered();
    }

    SubjectPosition {
        nx: observations.iter().map(|o| o.nx * o.confidence).sum::<f64>() / weight,
        ny: observations.iter().map(|o| o.ny * o.confidence).sum::<f64>() / weight,
        confidence: mean_confidence,
    }
}

/// JSON request/response shapes for the HTTP oracle.
#[derive(Debug, Serialize)]
struct LocateRequest<'a> {
    image: &'a str,
}

#[derive(Debug, Deserialize)]
struct LocateResponse {
    #[serde(default)]
    subject_detected: bool,
    #[serde(default = "default_half")]
    nx: f64,
    #[serde(default = "default_half")]
    ny: f64,
    #[serde(default)]
    confidence: f64,
}

fn default_half() -> f64 {
    0.5
}

/// HTTP client for a hosted vision oracle.
pub struct HttpVisionOracle {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpVisionOracle {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create from `CLIPFORGE_VISION_ENDPOINT` / `CLIPFORGE_VISION_API_KEY`.
    pub fn from_env() -> Option<Self> {
        let endpoint = std::env::var("CLIPFORGE_VISION_ENDPOINT").ok()?;
        let api_key = std::env::var("CLIPFORGE_VISION_API_KEY").unwrap_or_default();
        Some(Self::new(endpoint, api_key))
    }
}

#[async_trait]
impl VisionOracle for HttpVisionOracle {
    async fn locate(&self, jpeg: &[u8]) -> Result<SubjectPosition, VisionError> {
        let image = format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg));
        let request = LocateRequest { image: &image };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| VisionError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VisionError::RequestFailed(format!(
                "status {}",
                response.status()
            )));
        }

        let body: LocateResponse = response
            .json()
            .await
            .map_err(|e| VisionError::BadResponse(e.to_string()))?;

        if !body.subject_detected {
            return Ok(SubjectPosition::centered());
        }

        Ok(SubjectPosition {
            nx: body.nx.clamp(0.0, 1.0),
            ny: body.ny.clamp(0.0, 1.0),
            confidence: body.confidence.clamp(0.0, 1.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipforge_media::{MediaError, MediaResult};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedGrabber;

    #[async_trait]
    impl FrameGrabber for ScriptedGrabber {
        async fn grab(
            &self,
            _source: &Path,
            _timestamp: f64,
            _max_dimension: u32,
            _scratch_dir: &Path,
        ) -> MediaResult<Vec<u8>> {
            Ok(vec![0xFF, 0xD8, 0xFF])
        }
    }

    struct FailingGrabber;

    #[async_trait]
    impl FrameGrabber for FailingGrabber {
        async fn grab(
            &self,
            _source: &Path,
            _timestamp: f64,
            _max_dimension: u32,
            _scratch_dir: &Path,
        ) -> MediaResult<Vec<u8>> {
            Err(MediaError::InvalidMedia("no frames".to_string()))
        }
    }

    struct ScriptedOracle {
        responses: Mutex<Vec<Result<SubjectPosition, VisionError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedOracle {
        fn new(responses: Vec<Result<SubjectPosition, VisionError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl VisionOracle for ScriptedOracle {
        async fn locate(&self, _jpeg: &[u8]) -> Result<SubjectPosition, VisionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(SubjectPosition { nx: 0.6, ny: 0.4, confidence: 0.9 })
            } else {
                responses.remove(0)
            }
        }
    }

    fn test_config() -> PipelineConfig {
        PipelineConfig::default()
    }

    #[tokio::test]
    async fn test_weighted_mean_aggregation() {
        let oracle = ScriptedOracle::new(vec![
            Ok(SubjectPosition { nx: 0.4, ny: 0.4, confidence: 0.8 }),
            Ok(SubjectPosition { nx: 0.6, ny: 0.4, confidence: 0.8 }),
            Ok(SubjectPosition { nx: 0.5, ny: 0.4, confidence: 0.8 }),
            Ok(SubjectPosition { nx: 0.5, ny: 0.4, confidence: 0.8 }),
            Ok(SubjectPosition { nx: 0.5, ny: 0.4, confidence: 0.8 }),
        ]);
        let scratch = tempfile::tempdir().unwrap();

        let position = localize_subject(
            &ScriptedGrabber,
            &oracle,
            &PathBuf::from("src.mp4"),
            10.0,
            40.0,
            scratch.path(),
            &test_config(),
        )
        .await;

        assert!((position.nx - 0.5).abs() < 1e-9);
        assert!((position.ny - 0.4).abs() < 1e-9);
        assert!((position.confidence - 0.8).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_centre_fallback_below_three_frames() {
        // Every frame errors out (after retries).
        let mut responses = Vec::new();
        for _ in 0..15 {
            responses.push(Err(VisionError::RequestFailed("down".to_string())));
        }
        let oracle = ScriptedOracle::new(responses);
        let scratch = tempfile::tempdir().unwrap();

        let position = localize_subject(
            &ScriptedGrabber,
            &oracle,
            &PathBuf::from("src.mp4"),
            0.0,
            10.0,
            scratch.path(),
            &test_config(),
        )
        .await;

        assert_eq!(position, SubjectPosition::centered());
    }

    #[tokio::test]
    async fn test_grabber_failure_degrades_to_centre() {
        let oracle = ScriptedOracle::new(vec![]);
        let scratch = tempfile::tempdir().unwrap();

        let position = localize_subject(
            &FailingGrabber,
            &oracle,
            &PathBuf::from("src.mp4"),
            0.0,
            10.0,
            scratch.path(),
            &test_config(),
        )
        .await;

        assert_eq!(position, SubjectPosition::centered());
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let mut config = test_config();
        config.vision_retries = 2;

        let oracle = ScriptedOracle::new(vec![
            Err(VisionError::RequestFailed("blip".to_string())),
            Ok(SubjectPosition { nx: 0.7, ny: 0.3, confidence: 0.9 }),
        ]);

        let result = locate_with_retry(&oracle, &[0u8], &config).await.unwrap();
        assert!((result.nx - 0.7).abs() < 1e-9);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retries_capped_at_two() {
        let mut responses = Vec::new();
        for _ in 0..10 {
            responses.push(Err(VisionError::RequestFailed("down".to_string())));
        }
        let oracle = ScriptedOracle::new(responses);

        let result = locate_with_retry(&oracle, &[0u8], &test_config()).await;
        assert!(result.is_err());
        // Initial attempt + 2 retries.
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_aggregate_zero_weight() {
        let observations = vec![
            SubjectPosition { nx: 0.2, ny: 0.2, confidence: 0.0 },
            SubjectPosition { nx: 0.8, ny: 0.8, confidence: 0.0 },
            SubjectPosition { nx: 0.5, ny: 0.5, confidence: 0.0 },
        ];
        assert_eq!(aggregate(&observations), SubjectPosition::centered());
    }
}
