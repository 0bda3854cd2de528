//! Thin wrapper over the `voice_activity_detector` crate (Silero VAD v5).
//!
//! Silero VAD runs on CPU, handles background music and ambient noise well,
//! and ships its ONNX model inside the crate, so there is nothing to
//! download at runtime.
//!
//! Silero VAD v5 supports:
//! - 8kHz: 256 samples per frame (~32ms)
//! - 16kHz: 512 samples per frame (~32ms)

use tracing::debug;
use voice_activity_detector::VoiceActivityDetector;

use crate::error::{MediaError, MediaResult};

/// Silero VAD instance producing per-frame speech probabilities.
pub struct SileroDetector {
    vad: VoiceActivityDetector,
    sample_rate: usize,
    frame_size: usize,
}

impl SileroDetector {
    /// Create a detector for the given sample rate (8000 or 16000).
    pub fn new(sample_rate: usize) -> MediaResult<Self> {
        let frame_size = match sample_rate {
            8000 => 256,
            16000 => 512,
            _ => {
                return Err(MediaError::InvalidAudioFormat(format!(
                    "sample rate must be 8000 or 16000, got {}",
                    sample_rate
                )));
            }
        };

        let vad = VoiceActivityDetector::builder()
            .sample_rate(sample_rate as i64)
            .chunk_size(frame_size)
            .build()
            .map_err(|e| MediaError::VadFailed(format!("failed to create VAD: {e:?}")))?;

        debug!(
            sample_rate = sample_rate,
            frame_size = frame_size,
            "Initialized Silero VAD v5"
        );

        Ok(Self {
            vad,
            sample_rate,
            frame_size,
        })
    }

    /// Expected samples per frame (512 at 16kHz, 256 at 8kHz).
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Frame duration in seconds.
    pub fn frame_duration_s(&self) -> f64 {
        self.frame_size as f64 / self.sample_rate as f64
    }

    /// Speech probability for one frame of samples in [-1.0, 1.0].
    ///
    /// Short frames are zero-padded; the detector keeps internal state
    /// across frames, so feed frames in stream order.
    pub fn predict(&mut self, samples: &[f32]) -> MediaResult<f32> {
        Ok(self.vad.predict(samples.iter().copied()))
    }
}
