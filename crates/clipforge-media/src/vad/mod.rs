//! Speech/silence partitioning with Silero VAD.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ PCM samples  │───►│ Silero VAD   │───►│ Segmenter    │
//! │ (16kHz mono) │    │ (speech_prob)│    │ (partition)  │
//! └──────────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! The detector produces one speech probability per 32 ms frame; the
//! segmenter turns the frame labels into an alternating speech/silence
//! partition of the full duration.

mod detector;
mod segmenter;

pub use detector::SileroDetector;
pub use segmenter::{partition_from_frames, FrameLabel, VadPartition};

use crate::error::MediaResult;

/// Run Silero VAD over mono PCM samples and partition them.
///
/// `duration` of the returned partition is derived from the sample count,
/// so the partition covers `[0, samples.len() / rate)` exactly.
pub fn analyze_samples(samples: &[f32], rate: u32, threshold: f32) -> MediaResult<VadPartition> {
    let mut detector = SileroDetector::new(rate as usize)?;
    let frame_size = detector.frame_size();
    let frame_duration = frame_size as f64 / rate as f64;

    let mut labels = Vec::with_capacity(samples.len() / frame_size + 1);
    for chunk in samples.chunks(frame_size) {
        // The final partial frame is padded by the detector.
        let prob = detector.predict(chunk)?;
        labels.push(FrameLabel {
            is_speech: prob >= threshold,
        });
    }

    let duration = samples.len() as f64 / rate as f64;
    Ok(partition_from_frames(&labels, frame_duration, duration))
}
