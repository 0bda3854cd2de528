//! Full-source voice activity analysis.

use std::sync::Arc;
use tracing::{debug, info};

use clipforge_models::{PlatformPreset, VadAnalysis};

use crate::config::PipelineConfig;
use crate::error::{ExportError, PipelineResult};
use crate::services::SpeechDetector;

/// Run the speech detector over full-source PCM and wrap the partition in
/// a cacheable [`VadAnalysis`].
///
/// Inference is bounded by `config.vad_timeout`; an unavailable or
/// timed-out detector fails the request loudly. Falling back to "no VAD"
/// is not allowed, because a pass-through plan would silently disable
/// every edit downstream.
pub async fn analyze_source(
    detector: &dyn SpeechDetector,
    samples: Arc<Vec<f32>>,
    source_id: &str,
    preset: PlatformPreset,
    config: &PipelineConfig,
) -> PipelineResult<VadAnalysis> {
    let preset_config = preset.config();
    let sample_rate = config.pcm_sample_rate;
    let duration = samples.len() as f64 / sample_rate as f64;

    debug!(
        source_id = source_id,
        preset = %preset,
        duration_s = duration,
        threshold = preset_config.vad_threshold,
        "Starting VAD analysis"
    );

    let partition = tokio::time::timeout(
        config.vad_timeout,
        detector.detect(samples, sample_rate, preset_config.vad_threshold),
    )
    .await
    .map_err(|_| {
        ExportError::AnalyzerUnavailable(format!(
            "VAD inference exceeded {}s",
            config.vad_timeout.as_secs()
        ))
    })?
    .map_err(|e| ExportError::AnalyzerUnavailable(e.to_string()))?;

    let analysis = VadAnalysis {
        source_id: source_id.to_string(),
        duration: partition.duration,
        speech_segments: partition.speech_segments,
        silence_segments: partition.silence_segments,
        preset,
        config: preset_config,
        generated_at: chrono::Utc::now(),
    };

    info!(
        source_id = source_id,
        preset = %preset,
        speech_segments = analysis.speech_segments.len(),
        silence_segments = analysis.silence_segments.len(),
        speech_s = format!("{:.1}", analysis.speech_time()),
        silence_s = format!("{:.1}", analysis.silence_time()),
        "VAD analysis complete"
    );

    Ok(analysis)
}
