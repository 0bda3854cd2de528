//! External collaborator contracts.
//!
//! The pipeline talks to everything outside its own math through these
//! narrow async traits: the prober, the audio decoder, the voice activity
//! detector, the frame grabber, the vision oracle (see [`crate::vision`]),
//! and the render executor. Production wires in the ffmpeg/Silero-backed
//! adapters below; tests inject doubles.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

use clipforge_media::{
    command::FfmpegCommand, extract, frames, probe, vad, FfmpegRunner, MediaError, MediaInfo,
    MediaResult, VadPartition,
};

/// Probes source metadata (duration, resolution, frame rate, sample rate).
#[async_trait]
pub trait MediaProber: Send + Sync {
    async fn probe(&self, path: &Path) -> MediaResult<MediaInfo>;
}

/// Decodes a time range of a source to mono raw f32le PCM.
#[async_trait]
pub trait AudioDecoder: Send + Sync {
    async fn extract(
        &self,
        source: &Path,
        output: &Path,
        t0: f64,
        t1: f64,
        rate: u32,
    ) -> MediaResult<PathBuf>;
}

/// Labels PCM as speech/silence.
#[async_trait]
pub trait SpeechDetector: Send + Sync {
    async fn detect(
        &self,
        samples: Arc<Vec<f32>>,
        sample_rate: u32,
        threshold: f32,
    ) -> MediaResult<VadPartition>;
}

/// Extracts single JPEG frames for vision analysis.
#[async_trait]
pub trait FrameGrabber: Send + Sync {
    async fn grab(
        &self,
        source: &Path,
        timestamp: f64,
        max_dimension: u32,
        scratch_dir: &Path,
    ) -> MediaResult<Vec<u8>>;
}

/// Runs the external media tool for the final render.
#[async_trait]
pub trait RenderExecutor: Send + Sync {
    async fn run(
        &self,
        cmd: &FfmpegCommand,
        cancel: Option<watch::Receiver<bool>>,
    ) -> MediaResult<()>;
}

/// FFprobe-backed prober.
pub struct FfprobeProber;

#[async_trait]
impl MediaProber for FfprobeProber {
    async fn probe(&self, path: &Path) -> MediaResult<MediaInfo> {
        probe::probe_media(path).await
    }
}

/// FFmpeg-backed PCM decoder.
pub struct FfmpegDecoder;

#[async_trait]
impl AudioDecoder for FfmpegDecoder {
    async fn extract(
        &self,
        source: &Path,
        output: &Path,
        t0: f64,
        t1: f64,
        rate: u32,
    ) -> MediaResult<PathBuf> {
        extract::extract_pcm(source, output, t0, t1, rate).await
    }
}

/// Silero VAD-backed detector.
///
/// Inference is CPU-bound, so it runs on the blocking pool.
pub struct SileroSpeechDetector;

#[async_trait]
impl SpeechDetector for SileroSpeechDetector {
    async fn detect(
        &self,
        samples: Arc<Vec<f32>>,
        sample_rate: u32,
        threshold: f32,
    ) -> MediaResult<VadPartition> {
        tokio::task::spawn_blocking(move || {
            vad::analyze_samples(&samples, sample_rate, threshold)
        })
        .await
        .map_err(|e| MediaError::VadFailed(format!("inference task panicked: {e}")))?
    }
}

/// FFmpeg-backed frame grabber.
pub struct FfmpegFrameGrabber;

#[async_trait]
impl FrameGrabber for FfmpegFrameGrabber {
    async fn grab(
        &self,
        source: &Path,
        timestamp: f64,
        max_dimension: u32,
        scratch_dir: &Path,
    ) -> MediaResult<Vec<u8>> {
        frames::sample_frame_jpeg(source, timestamp, max_dimension, scratch_dir).await
    }
}

/// FFmpeg-backed render executor.
pub struct FfmpegRenderExecutor;

#[async_trait]
impl RenderExecutor for FfmpegRenderExecutor {
    async fn run(
        &self,
        cmd: &FfmpegCommand,
        cancel: Option<watch::Receiver<bool>>,
    ) -> MediaResult<()> {
        let mut runner = FfmpegRunner::new();
        if let Some(rx) = cancel {
            runner = runner.with_cancel(rx);
        }
        runner.run(cmd).await
    }
}
