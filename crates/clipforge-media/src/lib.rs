//! FFmpeg CLI plumbing for the clipforge pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multiple inputs
//! - Progress parsing from `-progress pipe:2`
//! - Cancellation support via tokio watch channels
//! - Media probing (duration, resolution, frame rate, sample rate)
//! - PCM extraction to raw f32le and back
//! - Silero VAD speech/silence partitioning
//! - Single-frame JPEG sampling for vision analysis

pub mod command;
pub mod error;
pub mod extract;
pub mod frames;
pub mod probe;
pub mod progress;
pub mod vad;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use extract::{extract_pcm, read_pcm, write_pcm};
pub use probe::{probe_media, MediaInfo};
pub use progress::FfmpegProgress;
pub use vad::{analyze_samples, SileroDetector, VadPartition};
