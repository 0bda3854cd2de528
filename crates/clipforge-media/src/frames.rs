//! Single-frame JPEG sampling for vision analysis.

use std::path::Path;
use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Extract one JPEG frame at `timestamp`, scaled so the longest edge is at
/// most `max_dimension` pixels.
pub async fn sample_frame_jpeg(
    source: impl AsRef<Path>,
    timestamp: f64,
    max_dimension: u32,
    scratch_dir: impl AsRef<Path>,
) -> MediaResult<Vec<u8>> {
    let source = source.as_ref();
    let frame_path = scratch_dir
        .as_ref()
        .join(format!("frame_{:.3}.jpg", timestamp));

    let cmd = FfmpegCommand::new(source, &frame_path)
        .seek(timestamp.max(0.0))
        .single_frame()
        .video_filter(format!(
            "scale='min({max},iw)':'min({max},ih)':force_original_aspect_ratio=decrease",
            max = max_dimension
        ))
        .output_args(["-q:v", "2"]);

    FfmpegRunner::new().run(&cmd).await?;

    let bytes = tokio::fs::read(&frame_path).await?;
    if bytes.is_empty() {
        return Err(MediaError::InvalidMedia(format!(
            "empty frame at {timestamp:.3}s from {}",
            source.display()
        )));
    }

    debug!(
        source = %source.display(),
        timestamp = timestamp,
        size_kb = bytes.len() / 1024,
        "Sampled frame"
    );

    let _ = tokio::fs::remove_file(&frame_path).await;

    Ok(bytes)
}
