//! PCM extraction and raw f32le file I/O.
//!
//! Audio is decoded once per request to raw 32-bit float little-endian
//! samples. The VAD analyzer and the audio assembler both consume the same
//! byte sequence, so there is no chance of resampling mismatches between
//! the two.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Decode `[t0, t1)` of `source` to mono raw f32le PCM at `rate` Hz.
///
/// The output file length in samples is `round((t1 - t0) * rate)` to within
/// one sample. Pass `t1 = f64::INFINITY` to decode to the end of the file.
pub async fn extract_pcm(
    source: impl AsRef<Path>,
    output: impl AsRef<Path>,
    t0: f64,
    t1: f64,
    rate: u32,
) -> MediaResult<PathBuf> {
    let source = source.as_ref();
    let output = output.as_ref();

    let mut cmd = FfmpegCommand::new(source, output);
    if t0 > 0.0 {
        cmd = cmd.seek(t0);
    }
    if t1.is_finite() {
        cmd = cmd.duration(t1 - t0);
    }
    cmd = cmd
        .no_video()
        .output_args(["-ar", &rate.to_string()])
        .output_args(["-ac", "1"])
        .output_args(["-f", "f32le"]);

    FfmpegRunner::new()
        .run(&cmd)
        .await
        .map_err(|e| match e {
            MediaError::FfmpegFailed { message, stderr, .. } => MediaError::DecodeFailed(
                stderr.map(|s| format!("{message}: {s}")).unwrap_or(message),
            ),
            other => other,
        })?;

    let metadata = tokio::fs::metadata(output).await?;
    if metadata.len() == 0 {
        return Err(MediaError::NoAudioData);
    }

    debug!(
        source = %source.display(),
        t0 = t0,
        samples = metadata.len() / 4,
        rate = rate,
        "Extracted PCM"
    );

    Ok(output.to_path_buf())
}

/// Load raw f32le samples from a file.
pub async fn read_pcm(path: impl AsRef<Path>) -> MediaResult<Vec<f32>> {
    let bytes = tokio::fs::read(path.as_ref()).await?;

    let samples: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    Ok(samples)
}

/// Write samples as raw f32le.
pub async fn write_pcm(path: impl AsRef<Path>, samples: &[f32]) -> MediaResult<()> {
    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    tokio::fs::write(path.as_ref(), &bytes).await?;
    Ok(())
}
