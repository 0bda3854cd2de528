//! Renderer bridge: filter graph synthesis and the final mux.
//!
//! The filter graph trims each kept segment from the source with the exact
//! times the planner produced, concatenates, scales, crops, and optionally
//! burns subtitles. Audio comes from the separately assembled PCM, so the
//! graph carries video only (`concat=...:v=1:a=0`).
//!
//! Before invoking the external tool the bridge verifies that the
//! assembled audio duration matches the plan to within one frame; a
//! mismatch means a bug in the planner, assembler, or this bridge, and
//! must surface loudly as a `SyncError` rather than ship a drifting clip.

use std::path::Path;
use tracing::{debug, info};

use clipforge_media::command::FfmpegCommand;
use clipforge_models::{EditPlan, FormatSpec};

use crate::captions::subtitles_filter_path;
use crate::crop::CropPlan;
use crate::error::{ExportError, PipelineResult};

/// Build the video filter graph for a plan.
///
/// Per kept segment: `trim=start={src_start}:end={src_end},setpts=PTS-STARTPTS`.
/// Segments are concatenated with `concat=n=N:v=1:a=0`; a single segment
/// skips the split/concat pair entirely. The chain then applies
/// `scale={sw}:{sh}`, `crop={w}:{h}:{x}:{y}`, and optionally
/// `subtitles='{ass}'`, ending at the `[vout]` label.
pub fn build_filter_graph(
    plan: &EditPlan,
    crop: &CropPlan,
    spec: &FormatSpec,
    captions_path: Option<&Path>,
) -> String {
    let mut filters: Vec<String> = Vec::new();
    let n = plan.kept_segments.len();

    if n == 1 {
        let seg = &plan.kept_segments[0];
        filters.push(format!(
            "[0:v]trim=start={:.6}:end={:.6},setpts=PTS-STARTPTS[vcat]",
            seg.src_start, seg.src_end
        ));
    } else {
        let split_outputs: String = (0..n).map(|i| format!("[s{i}]")).collect();
        filters.push(format!("[0:v]split={n}{split_outputs}"));

        for (i, seg) in plan.kept_segments.iter().enumerate() {
            filters.push(format!(
                "[s{i}]trim=start={:.6}:end={:.6},setpts=PTS-STARTPTS[t{i}]",
                seg.src_start, seg.src_end
            ));
        }

        let concat_inputs: String = (0..n).map(|i| format!("[t{i}]")).collect();
        filters.push(format!("{concat_inputs}concat=n={n}:v=1:a=0[vcat]"));
    }

    filters.push(format!(
        "[vcat]scale={}:{}[vsc]",
        crop.scaled_width, crop.scaled_height
    ));
    filters.push(format!(
        "[vsc]crop={}:{}:{}:{}[vcr]",
        spec.width, spec.height, crop.scaled_x, crop.scaled_y
    ));

    match captions_path {
        Some(path) => {
            let escaped = subtitles_filter_path(&path.to_string_lossy());
            filters.push(format!("[vcr]subtitles='{escaped}'[vout]"));
        }
        None => filters.push("[vcr]null[vout]".to_string()),
    }

    filters.join(";")
}

/// Verify the assembled audio against the plan.
///
/// Tolerance is one frame at the source frame rate.
pub fn verify_sync(plan: &EditPlan, assembled_duration: f64, fps: f64) -> PipelineResult<()> {
    let tolerance = 1.0 / fps.max(1.0);
    let drift = (plan.output_duration - assembled_duration).abs();

    if drift > tolerance {
        return Err(ExportError::SyncError {
            plan_duration: plan.output_duration,
            actual_duration: assembled_duration,
            context: format!("assembled audio drift {drift:.4}s exceeds {tolerance:.4}s"),
        });
    }

    debug!(
        plan_s = format!("{:.4}", plan.output_duration),
        audio_s = format!("{:.4}", assembled_duration),
        drift_ms = format!("{:.2}", drift * 1000.0),
        "Audio/video sync verified"
    );

    Ok(())
}

/// Check a rendered file's reported duration against the plan, again to
/// one frame.
pub fn verify_output_duration(plan: &EditPlan, output_duration: f64, fps: f64) -> PipelineResult<()> {
    let tolerance = 1.0 / fps.max(1.0);
    let drift = (plan.output_duration - output_duration).abs();

    if drift > tolerance {
        return Err(ExportError::SyncError {
            plan_duration: plan.output_duration,
            actual_duration: output_duration,
            context: format!("rendered output drift {drift:.4}s exceeds {tolerance:.4}s"),
        });
    }

    Ok(())
}

/// Assemble the final mux command: source video through the filter graph,
/// assembled raw f32le PCM as the audio track.
pub fn build_render_command(
    source: &Path,
    assembled_audio: &Path,
    output: &Path,
    filter_graph: &str,
    spec: &FormatSpec,
    pcm_sample_rate: u32,
) -> FfmpegCommand {
    info!(
        source = %source.display(),
        output = %output.display(),
        format = %spec.format,
        "Building render command"
    );

    FfmpegCommand::new(source, output)
        .input(assembled_audio)
        .input_args(["-f", "f32le"])
        .input_args(["-ar", &pcm_sample_rate.to_string()])
        .input_args(["-ac", "1"])
        .filter_complex(filter_graph)
        .map("[vout]")
        .map("1:a")
        .video_codec("libx264")
        .encoder_preset("medium")
        .crf(23)
        .output_args(["-b:v", &format!("{}M", spec.bitrate_mbps)])
        .output_args(["-maxrate", &format!("{}M", spec.bitrate_mbps * 1.5)])
        .output_args(["-bufsize", &format!("{}M", spec.bitrate_mbps * 2.0)])
        .output_args(["-r", &spec.fps.to_string()])
        .output_args(["-pix_fmt", "yuv420p"])
        .audio_codec("aac")
        .audio_bitrate(format!("{}k", spec.audio_bitrate_kbps))
}
