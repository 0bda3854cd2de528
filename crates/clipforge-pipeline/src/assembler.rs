//! Audio assembly with equal-power crossfades.
//!
//! Kept segments are sliced out of the full-source PCM (the same byte
//! sequence the VAD analyzed) and written end-to-end. At each join the
//! tail of one segment and the head of the next occupy the same output
//! samples, weighted `cos(pi/2 * t/L)` out and `sin(pi/2 * t/L)` in, so
//! the join is click-free and the fade costs no output time.

use std::path::Path;
use tracing::debug;

use clipforge_media::extract::write_pcm;
use clipforge_models::EditPlan;

use crate::error::{ExportError, PipelineResult};

/// Assemble the edited audio for a plan from full-source samples.
///
/// Returns the output sample buffer; its length is
/// `round(plan.output_duration * sample_rate)` to within one sample.
pub fn assemble(plan: &EditPlan, samples: &[f32], sample_rate: u32) -> Vec<f32> {
    let rate = sample_rate as f64;
    let total_samples = (plan.output_duration * rate).round() as usize;
    let mut out = vec![0.0f32; total_samples];

    for (segment, span) in plan.kept_segments.iter().zip(plan.timeline.spans.iter()) {
        let src_start = (segment.src_start * rate).round() as usize;
        let src_end = ((segment.src_end * rate).round() as usize).min(samples.len());
        if src_end <= src_start || src_start >= samples.len() {
            continue;
        }
        let slice = &samples[src_start..src_end];

        // The planner clamps fades to half the segment; clamp again here
        // so a degenerate plan still assembles without popping.
        let max_fade = slice.len() / 2;
        let lead_fade = ((segment.lead_fade_s * rate).round() as usize).min(max_fade);
        let trail_fade = ((segment.trail_fade_s * rate).round() as usize).min(max_fade);

        let out_start = (span.out_start * rate).round() as usize;

        for (i, &sample) in slice.iter().enumerate() {
            let out_idx = out_start + i;
            if out_idx >= out.len() {
                break;
            }

            let mut gain = 1.0f32;
            if i < lead_fade {
                // Fading in over the previous segment's tail.
                let t = i as f32 / lead_fade as f32;
                gain = (std::f32::consts::FRAC_PI_2 * t).sin();
            }
            let from_end = slice.len() - 1 - i;
            if from_end < trail_fade {
                // Fading out under the next segment's head.
                let t = (trail_fade - 1 - from_end) as f32 / trail_fade as f32;
                gain *= (std::f32::consts::FRAC_PI_2 * t).cos();
            }

            out[out_idx] += sample * gain;
        }
    }

    debug!(
        segments = plan.kept_segments.len(),
        output_samples = out.len(),
        output_s = format!("{:.3}", out.len() as f64 / rate),
        "Assembled edited audio"
    );

    out
}

/// Assemble and write the edited audio as raw f32le.
pub async fn assemble_to_file(
    plan: &EditPlan,
    samples: &[f32],
    sample_rate: u32,
    output: impl AsRef<Path>,
) -> PipelineResult<f64> {
    let assembled = assemble(plan, samples, sample_rate);
    let duration = assembled.len() as f64 / sample_rate as f64;

    write_pcm(output.as_ref(), &assembled)
        .await
        .map_err(|e| ExportError::IoFailure(std::io::Error::other(e.to_string())))?;

    Ok(duration)
}
