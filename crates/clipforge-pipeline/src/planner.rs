//! Edit planning: silence trimming decisions and the output timeline.
//!
//! The planner turns a source-wide VAD partition, a clip window, and the
//! preset (plus optional per-silence overrides) into an ordered list of
//! kept segments and the timeline map every downstream consumer shares.
//!
//! All times stay in floating-point source seconds. The planner performs
//! no frame snapping; the renderer may snap internally but the same plan
//! values feed audio assembly, caption timing, and the filter graph.

use tracing::debug;

use clipforge_models::{
    Adjustments, ClipRequest, EditPlan, KeptSegment, TimelineMap, TimelineSpan, VadAnalysis,
};

use crate::error::{ExportError, PipelineResult};

/// Tolerance for treating two source times as the same instant.
const EPS: f64 = 1e-9;

/// Source-time tolerance for matching a silence override to a detected
/// silence.
const OVERRIDE_MATCH_TOLERANCE_S: f64 = 0.100;

#[derive(Debug, Clone, Copy)]
enum Interval {
    Speech { start: f64, end: f64 },
    Silence { start: f64, end: f64, detected_start: f64 },
}

impl Interval {
    fn start(&self) -> f64 {
        match self {
            Interval::Speech { start, .. } | Interval::Silence { start, .. } => *start,
        }
    }
}

/// Compute the edit plan for a clip request.
///
/// Errors with [`ExportError::EmptyPlan`] when no speech survives the clip
/// window.
pub fn plan(vad: &VadAnalysis, request: &ClipRequest) -> PipelineResult<EditPlan> {
    let clip_start = request.clip_start;
    let clip_end = request.clip_end;
    let config = &vad.config;
    let adjustments = request.adjustments.clone().unwrap_or_default();
    let max_kept_silence = adjustments
        .max_kept_silence_s
        .unwrap_or(config.max_kept_silence_s);

    // 1. Intersect the partition with the clip window.
    let intervals = clip_intervals(vad, clip_start, clip_end);

    let speech_count = intervals
        .iter()
        .filter(|i| matches!(i, Interval::Speech { .. }))
        .count();
    if speech_count == 0 {
        return Err(ExportError::EmptyPlan);
    }
    let silences_detected = intervals.len() - speech_count;

    // 2. Pad speech, resolving overlaps at the midpoint.
    let padded = pad_speech(&intervals, config.speech_padding_s, clip_start, clip_end);

    // 3-4. Decide per-silence keeps and emit kept source intervals.
    let (kept_intervals, silences_trimmed) = apply_silence_keeps(
        &intervals,
        &padded,
        &adjustments,
        config.min_silence_s,
        max_kept_silence,
    );

    // 4b. Concatenate source-contiguous runs into kept segments.
    let mut segments = merge_contiguous(&kept_intervals);
    if segments.is_empty() {
        return Err(ExportError::EmptyPlan);
    }

    // 5. Crossfades at every interior join, clamped to half the shorter
    // neighbour so the timeline and the assembler agree exactly.
    assign_fades(&mut segments, config.crossfade_s);

    // 6. Fades cost no output time: each span starts a fade early.
    let timeline = build_timeline(&segments);
    let output_duration = timeline.output_duration();

    debug!(
        clip_start = clip_start,
        clip_end = clip_end,
        kept_segments = segments.len(),
        silences_detected = silences_detected,
        silences_trimmed = silences_trimmed,
        output_duration = format!("{output_duration:.3}"),
        "Edit plan computed"
    );

    Ok(EditPlan {
        source_id: vad.source_id.clone(),
        preset: vad.preset,
        clip_start,
        clip_end,
        kept_segments: segments,
        timeline,
        output_duration,
        silences_detected,
        silences_trimmed,
    })
}

/// Intersect the alternating VAD partition with `[clip_start, clip_end)`.
fn clip_intervals(vad: &VadAnalysis, clip_start: f64, clip_end: f64) -> Vec<Interval> {
    let mut intervals: Vec<Interval> = Vec::new();

    for s in &vad.speech_segments {
        let start = s.start.max(clip_start);
        let end = s.end.min(clip_end);
        if end - start > EPS {
            intervals.push(Interval::Speech { start, end });
        }
    }
    for s in &vad.silence_segments {
        let start = s.start.max(clip_start);
        let end = s.end.min(clip_end);
        if end - start > EPS {
            intervals.push(Interval::Silence {
                start,
                end,
                detected_start: s.start,
            });
        }
    }

    intervals.sort_by(|a, b| a.start().total_cmp(&b.start()));
    intervals
}

/// Padded bounds per interval (silences get placeholders updated later).
fn pad_speech(
    intervals: &[Interval],
    padding: f64,
    clip_start: f64,
    clip_end: f64,
) -> Vec<(f64, f64)> {
    let mut padded: Vec<(f64, f64)> = intervals
        .iter()
        .map(|interval| match *interval {
            Interval::Speech { start, end } => (
                (start - padding).max(clip_start),
                (end + padding).min(clip_end),
            ),
            Interval::Silence { start, end, .. } => (start, end),
        })
        .collect();

    // Resolve overlapping padded speech: the overlap is split at its
    // midpoint, half to each side.
    let speech_indices: Vec<usize> = intervals
        .iter()
        .enumerate()
        .filter(|(_, i)| matches!(i, Interval::Speech { .. }))
        .map(|(idx, _)| idx)
        .collect();

    for pair in speech_indices.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if padded[a].1 > padded[b].0 {
            let boundary = (padded[b].0 + padded[a].1) / 2.0;
            padded[a].1 = boundary;
            padded[b].0 = boundary;
        }
    }

    padded
}

/// Decide keeps for each silence and emit the kept source intervals in
/// order. Returns the intervals and the number of silences shortened or
/// removed.
fn apply_silence_keeps(
    intervals: &[Interval],
    padded: &[(f64, f64)],
    adjustments: &Adjustments,
    min_silence: f64,
    max_kept_silence: f64,
) -> (Vec<(f64, f64)>, usize) {
    let mut kept: Vec<(f64, f64)> = Vec::new();
    let mut trimmed = 0usize;

    for (idx, interval) in intervals.iter().enumerate() {
        match *interval {
            Interval::Speech { .. } => {
                let (start, end) = padded[idx];
                if end - start > EPS {
                    kept.push((start, end));
                }
            }
            Interval::Silence { detected_start, .. } => {
                // Padding of the neighbouring speech eats into the silence.
                let start = if idx > 0 {
                    padded[idx - 1].1.max(padded[idx].0)
                } else {
                    padded[idx].0
                };
                let end = if idx + 1 < intervals.len() {
                    padded[idx + 1].0.min(padded[idx].1)
                } else {
                    padded[idx].1
                };

                let duration = end - start;
                if duration <= EPS {
                    // Fully consumed by speech padding; the neighbours are
                    // now source-contiguous.
                    continue;
                }

                let keep = silence_keep(
                    detected_start,
                    duration,
                    adjustments,
                    min_silence,
                    max_kept_silence,
                );

                if keep + EPS < duration {
                    trimmed += 1;
                }

                if keep <= EPS {
                    // Removed entirely: a keep_ms = 0 override (or a hard
                    // trim to nothing) collapses to a single join between
                    // the neighbouring kept segments.
                    continue;
                }

                if keep + EPS >= duration {
                    kept.push((start, end));
                } else {
                    // Trim equally from both ends, preserving the centre
                    // of the pause.
                    let mid = (start + end) / 2.0;
                    kept.push((mid - keep / 2.0, mid + keep / 2.0));
                }
            }
        }
    }

    (kept, trimmed)
}

/// How much of a silence of `duration` seconds to keep.
fn silence_keep(
    detected_start: f64,
    duration: f64,
    adjustments: &Adjustments,
    min_silence: f64,
    max_kept_silence: f64,
) -> f64 {
    let override_keep = adjustments
        .silence_overrides
        .iter()
        .find(|ov| (ov.src_start - detected_start).abs() < OVERRIDE_MATCH_TOLERANCE_S)
        .map(|ov| ov.keep_ms as f64 / 1000.0);

    match override_keep {
        Some(keep) => keep.min(duration),
        None if duration < min_silence => duration,
        None => duration.min(max_kept_silence),
    }
}

/// Concatenate source-contiguous intervals into kept segments.
fn merge_contiguous(intervals: &[(f64, f64)]) -> Vec<KeptSegment> {
    let mut segments: Vec<KeptSegment> = Vec::new();

    for &(start, end) in intervals {
        if end - start <= EPS {
            continue;
        }
        match segments.last_mut() {
            Some(last) if (start - last.src_end).abs() <= 1e-6 => {
                last.src_end = end;
            }
            _ => segments.push(KeptSegment {
                src_start: start,
                src_end: end,
                lead_fade_s: 0.0,
                trail_fade_s: 0.0,
            }),
        }
    }

    segments
}

/// Set the crossfade at every interior join.
///
/// The fade is clamped to half the shorter neighbour so a short kept
/// silence can never be consumed entirely by its fades.
fn assign_fades(segments: &mut [KeptSegment], crossfade: f64) {
    for i in 0..segments.len().saturating_sub(1) {
        let fade = crossfade
            .min(segments[i].duration() / 2.0)
            .min(segments[i + 1].duration() / 2.0)
            .max(0.0);
        segments[i].trail_fade_s = fade;
        segments[i + 1].lead_fade_s = fade;
    }
}

/// Accumulate output time; a crossfade overlaps the join so the next span
/// starts a fade length early.
fn build_timeline(segments: &[KeptSegment]) -> TimelineMap {
    let mut spans = Vec::with_capacity(segments.len());
    let mut cursor = 0.0f64;

    for segment in segments {
        let out_start = cursor - segment.lead_fade_s;
        let out_end = out_start + segment.duration();
        spans.push(TimelineSpan {
            src_start: segment.src_start,
            src_end: segment.src_end,
            out_start,
            out_end,
        });
        cursor = out_end;
    }

    TimelineMap { spans }
}

/// Estimated durations for a clip range, computed from a cached analysis
/// without planning or rendering. Used for preset comparison in clip
/// selection.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationEstimate {
    pub original_duration: f64,
    pub estimated_duration: f64,
    pub time_saved: f64,
    pub percent_reduction: f64,
    pub speech_time: f64,
    pub silence_time: f64,
    pub silences_in_range: usize,
}

/// Estimate the edited duration of `[start, end)` under the analysis's
/// preset, without building a plan.
pub fn estimate(vad: &VadAnalysis, start: f64, end: f64) -> DurationEstimate {
    let start = start.clamp(0.0, vad.duration);
    let end = end.clamp(start, vad.duration);
    let original_duration = end - start;

    if original_duration <= 0.0 {
        return DurationEstimate {
            original_duration: 0.0,
            estimated_duration: 0.0,
            time_saved: 0.0,
            percent_reduction: 0.0,
            speech_time: 0.0,
            silence_time: 0.0,
            silences_in_range: 0,
        };
    }

    let max_kept = vad.config.max_kept_silence_s;

    let speech_time: f64 = vad
        .speech_segments
        .iter()
        .map(|s| (s.end.min(end) - s.start.max(start)).max(0.0))
        .sum();

    let mut silence_time = 0.0;
    let mut time_removed = 0.0;
    let mut silences_in_range = 0;

    for silence in &vad.silence_segments {
        let overlap = (silence.end.min(end) - silence.start.max(start)).max(0.0);
        if overlap > 0.0 {
            silences_in_range += 1;
            silence_time += overlap;
            if overlap > max_kept {
                time_removed += overlap - max_kept;
            }
        }
    }

    DurationEstimate {
        original_duration,
        estimated_duration: original_duration - time_removed,
        time_saved: time_removed,
        percent_reduction: time_removed / original_duration * 100.0,
        speech_time,
        silence_time,
        silences_in_range,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use clipforge_models::{
        ExportFormat, PlatformPreset, PresetConfig, SilenceOverride, SilenceSegment, SpeechSegment,
    };
    use std::path::PathBuf;

    fn make_vad(
        speech: &[(f64, f64)],
        silence: &[(f64, f64)],
        duration: f64,
        config: PresetConfig,
    ) -> VadAnalysis {
        VadAnalysis {
            source_id: "test-source".to_string(),
            duration,
            speech_segments: speech
                .iter()
                .map(|&(start, end)| SpeechSegment { start, end })
                .collect(),
            silence_segments: silence
                .iter()
                .map(|&(start, end)| SilenceSegment { start, end })
                .collect(),
            preset: PlatformPreset::Linkedin,
            config,
            generated_at: Utc::now(),
        }
    }

    fn make_request(clip_start: f64, clip_end: f64) -> ClipRequest {
        ClipRequest {
            source_id: "test-source".to_string(),
            source_path: PathBuf::from("/tmp/source.mp4"),
            clip_start,
            clip_end,
            target_format: ExportFormat::Tiktok,
            preset: PlatformPreset::Linkedin,
            include_captions: false,
            transcript: None,
            adjustments: None,
            output_path: PathBuf::from("/tmp/out.mp4"),
        }
    }

    fn linkedin() -> PresetConfig {
        PlatformPreset::Linkedin.config()
    }

    fn assert_plan_invariants(plan: &EditPlan) {
        // Ordered, non-overlapping, inside the clip window.
        for pair in plan.kept_segments.windows(2) {
            assert!(pair[0].src_end <= pair[1].src_start + 1e-9);
        }
        for seg in &plan.kept_segments {
            assert!(seg.src_start >= plan.clip_start - 1e-9);
            assert!(seg.src_end <= plan.clip_end + 1e-9);
            assert!(seg.duration() > 0.0);
        }
        // Boundary fades are zero.
        assert!(plan.kept_segments.first().unwrap().lead_fade_s.abs() < 1e-12);
        assert!(plan.kept_segments.last().unwrap().trail_fade_s.abs() < 1e-12);
        // Slope 1 on every span; output duration matches the timeline.
        for (seg, span) in plan.kept_segments.iter().zip(plan.timeline.spans.iter()) {
            assert!(((span.out_end - span.out_start) - seg.duration()).abs() < 1e-9);
        }
        assert!((plan.output_duration - plan.timeline.output_duration()).abs() < 1e-12);
        // Strict monotonicity in source order.
        for pair in plan.timeline.spans.windows(2) {
            assert!(pair[0].out_start < pair[1].out_start);
            assert!(pair[0].out_end < pair[1].out_end);
        }
    }

    #[test]
    fn test_all_speech_single_segment() {
        let vad = make_vad(&[(0.0, 30.0)], &[], 30.0, linkedin());
        let plan = plan(&vad, &make_request(5.0, 25.0)).unwrap();

        assert_eq!(plan.kept_segments.len(), 1);
        let seg = &plan.kept_segments[0];
        assert!((seg.src_start - 5.0).abs() < 1e-9);
        assert!((seg.src_end - 25.0).abs() < 1e-9);
        assert!((plan.output_duration - 20.0).abs() < 1e-9);
        assert_plan_invariants(&plan);
    }

    #[test]
    fn test_short_silence_kept_whole() {
        // 0.3s silence < min_silence_s (0.5): kept in full, so one
        // contiguous segment comes out.
        let vad = make_vad(
            &[(0.0, 5.0), (5.3, 10.0)],
            &[(5.0, 5.3)],
            10.0,
            linkedin(),
        );
        let plan = plan(&vad, &make_request(0.0, 10.0)).unwrap();

        assert_eq!(plan.kept_segments.len(), 1);
        assert!((plan.output_duration - 10.0).abs() < 1e-9);
        assert_eq!(plan.silences_trimmed, 0);
        assert_plan_invariants(&plan);
    }

    #[test]
    fn test_long_silence_trimmed_to_centre() {
        // 3s silence, max kept 0.7, padding 0.15 on each side. Effective
        // silence [5.15, 7.85] = 2.7s, trimmed to its centre 0.7s.
        let vad = make_vad(&[(0.0, 5.0), (8.0, 12.0)], &[(5.0, 8.0)], 12.0, linkedin());
        let plan = plan(&vad, &make_request(0.0, 12.0)).unwrap();

        // speech+pad | silence centre | pad+speech
        assert_eq!(plan.kept_segments.len(), 3);
        let centre = &plan.kept_segments[1];
        assert!((centre.duration() - 0.7).abs() < 1e-9);
        assert!(((centre.src_start + centre.src_end) / 2.0 - 6.5).abs() < 1e-9);

        // Output = 12 - (2.7 - 0.7) - 2 fades of 10ms.
        let expected = 12.0 - 2.0 - 2.0 * 0.010;
        assert!((plan.output_duration - expected).abs() < 1e-9);
        assert_eq!(plan.silences_detected, 1);
        assert_eq!(plan.silences_trimmed, 1);
        assert_plan_invariants(&plan);
    }

    #[test]
    fn test_padding_consumes_small_silence() {
        // 0.25s silence with 0.15s padding each side: padded speech
        // overlaps and splits at the midpoint; the window stays contiguous.
        let vad = make_vad(
            &[(0.0, 5.0), (5.25, 10.0)],
            &[(5.0, 5.25)],
            10.0,
            linkedin(),
        );
        let plan = plan(&vad, &make_request(0.0, 10.0)).unwrap();

        assert_eq!(plan.kept_segments.len(), 1);
        assert!((plan.output_duration - 10.0).abs() < 1e-9);
        assert_plan_invariants(&plan);
    }

    #[test]
    fn test_override_keep_zero_single_join() {
        // An override of 0 removes the silence entirely; the neighbours
        // join with a single crossfade.
        let mut request = make_request(0.0, 12.0);
        request.adjustments = Some(Adjustments {
            max_kept_silence_s: None,
            silence_overrides: vec![SilenceOverride {
                src_start: 5.02, // within 100ms of the detected start
                keep_ms: 0,
            }],
        });
        let vad = make_vad(&[(0.0, 5.0), (8.0, 12.0)], &[(5.0, 8.0)], 12.0, linkedin());
        let plan = plan(&vad, &request).unwrap();

        assert_eq!(plan.kept_segments.len(), 2);
        let fade = plan.kept_segments[0].trail_fade_s;
        assert!((fade - 0.010).abs() < 1e-9);
        assert!((plan.kept_segments[1].lead_fade_s - fade).abs() < 1e-12);
        assert_plan_invariants(&plan);
    }

    #[test]
    fn test_override_beyond_tolerance_ignored() {
        let mut request = make_request(0.0, 12.0);
        request.adjustments = Some(Adjustments {
            max_kept_silence_s: None,
            silence_overrides: vec![SilenceOverride {
                src_start: 5.2, // 200ms off: no match
                keep_ms: 0,
            }],
        });
        let vad = make_vad(&[(0.0, 5.0), (8.0, 12.0)], &[(5.0, 8.0)], 12.0, linkedin());
        let plan = plan(&vad, &request).unwrap();

        // Default trim applies instead: centre kept.
        assert_eq!(plan.kept_segments.len(), 3);
        assert_plan_invariants(&plan);
    }

    #[test]
    fn test_global_max_kept_override() {
        let mut request = make_request(0.0, 12.0);
        request.adjustments = Some(Adjustments {
            max_kept_silence_s: Some(0.2),
            silence_overrides: vec![],
        });
        let vad = make_vad(&[(0.0, 5.0), (8.0, 12.0)], &[(5.0, 8.0)], 12.0, linkedin());
        let plan = plan(&vad, &request).unwrap();

        let centre = &plan.kept_segments[1];
        assert!((centre.duration() - 0.2).abs() < 1e-9);
        assert_plan_invariants(&plan);
    }

    #[test]
    fn test_empty_plan_in_pure_silence() {
        let vad = make_vad(&[], &[(0.0, 60.0)], 60.0, linkedin());
        let err = plan(&vad, &make_request(10.0, 15.0)).unwrap_err();
        assert!(matches!(err, ExportError::EmptyPlan));
    }

    #[test]
    fn test_empty_plan_when_speech_outside_window() {
        let vad = make_vad(&[(0.0, 5.0)], &[(5.0, 60.0)], 60.0, linkedin());
        let err = plan(&vad, &make_request(20.0, 30.0)).unwrap_err();
        assert!(matches!(err, ExportError::EmptyPlan));
    }

    #[test]
    fn test_plan_determinism() {
        let vad = make_vad(
            &[(0.0, 5.0), (8.0, 12.0), (13.5, 20.0)],
            &[(5.0, 8.0), (12.0, 13.5)],
            20.0,
            linkedin(),
        );
        let request = make_request(1.0, 19.0);
        let a = plan(&vad, &request).unwrap();
        let b = plan(&vad, &request).unwrap();
        assert_eq!(a.kept_segments, b.kept_segments);
        assert_eq!(a.timeline, b.timeline);
    }

    #[test]
    fn test_timeline_fades_cost_no_output_time() {
        let vad = make_vad(&[(0.0, 5.0), (8.0, 12.0)], &[(5.0, 8.0)], 12.0, linkedin());
        let plan = plan(&vad, &make_request(0.0, 12.0)).unwrap();

        let total_src: f64 = plan.kept_segments.iter().map(|s| s.duration()).sum();
        let total_fades: f64 = plan.kept_segments.iter().map(|s| s.lead_fade_s).sum();
        assert!((plan.output_duration - (total_src - total_fades)).abs() < 1e-9);
    }

    #[test]
    fn test_later_piece_wins_on_fade_overlap() {
        let vad = make_vad(&[(0.0, 5.0), (8.0, 12.0)], &[(5.0, 8.0)], 12.0, linkedin());
        let plan = plan(&vad, &make_request(0.0, 12.0)).unwrap();

        // The first span's final fade window overlaps the second span's
        // start in output time; mapping a source time at the start of the
        // second segment must use the second (later) span.
        let second = &plan.timeline.spans[1];
        let mapped = plan.timeline.source_to_output(second.src_start).unwrap();
        assert!((mapped - second.out_start).abs() < 1e-12);
    }

    #[test]
    fn test_window_starting_mid_silence() {
        // The clip opens inside a long silence; the leading part gets
        // trimmed like any other silence (no speech before it).
        let vad = make_vad(&[(10.0, 20.0)], &[(0.0, 10.0)], 20.0, linkedin());
        let plan = plan(&vad, &make_request(5.0, 20.0)).unwrap();

        assert!(plan.output_duration < 15.0);
        assert_plan_invariants(&plan);
    }

    #[test]
    fn test_estimate_matches_silence_trim_math() {
        let vad = make_vad(
            &[(0.0, 5.0), (8.0, 12.0)],
            &[(5.0, 8.0)],
            12.0,
            linkedin(),
        );
        let est = estimate(&vad, 0.0, 12.0);

        assert!((est.original_duration - 12.0).abs() < 1e-9);
        // 3s silence trimmed to 0.7 => 2.3 saved.
        assert!((est.time_saved - 2.3).abs() < 1e-9);
        assert!((est.estimated_duration - 9.7).abs() < 1e-9);
        assert_eq!(est.silences_in_range, 1);
    }

    #[test]
    fn test_estimate_empty_range() {
        let vad = make_vad(&[(0.0, 5.0)], &[(5.0, 10.0)], 10.0, linkedin());
        let est = estimate(&vad, 4.0, 4.0);
        assert!(est.original_duration.abs() < 1e-12);
        assert!(est.estimated_duration.abs() < 1e-12);
    }
}
