//! Edit plans: kept segments and the source-to-output timeline map.
//!
//! The timeline map is the single source of truth shared by audio assembly,
//! caption timing, and the renderer's filter graph. All three consume the
//! same plan; none may re-derive or re-snap its times.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::format::ExportFormat;
use crate::preset::PlatformPreset;
use crate::transcript::Transcript;

/// One clip export request.
///
/// Invariant: `0 <= clip_start < clip_end <= source_duration` (validated by
/// the orchestrator after probing the source).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipRequest {
    /// Stable identifier for the source (VAD cache key component).
    pub source_id: String,
    /// Path to the source video file.
    pub source_path: PathBuf,
    /// Clip start in source-time seconds.
    pub clip_start: f64,
    /// Clip end in source-time seconds.
    pub clip_end: f64,
    pub target_format: ExportFormat,
    pub preset: PlatformPreset,
    /// Burn captions when a transcript is present.
    #[serde(default = "default_include_captions")]
    pub include_captions: bool,
    /// Word-level transcript for caption timing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Transcript>,
    /// Optional per-request silence adjustments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjustments: Option<Adjustments>,
    /// Path for the rendered output.
    pub output_path: PathBuf,
}

fn default_include_captions() -> bool {
    true
}

impl ClipRequest {
    /// Duration of the requested clip window in seconds.
    pub fn clip_duration(&self) -> f64 {
        self.clip_end - self.clip_start
    }
}

/// Per-request overrides applied on top of the preset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Adjustments {
    /// Replaces the preset's `max_kept_silence_s` when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_kept_silence_s: Option<f64>,
    /// Per-silence keep overrides, matched by detected silence start.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub silence_overrides: Vec<SilenceOverride>,
}

/// Override for a single detected silence.
///
/// Matches a silence whose detected start lies within 100 ms of
/// `src_start`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SilenceOverride {
    /// Source-time start of the silence being overridden.
    pub src_start: f64,
    /// Milliseconds of the silence to keep (0 removes it entirely).
    pub keep_ms: u64,
}

/// A contiguous range of source media that survives editing.
///
/// Fades describe the crossfade shared with the previous/next kept segment;
/// the first segment has `lead_fade_s = 0`, the last has `trail_fade_s = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeptSegment {
    pub src_start: f64,
    pub src_end: f64,
    pub lead_fade_s: f64,
    pub trail_fade_s: f64,
}

impl KeptSegment {
    pub fn duration(&self) -> f64 {
        self.src_end - self.src_start
    }
}

/// One piece of the piecewise-affine source-to-output mapping.
///
/// Slope is 1 on every span: `out_end - out_start == src_end - src_start`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineSpan {
    pub src_start: f64,
    pub src_end: f64,
    pub out_start: f64,
    pub out_end: f64,
}

impl TimelineSpan {
    /// Whether `src_t` lies inside this span's half-open source interval.
    pub fn contains_src(&self, src_t: f64) -> bool {
        src_t >= self.src_start && src_t < self.src_end
    }
}

/// Monotone piecewise-affine map from source-time to output-time.
///
/// Spans are ordered by source time. Where a crossfade joins two kept
/// segments their output intervals overlap by the fade length; the mapping
/// on that overlap is defined by the later span, which keeps it monotone
/// with slope 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineMap {
    pub spans: Vec<TimelineSpan>,
}

impl TimelineMap {
    /// Total output duration: `out_end` of the last span.
    pub fn output_duration(&self) -> f64 {
        self.spans.last().map(|s| s.out_end).unwrap_or(0.0)
    }

    /// Map a source timestamp to output-time.
    ///
    /// Returns `None` when the timestamp falls in removed material. On the
    /// crossfade overlap the later affine piece wins.
    pub fn source_to_output(&self, src_t: f64) -> Option<f64> {
        self.span_containing(src_t)
            .map(|span| span.out_start + (src_t - span.src_start))
    }

    /// The span whose source interval contains `src_t`, preferring the
    /// later span when boundaries touch.
    pub fn span_containing(&self, src_t: f64) -> Option<&TimelineSpan> {
        self.spans.iter().rev().find(|span| span.contains_src(src_t))
    }
}

/// Complete edit plan for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditPlan {
    pub source_id: String,
    pub preset: PlatformPreset,
    pub clip_start: f64,
    pub clip_end: f64,
    pub kept_segments: Vec<KeptSegment>,
    pub timeline: TimelineMap,
    /// Output duration after silence removal; equals the timeline's last
    /// `out_end`.
    pub output_duration: f64,
    /// Number of silences detected inside the clip window.
    pub silences_detected: usize,
    /// Number of silences shortened or removed.
    pub silences_trimmed: usize,
}

impl EditPlan {
    /// Time removed relative to the raw clip window.
    pub fn time_saved(&self) -> f64 {
        (self.clip_end - self.clip_start) - self.output_duration
    }

    /// Percentage of the clip window removed by editing.
    pub fn reduction_percent(&self) -> f64 {
        let original = self.clip_end - self.clip_start;
        if original <= 0.0 {
            return 0.0;
        }
        self.time_saved() / original * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(spans: &[(f64, f64, f64, f64)]) -> TimelineMap {
        TimelineMap {
            spans: spans
                .iter()
                .map(|&(src_start, src_end, out_start, out_end)| TimelineSpan {
                    src_start,
                    src_end,
                    out_start,
                    out_end,
                })
                .collect(),
        }
    }

    #[test]
    fn test_source_to_output_inside_span() {
        let m = map(&[(10.0, 12.0, 0.0, 2.0), (15.0, 18.0, 1.99, 4.99)]);
        assert_eq!(m.source_to_output(10.5), Some(0.5));
        assert!((m.source_to_output(16.0).unwrap() - 2.99).abs() < 1e-9);
    }

    #[test]
    fn test_source_to_output_in_removed_material() {
        let m = map(&[(10.0, 12.0, 0.0, 2.0), (15.0, 18.0, 2.0, 5.0)]);
        assert_eq!(m.source_to_output(13.0), None);
    }

    #[test]
    fn test_output_duration_is_last_out_end() {
        let m = map(&[(0.0, 2.0, 0.0, 2.0), (3.0, 5.0, 1.99, 3.99)]);
        assert!((m.output_duration() - 3.99).abs() < 1e-9);
    }

    #[test]
    fn test_monotone_within_spans() {
        let m = map(&[(0.0, 2.0, 0.0, 2.0), (3.0, 5.0, 1.99, 3.99)]);
        let a = m.source_to_output(0.5).unwrap();
        let b = m.source_to_output(1.5).unwrap();
        let c = m.source_to_output(3.5).unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_time_saved() {
        let plan = EditPlan {
            source_id: "s".to_string(),
            preset: PlatformPreset::Linkedin,
            clip_start: 90.0,
            clip_end: 123.0,
            kept_segments: vec![],
            timeline: TimelineMap::default(),
            output_duration: 30.7,
            silences_detected: 3,
            silences_trimmed: 1,
        };
        assert!((plan.time_saved() - 2.3).abs() < 1e-9);
        assert!((plan.reduction_percent() - 2.3 / 33.0 * 100.0).abs() < 1e-9);
    }
}
