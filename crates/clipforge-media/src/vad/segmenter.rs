//! Frame labels to speech/silence partition.
//!
//! Turns the per-frame speech decisions into an alternating list of speech
//! and silence intervals that covers `[0, duration)` exactly. Intervals
//! shorter than 20 ms are merged into a neighbour, which also absorbs
//! sub-10 ms detection gaps.

use clipforge_models::{SilenceSegment, SpeechSegment};

/// Minimum interval length the partition may contain.
const MIN_INTERVAL_S: f64 = 0.020;

/// One VAD frame decision.
#[derive(Debug, Clone, Copy)]
pub struct FrameLabel {
    pub is_speech: bool,
}

/// Alternating speech/silence partition of an audio stream.
#[derive(Debug, Clone, PartialEq)]
pub struct VadPartition {
    pub speech_segments: Vec<SpeechSegment>,
    pub silence_segments: Vec<SilenceSegment>,
    pub duration: f64,
}

#[derive(Debug, Clone, Copy)]
struct Run {
    is_speech: bool,
    start: f64,
    end: f64,
}

impl Run {
    fn len(&self) -> f64 {
        self.end - self.start
    }
}

/// Build the partition from per-frame labels.
///
/// `frame_duration` is the seconds covered by each label; the final run is
/// stretched to `duration` so the partition is exact.
pub fn partition_from_frames(
    labels: &[FrameLabel],
    frame_duration: f64,
    duration: f64,
) -> VadPartition {
    if labels.is_empty() || duration <= 0.0 {
        return VadPartition {
            speech_segments: Vec::new(),
            silence_segments: if duration > 0.0 {
                vec![SilenceSegment {
                    start: 0.0,
                    end: duration,
                }]
            } else {
                Vec::new()
            },
            duration: duration.max(0.0),
        };
    }

    // Collapse consecutive identical labels into runs.
    let mut runs: Vec<Run> = Vec::new();
    for (i, label) in labels.iter().enumerate() {
        let start = i as f64 * frame_duration;
        let end = (i + 1) as f64 * frame_duration;
        match runs.last_mut() {
            Some(run) if run.is_speech == label.is_speech => run.end = end,
            _ => runs.push(Run {
                is_speech: label.is_speech,
                start,
                end,
            }),
        }
    }

    // Stretch the last run over the trailing partial frame.
    if let Some(last) = runs.last_mut() {
        last.end = duration;
        if last.end <= last.start {
            runs.pop();
        }
    }

    merge_short_runs(&mut runs);

    let mut speech = Vec::new();
    let mut silence = Vec::new();
    for run in &runs {
        if run.is_speech {
            speech.push(SpeechSegment {
                start: run.start,
                end: run.end,
            });
        } else {
            silence.push(SilenceSegment {
                start: run.start,
                end: run.end,
            });
        }
    }

    VadPartition {
        speech_segments: speech,
        silence_segments: silence,
        duration,
    }
}

/// Merge runs shorter than the minimum interval into a neighbour.
///
/// Merging takes the label of the longer neighbour, then re-coalesces, so
/// the result stays alternating with every interval >= 20 ms (except when
/// the whole stream is shorter than that).
fn merge_short_runs(runs: &mut Vec<Run>) {
    loop {
        if runs.len() <= 1 {
            return;
        }

        let Some(idx) = runs
            .iter()
            .enumerate()
            .filter(|(_, r)| r.len() < MIN_INTERVAL_S)
            .min_by(|(_, a), (_, b)| a.len().total_cmp(&b.len()))
            .map(|(i, _)| i)
        else {
            return;
        };

        let short = runs[idx];
        let prev_len = if idx > 0 { runs[idx - 1].len() } else { -1.0 };
        let next_len = if idx + 1 < runs.len() {
            runs[idx + 1].len()
        } else {
            -1.0
        };

        if prev_len >= next_len {
            runs[idx - 1].end = short.end;
        } else {
            runs[idx + 1].start = short.start;
        }
        runs.remove(idx);

        coalesce(runs);
    }
}

/// Join adjacent runs that carry the same label.
fn coalesce(runs: &mut Vec<Run>) {
    let mut i = 0;
    while i + 1 < runs.len() {
        if runs[i].is_speech == runs[i + 1].is_speech {
            runs[i].end = runs[i + 1].end;
            runs.remove(i + 1);
        } else {
            i += 1;
        }
    }
}
