//! Voice activity analysis results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::preset::{PlatformPreset, PresetConfig};

/// A detected interval of speech, in source-time seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeechSegment {
    pub start: f64,
    pub end: f64,
}

impl SpeechSegment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// A detected interval of silence, in source-time seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SilenceSegment {
    pub start: f64,
    pub end: f64,
}

impl SilenceSegment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Immutable VAD analysis of a full source, cacheable by `(source_id, preset)`.
///
/// Speech and silence segments together partition `[0, duration)` exactly,
/// alternating and contiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VadAnalysis {
    pub source_id: String,
    /// Duration of the analyzed audio in seconds.
    pub duration: f64,
    pub speech_segments: Vec<SpeechSegment>,
    pub silence_segments: Vec<SilenceSegment>,
    pub preset: PlatformPreset,
    pub config: PresetConfig,
    pub generated_at: DateTime<Utc>,
}

impl VadAnalysis {
    /// Total detected speech time in seconds.
    pub fn speech_time(&self) -> f64 {
        self.speech_segments.iter().map(|s| s.duration()).sum()
    }

    /// Total detected silence time in seconds.
    pub fn silence_time(&self) -> f64 {
        self.silence_segments.iter().map(|s| s.duration()).sum()
    }

    /// Verify that speech and silence alternate and cover `[0, duration)`.
    pub fn is_partition(&self) -> bool {
        let mut intervals: Vec<(f64, f64)> = self
            .speech_segments
            .iter()
            .map(|s| (s.start, s.end))
            .chain(self.silence_segments.iter().map(|s| (s.start, s.end)))
            .collect();
        intervals.sort_by(|a, b| a.0.total_cmp(&b.0));

        if intervals.is_empty() {
            return self.duration == 0.0;
        }

        const EPS: f64 = 1e-6;
        if intervals[0].0.abs() > EPS {
            return false;
        }
        for pair in intervals.windows(2) {
            if (pair[0].1 - pair[1].0).abs() > EPS {
                return false;
            }
        }
        (intervals.last().map(|i| i.1).unwrap_or(0.0) - self.duration).abs() <= EPS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(speech: &[(f64, f64)], silence: &[(f64, f64)], duration: f64) -> VadAnalysis {
        VadAnalysis {
            source_id: "src".to_string(),
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
            config: PlatformPreset::Linkedin.config(),
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_partition_valid() {
        let a = analysis(&[(0.5, 2.0), (3.0, 5.0)], &[(0.0, 0.5), (2.0, 3.0)], 5.0);
        assert!(a.is_partition());
    }

    #[test]
    fn test_partition_with_gap_invalid() {
        let a = analysis(&[(0.0, 2.0)], &[(2.5, 5.0)], 5.0);
        assert!(!a.is_partition());
    }

    #[test]
    fn test_speech_time() {
        let a = analysis(&[(0.0, 2.0), (3.0, 5.0)], &[(2.0, 3.0)], 5.0);
        assert!((a.speech_time() - 4.0).abs() < 1e-9);
        assert!((a.silence_time() - 1.0).abs() < 1e-9);
    }
}
