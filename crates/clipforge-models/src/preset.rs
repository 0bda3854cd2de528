//! Silence removal presets.
//!
//! Each platform preset bundles the VAD threshold, silence trimming, speech
//! padding, and crossfade parameters tuned for that platform's pacing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Named silence-removal presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformPreset {
    Linkedin,
    YoutubeShorts,
    Tiktok,
    Podcast,
}

impl PlatformPreset {
    /// All available presets.
    pub const ALL: &'static [PlatformPreset] = &[
        PlatformPreset::Linkedin,
        PlatformPreset::YoutubeShorts,
        PlatformPreset::Tiktok,
        PlatformPreset::Podcast,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformPreset::Linkedin => "linkedin",
            PlatformPreset::YoutubeShorts => "youtube_shorts",
            PlatformPreset::Tiktok => "tiktok",
            PlatformPreset::Podcast => "podcast",
        }
    }

    /// Resolve the fixed configuration for this preset.
    pub fn config(&self) -> PresetConfig {
        match self {
            PlatformPreset::Linkedin => PresetConfig {
                vad_threshold: 0.5,
                min_silence_s: 0.50,
                max_kept_silence_s: 0.70,
                speech_padding_s: 0.15,
                crossfade_s: 0.010,
            },
            PlatformPreset::YoutubeShorts => PresetConfig {
                vad_threshold: 0.5,
                min_silence_s: 0.30,
                max_kept_silence_s: 0.20,
                speech_padding_s: 0.10,
                crossfade_s: 0.010,
            },
            PlatformPreset::Tiktok => PresetConfig {
                vad_threshold: 0.5,
                min_silence_s: 0.20,
                max_kept_silence_s: 0.15,
                speech_padding_s: 0.08,
                crossfade_s: 0.010,
            },
            PlatformPreset::Podcast => PresetConfig {
                vad_threshold: 0.5,
                min_silence_s: 0.80,
                max_kept_silence_s: 1.00,
                speech_padding_s: 0.20,
                crossfade_s: 0.010,
            },
        }
    }
}

impl fmt::Display for PlatformPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unrecognized preset names.
#[derive(Debug, Error)]
#[error("unknown preset '{0}'")]
pub struct UnknownPreset(pub String);

impl FromStr for PlatformPreset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linkedin" => Ok(PlatformPreset::Linkedin),
            "youtube_shorts" => Ok(PlatformPreset::YoutubeShorts),
            "tiktok" => Ok(PlatformPreset::Tiktok),
            "podcast" => Ok(PlatformPreset::Podcast),
            other => Err(UnknownPreset(other.to_string())),
        }
    }
}

/// Configuration bundle behind a [`PlatformPreset`].
///
/// All durations are in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresetConfig {
    /// Silero VAD speech threshold (0.0-1.0).
    ///
    /// Silero is trained to output ~0.5 for borderline frames, so 0.5 is a
    /// balanced default for all presets.
    pub vad_threshold: f32,

    /// Minimum silence duration eligible for trimming.
    ///
    /// Silences shorter than this are kept in full.
    pub min_silence_s: f64,

    /// Maximum silence to keep after trimming.
    ///
    /// Longer silences are shortened to this, trimming equally from both
    /// ends so the centre of the pause survives.
    pub max_kept_silence_s: f64,

    /// Padding preserved around each speech interval.
    ///
    /// Prevents clipping consonants at word boundaries.
    pub speech_padding_s: f64,

    /// Crossfade duration at each join between kept segments.
    pub crossfade_s: f64,
}

impl PresetConfig {
    /// Builder-style setter for the VAD threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.vad_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Builder-style setter for the maximum kept silence.
    pub fn with_max_kept_silence(mut self, seconds: f64) -> Self {
        self.max_kept_silence_s = seconds.max(0.0);
        self
    }
}
