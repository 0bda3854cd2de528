//! Export format and platform output specifications.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Target export formats.
///
/// Each format resolves to a fixed [`FormatSpec`] describing the output
/// resolution, encoder settings, and caption placement for the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// TikTok vertical video (1080x1920, 9:16)
    Tiktok,
    /// YouTube Shorts vertical video (1080x1920, 9:16)
    YoutubeShorts,
    /// Instagram Reels vertical video (1080x1920, 9:16)
    InstagramReels,
    /// LinkedIn portrait video (1080x1350, 4:5)
    Linkedin,
    /// LinkedIn square video (1080x1080, 1:1)
    LinkedinSquare,
}

impl ExportFormat {
    /// All available formats.
    pub const ALL: &'static [ExportFormat] = &[
        ExportFormat::Tiktok,
        ExportFormat::YoutubeShorts,
        ExportFormat::InstagramReels,
        ExportFormat::Linkedin,
        ExportFormat::LinkedinSquare,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Tiktok => "tiktok",
            ExportFormat::YoutubeShorts => "youtube_shorts",
            ExportFormat::InstagramReels => "instagram_reels",
            ExportFormat::Linkedin => "linkedin",
            ExportFormat::LinkedinSquare => "linkedin_square",
        }
    }

    /// Resolve the full output specification for this format.
    pub fn spec(&self) -> FormatSpec {
        match self {
            ExportFormat::Tiktok => FormatSpec {
                format: *self,
                aspect_ratio: AspectRatio::PORTRAIT_9_16,
                width: 1080,
                height: 1920,
                max_duration_s: 180,
                caption_margin_bottom: 367,
                caption_margin_sides: 80,
                subject_anchor_x: 0.50,
                subject_anchor_y: 0.35,
                bitrate_mbps: 8.0,
                fps: 30,
                audio_bitrate_kbps: 128,
            },
            ExportFormat::YoutubeShorts => FormatSpec {
                format: *self,
                aspect_ratio: AspectRatio::PORTRAIT_9_16,
                width: 1080,
                height: 1920,
                max_duration_s: 60,
                caption_margin_bottom: 367,
                caption_margin_sides: 80,
                subject_anchor_x: 0.50,
                subject_anchor_y: 0.35,
                bitrate_mbps: 8.0,
                fps: 30,
                audio_bitrate_kbps: 128,
            },
            ExportFormat::InstagramReels => FormatSpec {
                format: *self,
                aspect_ratio: AspectRatio::PORTRAIT_9_16,
                width: 1080,
                height: 1920,
                max_duration_s: 90,
                caption_margin_bottom: 350,
                caption_margin_sides: 80,
                subject_anchor_x: 0.50,
                subject_anchor_y: 0.35,
                bitrate_mbps: 8.0,
                fps: 30,
                audio_bitrate_kbps: 128,
            },
            ExportFormat::Linkedin => FormatSpec {
                format: *self,
                aspect_ratio: AspectRatio::PORTRAIT_4_5,
                width: 1080,
                height: 1350,
                max_duration_s: 600,
                caption_margin_bottom: 100,
                caption_margin_sides: 60,
                subject_anchor_x: 0.50,
                subject_anchor_y: 0.50,
                bitrate_mbps: 6.0,
                fps: 30,
                audio_bitrate_kbps: 128,
            },
            ExportFormat::LinkedinSquare => FormatSpec {
                format: *self,
                aspect_ratio: AspectRatio::SQUARE,
                width: 1080,
                height: 1080,
                max_duration_s: 600,
                caption_margin_bottom: 100,
                caption_margin_sides: 60,
                subject_anchor_x: 0.50,
                subject_anchor_y: 0.50,
                bitrate_mbps: 6.0,
                fps: 30,
                audio_bitrate_kbps: 128,
            },
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unrecognized format names.
#[derive(Debug, Error)]
#[error("unknown export format '{0}'")]
pub struct UnknownFormat(pub String);

impl FromStr for ExportFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tiktok" => Ok(ExportFormat::Tiktok),
            "youtube_shorts" => Ok(ExportFormat::YoutubeShorts),
            "instagram_reels" => Ok(ExportFormat::InstagramReels),
            "linkedin" => Ok(ExportFormat::Linkedin),
            "linkedin_square" => Ok(ExportFormat::LinkedinSquare),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}

/// Aspect ratio as a width:height pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub const PORTRAIT_9_16: AspectRatio = AspectRatio { width: 9, height: 16 };
    pub const PORTRAIT_4_5: AspectRatio = AspectRatio { width: 4, height: 5 };
    pub const SQUARE: AspectRatio = AspectRatio { width: 1, height: 1 };

    /// Ratio as a float (width / height).
    pub fn ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

/// Complete output specification for an export format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormatSpec {
    pub format: ExportFormat,
    pub aspect_ratio: AspectRatio,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Platform maximum video duration in seconds
    pub max_duration_s: u32,
    /// Bottom margin reserved for captions (px, UI safe zone)
    pub caption_margin_bottom: u32,
    /// Side margins for captions (px)
    pub caption_margin_sides: u32,
    /// Horizontal anchor for the subject (0-1, fraction of output width)
    pub subject_anchor_x: f64,
    /// Vertical anchor for the subject (0-1, fraction of output height)
    pub subject_anchor_y: f64,
    /// Recommended video bitrate
    pub bitrate_mbps: f64,
    /// Output frame rate
    pub fps: u32,
    /// Audio bitrate
    pub audio_bitrate_kbps: u32,
}

impl FormatSpec {
    /// Target aspect as a float (width / height).
    pub fn target_aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse_roundtrip() {
        for fmt in ExportFormat::ALL {
            let parsed: ExportFormat = fmt.as_str().parse().unwrap();
            assert_eq!(parsed, *fmt);
        }
    }

    #[test]
    fn test_unknown_format() {
        assert!("twitter".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_fixed_resolutions() {
        assert_eq!(ExportFormat::Tiktok.spec().width, 1080);
        assert_eq!(ExportFormat::Tiktok.spec().height, 1920);
        assert_eq!(ExportFormat::Linkedin.spec().height, 1350);
        assert_eq!(ExportFormat::LinkedinSquare.spec().height, 1080);
    }

    #[test]
    fn test_vertical_anchor_is_rule_of_thirds() {
        assert!((ExportFormat::Tiktok.spec().subject_anchor_y - 0.35).abs() < f64::EPSILON);
        assert!((ExportFormat::LinkedinSquare.spec().subject_anchor_y - 0.50).abs() < f64::EPSILON);
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&ExportFormat::YoutubeShorts).unwrap();
        assert_eq!(json, "\"youtube_shorts\"");
    }
}
