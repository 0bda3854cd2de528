//! Shared data models for the clipforge export pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Export formats and platform presets
//! - VAD analysis (speech/silence partitions)
//! - Edit plans, kept segments, and the timeline map
//! - Transcripts and caption chunks
//! - Subject positions, crop regions, and export results

pub mod format;
pub mod plan;
pub mod preset;
pub mod result;
pub mod subject;
pub mod transcript;
pub mod vad;

// Re-export common types
pub use format::{AspectRatio, ExportFormat, FormatSpec, UnknownFormat};
pub use plan::{Adjustments, ClipRequest, EditPlan, KeptSegment, SilenceOverride, TimelineMap, TimelineSpan};
pub use preset::{PlatformPreset, PresetConfig, UnknownPreset};
pub use result::{ClipExport, PlanSummary};
pub use subject::{CropRegion, SubjectPosition};
pub use transcript::{CaptionChunk, CaptionWord, Transcript, TranscriptSegment, WordTiming};
pub use vad::{SilenceSegment, SpeechSegment, VadAnalysis};
