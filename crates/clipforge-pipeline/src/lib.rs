//! Unified clip export pipeline.
//!
//! Takes a `(source, clip_start, clip_end, format, preset, transcript?)`
//! request and produces one muxed output whose audio edits, video edits,
//! caption timings, and crop region are mutually consistent to sub-frame
//! tolerance.
//!
//! The pieces, in data-flow order:
//!
//! ```text
//! probe ─► extract ─► analyze (cached) ─► plan ─┬─► assemble audio ─┐
//!                                               ├─► time captions  ─┼─► render
//! localize subject ─► calculate crop ───────────┴───────────────────┘
//! ```
//!
//! Everything downstream of the planner consumes the same
//! [`clipforge_models::TimelineMap`]; no component re-derives or re-snaps
//! edit times. The planner performs no frame snapping at all: an
//! independent snap in the video path is exactly how audio/video desync
//! creeps in.

pub mod analyzer;
pub mod assembler;
pub mod cache;
pub mod captions;
pub mod config;
pub mod crop;
pub mod error;
pub mod exporter;
pub mod planner;
pub mod render;
pub mod services;
pub mod vision;

pub use cache::VadCache;
pub use config::PipelineConfig;
pub use error::{ExportError, PipelineResult};
pub use exporter::{CancelHandle, ClipExporter, ExportStage, ExporterContext};
