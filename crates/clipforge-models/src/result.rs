//! Export results returned by the pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::subject::{CropRegion, SubjectPosition};

/// Summary of the edit plan attached to a result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanSummary {
    /// Number of kept segments in the plan.
    pub segments_count: usize,
    /// Silences detected inside the clip window.
    pub silences_detected: usize,
    /// Silences shortened or removed.
    pub silences_trimmed: usize,
}

/// Outcome of one `export_clip` request.
///
/// `success = false` with an `error` message is the soft-failure shape
/// (e.g. an empty plan); hard failures surface as errors instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipExport {
    pub success: bool,
    pub output_path: PathBuf,

    /// Duration of the requested clip window in seconds.
    pub original_duration: f64,
    /// Duration after silence removal.
    pub edited_duration: f64,
    /// `original_duration - edited_duration`.
    pub time_saved: f64,

    pub plan_summary: PlanSummary,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_position: Option<SubjectPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropRegion>,

    /// Set when the crop was chosen under low confidence or the vision
    /// oracle was unavailable.
    #[serde(default)]
    pub needs_review: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClipExport {
    /// Soft-failure result carrying an explanation.
    pub fn failure(output_path: PathBuf, original_duration: f64, error: impl Into<String>) -> Self {
        Self {
            success: false,
            output_path,
            original_duration,
            edited_duration: 0.0,
            time_saved: 0.0,
            plan_summary: PlanSummary::default(),
            subject_position: None,
            crop: None,
            needs_review: false,
            error: Some(error.into()),
        }
    }

    /// Percentage of the clip window removed by editing.
    pub fn percent_reduction(&self) -> f64 {
        if self.original_duration <= 0.0 {
            return 0.0;
        }
        self.time_saved / self.original_duration * 100.0
    }
}
