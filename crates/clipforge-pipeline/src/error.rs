//! Pipeline error types.

use thiserror::Error;

use clipforge_media::MediaError;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, ExportError>;

/// Errors surfaced by the export pipeline.
///
/// `EmptyPlan` is reported as a soft failure by the orchestrator (a
/// `ClipExport` with `success = false`) rather than propagated; it appears
/// here so inner stages can signal it. Vision outages never become request
/// failures; the pipeline degrades to a centre crop instead.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("invalid clip range [{clip_start}, {clip_end}) for source of {source_duration}s")]
    InvalidRange {
        clip_start: f64,
        clip_end: f64,
        source_duration: f64,
    },

    #[error("source unreadable: {0}")]
    SourceUnreadable(String),

    #[error("audio decode failed: {0}")]
    DecodeFailed(String),

    #[error("voice activity analyzer unavailable: {0}")]
    AnalyzerUnavailable(String),

    #[error("no speech survives the clip window")]
    EmptyPlan,

    #[error("render failed: {0}")]
    RenderFailed(String),

    #[error(
        "sync invariant violated: plan duration {plan_duration:.4}s vs {actual_duration:.4}s \
         ({context})"
    )]
    SyncError {
        plan_duration: f64,
        actual_duration: f64,
        context: String,
    },

    #[error("export cancelled")]
    Cancelled,

    #[error("IO failure: {0}")]
    IoFailure(#[from] std::io::Error),
}

impl From<MediaError> for ExportError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::SourceUnreadable(path) => {
                ExportError::SourceUnreadable(path.display().to_string())
            }
            MediaError::FfprobeFailed { message, stderr } => ExportError::SourceUnreadable(
                stderr.map(|s| format!("{message}: {s}")).unwrap_or(message),
            ),
            MediaError::DecodeFailed(msg) | MediaError::InvalidAudioFormat(msg) => {
                ExportError::DecodeFailed(msg)
            }
            MediaError::NoAudioData => ExportError::DecodeFailed("no audio data".to_string()),
            MediaError::VadFailed(msg) => ExportError::AnalyzerUnavailable(msg),
            MediaError::Cancelled => ExportError::Cancelled,
            MediaError::Io(e) => ExportError::IoFailure(e),
            other => ExportError::RenderFailed(other.to_string()),
        }
    }
}
