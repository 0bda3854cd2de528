//! Pipeline orchestrator.
//!
//! Sequences probe → extract → analyze → plan → {assemble, localize+crop,
//! captions} → render for one export request, and owns the per-request
//! scratch directory and cancellation.
//!
//! The orchestrator is reentrant: concurrent `export` calls share only the
//! injected VAD cache, which is thread-safe and single-flight.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use uuid::Uuid;

use clipforge_media::extract::read_pcm;
use clipforge_models::{ClipExport, ClipRequest, EditPlan, PlanSummary, SubjectPosition};

use crate::analyzer;
use crate::assembler;
use crate::cache::VadCache;
use crate::captions::{self, CaptionOptions, CaptionStyle};
use crate::config::PipelineConfig;
use crate::crop::{self, CropPlan};
use crate::error::{ExportError, PipelineResult};
use crate::planner;
use crate::render;
use crate::services::{
    AudioDecoder, FfmpegDecoder, FfmpegFrameGrabber, FfmpegRenderExecutor, FfprobeProber,
    FrameGrabber, MediaProber, RenderExecutor, SpeechDetector, SileroSpeechDetector,
};
use crate::vision::{self, VisionOracle};

/// Pipeline stages reported over the progress channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Probing,
    Extracting,
    Analyzing,
    Planning,
    Assembling,
    Rendering,
    Complete,
}

/// Cancellation handle for an in-flight export.
///
/// Cancelling kills any running external process, removes the scratch
/// directory, and deletes partial output. A cancelled request produces no
/// result.
#[derive(Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Injected collaborators and shared state for the pipeline.
pub struct ExporterContext {
    pub prober: Arc<dyn MediaProber>,
    pub decoder: Arc<dyn AudioDecoder>,
    pub detector: Arc<dyn SpeechDetector>,
    pub grabber: Arc<dyn FrameGrabber>,
    pub oracle: Option<Arc<dyn VisionOracle>>,
    pub render_executor: Arc<dyn RenderExecutor>,
    pub vad_cache: Arc<VadCache>,
    pub config: PipelineConfig,
}

impl ExporterContext {
    /// Production context: ffmpeg/ffprobe/Silero-backed collaborators.
    pub fn new(config: PipelineConfig, oracle: Option<Arc<dyn VisionOracle>>) -> Self {
        Self {
            prober: Arc::new(FfprobeProber),
            decoder: Arc::new(FfmpegDecoder),
            detector: Arc::new(SileroSpeechDetector),
            grabber: Arc::new(FfmpegFrameGrabber),
            oracle,
            render_executor: Arc::new(FfmpegRenderExecutor),
            vad_cache: Arc::new(VadCache::new()),
            config,
        }
    }

    pub fn with_prober(mut self, prober: Arc<dyn MediaProber>) -> Self {
        self.prober = prober;
        self
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn AudioDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_detector(mut self, detector: Arc<dyn SpeechDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_grabber(mut self, grabber: Arc<dyn FrameGrabber>) -> Self {
        self.grabber = grabber;
        self
    }

    pub fn with_render_executor(mut self, executor: Arc<dyn RenderExecutor>) -> Self {
        self.render_executor = executor;
        self
    }

    pub fn with_vad_cache(mut self, cache: Arc<VadCache>) -> Self {
        self.vad_cache = cache;
        self
    }
}

/// The unified clip export pipeline.
pub struct ClipExporter {
    ctx: Arc<ExporterContext>,
    progress: Option<mpsc::UnboundedSender<ExportStage>>,
}

impl ClipExporter {
    pub fn new(ctx: ExporterContext) -> Self {
        Self {
            ctx: Arc::new(ctx),
            progress: None,
        }
    }

    /// Attach a progress channel; stages are sent best-effort.
    pub fn with_progress(mut self, tx: mpsc::UnboundedSender<ExportStage>) -> Self {
        self.progress = Some(tx);
        self
    }

    fn report(&self, stage: ExportStage) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(stage);
        }
    }

    /// Export one clip.
    ///
    /// Returns `Ok` with `success = false` for semantic soft failures
    /// (an empty plan); hard failures and cancellation are errors. A
    /// cancelled export deletes its partial output and scratch files.
    pub async fn export(
        &self,
        request: &ClipRequest,
        cancel: Option<&CancelHandle>,
    ) -> PipelineResult<ClipExport> {
        let request_id = Uuid::new_v4();
        let result = self.export_inner(request, cancel, request_id).await;

        // Never retain partial output for a failed or cancelled request.
        if result.is_err() {
            let _ = tokio::fs::remove_file(&request.output_path).await;
        }

        result
    }

    async fn export_inner(
        &self,
        request: &ClipRequest,
        cancel: Option<&CancelHandle>,
        request_id: Uuid,
    ) -> PipelineResult<ClipExport> {
        let ctx = &self.ctx;
        let spec = request.target_format.spec();

        info!(
            request_id = %request_id,
            source_id = %request.source_id,
            clip_start = request.clip_start,
            clip_end = request.clip_end,
            format = %request.target_format,
            preset = %request.preset,
            "Starting clip export"
        );

        // 1. Probe and validate the range before doing any work.
        self.report(ExportStage::Probing);
        let source_info = ctx.prober.probe(&request.source_path).await?;

        if request.clip_start < 0.0
            || request.clip_end <= request.clip_start
            || request.clip_end > source_info.duration + 1e-6
        {
            return Err(ExportError::InvalidRange {
                clip_start: request.clip_start,
                clip_end: request.clip_end,
                source_duration: source_info.duration,
            });
        }

        ensure_live(cancel)?;

        // Per-request scratch directory, removed on every exit path.
        let scratch = tempfile::Builder::new()
            .prefix("clipforge_export_")
            .tempdir()?;

        // 2. Decode the full source once; the analyzer and the assembler
        // share this exact byte sequence.
        self.report(ExportStage::Extracting);
        let pcm_path = scratch.path().join("source.f32");
        ctx.decoder
            .extract(
                &request.source_path,
                &pcm_path,
                0.0,
                f64::INFINITY,
                ctx.config.pcm_sample_rate,
            )
            .await?;
        let samples = Arc::new(read_pcm(&pcm_path).await?);

        ensure_live(cancel)?;

        // 3. VAD analysis, cache-first with single-flight compute.
        self.report(ExportStage::Analyzing);
        let vad = ctx
            .vad_cache
            .get_or_compute(&request.source_id, request.preset, || {
                analyzer::analyze_source(
                    ctx.detector.as_ref(),
                    Arc::clone(&samples),
                    &request.source_id,
                    request.preset,
                    &ctx.config,
                )
            })
            .await?;

        ensure_live(cancel)?;

        // 4. Plan. An empty plan is a soft failure; the renderer is never
        // invoked for it.
        self.report(ExportStage::Planning);
        let plan = match planner::plan(&vad, request) {
            Ok(plan) => plan,
            Err(ExportError::EmptyPlan) => {
                info!(request_id = %request_id, "No speech in clip window, skipping render");
                return Ok(ClipExport::failure(
                    request.output_path.clone(),
                    request.clip_duration(),
                    "no speech survives the clip window",
                ));
            }
            Err(e) => return Err(e),
        };

        ensure_live(cancel)?;

        // 5. Fan out: audio assembly, subject localization + crop, and
        // caption timing are independent given the plan.
        self.report(ExportStage::Assembling);
        let audio_path = scratch.path().join("edited.f32");
        let captions_path = scratch.path().join("captions.ass");

        let assemble_branch = async {
            assembler::assemble_to_file(&plan, &samples, ctx.config.pcm_sample_rate, &audio_path)
                .await
        };

        let crop_branch = async {
            Ok::<CropPlan, ExportError>(
                self.localize_and_crop(
                    request,
                    (source_info.width, source_info.height),
                    scratch.path(),
                    &spec,
                )
                .await,
            )
        };

        let captions_branch = async {
            self.write_captions(request, &plan, &captions_path, &spec)
                .await
        };

        let (assembled_duration, crop_plan, caption_file) =
            tokio::try_join!(assemble_branch, crop_branch, captions_branch)?;

        ensure_live(cancel)?;

        // 6. The sync invariant gates the render.
        render::verify_sync(&plan, assembled_duration, source_info.fps)?;

        let filter_graph =
            render::build_filter_graph(&plan, &crop_plan, &spec, caption_file.as_deref());
        let command = render::build_render_command(
            &request.source_path,
            &audio_path,
            &request.output_path,
            &filter_graph,
            &spec,
            ctx.config.pcm_sample_rate,
        );

        self.report(ExportStage::Rendering);
        ctx.render_executor
            .run(&command, cancel.map(|c| c.subscribe()))
            .await
            .map_err(|e| match e {
                clipforge_media::MediaError::Cancelled => ExportError::Cancelled,
                other => ExportError::RenderFailed(other.to_string()),
            })?;

        // 7. Verify the rendered duration when the output is probeable.
        match ctx.prober.probe(&request.output_path).await {
            Ok(output_info) => {
                render::verify_output_duration(&plan, output_info.duration, source_info.fps)?
            }
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "Could not probe rendered output");
            }
        }

        self.report(ExportStage::Complete);

        let edited_duration = plan.output_duration;
        let export = ClipExport {
            success: true,
            output_path: request.output_path.clone(),
            original_duration: request.clip_duration(),
            edited_duration,
            time_saved: request.clip_duration() - edited_duration,
            plan_summary: summarize(&plan),
            subject_position: Some(crop_plan.subject),
            crop: Some(crop_plan.region),
            needs_review: crop_plan.needs_review,
            error: None,
        };

        info!(
            request_id = %request_id,
            edited_duration = format!("{:.2}", export.edited_duration),
            time_saved = format!("{:.2}", export.time_saved),
            segments = export.plan_summary.segments_count,
            needs_review = export.needs_review,
            "Clip export complete"
        );

        Ok(export)
    }

    /// Localize the subject and compute the crop. The vision oracle is
    /// non-essential: without one (or when it is down) the crop centres
    /// and the result is flagged for review.
    async fn localize_and_crop(
        &self,
        request: &ClipRequest,
        source_dims: (u32, u32),
        scratch: &Path,
        spec: &clipforge_models::FormatSpec,
    ) -> CropPlan {
        let ctx = &self.ctx;

        let subject = match &ctx.oracle {
            Some(oracle) => {
                vision::localize_subject(
                    ctx.grabber.as_ref(),
                    oracle.as_ref(),
                    &request.source_path,
                    request.clip_start,
                    request.clip_end,
                    scratch,
                    &ctx.config,
                )
                .await
            }
            None => SubjectPosition::centered(),
        };

        crop::calculate_crop(
            source_dims.0,
            source_dims.1,
            spec,
            &subject,
            ctx.config.review_confidence_threshold,
        )
    }

    /// Rebase captions and write the ASS file when requested.
    async fn write_captions(
        &self,
        request: &ClipRequest,
        plan: &EditPlan,
        path: &Path,
        spec: &clipforge_models::FormatSpec,
    ) -> PipelineResult<Option<PathBuf>> {
        let Some(transcript) = request.transcript.as_ref().filter(|_| request.include_captions)
        else {
            return Ok(None);
        };

        let options = CaptionOptions {
            max_words_per_chunk: self.ctx.config.max_words_per_chunk,
            max_chunk_duration_s: self.ctx.config.max_chunk_duration_s,
            max_intra_chunk_gap_s: self.ctx.config.max_intra_chunk_gap_s,
        };

        let chunks = captions::rebase_captions(transcript, plan, &options);
        if chunks.is_empty() {
            return Ok(None);
        }

        let style = CaptionStyle::for_format(request.target_format);
        let ass = captions::render_ass(&chunks, &style, spec);
        tokio::fs::write(path, ass).await?;

        Ok(Some(path.to_path_buf()))
    }
}

fn summarize(plan: &EditPlan) -> PlanSummary {
    PlanSummary {
        segments_count: plan.kept_segments.len(),
        silences_detected: plan.silences_detected,
        silences_trimmed: plan.silences_trimmed,
    }
}

/// Bail out between stages once cancellation is requested.
fn ensure_live(cancel: Option<&CancelHandle>) -> PipelineResult<()> {
    match cancel {
        Some(handle) if handle.is_cancelled() => Err(ExportError::Cancelled),
        _ => Ok(()),
    }
}
