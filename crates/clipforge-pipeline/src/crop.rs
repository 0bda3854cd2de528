//! Crop calculation: the largest target-aspect rectangle, anchored on the
//! subject.

use tracing::debug;

use clipforge_models::{CropRegion, FormatSpec, SubjectPosition};

/// A computed crop with the scaled-space geometry the renderer's
/// `scale=...,crop=...` filter pair needs.
#[derive(Debug, Clone, PartialEq)]
pub struct CropPlan {
    /// Crop rectangle in source pixels.
    pub region: CropRegion,
    pub subject: SubjectPosition,
    /// Set when subject confidence is below the review threshold.
    pub needs_review: bool,
    /// Set when the crop is smaller than the output and must upscale.
    pub upscaled: bool,
    /// Scale factor from source to output space.
    pub scale: f64,
    /// Source dimensions after scaling.
    pub scaled_width: u32,
    pub scaled_height: u32,
    /// Crop origin after scaling; the scaled crop size is the output size.
    pub scaled_x: u32,
    pub scaled_y: u32,
}

/// Compute the crop for a source frame, subject position, and format.
///
/// The rectangle is the largest one of the target aspect that fits in the
/// source. Its position puts the subject at the format's anchor point
/// (rule-of-thirds vertical for 9:16, centre for 1:1 and 4:5), clamped to
/// the frame. Dimensions are integers with aspect error below half a
/// pixel.
pub fn calculate_crop(
    src_w: u32,
    src_h: u32,
    spec: &FormatSpec,
    subject: &SubjectPosition,
    review_confidence_threshold: f64,
) -> CropPlan {
    let target_aspect = spec.target_aspect();
    let (width, height) = fit_aspect(src_w, src_h, target_aspect);

    // Place the subject on the anchor point, clamped to the frame.
    let subject_x = subject.nx * src_w as f64;
    let subject_y = subject.ny * src_h as f64;

    let x = (subject_x - spec.subject_anchor_x * width as f64)
        .round()
        .clamp(0.0, (src_w - width) as f64) as u32;
    let y = (subject_y - spec.subject_anchor_y * height as f64)
        .round()
        .clamp(0.0, (src_h - height) as f64) as u32;

    let region = CropRegion {
        x,
        y,
        width,
        height,
    };

    let upscaled = width < spec.width || height < spec.height;
    let needs_review = subject.confidence < review_confidence_threshold;

    // Geometry in output space: scale the source so the crop rectangle
    // becomes exactly the output size.
    let scale = spec.width as f64 / width as f64;
    let scaled_width = (src_w as f64 * scale).round() as u32;
    let scaled_height = (src_h as f64 * scale).round() as u32;
    let scaled_x = ((x as f64 * scale).round() as u32).min(scaled_width.saturating_sub(spec.width));
    let scaled_y =
        ((y as f64 * scale).round() as u32).min(scaled_height.saturating_sub(spec.height));

    debug!(
        src = format!("{src_w}x{src_h}"),
        crop = format!("{width}x{height}+{x}+{y}"),
        scale = format!("{scale:.4}"),
        upscaled = upscaled,
        needs_review = needs_review,
        "Calculated crop"
    );

    CropPlan {
        region,
        subject: *subject,
        needs_review,
        upscaled,
        scale,
        scaled_width,
        scaled_height,
        scaled_x,
        scaled_y,
    }
}

/// Largest integer rectangle of `target_aspect` that fits in the source,
/// with aspect error under half a pixel.
fn fit_aspect(src_w: u32, src_h: u32, target_aspect: f64) -> (u32, u32) {
    let src_aspect = src_w as f64 / src_h as f64;

    if src_aspect > target_aspect {
        // Height-limited: full height, crop the sides.
        for dh in 0..8u32 {
            let height = src_h - dh;
            let width = (height as f64 * target_aspect).round() as u32;
            if width <= src_w && (width as f64 - height as f64 * target_aspect).abs() < 0.5 {
                return (width, height);
            }
        }
        (src_h, src_h) // unreachable for sane aspects
    } else {
        // Width-limited: full width, crop top/bottom.
        for dw in 0..8u32 {
            let width = src_w - dw;
            let height = (width as f64 / target_aspect).round() as u32;
            if height <= src_h && (width as f64 - height as f64 * target_aspect).abs() < 0.5 {
                return (width, height);
            }
        }
        (src_w, src_w)
    }
}
