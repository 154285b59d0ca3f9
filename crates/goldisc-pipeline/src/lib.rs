//! goldisc-pipeline: Pure disc-mockup rendering pipeline (sans-IO).
//!
//! Converts a photographic cover image into a gold-toned circular disc
//! mockup through: luminance normalization -> gold grading -> disc
//! masking -> layer compositing (shadow, disc, rim, hub) -> flatten.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and decoded images and returns structured data. Asset
//! probing and file writing live in the `goldisc` CLI crate.

pub mod compose;
pub mod diagnostics;
pub mod flatten;
pub mod geometry;
pub mod grade;
pub mod mask;
pub mod overlay;
pub mod tone;
pub mod types;

use std::time::Instant;

use diagnostics::{PipelineDiagnostics, PipelineSummary, StageDiagnostics, StageMetrics};
pub use geometry::DiscGeometry;
pub use overlay::OverlayAssets;
pub use types::{
    Dimensions, FallbackReport, PipelineConfig, PipelineError, RenderResult, RimSource,
    StagedResult,
};

/// Run the full rendering pipeline.
///
/// Takes raw cover image bytes (PNG, JPEG, BMP, WebP), pre-decoded
/// optional overlays, and a configuration, and produces a
/// [`RenderResult`] holding the final opaque RGB raster at the cover's
/// dimensions plus the [`FallbackReport`] of every fallback taken.
///
/// # Pipeline steps
///
/// 1. Decode the cover and convert to luminance
/// 2. Autocontrast stretch (cutoff histogram stretch)
/// 3. Gold grading (duotone, contrast, recentering, black lift, gamma)
/// 4. Disc mask (outer ellipse with punched center hole)
/// 5. Layer compositing (shadow, masked disc, rim, hub)
/// 6. Flatten over the opaque background
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if the configuration fails
/// validation, [`PipelineError::EmptyInput`] if `cover_bytes` is
/// empty, and [`PipelineError::ImageDecode`] if the image format is
/// unrecognized.
pub fn process(
    cover_bytes: &[u8],
    overlays: &OverlayAssets,
    config: &PipelineConfig,
) -> Result<RenderResult, PipelineError> {
    let (staged, _diagnostics) = process_with_diagnostics(cover_bytes, overlays, config)?;
    Ok(staged.into_render_result())
}

/// Run the pipeline, preserving every intermediate stage output.
///
/// # Errors
///
/// Same conditions as [`process`].
pub fn process_staged(
    cover_bytes: &[u8],
    overlays: &OverlayAssets,
    config: &PipelineConfig,
) -> Result<StagedResult, PipelineError> {
    let (staged, _diagnostics) = process_with_diagnostics(cover_bytes, overlays, config)?;
    Ok(staged)
}

/// Run the pipeline, preserving intermediates and collecting per-stage
/// timing and metrics.
///
/// # Errors
///
/// Same conditions as [`process`].
#[allow(clippy::too_many_lines, clippy::similar_names)]
pub fn process_with_diagnostics(
    cover_bytes: &[u8],
    overlays: &OverlayAssets,
    config: &PipelineConfig,
) -> Result<(StagedResult, PipelineDiagnostics), PipelineError> {
    config.validate()?;
    let run_start = Instant::now();

    // 1. Decode and convert to luminance.
    let stage_start = Instant::now();
    let luminance = tone::decode_and_grayscale(cover_bytes)?;
    let dimensions = Dimensions {
        width: luminance.width(),
        height: luminance.height(),
    };
    let decode_diag = StageDiagnostics {
        duration: stage_start.elapsed(),
        metrics: StageMetrics::Decode {
            input_bytes: cover_bytes.len(),
            width: dimensions.width,
            height: dimensions.height,
        },
    };

    // 2. Autocontrast stretch.
    let stage_start = Instant::now();
    let normalized = tone::autocontrast(&luminance, config.autocontrast_cutoff);
    let (output_min, output_max) = normalized
        .pixels()
        .fold((255u8, 0u8), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));
    let normalize_diag = StageDiagnostics {
        duration: stage_start.elapsed(),
        metrics: StageMetrics::Normalize {
            cutoff: config.autocontrast_cutoff,
            output_min,
            output_max,
        },
    };

    // 3. Gold grading.
    let stage_start = Instant::now();
    let graded = grade::grade(&normalized, config);
    let grade_diag = StageDiagnostics {
        duration: stage_start.elapsed(),
        metrics: StageMetrics::Grade {
            contrast_factor: config.contrast_factor,
            gamma: config.gamma,
        },
    };

    // 4. Geometry + disc mask.
    let stage_start = Instant::now();
    let disc_geometry = DiscGeometry::new(dimensions, config);
    let disc_mask = mask::disc_mask(dimensions, &disc_geometry);
    let mask_diag = StageDiagnostics {
        duration: stage_start.elapsed(),
        metrics: StageMetrics::Mask {
            hole_radius_px: disc_geometry.hole_radius,
            hole_clamped: disc_geometry.hole_clamped,
            opaque_pixel_count: diagnostics::count_opaque_pixels(&disc_mask),
        },
    };

    // 5. Layer compositing.
    let stage_start = Instant::now();
    let (composed, fallbacks) = compose::compose(&graded, &disc_mask, overlays, &disc_geometry, config);
    let compose_diag = StageDiagnostics {
        duration: stage_start.elapsed(),
        metrics: StageMetrics::Compose {
            rim: fallbacks.rim.to_string(),
            hub_applied: fallbacks.hub_applied,
        },
    };

    // 6. Flatten over the background.
    let stage_start = Instant::now();
    let flattened = flatten::flatten(&composed, config.output_background);
    let flatten_diag = StageDiagnostics {
        duration: stage_start.elapsed(),
        metrics: StageMetrics::Flatten {
            background: config.output_background,
        },
    };

    let diagnostics = PipelineDiagnostics {
        decode: decode_diag,
        normalize: normalize_diag,
        grade: grade_diag,
        mask: mask_diag,
        compose: compose_diag,
        flatten: flatten_diag,
        total_duration: run_start.elapsed(),
        summary: PipelineSummary {
            image_width: dimensions.width,
            image_height: dimensions.height,
            pixel_count: dimensions.pixel_count(),
            rim_source: fallbacks.rim.to_string(),
            hub_applied: fallbacks.hub_applied,
            hole_clamped: fallbacks.hole_clamped,
        },
    };

    let staged = StagedResult {
        luminance,
        normalized,
        graded,
        mask: disc_mask,
        composed,
        flattened,
        dimensions,
        fallbacks,
    };
    Ok((staged, diagnostics))
}
