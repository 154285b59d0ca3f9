//! Shared types for the goldisc rendering pipeline.

use serde::{Deserialize, Serialize};

/// Re-export the raster buffer types so downstream crates can hold
/// pipeline inputs and outputs without depending on `image` directly.
pub use image::{GrayImage, RgbImage, RgbaImage};

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// The shorter of the two dimensions.
    ///
    /// All circular geometry (hole radius, hub size) is derived from
    /// this so the disc fits the image regardless of aspect ratio.
    #[must_use]
    pub const fn shorter(self) -> u32 {
        if self.width < self.height {
            self.width
        } else {
            self.height
        }
    }

    /// Total pixel count (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Configuration for the disc rendering pipeline.
///
/// All parameters have defaults matching the reference gold styling.
/// The color and threshold values are deliberately configuration (not
/// module globals) so repeated invocations with different styling can
/// coexist.
///
/// Fields are public with no construction-time validation; call
/// [`validate`](Self::validate) before running the pipeline. Invalid
/// values return [`PipelineError::InvalidConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Center hole radius as a fraction of the shorter image dimension.
    pub hole_radius_fraction: f64,

    /// Hub overlay side length as a fraction of the shorter image
    /// dimension.
    pub hub_scale_fraction: f64,

    /// When `false`, the outer shape steps (drop shadow, rim overlay,
    /// outline border) are skipped and only the masked gold disc plus
    /// hub is produced.
    pub render_circle_geometry: bool,

    /// Inset of the outer disc ellipse from the image edge, in pixels.
    pub outer_margin: u32,

    /// Opaque background the final canvas is flattened over.
    pub output_background: [u8; 3],

    /// Duotone color for luminance 0.
    pub dark_gold: [u8; 3],

    /// Duotone color for luminance 255.
    pub light_gold: [u8; 3],

    /// Reference gold the image mean is pulled toward during
    /// recentering.
    pub reference_gold: [u8; 3],

    /// Stroke color of the fallback outline border drawn when no rim
    /// overlay is available.
    pub border_color: [u8; 3],

    /// Fraction of pixels clipped at each histogram end during
    /// autocontrast.
    pub autocontrast_cutoff: f64,

    /// Contrast boost factor applied around the image's own mean.
    pub contrast_factor: f32,

    /// Channel values below this floor are lifted toward it.
    pub black_floor: f32,

    /// Global gamma exponent applied last; slightly below 1 brightens
    /// midtones.
    pub gamma: f32,

    /// Horizontal offset of the drop shadow in pixels.
    pub shadow_offset_x: i32,

    /// Alpha of the outer, soft shadow ellipse.
    pub shadow_alpha_soft: u8,

    /// Alpha of the inset, main shadow ellipse.
    pub shadow_alpha_main: u8,
}

impl PipelineConfig {
    /// Default center hole radius fraction.
    pub const DEFAULT_HOLE_RADIUS_FRACTION: f64 = 0.17;
    /// Default hub scale fraction.
    pub const DEFAULT_HUB_SCALE_FRACTION: f64 = 0.35;
    /// Default outer margin in pixels.
    pub const DEFAULT_OUTER_MARGIN: u32 = 1;
    /// Default flatten background (opaque white).
    pub const DEFAULT_OUTPUT_BACKGROUND: [u8; 3] = [255, 255, 255];
    /// Default duotone dark endpoint.
    pub const DEFAULT_DARK_GOLD: [u8; 3] = [35, 31, 18];
    /// Default duotone light endpoint.
    pub const DEFAULT_LIGHT_GOLD: [u8; 3] = [210, 190, 120];
    /// Default recentering reference gold.
    pub const DEFAULT_REFERENCE_GOLD: [u8; 3] = [69, 62, 35];
    /// Default fallback border color.
    pub const DEFAULT_BORDER_COLOR: [u8; 3] = [230, 220, 160];
    /// Default autocontrast cutoff fraction per histogram end (0.5%).
    pub const DEFAULT_AUTOCONTRAST_CUTOFF: f64 = 0.005;
    /// Default contrast boost factor.
    pub const DEFAULT_CONTRAST_FACTOR: f32 = 1.6;
    /// Default black lift floor.
    pub const DEFAULT_BLACK_FLOOR: f32 = 35.0;
    /// Default gamma exponent.
    pub const DEFAULT_GAMMA: f32 = 0.93;
    /// Default shadow horizontal offset in pixels.
    pub const DEFAULT_SHADOW_OFFSET_X: i32 = 4;
    /// Default soft shadow alpha.
    pub const DEFAULT_SHADOW_ALPHA_SOFT: u8 = 25;
    /// Default main shadow alpha.
    pub const DEFAULT_SHADOW_ALPHA_MAIN: u8 = 45;

    /// Check that all numeric fields are finite and within their
    /// working ranges.
    ///
    /// Geometry that is merely degenerate (a hole radius reaching the
    /// disc edge) is clamped downstream, not rejected here; this only
    /// rejects values the numeric stages cannot interpret at all.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] naming the offending
    /// field.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.hole_radius_fraction.is_finite() || !(0.0..1.0).contains(&self.hole_radius_fraction)
        {
            return Err(PipelineError::InvalidConfig(format!(
                "hole_radius_fraction must be in [0, 1), got {}",
                self.hole_radius_fraction,
            )));
        }
        if !self.hub_scale_fraction.is_finite() || !(0.0..=1.0).contains(&self.hub_scale_fraction) {
            return Err(PipelineError::InvalidConfig(format!(
                "hub_scale_fraction must be in [0, 1], got {}",
                self.hub_scale_fraction,
            )));
        }
        if !self.autocontrast_cutoff.is_finite() || !(0.0..0.5).contains(&self.autocontrast_cutoff)
        {
            return Err(PipelineError::InvalidConfig(format!(
                "autocontrast_cutoff must be in [0, 0.5), got {}",
                self.autocontrast_cutoff,
            )));
        }
        if !self.contrast_factor.is_finite() || self.contrast_factor <= 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "contrast_factor must be positive, got {}",
                self.contrast_factor,
            )));
        }
        if !self.black_floor.is_finite() || !(0.0..=255.0).contains(&self.black_floor) {
            return Err(PipelineError::InvalidConfig(format!(
                "black_floor must be in [0, 255], got {}",
                self.black_floor,
            )));
        }
        if !self.gamma.is_finite() || self.gamma <= 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "gamma must be positive, got {}",
                self.gamma,
            )));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            hole_radius_fraction: Self::DEFAULT_HOLE_RADIUS_FRACTION,
            hub_scale_fraction: Self::DEFAULT_HUB_SCALE_FRACTION,
            render_circle_geometry: true,
            outer_margin: Self::DEFAULT_OUTER_MARGIN,
            output_background: Self::DEFAULT_OUTPUT_BACKGROUND,
            dark_gold: Self::DEFAULT_DARK_GOLD,
            light_gold: Self::DEFAULT_LIGHT_GOLD,
            reference_gold: Self::DEFAULT_REFERENCE_GOLD,
            border_color: Self::DEFAULT_BORDER_COLOR,
            autocontrast_cutoff: Self::DEFAULT_AUTOCONTRAST_CUTOFF,
            contrast_factor: Self::DEFAULT_CONTRAST_FACTOR,
            black_floor: Self::DEFAULT_BLACK_FLOOR,
            gamma: Self::DEFAULT_GAMMA,
            shadow_offset_x: Self::DEFAULT_SHADOW_OFFSET_X,
            shadow_alpha_soft: Self::DEFAULT_SHADOW_ALPHA_SOFT,
            shadow_alpha_main: Self::DEFAULT_SHADOW_ALPHA_MAIN,
        }
    }
}

/// How the rim layer was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RimSource {
    /// An externally supplied rim overlay was composited.
    Overlay,
    /// No overlay was available; the fallback outline border was drawn.
    Outline,
    /// Circle geometry was disabled; no rim layer at all.
    Skipped,
}

impl std::fmt::Display for RimSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overlay => f.write_str("overlay"),
            Self::Outline => f.write_str("outline"),
            Self::Skipped => f.write_str("skipped"),
        }
    }
}

/// Informational record of every fallback the pipeline took.
///
/// Missing optional assets and clamped geometry are not errors; they
/// are reported here so the caller can surface them (the CLI logs
/// them as warnings).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackReport {
    /// Which rim rendering path was taken.
    pub rim: RimSource,
    /// Whether a hub overlay was composited.
    pub hub_applied: bool,
    /// Whether the hole radius had to be clamped to stay inside the
    /// outer disc.
    pub hole_clamped: bool,
}

/// Result of running the full pipeline.
#[derive(Debug, Clone)]
pub struct RenderResult {
    /// The final opaque RGB raster at the cover's dimensions.
    pub image: RgbImage,

    /// Dimensions of the source cover image in pixels.
    pub dimensions: Dimensions,

    /// Fallbacks taken during compositing.
    pub fallbacks: FallbackReport,
}

/// Result of running the pipeline with all intermediate stage outputs
/// preserved.
///
/// Each field captures the output of one logical pipeline stage, for
/// callers that want to inspect or display individual steps.
///
/// Does not derive `PartialEq` or serde traits: the `image` buffer
/// types implement neither, and nothing crosses a serialization
/// boundary here.
#[derive(Debug, Clone)]
pub struct StagedResult {
    /// Stage 1a: decoded single-channel luminance image.
    pub luminance: GrayImage,
    /// Stage 1b: contrast-stretched luminance.
    pub normalized: GrayImage,
    /// Stage 2: gold-graded RGB image.
    pub graded: RgbImage,
    /// Stage 3: disc alpha mask (opaque disc, punched hole).
    pub mask: GrayImage,
    /// Stage 4: composited RGBA canvas (shadow, disc, rim, hub).
    pub composed: RgbaImage,
    /// Stage 5: canvas flattened over the opaque background.
    pub flattened: RgbImage,
    /// Source image dimensions in pixels.
    pub dimensions: Dimensions,
    /// Fallbacks taken during compositing.
    pub fallbacks: FallbackReport,
}

impl StagedResult {
    /// Consume the staged intermediates, keeping only the final raster.
    #[must_use]
    pub fn into_render_result(self) -> RenderResult {
        RenderResult {
            image: self.flattened,
            dimensions: self.dimensions,
            fallbacks: self.fallbacks,
        }
    }
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode an input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}
