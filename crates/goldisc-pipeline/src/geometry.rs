//! Disc geometry derived once per run from the image dimensions.
//!
//! Everything circular is concentric on the image's integer center:
//! the outer disc ellipse inscribed in the margin-inset bounding box,
//! the punched center hole, and the hub square. The hole radius is
//! clamped so the hole always stays strictly inside the outer disc —
//! a disc with no visible hole is a valid (if unusual) output, so
//! degenerate inputs clamp instead of failing.

use crate::types::{Dimensions, PipelineConfig};

/// Concrete pixel geometry for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscGeometry {
    /// Integer center of the canvas.
    pub center: (i32, i32),
    /// Semi-axes of the outer disc ellipse.
    pub semi_axes: (i32, i32),
    /// Radius of the punched center hole.
    pub hole_radius: i32,
    /// Side length of the (square) hub overlay.
    pub hub_size: u32,
    /// Horizontal offset of the drop shadow.
    pub shadow_offset_x: i32,
    /// Whether the configured hole radius had to be clamped.
    pub hole_clamped: bool,
}

impl DiscGeometry {
    /// Derive the run geometry from image dimensions and configuration.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub fn new(dimensions: Dimensions, config: &PipelineConfig) -> Self {
        let Dimensions { width, height } = dimensions;
        let center = ((width / 2) as i32, (height / 2) as i32);

        let inset = 2 * config.outer_margin;
        let semi_a = ((width.saturating_sub(inset)) / 2).max(1) as i32;
        let semi_b = ((height.saturating_sub(inset)) / 2).max(1) as i32;

        let shorter = f64::from(dimensions.shorter());
        let requested = (config.hole_radius_fraction * shorter).floor() as i32;

        // The hole must stay strictly inside the outer ellipse.
        let max_hole = (semi_a.min(semi_b) - 1).max(0);
        let hole_radius = requested.min(max_hole);

        let hub_size = (config.hub_scale_fraction * shorter).floor() as u32;

        Self {
            center,
            semi_axes: (semi_a, semi_b),
            hole_radius,
            hub_size,
            shadow_offset_x: config.shadow_offset_x,
            hole_clamped: requested > max_hole,
        }
    }
}
