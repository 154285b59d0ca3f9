//! Layer compositing: shadow, masked disc, rim, hub.
//!
//! Assembles the final canvas from the graded disc and the optional
//! overlays. The z-order is fixed and never varies: drop shadow at the
//! bottom, then the masked gold disc, then the rim (overlay or drawn
//! outline), then the hub on top. Each step uses straight-alpha
//! source-over blending; the visible color always matches
//! `out = src*a + dst*(1 - a)` once flattened over an opaque
//! background.

use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_ellipse_mut, draw_hollow_ellipse_mut};

use crate::geometry::DiscGeometry;
use crate::overlay::{self, OverlayAssets};
use crate::types::{Dimensions, FallbackReport, PipelineConfig, RimSource};

/// Composite all layers onto a transparent canvas.
///
/// Returns the composed RGBA canvas along with the record of which
/// fallbacks were taken (rim outline instead of overlay, hub skipped,
/// hole clamped).
#[must_use = "returns the composed canvas and fallback report"]
pub fn compose(
    graded: &RgbImage,
    mask: &GrayImage,
    overlays: &OverlayAssets,
    geometry: &DiscGeometry,
    config: &PipelineConfig,
) -> (RgbaImage, FallbackReport) {
    let dimensions = Dimensions {
        width: graded.width(),
        height: graded.height(),
    };
    let mut canvas = RgbaImage::new(dimensions.width, dimensions.height);

    if config.render_circle_geometry {
        let shadow = shadow_layer(dimensions, geometry, config);
        composite_over(&mut canvas, &shadow, 0, 0);
    }

    composite_masked(&mut canvas, graded, mask);

    let rim = if config.render_circle_geometry {
        if let Some(rim_image) = overlays.rim.as_ref() {
            let fitted = overlay::fit_rim(rim_image, dimensions);
            composite_over(&mut canvas, &fitted, 0, 0);
            RimSource::Overlay
        } else {
            draw_border(&mut canvas, geometry, config.border_color);
            RimSource::Outline
        }
    } else {
        RimSource::Skipped
    };

    let hub_applied = match overlays.hub.as_ref() {
        Some(hub) if geometry.hub_size > 0 => {
            let fitted = overlay::fit_hub(hub, geometry.hub_size);
            let side = i64::from(geometry.hub_size);
            let x0 = i64::from(geometry.center.0) - side / 2;
            let y0 = i64::from(geometry.center.1) - side / 2;
            composite_over(&mut canvas, &fitted, x0, y0);
            true
        }
        _ => false,
    };

    let report = FallbackReport {
        rim,
        hub_applied,
        hole_clamped: geometry.hole_clamped,
    };
    (canvas, report)
}

/// Source-over composite `src` onto `dst` with its top-left corner at
/// `(x0, y0)`.
///
/// Pixels falling outside the destination are clipped. Offsets may be
/// negative.
pub fn composite_over(dst: &mut RgbaImage, src: &RgbaImage, x0: i64, y0: i64) {
    let (dw, dh) = (i64::from(dst.width()), i64::from(dst.height()));
    for (sx, sy, &src_px) in src.enumerate_pixels() {
        let dx = x0 + i64::from(sx);
        let dy = y0 + i64::from(sy);
        if dx < 0 || dy < 0 || dx >= dw || dy >= dh {
            continue;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (dx, dy) = (dx as u32, dy as u32);
        let blended = over(*dst.get_pixel(dx, dy), src_px);
        dst.put_pixel(dx, dy, blended);
    }
}

/// Source-over composite an RGB image onto `dst`, taking per-pixel
/// alpha from `mask`.
///
/// `src` and `mask` must share the destination's dimensions; this is
/// how the graded disc is drawn through the disc mask.
pub fn composite_masked(dst: &mut RgbaImage, src: &RgbImage, mask: &GrayImage) {
    for (x, y, dst_px) in dst.enumerate_pixels_mut() {
        let Luma([alpha]) = *mask.get_pixel(x, y);
        if alpha == 0 {
            continue;
        }
        let Rgb([r, g, b]) = *src.get_pixel(x, y);
        *dst_px = over(*dst_px, Rgba([r, g, b, alpha]));
    }
}

/// Straight-alpha source-over of a single pixel.
///
/// `outAlpha = srcAlpha + dstAlpha*(1 - srcAlpha)`; color channels are
/// the alpha-weighted average normalized by the output alpha. Over an
/// opaque destination this reduces to `src*a + dst*(1 - a)`.
fn over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    if src.0[3] == 255 {
        return src;
    }
    if src.0[3] == 0 {
        return dst;
    }

    let sa = f32::from(src.0[3]) / 255.0;
    let da = f32::from(dst.0[3]) / 255.0;
    let out_alpha = da.mul_add(1.0 - sa, sa);
    if out_alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |s: u8, d: u8| -> u8 {
        let weighted = (f32::from(d) * da).mul_add(1.0 - sa, f32::from(s) * sa);
        clamp_channel(weighted / out_alpha)
    };
    Rgba([
        channel(src.0[0], dst.0[0]),
        channel(src.0[1], dst.0[1]),
        channel(src.0[2], dst.0[2]),
        clamp_channel(out_alpha * 255.0),
    ])
}

/// Draw the directional drop shadow on its own transparent layer.
///
/// Two concentric black ellipses shifted right by the shadow offset:
/// a full-size soft one, then a one-pixel-inset main one painted over
/// it, leaving a soft crescent at the rim. The disc's center hole is
/// punched out of the shadow as well, so the background stays visible
/// through the hole after flattening.
fn shadow_layer(
    dimensions: Dimensions,
    geometry: &DiscGeometry,
    config: &PipelineConfig,
) -> RgbaImage {
    let mut layer = RgbaImage::new(dimensions.width, dimensions.height);
    let (cx, cy) = geometry.center;
    let (a, b) = geometry.semi_axes;
    let shifted = (cx + geometry.shadow_offset_x, cy);

    draw_filled_ellipse_mut(&mut layer, shifted, a, b, Rgba([0, 0, 0, config.shadow_alpha_soft]));
    draw_filled_ellipse_mut(
        &mut layer,
        shifted,
        (a - 1).max(1),
        (b - 1).max(1),
        Rgba([0, 0, 0, config.shadow_alpha_main]),
    );
    if geometry.hole_radius > 0 {
        draw_filled_ellipse_mut(
            &mut layer,
            geometry.center,
            geometry.hole_radius,
            geometry.hole_radius,
            Rgba([0, 0, 0, 0]),
        );
    }
    layer
}

/// Draw the fallback rim: a two-pixel stroked ellipse outline at the
/// disc's outer boundary.
fn draw_border(canvas: &mut RgbaImage, geometry: &DiscGeometry, color: [u8; 3]) {
    let stroke = Rgba([color[0], color[1], color[2], 255]);
    let (a, b) = geometry.semi_axes;
    draw_hollow_ellipse_mut(canvas, geometry.center, a, b, stroke);
    draw_hollow_ellipse_mut(canvas, geometry.center, (a - 1).max(1), (b - 1).max(1), stroke);
}

/// Round and clamp a channel value to `[0, 255]`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::DiscGeometry;
    use crate::mask::disc_mask;
    use crate::types::PipelineConfig;

    fn dims(w: u32, h: u32) -> Dimensions {
        Dimensions {
            width: w,
            height: h,
        }
    }

    /// Compose a plain gold disc at the given size with the given
    /// overlays and config.
    fn compose_disc(
        size: u32,
        overlays: &OverlayAssets,
        config: &PipelineConfig,
    ) -> (RgbaImage, FallbackReport) {
        let d = dims(size, size);
        let geometry = DiscGeometry::new(d, config);
        let graded = RgbImage::from_pixel(size, size, Rgb([180, 160, 90]));
        let mask = disc_mask(d, &geometry);
        compose(&graded, &mask, overlays, &geometry, config)
    }

    #[test]
    fn over_opaque_destination_matches_reference_formula() {
        let dst = Rgba([100, 100, 100, 255]);
        let src = Rgba([200, 0, 0, 128]);
        let out = over(dst, src);
        // a = 128/255: r = 200*a + 100*(1-a) = 150.2
        assert_eq!(out, Rgba([150, 50, 50, 255]));
    }

    #[test]
    fn over_transparent_destination_copies_source() {
        let src = Rgba([12, 34, 56, 78]);
        assert_eq!(over(Rgba([0, 0, 0, 0]), src), src);
    }

    #[test]
    fn over_accumulates_alpha() {
        let dst = Rgba([0, 0, 0, 128]);
        let src = Rgba([0, 0, 0, 128]);
        let out = over(dst, src);
        // a = 0.502 + 0.502*0.498 = 0.752
        assert_eq!(out.0[3], 192);
    }

    #[test]
    fn opaque_source_replaces_destination() {
        let dst = Rgba([1, 2, 3, 4]);
        let src = Rgba([200, 210, 220, 255]);
        assert_eq!(over(dst, src), src);
    }

    #[test]
    fn composite_over_clips_out_of_bounds() {
        let mut dst = RgbaImage::new(4, 4);
        let src = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        // Offset so only the bottom-right quadrant of src lands on dst.
        composite_over(&mut dst, &src, -2, -2);
        assert_eq!(dst.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(dst.get_pixel(2, 2).0, [0, 0, 0, 0]);
    }

    #[test]
    fn composite_masked_honors_mask_extremes() {
        let mut dst = RgbaImage::from_pixel(2, 1, Rgba([10, 10, 10, 255]));
        let src = RgbImage::from_pixel(2, 1, Rgb([200, 200, 200]));
        let mask = GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 0 } else { 255 }]));
        composite_masked(&mut dst, &src, &mask);
        assert_eq!(dst.get_pixel(0, 0).0, [10, 10, 10, 255]);
        assert_eq!(dst.get_pixel(1, 0).0, [200, 200, 200, 255]);
    }

    #[test]
    fn disc_interior_is_opaque_gold() {
        let (canvas, report) = compose_disc(100, &OverlayAssets::none(), &PipelineConfig::default());
        // Mid-annulus pixel: the masked disc drawn over nothing.
        let px = canvas.get_pixel(50 + 33, 50);
        assert_eq!(px.0, [180, 160, 90, 255]);
        assert_eq!(report.rim, RimSource::Outline);
        assert!(!report.hub_applied);
    }

    #[test]
    fn shadow_extends_past_right_edge_of_disc() {
        let config = PipelineConfig::default();
        let (canvas, _) = compose_disc(100, &OverlayAssets::none(), &config);
        // Lower-right diagonal, outside the disc (half-width ~34 at
        // dy=35) but inside the right-shifted shadow (reaches ~86).
        let px = canvas.get_pixel(86, 85);
        assert_eq!(px.0[0], 0);
        assert_eq!(px.0[3], config.shadow_alpha_main);
    }

    #[test]
    fn hole_shows_no_shadow() {
        let (canvas, _) = compose_disc(100, &OverlayAssets::none(), &PipelineConfig::default());
        // The hole is punched through the shadow too: the canvas is
        // fully transparent at the disc center.
        assert_eq!(canvas.get_pixel(50, 50).0[3], 0);
    }

    #[test]
    fn flat_mode_skips_shadow_and_rim() {
        let config = PipelineConfig {
            render_circle_geometry: false,
            ..PipelineConfig::default()
        };
        let (canvas, report) = compose_disc(100, &OverlayAssets::none(), &config);
        assert_eq!(report.rim, RimSource::Skipped);
        // No shadow: the lower-right diagonal spot that would carry
        // shadow in full geometry stays fully transparent.
        assert_eq!(canvas.get_pixel(86, 85).0[3], 0);
        // Corner transparent.
        assert_eq!(canvas.get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn hub_only_touches_its_bounding_square() {
        let hub = RgbaImage::from_pixel(35, 35, Rgba([5, 5, 5, 255]));
        let with_hub = OverlayAssets {
            rim: None,
            hub: Some(hub),
        };
        let config = PipelineConfig::default();
        let (canvas_hub, report) = compose_disc(100, &with_hub, &config);
        let (canvas_bare, _) = compose_disc(100, &OverlayAssets::none(), &config);
        assert!(report.hub_applied);

        let geometry = DiscGeometry::new(dims(100, 100), &config);
        let side = i64::from(geometry.hub_size);
        let x0 = i64::from(geometry.center.0) - side / 2;
        let y0 = i64::from(geometry.center.1) - side / 2;
        for (x, y, px) in canvas_hub.enumerate_pixels() {
            let inside_square = i64::from(x) >= x0
                && i64::from(x) < x0 + side
                && i64::from(y) >= y0
                && i64::from(y) < y0 + side;
            if !inside_square {
                assert_eq!(
                    px,
                    canvas_bare.get_pixel(x, y),
                    "hub altered pixel ({x},{y}) outside its bounding square",
                );
            }
        }
    }

    #[test]
    fn rim_overlay_leaves_disc_interior_untouched() {
        // A rim overlay with a fully transparent interior: swapping it
        // for the outline fallback must not change any pixel strictly
        // inside the masked disc.
        let rim = RgbaImage::from_fn(100, 100, |x, y| {
            let (dx, dy) = (f64::from(x) - 50.0, f64::from(y) - 50.0);
            let dist = (dx * dx + dy * dy).sqrt();
            if dist > 46.0 {
                Rgba([240, 230, 180, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        let with_rim = OverlayAssets {
            rim: Some(rim),
            hub: None,
        };
        let config = PipelineConfig::default();
        let (canvas_rim, report) = compose_disc(100, &with_rim, &config);
        let (canvas_outline, _) = compose_disc(100, &OverlayAssets::none(), &config);
        assert_eq!(report.rim, RimSource::Overlay);

        let geometry = DiscGeometry::new(dims(100, 100), &config);
        for (x, y, px) in canvas_rim.enumerate_pixels() {
            let (dx, dy) = (
                f64::from(x) - f64::from(geometry.center.0),
                f64::from(y) - f64::from(geometry.center.1),
            );
            let dist = (dx * dx + dy * dy).sqrt();
            // Strictly inside: clear of both the overlay ring and the
            // 2px outline at the boundary.
            if dist < 44.0 {
                assert_eq!(
                    px,
                    canvas_outline.get_pixel(x, y),
                    "rim choice altered interior pixel ({x},{y})",
                );
            }
        }
    }

    #[test]
    fn rim_overlay_is_resized_to_canvas() {
        let rim = RgbaImage::from_pixel(30, 30, Rgba([255, 0, 255, 255]));
        let with_rim = OverlayAssets {
            rim: Some(rim),
            hub: None,
        };
        let (canvas, report) = compose_disc(100, &with_rim, &PipelineConfig::default());
        assert_eq!(report.rim, RimSource::Overlay);
        // Opaque magenta rim covers the whole canvas after resize.
        assert_eq!(canvas.get_pixel(0, 0).0, [255, 0, 255, 255]);
        assert_eq!(canvas.get_pixel(99, 99).0, [255, 0, 255, 255]);
    }
}
