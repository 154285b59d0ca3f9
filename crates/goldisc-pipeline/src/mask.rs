//! Disc alpha mask: an opaque ellipse with a punched center hole.
//!
//! The mask drives the disc compositing step — 255 inside the outer
//! disc, 0 outside it and inside the hole. Ellipses are hard-edged
//! fills (no anti-aliasing), so mask membership is exact and the
//! compositing tests can assert pixel-for-pixel.

use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_ellipse_mut;

use crate::geometry::DiscGeometry;
use crate::types::Dimensions;

/// Build the disc alpha mask for a canvas of the given dimensions.
///
/// The outer ellipse is inscribed in the margin-inset bounding box;
/// the hole is a concentric circle painted back to transparent. The
/// geometry guarantees the hole is strictly smaller than the disc.
#[must_use = "returns the disc alpha mask"]
pub fn disc_mask(dimensions: Dimensions, geometry: &DiscGeometry) -> GrayImage {
    let mut mask = GrayImage::new(dimensions.width, dimensions.height);

    draw_filled_ellipse_mut(
        &mut mask,
        geometry.center,
        geometry.semi_axes.0,
        geometry.semi_axes.1,
        Luma([255]),
    );

    if geometry.hole_radius > 0 {
        draw_filled_ellipse_mut(
            &mut mask,
            geometry.center,
            geometry.hole_radius,
            geometry.hole_radius,
            Luma([0]),
        );
    }

    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PipelineConfig;

    fn dims(w: u32, h: u32) -> Dimensions {
        Dimensions {
            width: w,
            height: h,
        }
    }

    fn mask_for(w: u32, h: u32) -> (GrayImage, DiscGeometry) {
        let geometry = DiscGeometry::new(dims(w, h), &PipelineConfig::default());
        (disc_mask(dims(w, h), &geometry), geometry)
    }

    #[test]
    fn mask_dimensions_match_canvas() {
        let (mask, _) = mask_for(120, 80);
        assert_eq!(mask.width(), 120);
        assert_eq!(mask.height(), 80);
    }

    #[test]
    #[allow(clippy::cast_sign_loss)]
    fn center_is_transparent_and_annulus_opaque() {
        let (mask, g) = mask_for(200, 200);
        let (cx, cy) = g.center;
        // Hole center.
        assert_eq!(mask.get_pixel(cx as u32, cy as u32).0[0], 0);
        // Mid-annulus, halfway between hole edge and disc edge.
        let mid = (g.hole_radius + g.semi_axes.0) / 2;
        assert_eq!(mask.get_pixel((cx + mid) as u32, cy as u32).0[0], 255);
        // Corners are outside the disc.
        assert_eq!(mask.get_pixel(0, 0).0[0], 0);
        assert_eq!(mask.get_pixel(199, 199).0[0], 0);
    }

    #[test]
    fn hole_is_strict_subset_of_disc() {
        // Compare against a solid disc (hole radius forced to 0):
        // every opaque pixel of the holed mask must be opaque in the
        // solid mask, and every pixel the hole removed must lie within
        // the hole radius of the center.
        for (w, h) in [(20, 20), (40, 30), (101, 77), (64, 200)] {
            let geometry = DiscGeometry::new(dims(w, h), &PipelineConfig::default());
            let solid = DiscGeometry {
                hole_radius: 0,
                ..geometry
            };
            let holed_mask = disc_mask(dims(w, h), &geometry);
            let solid_mask = disc_mask(dims(w, h), &solid);

            let (cx, cy) = geometry.center;
            let mut removed = 0u32;
            for y in 0..h {
                for x in 0..w {
                    let holed = holed_mask.get_pixel(x, y).0[0];
                    let full = solid_mask.get_pixel(x, y).0[0];
                    if holed == 255 {
                        assert_eq!(full, 255, "{w}x{h}: opaque pixel ({x},{y}) outside disc");
                    }
                    if full == 255 && holed == 0 {
                        removed += 1;
                        #[allow(clippy::cast_possible_wrap)]
                        let (dx, dy) = (x as i32 - cx, y as i32 - cy);
                        let dist = f64::from(dx * dx + dy * dy).sqrt();
                        assert!(
                            dist <= f64::from(geometry.hole_radius) + 1.0,
                            "{w}x{h}: removed pixel ({x},{y}) outside hole radius",
                        );
                    }
                }
            }
            assert!(removed > 0, "{w}x{h}: hole removed no pixels");
        }
    }

    #[test]
    fn mask_values_are_binary() {
        let (mask, _) = mask_for(50, 50);
        for p in mask.pixels() {
            assert!(p.0[0] == 0 || p.0[0] == 255);
        }
    }

    #[test]
    #[allow(clippy::cast_sign_loss)]
    fn zero_hole_radius_skips_punch() {
        let geometry = DiscGeometry {
            hole_radius: 0,
            ..DiscGeometry::new(dims(60, 60), &PipelineConfig::default())
        };
        let mask = disc_mask(dims(60, 60), &geometry);
        let (cx, cy) = geometry.center;
        assert_eq!(mask.get_pixel(cx as u32, cy as u32).0[0], 255);
    }
}
