//! Gold grading: map normalized luminance onto a gold palette.
//!
//! Five sub-steps in fixed order, each a pure whole-image transform:
//! duotone mapping, contrast boost around the image mean, mean
//! recentering toward a reference gold, black lift, and a global gamma
//! curve. [`grade`] chains them; the individual steps are public for
//! inspection and testing.
//!
//! Every step is purely numeric and deterministic — identical input
//! and constants produce byte-identical output. All channel arithmetic
//! clamps to `[0, 255]`; nothing wraps.

use image::{GrayImage, Rgb, RgbImage};

use crate::types::PipelineConfig;

/// Fraction of the original value kept when lifting a channel that
/// fell below the black floor; the remainder comes from the floor.
const BLACK_LIFT_KEEP: f32 = 0.4;

/// Run the full grading chain on a normalized luminance image.
#[must_use = "returns the graded RGB image"]
pub fn grade(normalized: &GrayImage, config: &PipelineConfig) -> RgbImage {
    let duo = duotone(normalized, config.dark_gold, config.light_gold);
    let boosted = boost_contrast(&duo, config.contrast_factor);
    let recentred = recenter_mean(&boosted, config.reference_gold);
    let lifted = lift_blacks(&recentred, config.black_floor);
    gamma_lift(&lifted, config.gamma)
}

/// Map luminance onto a two-point gold gradient.
///
/// Luminance 0 maps to `dark`, 255 to `light`, with each channel
/// interpolated independently in between.
#[must_use = "returns the duotone RGB image"]
pub fn duotone(gray: &GrayImage, dark: [u8; 3], light: [u8; 3]) -> RgbImage {
    RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let t = f32::from(gray.get_pixel(x, y).0[0]) / 255.0;
        Rgb(std::array::from_fn(|c| {
            let d = f32::from(dark[c]);
            let l = f32::from(light[c]);
            clamp_channel((l - d).mul_add(t, d))
        }))
    })
}

/// Scale each channel's deviation from the image's own mean luminance
/// by `factor`.
///
/// The pivot is the image's own mean luminance, not 128, so the boost
/// widens contrast around wherever the image actually sits.
#[must_use = "returns the contrast-boosted image"]
pub fn boost_contrast(image: &RgbImage, factor: f32) -> RgbImage {
    let pivot = mean_luminance(image);
    map_channels(image, |c| (c - pivot).mul_add(factor, pivot))
}

/// Pull the image's overall color cast toward `reference`.
///
/// Computes the per-channel mean, targets the midpoint between that
/// mean and the reference color, and scales every pixel's channels by
/// `target / mean`. A pixel-independent multiplicative correction: an
/// image whose mean already equals the reference gets scale 1 on every
/// channel and passes through untouched.
#[must_use = "returns the recentred image"]
#[allow(clippy::cast_possible_truncation)]
pub fn recenter_mean(image: &RgbImage, reference: [u8; 3]) -> RgbImage {
    let mean = channel_means(image);

    let scale: [f32; 3] = std::array::from_fn(|c| {
        if mean[c] > 0.0 {
            let target = f64::from(reference[c]).midpoint(mean[c]);
            (target / mean[c]) as f32
        } else {
            1.0
        }
    });

    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let px = image.get_pixel(x, y).0;
        Rgb(std::array::from_fn(|c| {
            clamp_channel(f32::from(px[c]) * scale[c])
        }))
    })
}

/// Raise channel values below `floor` without flattening mid-tones.
///
/// A value under the floor becomes `0.4 * value + 0.6 * floor`;
/// everything at or above the floor is untouched.
#[must_use = "returns the black-lifted image"]
pub fn lift_blacks(image: &RgbImage, floor: f32) -> RgbImage {
    map_channels(image, |c| {
        if c < floor {
            c.mul_add(BLACK_LIFT_KEEP, floor * (1.0 - BLACK_LIFT_KEEP))
        } else {
            c
        }
    })
}

/// Apply a global gamma curve.
///
/// Channels are normalized to `[0, 1]`, raised to `gamma`, and
/// rescaled. Exponents below 1 brighten midtones while leaving 0 and
/// 255 fixed.
#[must_use = "returns the gamma-adjusted image"]
pub fn gamma_lift(image: &RgbImage, gamma: f32) -> RgbImage {
    map_channels(image, |c| (c / 255.0).powf(gamma) * 255.0)
}

/// Apply `f` to every channel of every pixel, clamping and rounding
/// the result to `[0, 255]`.
fn map_channels(image: &RgbImage, f: impl Fn(f32) -> f32) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let px = image.get_pixel(x, y).0;
        Rgb(std::array::from_fn(|c| clamp_channel(f(f32::from(px[c])))))
    })
}

/// Mean luminance (`0.299*R + 0.587*G + 0.114*B`) over the whole image.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn mean_luminance(image: &RgbImage) -> f32 {
    let count = u64::from(image.width()) * u64::from(image.height());
    if count == 0 {
        return 0.0;
    }
    let sum: f64 = image
        .pixels()
        .map(|p| {
            0.114f64.mul_add(
                f64::from(p.0[2]),
                0.299f64.mul_add(f64::from(p.0[0]), 0.587 * f64::from(p.0[1])),
            )
        })
        .sum();
    (sum / count as f64) as f32
}

/// Per-channel means over the whole image.
#[allow(clippy::cast_precision_loss)]
fn channel_means(image: &RgbImage) -> [f64; 3] {
    let count = u64::from(image.width()) * u64::from(image.height());
    if count == 0 {
        return [0.0; 3];
    }
    let mut sums = [0.0f64; 3];
    for p in image.pixels() {
        for c in 0..3 {
            sums[c] += f64::from(p.0[c]);
        }
    }
    sums.map(|s| s / count as f64)
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

    const DARK: [u8; 3] = PipelineConfig::DEFAULT_DARK_GOLD;
    const LIGHT: [u8; 3] = PipelineConfig::DEFAULT_LIGHT_GOLD;
    const REFERENCE: [u8; 3] = PipelineConfig::DEFAULT_REFERENCE_GOLD;

    #[allow(clippy::cast_possible_truncation)]
    fn gradient_gray(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| image::Luma([((x * 7 + y * 13) % 256) as u8]))
    }

    #[test]
    fn duotone_maps_endpoints_to_palette() {
        let gray = GrayImage::from_fn(2, 1, |x, _| image::Luma([if x == 0 { 0 } else { 255 }]));
        let rgb = duotone(&gray, DARK, LIGHT);
        assert_eq!(rgb.get_pixel(0, 0).0, DARK);
        assert_eq!(rgb.get_pixel(1, 0).0, LIGHT);
    }

    #[test]
    fn duotone_interpolates_each_channel() {
        let gray = GrayImage::from_pixel(1, 1, image::Luma([128]));
        let rgb = duotone(&gray, [0, 100, 200], [100, 200, 240]);
        let px = rgb.get_pixel(0, 0).0;
        // t = 128/255 ≈ 0.502
        assert_eq!(px, [50, 150, 220]);
    }

    #[test]
    #[allow(clippy::cast_possible_truncation)]
    fn duotone_is_monotonic_in_luminance() {
        let gray = GrayImage::from_fn(256, 1, |x, _| image::Luma([x as u8]));
        let rgb = duotone(&gray, DARK, LIGHT);
        for x in 1..256 {
            for c in 0..3 {
                assert!(
                    rgb.get_pixel(x, 0).0[c] >= rgb.get_pixel(x - 1, 0).0[c],
                    "channel {c} decreased at luminance {x}",
                );
            }
        }
    }

    #[test]
    fn contrast_boost_widens_around_mean() {
        // Two-tone image: mean luminance sits between the tones, so the
        // dark tone must get darker and the bright tone brighter.
        let img = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                image::Rgb([80, 80, 80])
            } else {
                image::Rgb([160, 160, 160])
            }
        });
        let boosted = boost_contrast(&img, 1.6);
        assert!(boosted.get_pixel(0, 0).0[0] < 80);
        assert!(boosted.get_pixel(1, 0).0[0] > 160);
    }

    #[test]
    fn contrast_boost_clamps_extremes() {
        let img = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                image::Rgb([5, 5, 5])
            } else {
                image::Rgb([250, 250, 250])
            }
        });
        let boosted = boost_contrast(&img, 3.0);
        assert_eq!(boosted.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(boosted.get_pixel(1, 0).0, [255, 255, 255]);
    }

    #[test]
    fn recenter_is_noop_for_uniform_reference_gold() {
        let img = RgbImage::from_pixel(8, 8, image::Rgb(REFERENCE));
        let out = recenter_mean(&img, REFERENCE);
        assert_eq!(img, out);
    }

    #[test]
    fn recenter_pulls_mean_toward_reference() {
        // A bright bluish image: every channel mean should move toward
        // the (darker, warmer) reference gold.
        let img = RgbImage::from_pixel(8, 8, image::Rgb([120, 140, 200]));
        let out = recenter_mean(&img, REFERENCE);
        let before = channel_means(&img);
        let after = channel_means(&out);
        for c in 0..3 {
            let target = f64::from(REFERENCE[c]).midpoint(before[c]);
            assert!(
                (after[c] - target).abs() < 1.0,
                "channel {c}: expected mean near {target}, got {}",
                after[c],
            );
        }
    }

    #[test]
    fn recenter_handles_black_image() {
        // Zero channel means must not divide by zero.
        let img = RgbImage::from_pixel(4, 4, image::Rgb([0, 0, 0]));
        let out = recenter_mean(&img, REFERENCE);
        assert_eq!(img, out);
    }

    #[test]
    fn lift_blacks_raises_only_dark_channels() {
        let img = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                image::Rgb([10, 20, 30])
            } else {
                image::Rgb([40, 100, 200])
            }
        });
        let out = lift_blacks(&img, 35.0);
        // 10*0.4 + 35*0.6 = 25, 20*0.4 + 21 = 29, 30*0.4 + 21 = 33
        assert_eq!(out.get_pixel(0, 0).0, [25, 29, 33]);
        // At or above the floor: untouched.
        assert_eq!(out.get_pixel(1, 0).0, [40, 100, 200]);
    }

    #[test]
    fn gamma_lift_brightens_midtones_and_fixes_endpoints() {
        let img = RgbImage::from_fn(3, 1, |x, _| match x {
            0 => image::Rgb([0, 0, 0]),
            1 => image::Rgb([128, 128, 128]),
            _ => image::Rgb([255, 255, 255]),
        });
        let out = gamma_lift(&img, 0.93);
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0]);
        assert!(out.get_pixel(1, 0).0[0] > 128);
        assert_eq!(out.get_pixel(2, 0).0, [255, 255, 255]);
    }

    #[test]
    fn grade_is_deterministic() {
        let gray = gradient_gray(32, 24);
        let config = PipelineConfig::default();
        let a = grade(&gray, &config);
        let b = grade(&gray, &config);
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn grade_output_dimensions_match_input() {
        let gray = gradient_gray(17, 31);
        let out = grade(&gray, &PipelineConfig::default());
        assert_eq!(out.width(), 17);
        assert_eq!(out.height(), 31);
    }

    #[test]
    fn grade_output_is_gold_toned() {
        // After grading, warm channels should dominate: R >= B and
        // G >= B on average (gold has almost no blue).
        let gray = gradient_gray(32, 32);
        let out = grade(&gray, &PipelineConfig::default());
        let means = channel_means(&out);
        assert!(
            means[0] > means[2] && means[1] > means[2],
            "expected warm cast, got means {means:?}",
        );
    }
}
