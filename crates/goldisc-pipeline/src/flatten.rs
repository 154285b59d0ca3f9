//! Final rasterization: flatten the RGBA canvas over an opaque
//! background.
//!
//! The last pipeline stage and the only one that discards alpha. Per
//! channel the output is `src*a + background*(1 - a)`, rounded — the
//! straight-alpha over formula with an opaque destination.

use image::{Rgb, RgbImage, RgbaImage};

/// Flatten an RGBA canvas over an opaque background color.
#[must_use = "returns the flattened RGB image"]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn flatten(canvas: &RgbaImage, background: [u8; 3]) -> RgbImage {
    RgbImage::from_fn(canvas.width(), canvas.height(), |x, y| {
        let px = canvas.get_pixel(x, y).0;
        let alpha = f32::from(px[3]) / 255.0;
        Rgb(std::array::from_fn(|c| {
            let v = (f32::from(background[c])).mul_add(1.0 - alpha, f32::from(px[c]) * alpha);
            v.round().clamp(0.0, 255.0) as u8
        }))
    })
}
