//! Tone normalization: decoding, luminance conversion, and
//! contrast stretching.
//!
//! The first pipeline stage: raw cover bytes in, a contrast-stretched
//! single-channel luminance image out. The stretch uses
//! "autocontrast with cutoff" semantics — a small fraction of extreme
//! pixels at each histogram end is clipped before rescaling, so a few
//! stray dark or bright pixels cannot compress the useful range.

use image::GrayImage;

use crate::types::PipelineError;

/// Decode raw image bytes and convert to grayscale.
///
/// Supports PNG, JPEG, BMP, and WebP (whatever the `image` crate can
/// decode). RGB-to-gray conversion uses the standard luminance
/// weights `0.299*R + 0.587*G + 0.114*B`.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
#[must_use = "returns the decoded luminance image"]
pub fn decode_and_grayscale(bytes: &[u8]) -> Result<GrayImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_luma8())
}

/// Stretch the luminance histogram to span the full `[0, 255]` range,
/// clipping `cutoff_fraction` of pixels at each end first.
///
/// The low bound is the smallest value with more than
/// `cutoff_fraction * pixel_count` pixels at or below it; the high
/// bound is the symmetric value from the top. Values between the
/// bounds are linearly remapped to `[0, 255]` and everything outside
/// saturates.
///
/// A flat image (bounds collapse to a single value) is returned
/// unchanged — there is no range to stretch and no division to blow
/// up on.
#[must_use = "returns the contrast-stretched image"]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn autocontrast(image: &GrayImage, cutoff_fraction: f64) -> GrayImage {
    let Some((low, high)) = histogram_bounds(image, cutoff_fraction) else {
        return image.clone();
    };

    let scale = 255.0 / f64::from(high - low);

    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let stretched = (f64::from(pixel.0[0]) - f64::from(low)) * scale;
        pixel.0[0] = stretched.round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Find the cutoff-adjusted (low, high) histogram bounds.
///
/// Returns `None` when the image is empty or flat (low >= high), in
/// which case stretching is a no-op.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn histogram_bounds(image: &GrayImage, cutoff_fraction: f64) -> Option<(u8, u8)> {
    let total: u64 = u64::from(image.width()) * u64::from(image.height());
    if total == 0 {
        return None;
    }

    let mut histogram = [0u64; 256];
    for pixel in image.pixels() {
        histogram[usize::from(pixel.0[0])] += 1;
    }

    let clip = (total as f64 * cutoff_fraction) as u64;

    let mut low = 0u8;
    let mut seen = 0u64;
    for (value, &count) in histogram.iter().enumerate() {
        seen += count;
        if seen > clip {
            low = value as u8;
            break;
        }
    }

    let mut high = 255u8;
    let mut seen = 0u64;
    for (value, &count) in histogram.iter().enumerate().rev() {
        seen += count;
        if seen > clip {
            high = value as u8;
            break;
        }
    }

    if low >= high { None } else { Some((low, high)) }
}
