//! Optional rim and hub overlay assets.
//!
//! The capability check for overlays happens once, before the
//! pipeline runs: the caller hands in whatever asset bytes it located
//! (or `None`), and [`OverlayAssets::decode`] turns them into decoded
//! RGBA images. The compositor then only deals in present-or-absent
//! images, never in paths or probing.
//!
//! Overlays rarely match the canvas exactly, so they are resampled
//! with Lanczos3 — the sharpest of the `image` crate's filters and
//! the right choice for photographic overlay art.

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::types::{Dimensions, PipelineError};

/// Decoded optional overlay images, each independently present or
/// absent.
#[derive(Debug, Clone, Default)]
pub struct OverlayAssets {
    /// Full-canvas rim/border overlay (with alpha).
    pub rim: Option<RgbaImage>,
    /// Center hub overlay (with alpha).
    pub hub: Option<RgbaImage>,
}

impl OverlayAssets {
    /// No overlays at all; the pipeline falls back to the drawn
    /// outline border and skips the hub.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            rim: None,
            hub: None,
        }
    }

    /// Decode overlay byte slices into RGBA images.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyInput`] for a present-but-empty
    /// byte slice and [`PipelineError::ImageDecode`] for undecodable
    /// bytes. A missing (`None`) asset is not an error.
    pub fn decode(
        rim_bytes: Option<&[u8]>,
        hub_bytes: Option<&[u8]>,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            rim: rim_bytes.map(decode_rgba).transpose()?,
            hub: hub_bytes.map(decode_rgba).transpose()?,
        })
    }
}

/// Decode bytes into an RGBA image, preserving any alpha channel.
fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgba8())
}

/// Fit a rim overlay to the canvas dimensions.
///
/// Resamples with Lanczos3 when the sizes differ; an already-matching
/// overlay passes through untouched.
#[must_use = "returns the fitted rim overlay"]
pub fn fit_rim(rim: &RgbaImage, dimensions: Dimensions) -> RgbaImage {
    if (rim.width(), rim.height()) == (dimensions.width, dimensions.height) {
        return rim.clone();
    }
    imageops::resize(
        rim,
        dimensions.width,
        dimensions.height,
        FilterType::Lanczos3,
    )
}

/// Fit a hub overlay to a `side x side` square.
///
/// Non-square hubs are squashed to square — the hub asset is expected
/// to be circular artwork on a transparent field, so the exact-square
/// resize matches how it is authored.
#[must_use = "returns the fitted hub overlay"]
pub fn fit_hub(hub: &RgbaImage, side: u32) -> RgbaImage {
    if (hub.width(), hub.height()) == (side, side) {
        return hub.clone();
    }
    imageops::resize(hub, side, side, FilterType::Lanczos3)
}
