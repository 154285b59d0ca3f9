//! Pipeline diagnostics: timing and metrics for each stage.
//!
//! Permanent instrumentation for styling experiments — every call to
//! [`process_with_diagnostics`](crate::process_with_diagnostics)
//! collects these alongside the pipeline results, and the CLI prints
//! them on request.
//!
//! Durations are measured with [`std::time::Instant`] and serialized
//! as fractional seconds (`f64`), since `std::time::Duration` does not
//! implement serde traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1a: cover decoding + luminance conversion.
    pub decode: StageDiagnostics,
    /// Stage 1b: autocontrast stretch.
    pub normalize: StageDiagnostics,
    /// Stage 2: gold grading.
    pub grade: StageDiagnostics,
    /// Stage 3: disc mask construction.
    pub mask: StageDiagnostics,
    /// Stage 4: layer compositing.
    pub compose: StageDiagnostics,
    /// Stage 5: flatten over background.
    pub flatten: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline.
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary of the run.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage.
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Cover decoding metrics.
    Decode {
        /// Size of the input image bytes.
        input_bytes: usize,
        /// Decoded image width in pixels.
        width: u32,
        /// Decoded image height in pixels.
        height: u32,
    },
    /// Autocontrast metrics.
    Normalize {
        /// Cutoff fraction clipped at each histogram end.
        cutoff: f64,
        /// Minimum luminance after stretching.
        output_min: u8,
        /// Maximum luminance after stretching.
        output_max: u8,
    },
    /// Gold grading metrics.
    Grade {
        /// Contrast boost factor.
        contrast_factor: f32,
        /// Gamma exponent.
        gamma: f32,
    },
    /// Disc mask metrics.
    Mask {
        /// Hole radius in pixels (after clamping).
        hole_radius_px: i32,
        /// Whether the configured radius was clamped.
        hole_clamped: bool,
        /// Number of opaque (255) mask pixels.
        opaque_pixel_count: u64,
    },
    /// Compositing metrics.
    Compose {
        /// Which rim path was taken (overlay / outline / skipped).
        rim: String,
        /// Whether a hub overlay was composited.
        hub_applied: bool,
    },
    /// Flatten metrics.
    Flatten {
        /// Background the canvas was flattened over.
        background: [u8; 3],
    },
}

/// High-level summary for the entire run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Which rim path was taken.
    pub rim_source: String,
    /// Whether a hub overlay was composited.
    pub hub_applied: bool,
    /// Whether the hole radius was clamped.
    pub hole_clamped: bool,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<12} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(72));

        let total_ms = duration_ms(self.total_duration);
        let stages: [(&str, &StageDiagnostics); 6] = [
            ("Decode", &self.decode),
            ("Normalize", &self.normalize),
            ("Grade", &self.grade),
            ("Mask", &self.mask),
            ("Compose", &self.compose),
            ("Flatten", &self.flatten),
        ];

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<12} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Rim: {}  |  Hub applied: {}  |  Hole clamped: {}",
            self.summary.rim_source, self.summary.hub_applied, self.summary.hole_clamped,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            input_bytes,
            width,
            height,
        } => format!("{input_bytes} bytes -> {width}x{height}"),
        StageMetrics::Normalize {
            cutoff,
            output_min,
            output_max,
        } => format!("cutoff={cutoff:.3} range={output_min}..{output_max}"),
        StageMetrics::Grade {
            contrast_factor,
            gamma,
        } => format!("contrast={contrast_factor:.2} gamma={gamma:.2}"),
        StageMetrics::Mask {
            hole_radius_px,
            hole_clamped,
            opaque_pixel_count,
        } => format!(
            "hole_r={hole_radius_px}px{} opaque={opaque_pixel_count}",
            if *hole_clamped { " (clamped)" } else { "" },
        ),
        StageMetrics::Compose { rim, hub_applied } => {
            format!("rim={rim} hub={hub_applied}")
        }
        StageMetrics::Flatten { background } => {
            format!(
                "background=({},{},{})",
                background[0], background[1], background[2],
            )
        }
    }
}

/// Count opaque (value == 255) pixels in a mask.
pub(crate) fn count_opaque_pixels(mask: &image::GrayImage) -> u64 {
    mask.pixels()
        .map(|p| u64::from(u8::from(p.0[0] == 255)))
        .sum()
}
