//! goldisc: render a cover image as a gold-toned disc mockup.
//!
//! Thin I/O wrapper around `goldisc-pipeline`: resolves the cover and
//! optional overlay asset paths, reads the files, runs the pipeline,
//! and writes the final raster. All pixel work happens in the
//! pipeline crate; this binary only moves bytes and reports what the
//! pipeline did.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use goldisc_pipeline::{OverlayAssets, PipelineConfig};

/// Render a cover image as a gold-toned disc mockup with hub, rim,
/// and drop shadow.
#[derive(Parser)]
#[command(name = "goldisc", version)]
struct Cli {
    /// Path to the cover image (PNG, JPEG, BMP, WebP).
    cover: PathBuf,

    /// Rim overlay image with transparency. When omitted, probes
    /// `outsid.png`, then `outside.png`, in the working directory;
    /// without either, a thin outline border is drawn instead.
    #[arg(long)]
    rim: Option<PathBuf>,

    /// Hub overlay image with transparency. When omitted, probes
    /// `middle.png`; without it, the hub layer is skipped.
    #[arg(long)]
    hub: Option<PathBuf>,

    /// Output image path; the extension selects the format.
    #[arg(short, long, default_value = "disc-mockup.jpg")]
    output: PathBuf,

    /// Center hole radius as a fraction of the shorter dimension.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_HOLE_RADIUS_FRACTION)]
    hole_radius: f64,

    /// Hub size as a fraction of the shorter dimension.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_HUB_SCALE_FRACTION)]
    hub_scale: f64,

    /// Skip the outer shape steps (drop shadow, rim, border) and
    /// render only the masked gold disc plus hub.
    #[arg(long)]
    flat: bool,

    /// Background color as "R,G,B" (defaults to white).
    #[arg(long, value_name = "R,G,B")]
    background: Option<String>,

    /// Print the per-stage diagnostics report after rendering.
    #[arg(long)]
    diagnostics: bool,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// The JSON must be a valid `PipelineConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Parse a `"R,G,B"` color argument.
fn parse_background(s: &str) -> Result<[u8; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let &[r, g, b] = parts.as_slice() else {
        return Err(format!("background must be 'R,G,B', got: '{s}'"));
    };
    let channel = |name: &str, v: &str| -> Result<u8, String> {
        v.parse()
            .map_err(|e| format!("invalid background {name} '{v}': {e}"))
    };
    Ok([channel("R", r)?, channel("G", g)?, channel("B", b)?])
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and
/// all individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    let mut config = PipelineConfig {
        hole_radius_fraction: cli.hole_radius,
        hub_scale_fraction: cli.hub_scale,
        render_circle_geometry: !cli.flat,
        ..PipelineConfig::default()
    };
    if let Some(ref bg) = cli.background {
        config.output_background = parse_background(bg)?;
    }
    Ok(config)
}

/// Resolve an optional overlay asset path.
///
/// An explicitly given path wins but must exist; a missing explicit
/// path falls back to the default rendering (with a warning) rather
/// than aborting the run. Otherwise the conventional filenames are
/// probed in order.
fn resolve_asset(kind: &str, explicit: Option<&Path>, candidates: &[&str]) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        log::warn!("{kind} overlay '{}' not found; falling back", path.display());
        return None;
    }
    candidates.iter().map(PathBuf::from).find(|path| path.exists())
}

/// Read an optional asset file into memory.
fn read_asset(path: Option<&PathBuf>) -> Result<Option<Vec<u8>>, String> {
    path.map(|p| {
        std::fs::read(p).map_err(|e| format!("failed to read '{}': {e}", p.display()))
    })
    .transpose()
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = config_from_cli(cli)?;

    if !cli.cover.exists() {
        return Err(format!("cover file '{}' not found", cli.cover.display()));
    }
    let cover_bytes = std::fs::read(&cli.cover)
        .map_err(|e| format!("failed to read '{}': {e}", cli.cover.display()))?;
    log::info!("using cover file: {}", cli.cover.display());

    let rim_path = resolve_asset("rim", cli.rim.as_deref(), &["outsid.png", "outside.png"]);
    let hub_path = resolve_asset("hub", cli.hub.as_deref(), &["middle.png"]);
    match rim_path {
        Some(ref path) => log::info!("using rim overlay: {}", path.display()),
        None => log::info!("no rim overlay; drawing outline border"),
    }
    if hub_path.is_none() {
        log::warn!("hub overlay not found; skipping hub layer");
    }

    let rim_bytes = read_asset(rim_path.as_ref())?;
    let hub_bytes = read_asset(hub_path.as_ref())?;
    let overlays = OverlayAssets::decode(rim_bytes.as_deref(), hub_bytes.as_deref())
        .map_err(|e| e.to_string())?;

    let (staged, diagnostics) =
        goldisc_pipeline::process_with_diagnostics(&cover_bytes, &overlays, &config)
            .map_err(|e| e.to_string())?;

    if staged.fallbacks.hole_clamped {
        log::warn!("hole radius clamped to stay inside the disc");
    }

    let result = staged.into_render_result();
    result
        .image
        .save(&cli.output)
        .map_err(|e| format!("failed to write '{}': {e}", cli.output.display()))?;
    println!(
        "Saved disc mockup as '{}' ({} x {})",
        cli.output.display(),
        result.dimensions.width,
        result.dimensions.height,
    );

    if cli.diagnostics {
        println!("\n{}", diagnostics.report());
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}
