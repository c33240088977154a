//! Panomap CLI - Command-line interface
//!
//! Captures a panoramic minimap of the built-in synthetic terrain and
//! writes it as a PNG. Exists to exercise the panomap library end to
//! end; wiring a real engine renderer means implementing
//! `panomap::capture::CaptureDevice` and swapping it in here.

use clap::Parser;
use image::Rgba;
use panomap::bounds::{WorldBounds, WorldPoint};
use panomap::capture::AlwaysReady;
use panomap::logging::init_logging;
use panomap::orchestrator::run_capture;
use panomap::persist::PngSink;
use panomap::progress::ProgressSink;
use panomap::settings::{Background, CaptureSettings};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

mod error;
mod synthetic;

use error::CliError;
use synthetic::SyntheticRenderer;

#[derive(Parser)]
#[command(name = "panomap")]
#[command(version = panomap::VERSION)]
#[command(about = "Capture a panoramic minimap as a stitched PNG", long_about = None)]
struct Args {
    /// West edge of the capture area in world units
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    min_x: f64,

    /// North edge of the capture area in world units
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    min_y: f64,

    /// East edge of the capture area in world units
    #[arg(long, default_value = "8192", allow_hyphen_values = true)]
    max_x: f64,

    /// South edge of the capture area in world units
    #[arg(long, default_value = "8192", allow_hyphen_values = true)]
    max_y: f64,

    /// Output image width in pixels
    #[arg(long, default_value = "2048")]
    width: u32,

    /// Output image height in pixels
    #[arg(long, default_value = "2048")]
    height: u32,

    /// Capture as a grid of overlapping tiles instead of one shot
    #[arg(long)]
    tiled: bool,

    /// Pixel size of a square tile (with --tiled)
    #[arg(long, default_value = "512")]
    tile_resolution: u32,

    /// Pixel overlap between adjacent tiles (with --tiled)
    #[arg(long, default_value = "64")]
    tile_overlap: u32,

    /// Camera height in world units
    #[arg(long, default_value = "50000")]
    camera_height: f64,

    /// Transparent background instead of solid black
    #[arg(long)]
    transparent: bool,

    /// Directory the image is written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Output file name (without extension)
    #[arg(long, default_value = "minimap")]
    name: String,

    /// Append a timestamp to the file name
    #[arg(long)]
    timestamp: bool,
}

impl Args {
    fn into_settings(self) -> CaptureSettings {
        CaptureSettings {
            capture_bounds: WorldBounds::new(
                WorldPoint::new(self.min_x, self.min_y, 0.0),
                WorldPoint::new(self.max_x, self.max_y, 0.0),
            ),
            output_width: self.width,
            output_height: self.height,
            use_tiling: self.tiled,
            tile_resolution: self.tile_resolution,
            tile_overlap: self.tile_overlap,
            camera_height: self.camera_height,
            background: if self.transparent {
                Background::Transparent
            } else {
                Background::SolidColor(Rgba([0, 0, 0, 255]))
            },
            output_dir: self.output_dir,
            file_name: self.name,
            use_auto_filename: self.timestamp,
            ..Default::default()
        }
    }
}

/// Prints tile progress to stdout as the run advances.
struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn on_progress(&self, status: &str, fraction: f32, _current: usize, _total: usize) {
        println!("[{:>5.1}%] {}", fraction * 100.0, status);
    }

    fn on_complete(&self, success: bool, output_path: Option<&Path>) {
        if success {
            if let Some(path) = output_path {
                println!();
                println!("Minimap written to {}", path.display());
            }
        } else {
            println!();
            println!("Run did not produce an image.");
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _logging_guard = match init_logging("logs", "panomap.log") {
        Ok(guard) => guard,
        Err(e) => CliError::LoggingInit(e.to_string()).exit(),
    };

    let settings = args.into_settings();
    println!(
        "Capturing {}x{} minimap of [{} .. {}]",
        settings.output_width,
        settings.output_height,
        settings.capture_bounds.min,
        settings.capture_bounds.max,
    );
    if settings.use_tiling {
        println!(
            "Tiling: {}px tiles, {}px overlap",
            settings.tile_resolution, settings.tile_overlap
        );
    }
    println!();

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupt received, stopping after the current tile...");
            ctrl_c_token.cancel();
        }
    });

    let result = run_capture(
        &settings,
        SyntheticRenderer::new(),
        AlwaysReady,
        PngSink,
        &ConsoleProgress,
        cancel,
    )
    .await;

    match result {
        Ok(report) => {
            println!(
                "Captured {} tile(s) ({} skipped) in {:.1}s",
                report.tiles_captured,
                report.tiles_skipped,
                report.duration.as_secs_f32(),
            );
        }
        Err(err) => CliError::from(err).exit(),
    }
}
