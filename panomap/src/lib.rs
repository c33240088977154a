//! Panomap - panoramic minimap generation from tiled captures
//!
//! This library drives an external 3D renderer to photograph a large
//! planar world area piece by piece and assembles the pieces into one
//! seamless raster image. The renderer, the world-streaming machinery and
//! the final storage format all sit behind narrow traits; panomap owns
//! the grid math, the capture sequencing, and the seam-blended stitch.
//!
//! # High-Level API
//!
//! Most uses go through [`orchestrator::run_capture`]:
//!
//! ```ignore
//! use panomap::orchestrator::run_capture;
//! use panomap::capture::AlwaysReady;
//! use panomap::persist::PngSink;
//! use panomap::progress::NullProgress;
//! use panomap::settings::CaptureSettings;
//! use tokio_util::sync::CancellationToken;
//!
//! let settings = CaptureSettings { use_tiling: true, ..Default::default() };
//! let report = run_capture(
//!     &settings,
//!     my_renderer,          // impl capture::CaptureDevice
//!     AlwaysReady,          // or a real streaming gate
//!     PngSink,
//!     &NullProgress,
//!     CancellationToken::new(),
//! )
//! .await?;
//! println!("wrote {}", report.output_path.display());
//! ```

pub mod bounds;
pub mod capture;
pub mod error;
pub mod grid;
pub mod logging;
pub mod orchestrator;
pub mod persist;
pub mod progress;
pub mod settings;
pub mod state;
pub mod stitch;
pub mod store;

/// Version of the panomap library and CLI.
///
/// This is synchronized across all components in the workspace via the
/// workspace manifest and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
