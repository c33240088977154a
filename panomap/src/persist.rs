//! Saving the stitched image.
//!
//! The core does not know the encoding format; it hands the final buffer
//! to an [`ImageSink`]. The bundled [`PngSink`] covers the common case of
//! writing a PNG next to the project; anything else (different formats,
//! uploading, importing into an asset database) is a new sink.

use crate::settings::CaptureSettings;
use chrono::Local;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors from encoding or writing the output image.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode or write {path}: {source}")]
    Write {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// Consumes the stitcher's output and persists it somewhere.
pub trait ImageSink: Send + Sync {
    /// Encodes and writes `image` to `path`.
    fn encode_and_save(&self, image: &RgbaImage, path: &Path) -> Result<(), PersistError>;

    /// File extension this sink writes, without the leading dot.
    fn extension(&self) -> &str;
}

/// Arc-wrapped sinks are sinks themselves.
impl<T: ImageSink + ?Sized> ImageSink for Arc<T> {
    fn encode_and_save(&self, image: &RgbaImage, path: &Path) -> Result<(), PersistError> {
        (**self).encode_and_save(image, path)
    }

    fn extension(&self) -> &str {
        (**self).extension()
    }
}

/// Writes the image as a PNG file, creating the parent directory if
/// needed.
#[derive(Debug, Default, Clone, Copy)]
pub struct PngSink;

impl ImageSink for PngSink {
    fn encode_and_save(&self, image: &RgbaImage, path: &Path) -> Result<(), PersistError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| PersistError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|source| PersistError::Write {
                path: path.to_path_buf(),
                source,
            })?;

        info!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "saved output image"
        );
        Ok(())
    }

    fn extension(&self) -> &str {
        "png"
    }
}

/// Builds the output path for a run: directory, file stem, optional
/// timestamp suffix, and the sink's extension.
pub fn output_path(settings: &CaptureSettings, sink: &dyn ImageSink) -> PathBuf {
    let mut stem = settings.file_name.clone();
    if settings.use_auto_filename {
        stem.push_str(&timestamp_suffix());
    }
    settings
        .output_dir
        .join(format!("{}.{}", stem, sink.extension()))
}

/// Timestamp suffix in `_DD_MM_HH_mm` form, local time.
fn timestamp_suffix() -> String {
    Local::now().format("_%d_%m_%H_%M").to_string()
}
