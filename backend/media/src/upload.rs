//! File upload: the path used when no camera is available, or when the
//! user picks an existing photo.

use std::path::{Path, PathBuf};

use leadscan_core::CapturedImage;
use thiserror::Error;
use tracing::debug;

use crate::mime_detect::{detect_mime_type, is_image, sniff_image_mime};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is empty")]
    Empty(PathBuf),

    #[error("{0} is not an image")]
    NotAnImage(PathBuf),
}

/// Read an image file into a [`CapturedImage`]. Content sniffing wins over
/// the extension.
pub async fn read_image_file(path: &Path) -> Result<CapturedImage, UploadError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| UploadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    image_from_bytes(path, &bytes)
}

fn image_from_bytes(path: &Path, bytes: &[u8]) -> Result<CapturedImage, UploadError> {
    if bytes.is_empty() {
        return Err(UploadError::Empty(path.to_path_buf()));
    }
    let mime = sniff_image_mime(bytes).unwrap_or_else(|| detect_mime_type(path));
    if !is_image(mime) {
        return Err(UploadError::NotAnImage(path.to_path_buf()));
    }
    debug!(path = %path.display(), mime, bytes = bytes.len(), "Read uploaded image");
    Ok(CapturedImage::from_bytes(mime, bytes))
}
