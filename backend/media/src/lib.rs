//! Capture side of a scan: the session image buffer, scoped camera access,
//! and file uploads.

pub mod buffer;
pub mod camera;
pub mod mime_detect;
pub mod upload;

pub use buffer::CaptureBuffer;
pub use camera::{
    CameraConstraints, CameraDevice, CameraSession, CaptureSource, FacingMode, NoCamera,
    VideoStream,
};
pub use mime_detect::{detect_mime_type, is_image, is_model_supported, sniff_image_mime};
pub use upload::{read_image_file, UploadError};
