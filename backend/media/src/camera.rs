//! Camera access as a scoped resource.
//!
//! A [`CameraSession`] owns an open stream and stops every track when it is
//! released or dropped, whichever comes first.

use leadscan_core::{CaptureError, CapturedImage};
use tracing::{debug, info, warn};

/// Which camera to prefer on devices with several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacingMode {
    /// Rear camera, pointed at the card.
    #[default]
    Environment,
    User,
}

#[derive(Debug, Clone, Default)]
pub struct CameraConstraints {
    pub facing_mode: FacingMode,
    pub audio: bool,
}

/// A source of video streams (a webcam, a phone camera, a test double).
pub trait CameraDevice: Send + Sync {
    fn open(&self, constraints: &CameraConstraints) -> Result<Box<dyn VideoStream>, CaptureError>;
}

/// An open stream. `stop` ends all of its tracks.
pub trait VideoStream: Send {
    /// Grab the current frame as a JPEG.
    fn capture_frame(&mut self) -> Result<CapturedImage, CaptureError>;

    fn stop(&mut self);
}

/// An acquired camera stream, released exactly once.
pub struct CameraSession {
    stream: Option<Box<dyn VideoStream>>,
}

impl CameraSession {
    pub fn open(device: &dyn CameraDevice, constraints: &CameraConstraints) -> Result<Self, CaptureError> {
        let stream = device.open(constraints)?;
        debug!(facing = ?constraints.facing_mode, "Camera stream acquired");
        Ok(Self { stream: Some(stream) })
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    pub fn capture_frame(&mut self) -> Result<CapturedImage, CaptureError> {
        match self.stream.as_mut() {
            Some(stream) => stream.capture_frame(),
            None => Err(CaptureError::Unavailable("camera already released".into())),
        }
    }

    /// Stop all tracks. Calling this more than once is harmless.
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            debug!("Camera stream released");
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.release();
    }
}

/// Where the images of a session come from.
pub enum CaptureSource {
    Camera(CameraSession),
    /// The camera could not be opened; only file uploads are possible.
    UploadOnly { reason: CaptureError },
}

impl CaptureSource {
    /// Open the camera, or fall back to upload-only when it is unavailable.
    pub fn acquire(device: &dyn CameraDevice, constraints: &CameraConstraints) -> Self {
        match CameraSession::open(device, constraints) {
            Ok(session) => {
                info!("Camera ready");
                Self::Camera(session)
            }
            Err(reason) => {
                warn!(error = %reason, "Unable to access camera; falling back to file upload");
                Self::UploadOnly { reason }
            }
        }
    }

    pub fn is_camera(&self) -> bool {
        matches!(self, Self::Camera(_))
    }

    pub fn capture_frame(&mut self) -> Result<CapturedImage, CaptureError> {
        match self {
            Self::Camera(session) => session.capture_frame(),
            Self::UploadOnly { reason } => Err(reason.clone()),
        }
    }

    pub fn release(&mut self) {
        if let Self::Camera(session) = self {
            session.release();
        }
    }
}

/// A device that never has a camera. Every session is upload-only.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCamera;

impl CameraDevice for NoCamera {
    fn open(&self, _constraints: &CameraConstraints) -> Result<Box<dyn VideoStream>, CaptureError> {
        Err(CaptureError::Unavailable("no camera device".into()))
    }
}

pub mod mock {
    //! Camera double that counts acquisitions and stops.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[derive(Debug, Default)]
    struct Counters {
        opened: AtomicUsize,
        stopped: AtomicUsize,
        frames: AtomicUsize,
    }

    /// Hands out streams that return numbered JPEG frames.
    #[derive(Debug, Clone, Default)]
    pub struct MockCamera {
        counters: Arc<Counters>,
        failure: Option<CaptureError>,
    }

    impl MockCamera {
        pub fn new() -> Self {
            Self::default()
        }

        /// A camera whose `open` always fails with `error`.
        pub fn failing(error: CaptureError) -> Self {
            Self {
                failure: Some(error),
                ..Self::default()
            }
        }

        pub fn open_count(&self) -> usize {
            self.counters.opened.load(Ordering::SeqCst)
        }

        pub fn stop_count(&self) -> usize {
            self.counters.stopped.load(Ordering::SeqCst)
        }
    }

    impl CameraDevice for MockCamera {
        fn open(&self, _constraints: &CameraConstraints) -> Result<Box<dyn VideoStream>, CaptureError> {
            if let Some(err) = &self.failure {
                return Err(err.clone());
            }
            self.counters.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(MockStream {
                counters: Arc::clone(&self.counters),
                stopped: false,
            }))
        }
    }

    struct MockStream {
        counters: Arc<Counters>,
        stopped: bool,
    }

    impl VideoStream for MockStream {
        fn capture_frame(&mut self) -> Result<CapturedImage, CaptureError> {
            if self.stopped {
                return Err(CaptureError::Unavailable("stream stopped".into()));
            }
            let n = self.counters.frames.fetch_add(1, Ordering::SeqCst);
            Ok(CapturedImage::new("image/jpeg", format!("frame-{n}")))
        }

        fn stop(&mut self) {
            if !self.stopped {
                self.stopped = true;
                self.counters.stopped.fetch_add(1, Ordering::SeqCst);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockCamera;
    use super::*;

    #[test]
    fn release_stops_tracks_once() {
        let camera = MockCamera::new();
        let mut session = CameraSession::open(&camera, &CameraConstraints::default()).unwrap();
        assert!(session.capture_frame().is_ok());
        session.release();
        session.release();
        drop(session);
        assert_eq!(camera.open_count(), 1);
        assert_eq!(camera.stop_count(), 1);
    }

    #[test]
    fn drop_releases_the_stream() {
        let camera = MockCamera::new();
        {
            let _session = CameraSession::open(&camera, &CameraConstraints::default()).unwrap();
        }
        assert_eq!(camera.stop_count(), camera.open_count());
    }

    #[test]
    fn capture_after_release_fails() {
        let camera = MockCamera::new();
        let mut session = CameraSession::open(&camera, &CameraConstraints::default()).unwrap();
        session.release();
        assert!(!session.is_active());
        assert!(session.capture_frame().is_err());
    }

    #[test]
    fn permission_denied_falls_back_to_upload() {
        let camera = MockCamera::failing(CaptureError::PermissionDenied);
        let mut source = CaptureSource::acquire(&camera, &CameraConstraints::default());
        assert!(!source.is_camera());
        assert_eq!(source.capture_frame(), Err(CaptureError::PermissionDenied));
        assert_eq!(camera.open_count(), 0);
    }

    #[test]
    fn no_camera_is_upload_only() {
        let source = CaptureSource::acquire(&NoCamera, &CameraConstraints::default());
        assert!(matches!(source, CaptureSource::UploadOnly { .. }));
    }
}
