//! Drives one scan at a time: camera, buffer, extraction, storage.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use leadscan_core::{
    CapturedImage, Event, EventKind, ExtractionError, Extractor, LeadRecord,
    EXTRACTION_FAILED_MESSAGE,
};
use leadscan_media::{CameraConstraints, CameraDevice, CaptureBuffer, CaptureSource};
use leadscan_storage::RecordStore;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::SessionError;
use crate::state::{transition, ScanAction, ScanStatus};

pub const DEFAULT_SUCCESS_DELAY: Duration = Duration::from_millis(2000);

/// Message shown when an extracted record could not be saved.
pub const SAVE_FAILED_MESSAGE: &str = "Failed to save the record. Please try again.";

/// How a finalize ended. Both outcomes leave the controller in a valid state.
#[derive(Debug)]
pub enum ScanOutcome {
    Created(LeadRecord),
    Failed(ExtractionError),
}

pub struct ScanController {
    status: ScanStatus,
    buffer: CaptureBuffer,
    source: Option<CaptureSource>,
    camera: Arc<dyn CameraDevice>,
    constraints: CameraConstraints,
    extractor: Arc<dyn Extractor>,
    success_delay: Duration,
    success_at: Option<Instant>,
    session_id: Uuid,
    events: Option<broadcast::Sender<Event>>,
}

impl ScanController {
    pub fn new(camera: Arc<dyn CameraDevice>, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            status: ScanStatus::Idle,
            buffer: CaptureBuffer::new(),
            source: None,
            camera,
            constraints: CameraConstraints::default(),
            extractor,
            success_delay: DEFAULT_SUCCESS_DELAY,
            success_at: None,
            session_id: Uuid::new_v4(),
            events: None,
        }
    }

    pub fn with_success_delay(mut self, delay: Duration) -> Self {
        self.success_delay = delay;
        self
    }

    pub fn with_constraints(mut self, constraints: CameraConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Publish every transition on `sender`.
    pub fn with_events(mut self, sender: broadcast::Sender<Event>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Current status, after applying a success delay that has run out.
    pub fn status(&mut self) -> &ScanStatus {
        self.refresh(Instant::now());
        &self.status
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn images(&self) -> Vec<CapturedImage> {
        self.buffer.snapshot()
    }

    pub fn image_count(&self) -> usize {
        self.buffer.len()
    }

    /// True while a live camera stream is held.
    pub fn has_camera(&self) -> bool {
        self.source.as_ref().is_some_and(CaptureSource::is_camera)
    }

    /// Open the camera (or fall back to uploads) and start capturing.
    pub fn start_scan(&mut self) -> Result<(), SessionError> {
        self.refresh(Instant::now());
        self.status = transition(&self.status, ScanAction::StartScan)?;
        self.session_id = Uuid::new_v4();
        self.buffer.clear();
        self.release_camera();

        let source = CaptureSource::acquire(self.camera.as_ref(), &self.constraints);
        let fallback = match &source {
            CaptureSource::UploadOnly { reason } => Some(reason.to_string()),
            CaptureSource::Camera(_) => None,
        };
        self.source = Some(source);

        info!(session = %self.session_id, "Scan started");
        self.emit(EventKind::ScanStarted, json!({}));
        if let Some(reason) = fallback {
            self.emit(EventKind::CameraFallback, json!({ "reason": reason }));
        }
        Ok(())
    }

    pub fn add_image(&mut self, image: CapturedImage) -> Result<(), SessionError> {
        self.refresh(Instant::now());
        self.status = transition(&self.status, ScanAction::EditImages)?;
        self.buffer.append(image);
        self.emit(EventKind::ImageAdded, json!({ "count": self.buffer.len() }));
        Ok(())
    }

    /// Take a photo with the open camera and add it to the buffer.
    pub fn capture_frame(&mut self) -> Result<(), SessionError> {
        self.refresh(Instant::now());
        transition(&self.status, ScanAction::EditImages)?;
        let Some(source) = self.source.as_mut() else {
            return Err(SessionError::Capture(leadscan_core::CaptureError::Unavailable(
                "camera not open".into(),
            )));
        };
        let frame = source.capture_frame()?;
        self.add_image(frame)
    }

    /// Drop the image at `index`. Out of range is a no-op.
    pub fn remove_image(&mut self, index: usize) -> Result<Option<CapturedImage>, SessionError> {
        self.refresh(Instant::now());
        self.status = transition(&self.status, ScanAction::EditImages)?;
        let removed = self.buffer.remove_at(index);
        if removed.is_some() {
            self.emit(
                EventKind::ImageRemoved,
                json!({ "index": index, "count": self.buffer.len() }),
            );
        }
        Ok(removed)
    }

    /// Abandon the scan. Captured images are discarded.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        self.refresh(Instant::now());
        self.status = transition(&self.status, ScanAction::Cancel)?;
        self.release_camera();
        let discarded = self.buffer.len();
        self.buffer.clear();
        info!(session = %self.session_id, discarded, "Scan cancelled");
        self.emit(EventKind::ScanCancelled, json!({ "discarded": discarded }));
        Ok(())
    }

    /// Send the buffered images for extraction and store the result.
    ///
    /// An empty buffer is rejected and leaves the session capturing. An
    /// extraction failure is not an `Err`: the controller moves to
    /// [`ScanStatus::Error`] and returns [`ScanOutcome::Failed`]. Dropping
    /// the future mid-request also leaves the session in the error state.
    pub async fn finalize(&mut self, store: &mut RecordStore) -> Result<ScanOutcome, SessionError> {
        self.refresh(Instant::now());
        let next = transition(&self.status, ScanAction::Finalize)?;
        if self.buffer.is_empty() {
            return Err(SessionError::EmptyCapture);
        }
        self.status = next;
        self.release_camera();
        let images = self.buffer.take();
        let bytes: usize = images.iter().map(CapturedImage::byte_len).sum();
        info!(session = %self.session_id, images = images.len(), bytes, "Extracting");
        self.emit(EventKind::ExtractionStarted, json!({ "images": images.len() }));

        let extractor = Arc::clone(&self.extractor);
        let mut guard = ExtractionGuard {
            status: &mut self.status,
            session_id: self.session_id,
            events: self.events.clone(),
            armed: true,
        };
        let result = extractor.extract(&images).await;
        guard.armed = false;
        drop(guard);

        let fields = match result {
            Ok(fields) => fields,
            Err(err) => {
                warn!(session = %self.session_id, error = %err, "Extraction failed");
                self.fail(err.user_message())?;
                return Ok(ScanOutcome::Failed(err));
            }
        };

        let mut id = Uuid::new_v4();
        while store.contains(id) {
            debug!(%id, "Record id collision; regenerating");
            id = Uuid::new_v4();
        }
        let record = LeadRecord::new(id, fields, Utc::now().timestamp_millis());
        if let Err(err) = store.insert_front(record.clone()) {
            warn!(session = %self.session_id, error = %err, "Failed to store record");
            self.fail(SAVE_FAILED_MESSAGE)?;
            return Err(err.into());
        }

        self.status = transition(&self.status, ScanAction::ExtractionSucceeded)?;
        self.success_at = Some(Instant::now());
        info!(session = %self.session_id, record = %record.id, "Record created");
        self.emit(
            EventKind::RecordCreated,
            json!({ "id": record.id, "company": record.fields.company_name }),
        );
        Ok(ScanOutcome::Created(record))
    }

    pub fn dismiss_error(&mut self) -> Result<(), SessionError> {
        self.refresh(Instant::now());
        self.status = transition(&self.status, ScanAction::Dismiss)?;
        self.emit(EventKind::SessionIdle, json!({}));
        Ok(())
    }

    /// Time left before the success status clears itself.
    pub fn success_remaining(&self, now: Instant) -> Option<Duration> {
        match (&self.status, self.success_at) {
            (ScanStatus::Success, Some(at)) => {
                Some((at + self.success_delay).saturating_duration_since(now))
            }
            _ => None,
        }
    }

    /// Apply the automatic success → idle step if its delay has passed.
    /// Returns whether the status changed.
    pub fn refresh(&mut self, now: Instant) -> bool {
        if self.success_remaining(now) != Some(Duration::ZERO) {
            return false;
        }
        let Ok(next) = transition(&self.status, ScanAction::SuccessElapsed) else {
            return false;
        };
        self.status = next;
        self.success_at = None;
        self.emit(EventKind::SessionIdle, json!({}));
        true
    }

    /// Wait out the success delay, if one is pending.
    pub async fn settle(&mut self) {
        if let Some(remaining) = self.success_remaining(Instant::now()) {
            tokio::time::sleep(remaining).await;
            self.refresh(Instant::now());
        }
    }

    fn fail(&mut self, message: &str) -> Result<(), SessionError> {
        let action = ScanAction::ExtractionFailed {
            message: message.to_string(),
        };
        self.status = transition(&self.status, action)?;
        self.emit(EventKind::ExtractionFailed, json!({ "message": message }));
        Ok(())
    }

    fn release_camera(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.release();
        }
    }

    fn emit(&self, kind: EventKind, payload: serde_json::Value) {
        debug!(session = %self.session_id, event = %kind, status = %self.status, "Scan event");
        if let Some(sender) = &self.events {
            // No subscribers is fine.
            let _ = sender.send(Event::new(self.session_id, kind, payload));
        }
    }
}

impl Drop for ScanController {
    fn drop(&mut self) {
        self.release_camera();
    }
}

/// Held across the extraction request. If the request future is dropped
/// while armed, the session fails instead of staying in `Extracting`.
struct ExtractionGuard<'a> {
    status: &'a mut ScanStatus,
    session_id: Uuid,
    events: Option<broadcast::Sender<Event>>,
    armed: bool,
}

impl Drop for ExtractionGuard<'_> {
    fn drop(&mut self) {
        if !self.armed || !self.status.is_busy() {
            return;
        }
        let action = ScanAction::ExtractionFailed {
            message: EXTRACTION_FAILED_MESSAGE.to_string(),
        };
        let Ok(next) = transition(&*self.status, action) else {
            return;
        };
        *self.status = next;
        warn!(session = %self.session_id, "Extraction abandoned before it finished");
        if let Some(sender) = &self.events {
            let _ = sender.send(Event::new(
                self.session_id,
                EventKind::ExtractionFailed,
                json!({ "message": EXTRACTION_FAILED_MESSAGE, "abandoned": true }),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use leadscan_core::{CaptureError, LeadFields};
    use leadscan_media::camera::mock::MockCamera;
    use leadscan_storage::InMemoryKvStore;
    use leadscan_understanding::{ExtractionClient, MockVision};

    const ACME: &str = r#"{"companyName":"Acme","contactPerson":"Jane Doe","contactNumber":"555-1212","emailId":"jane@acme.com"}"#;

    fn controller(camera: &MockCamera, vision: &MockVision) -> ScanController {
        let extractor = ExtractionClient::new(Arc::new(vision.clone()), "test-model");
        ScanController::new(Arc::new(camera.clone()), Arc::new(extractor))
    }

    fn store() -> RecordStore {
        RecordStore::open(Arc::new(InMemoryKvStore::new()), "jane@acme.com")
    }

    fn image(tag: &str) -> CapturedImage {
        CapturedImage::new("image/jpeg", tag)
    }

    /// Never answers within a test's lifetime.
    struct StalledExtractor;

    #[async_trait]
    impl Extractor for StalledExtractor {
        async fn extract(&self, _images: &[CapturedImage]) -> Result<LeadFields, ExtractionError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(ExtractionError::NoImages)
        }
    }

    #[tokio::test]
    async fn two_images_become_one_record() {
        let camera = MockCamera::new();
        let vision = MockVision::replying(ACME);
        let mut ctl = controller(&camera, &vision);
        let mut store = store();
        let started_at = Utc::now().timestamp_millis();

        ctl.start_scan().unwrap();
        ctl.add_image(image("front")).unwrap();
        ctl.add_image(image("back")).unwrap();
        let outcome = ctl.finalize(&mut store).await.unwrap();

        let ScanOutcome::Created(record) = outcome else {
            panic!("expected a record");
        };
        assert_eq!(ctl.status(), &ScanStatus::Success);
        assert_eq!(record.fields.company_name, "Acme");
        assert_eq!(record.fields.contact_person, "Jane Doe");
        assert_eq!(record.fields.website, "");
        assert!(record.timestamp >= started_at);
        assert!(record.timestamp <= Utc::now().timestamp_millis());
        assert_eq!(store.list()[0].id, record.id);
        assert_eq!(store.len(), 1);
        assert_eq!(ctl.image_count(), 0);

        let sent = vision.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].images, vec![image("front"), image("back")]);
    }

    #[tokio::test]
    async fn malformed_reply_goes_to_error_without_storing() {
        let camera = MockCamera::new();
        let vision = MockVision::replying("I could not read that card");
        let mut ctl = controller(&camera, &vision);
        let mut store = store();

        ctl.start_scan().unwrap();
        ctl.add_image(image("front")).unwrap();
        let outcome = ctl.finalize(&mut store).await.unwrap();

        assert!(matches!(
            outcome,
            ScanOutcome::Failed(ExtractionError::MalformedResponse { .. })
        ));
        assert_eq!(
            ctl.status(),
            &ScanStatus::Error {
                message: EXTRACTION_FAILED_MESSAGE.into()
            }
        );
        assert!(store.is_empty());
        assert_eq!(ctl.image_count(), 0);

        ctl.dismiss_error().unwrap();
        assert_eq!(ctl.status(), &ScanStatus::Idle);
    }

    #[tokio::test]
    async fn request_failure_can_be_retried_with_a_new_scan() {
        let camera = MockCamera::new();
        let vision = MockVision::failing("503 Service Unavailable");
        let mut ctl = controller(&camera, &vision);
        let mut store = store();

        ctl.start_scan().unwrap();
        ctl.add_image(image("front")).unwrap();
        let outcome = ctl.finalize(&mut store).await.unwrap();
        assert!(matches!(outcome, ScanOutcome::Failed(ExtractionError::RequestFailed(_))));

        ctl.start_scan().unwrap();
        assert_eq!(ctl.status(), &ScanStatus::Capturing);
        assert_eq!(ctl.image_count(), 0);
    }

    #[tokio::test]
    async fn empty_buffer_cannot_be_finalized() {
        let camera = MockCamera::new();
        let vision = MockVision::replying(ACME);
        let mut ctl = controller(&camera, &vision);
        let mut store = store();

        ctl.start_scan().unwrap();
        let err = ctl.finalize(&mut store).await.unwrap_err();
        assert!(matches!(err, SessionError::EmptyCapture));
        assert_eq!(ctl.status(), &ScanStatus::Capturing);
        assert!(vision.requests().is_empty());
    }

    #[tokio::test]
    async fn camera_is_released_on_finalize() {
        let camera = MockCamera::new();
        let mut ctl = controller(&camera, &MockVision::replying(ACME));
        let mut store = store();

        ctl.start_scan().unwrap();
        ctl.capture_frame().unwrap();
        assert!(ctl.has_camera());
        ctl.finalize(&mut store).await.unwrap();

        assert!(!ctl.has_camera());
        assert_eq!(camera.open_count(), 1);
        assert_eq!(camera.stop_count(), 1);
    }

    #[test]
    fn camera_is_released_on_cancel_and_buffer_cleared() {
        let camera = MockCamera::new();
        let mut ctl = controller(&camera, &MockVision::replying(ACME));

        ctl.start_scan().unwrap();
        ctl.capture_frame().unwrap();
        ctl.capture_frame().unwrap();
        assert_eq!(ctl.image_count(), 2);
        ctl.cancel().unwrap();

        assert_eq!(ctl.status(), &ScanStatus::Idle);
        assert_eq!(ctl.image_count(), 0);
        assert_eq!(camera.stop_count(), camera.open_count());
    }

    #[test]
    fn camera_is_released_on_drop() {
        let camera = MockCamera::new();
        {
            let mut ctl = controller(&camera, &MockVision::replying(ACME));
            ctl.start_scan().unwrap();
        }
        assert_eq!(camera.open_count(), 1);
        assert_eq!(camera.stop_count(), 1);
    }

    #[test]
    fn unavailable_camera_falls_back_to_uploads() {
        let camera = MockCamera::failing(CaptureError::PermissionDenied);
        let (tx, mut rx) = broadcast::channel(16);
        let mut ctl = controller(&camera, &MockVision::replying(ACME)).with_events(tx);

        ctl.start_scan().unwrap();
        assert_eq!(ctl.status(), &ScanStatus::Capturing);
        assert!(!ctl.has_camera());
        assert!(matches!(
            ctl.capture_frame(),
            Err(SessionError::Capture(CaptureError::PermissionDenied))
        ));
        ctl.add_image(image("upload")).unwrap();
        assert_eq!(ctl.image_count(), 1);

        assert_eq!(rx.try_recv().unwrap().kind, EventKind::ScanStarted);
        assert_eq!(rx.try_recv().unwrap().kind, EventKind::CameraFallback);
        assert_eq!(rx.try_recv().unwrap().kind, EventKind::ImageAdded);
    }

    #[test]
    fn remove_image_out_of_range_is_a_no_op() {
        let mut ctl = controller(&MockCamera::new(), &MockVision::replying(ACME));
        ctl.start_scan().unwrap();
        ctl.add_image(image("a")).unwrap();
        ctl.add_image(image("b")).unwrap();

        assert_eq!(ctl.remove_image(5).unwrap(), None);
        assert_eq!(ctl.remove_image(0).unwrap(), Some(image("a")));
        assert_eq!(ctl.images(), vec![image("b")]);
    }

    #[test]
    fn images_cannot_be_added_while_idle() {
        let mut ctl = controller(&MockCamera::new(), &MockVision::replying(ACME));
        let err = ctl.add_image(image("a")).unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition(_)));
        assert_eq!(ctl.image_count(), 0);
    }

    #[tokio::test]
    async fn success_clears_after_the_delay() {
        let mut ctl = controller(&MockCamera::new(), &MockVision::replying(ACME))
            .with_success_delay(Duration::from_millis(2000));
        let mut store = store();
        ctl.start_scan().unwrap();
        ctl.add_image(image("a")).unwrap();
        ctl.finalize(&mut store).await.unwrap();

        let now = Instant::now();
        assert!(!ctl.refresh(now));
        assert_eq!(ctl.status(), &ScanStatus::Success);
        assert!(ctl.refresh(now + Duration::from_millis(2001)));
        assert_eq!(ctl.status(), &ScanStatus::Idle);
        assert_eq!(ctl.success_remaining(now), None);
    }

    #[tokio::test]
    async fn settle_waits_out_a_short_delay() {
        let mut ctl = controller(&MockCamera::new(), &MockVision::replying(ACME))
            .with_success_delay(Duration::from_millis(5));
        let mut store = store();
        ctl.start_scan().unwrap();
        ctl.add_image(image("a")).unwrap();
        ctl.finalize(&mut store).await.unwrap();

        ctl.settle().await;
        assert_eq!(ctl.status(), &ScanStatus::Idle);
    }

    #[tokio::test]
    async fn success_clears_on_its_own_once_the_delay_passes() {
        let (tx, mut rx) = broadcast::channel(32);
        let mut ctl = controller(&MockCamera::new(), &MockVision::replying(ACME))
            .with_success_delay(Duration::from_millis(1))
            .with_events(tx);
        let mut store = store();
        ctl.start_scan().unwrap();
        ctl.add_image(image("a")).unwrap();
        ctl.finalize(&mut store).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        ctl.start_scan().unwrap();
        assert_eq!(ctl.status(), &ScanStatus::Capturing);

        let kinds: Vec<EventKind> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.kind)
            .collect();
        let idle = kinds.iter().position(|k| *k == EventKind::SessionIdle).unwrap();
        let restarted = kinds.iter().rposition(|k| *k == EventKind::ScanStarted).unwrap();
        assert!(idle < restarted);
    }

    #[tokio::test]
    async fn status_reports_idle_after_the_delay() {
        let mut ctl = controller(&MockCamera::new(), &MockVision::replying(ACME))
            .with_success_delay(Duration::from_millis(1));
        let mut store = store();
        ctl.start_scan().unwrap();
        ctl.add_image(image("a")).unwrap();
        ctl.finalize(&mut store).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(ctl.status(), &ScanStatus::Idle);
    }

    #[tokio::test]
    async fn abandoned_finalize_leaves_an_error_not_extracting() {
        let (tx, mut rx) = broadcast::channel(32);
        let mut ctl = ScanController::new(Arc::new(MockCamera::new()), Arc::new(StalledExtractor))
            .with_events(tx);
        let mut store = store();
        ctl.start_scan().unwrap();
        ctl.add_image(image("a")).unwrap();

        let finished =
            tokio::time::timeout(Duration::from_millis(10), ctl.finalize(&mut store)).await;
        assert!(finished.is_err());
        assert_eq!(
            ctl.status(),
            &ScanStatus::Error {
                message: EXTRACTION_FAILED_MESSAGE.into()
            }
        );
        assert!(store.is_empty());
        let kinds: Vec<EventKind> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.kind)
            .collect();
        assert_eq!(kinds.last(), Some(&EventKind::ExtractionFailed));

        ctl.start_scan().unwrap();
        assert_eq!(ctl.status(), &ScanStatus::Capturing);
    }

    #[tokio::test]
    async fn newest_record_comes_first() {
        let mut ctl = controller(&MockCamera::new(), &MockVision::replying(ACME))
            .with_success_delay(Duration::ZERO);
        let mut store = store();
        let mut ids = Vec::new();
        for _ in 0..2 {
            ctl.start_scan().unwrap();
            ctl.add_image(image("a")).unwrap();
            if let ScanOutcome::Created(r) = ctl.finalize(&mut store).await.unwrap() {
                ids.push(r.id);
            }
            assert!(ctl.refresh(Instant::now()));
        }
        assert_ne!(ids[0], ids[1]);
        assert_eq!(store.list()[0].id, ids[1]);
        assert_eq!(store.list()[1].id, ids[0]);
    }
}
