//! In-memory image buffer for one capture session.

use leadscan_core::CapturedImage;

/// Ordered images of the session in progress. Nothing here is persisted.
#[derive(Debug, Default, Clone)]
pub struct CaptureBuffer {
    images: Vec<CapturedImage>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, image: CapturedImage) {
        self.images.push(image);
    }

    /// Remove the image at `index`. Out of range is a no-op.
    pub fn remove_at(&mut self, index: usize) -> Option<CapturedImage> {
        if index < self.images.len() {
            Some(self.images.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }

    pub fn snapshot(&self) -> Vec<CapturedImage> {
        self.images.clone()
    }

    /// Hand over every image, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<CapturedImage> {
        std::mem::take(&mut self.images)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
