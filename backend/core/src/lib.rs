pub mod error;
pub mod event;
pub mod export;
pub mod traits;
pub mod types;

pub use error::{CaptureError, ExtractionError, StoreError, EXTRACTION_FAILED_MESSAGE};
pub use event::{Event, EventKind};
pub use export::{export_file_name, render_csv, RecordExporter, CSV_HEADERS};
pub use traits::{Extractor, KeyValueStore, VisionModel, VisionRequest, VisionResponse};
pub use types::{CapturedImage, Identity, LeadFields, LeadRecord};
