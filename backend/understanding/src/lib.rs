pub mod extraction;
pub mod mock;
pub mod prompt;
pub mod vision;

pub use extraction::{parse_lead_fields, ExtractionClient};
pub use mock::MockVision;
pub use prompt::{EXTRACTION_INSTRUCTION, RESPONSE_SCHEMA};
pub use vision::{create_backend, GeminiVision, OpenAiVision, VisionProviderKind, DEFAULT_TIMEOUT};
