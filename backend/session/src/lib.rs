//! Scan sessions and the signed-in workspace.

pub mod auth;
pub mod controller;
pub mod error;
pub mod state;
pub mod workspace;

pub use auth::{Authenticator, PendingVerification, DEFAULT_DISPLAY_NAME};
pub use controller::{ScanController, ScanOutcome, DEFAULT_SUCCESS_DELAY, SAVE_FAILED_MESSAGE};
pub use error::{AuthError, SessionError};
pub use state::{transition, InvalidTransition, ScanAction, ScanStatus};
pub use workspace::Workspace;
