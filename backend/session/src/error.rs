use leadscan_core::{CaptureError, StoreError};
use thiserror::Error;

use crate::state::InvalidTransition;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("capture at least one image first")]
    EmptyCapture,

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("password is required")]
    MissingPassword,

    #[error("full name is required")]
    MissingName,

    #[error("not signed in")]
    NotSignedIn,
}
