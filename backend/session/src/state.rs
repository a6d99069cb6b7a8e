//! The scan session state machine.
//!
//! [`transition`] is pure: it decides the next status and nothing else. The
//! side effects (camera, buffer, extraction, storage) belong to
//! [`ScanController`](crate::controller::ScanController).

use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanStatus {
    #[default]
    Idle,
    Capturing,
    Extracting,
    Success,
    Error { message: String },
}

impl ScanStatus {
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Extracting)
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Capturing => write!(f, "capturing"),
            Self::Extracting => write!(f, "extracting"),
            Self::Success => write!(f, "success"),
            Self::Error { .. } => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanAction {
    StartScan,
    /// An image was added to or removed from the buffer.
    EditImages,
    Cancel,
    Finalize,
    ExtractionSucceeded,
    ExtractionFailed { message: String },
    /// The success banner has been shown long enough.
    SuccessElapsed,
    Dismiss,
}

impl fmt::Display for ScanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StartScan => "start a scan",
            Self::EditImages => "change images",
            Self::Cancel => "cancel",
            Self::Finalize => "finalize",
            Self::ExtractionSucceeded => "complete extraction",
            Self::ExtractionFailed { .. } => "fail extraction",
            Self::SuccessElapsed => "leave success",
            Self::Dismiss => "dismiss",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action} while {from}")]
pub struct InvalidTransition {
    pub from: ScanStatus,
    pub action: ScanAction,
}

pub fn transition(from: &ScanStatus, action: ScanAction) -> Result<ScanStatus, InvalidTransition> {
    use ScanAction as A;
    use ScanStatus as S;

    let next = match (from, &action) {
        (S::Idle | S::Error { .. }, A::StartScan) => S::Capturing,
        (S::Capturing, A::EditImages) => S::Capturing,
        (S::Capturing, A::Cancel) => S::Idle,
        (S::Capturing, A::Finalize) => S::Extracting,
        (S::Extracting, A::ExtractionSucceeded) => S::Success,
        (S::Extracting, A::ExtractionFailed { message }) => S::Error {
            message: message.clone(),
        },
        (S::Success, A::SuccessElapsed) => S::Idle,
        (S::Error { .. }, A::Dismiss) => S::Idle,
        _ => {
            return Err(InvalidTransition {
                from: from.clone(),
                action,
            });
        }
    };
    Ok(next)
}
