use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::BackendSlot;

/// Fatal platform errors raised while resolving the keychain backend.
///
/// These are never folded into an operation result: they abort the call and
/// should be treated as a deployment/configuration failure.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Host OS family is not supported
    #[error("Invalid platform. OS must be {expected} (detected '{os}')")]
    UnsupportedOs { os: String, expected: &'static str },

    /// Host CPU architecture has no backend slot
    #[error("Invalid platform. Unsupported architecture ({arch})")]
    UnsupportedArch { arch: String },

    /// The backend for a recognized slot could not be loaded
    #[error("Failed to load keychain backend for {slot}: {source}")]
    BackendLoad {
        slot: BackendSlot,
        #[source]
        source: BackendFault,
    },
}

/// A system-level fault raised by a keychain backend.
///
/// Carried unchanged from the backend into operation results.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct BackendFault {
    /// Human-readable description from the backend
    pub message: String,

    /// Native status code (e.g. an OSStatus), when the backend exposes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
}

impl BackendFault {
    /// Create a fault without a native status code
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// Create a fault carrying a native status code
    pub fn with_code(message: impl Into<String>, code: i32) -> Self {
        Self {
            message: message.into(),
            code: Some(code),
        }
    }
}
