//! Error types for PrevEngine
//!
//! This module defines the error types used by the graphics device lifecycle:
//! adapter queries, device creation, swap chain resources and display-mode
//! transitions.

use std::fmt;

use crate::graphics::{ResourceStage, TransitionStep};

/// Result type for PrevEngine operations
pub type Result<T> = std::result::Result<T, Error>;

/// PrevEngine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Driver-level failure not covered by a more specific variant
    BackendError(String),

    /// No adapter, no output, or the output mode list could not be retrieved
    AdapterQueryError(String),

    /// None of the requested capability tiers is supported by the device
    UnsupportedCapabilityError(String),

    /// A swap chain resource failed to build; `stage` names which one
    ResourceCreationError {
        stage: ResourceStage,
        message: String,
    },

    /// A step of the display-mode transition protocol failed
    TransitionError {
        step: TransitionStep,
        message: String,
    },

    /// Operation not allowed in the current state (frame order, missing resources)
    InvalidState(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::AdapterQueryError(msg) => write!(f, "Adapter query failed: {}", msg),
            Error::UnsupportedCapabilityError(msg) => {
                write!(f, "Unsupported capability: {}", msg)
            }
            Error::ResourceCreationError { stage, message } => {
                write!(f, "Resource creation failed at stage {}: {}", stage, message)
            }
            Error::TransitionError { step, message } => {
                write!(f, "Display-mode transition failed at step {}: {}", step, message)
            }
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Driver message carried by this error, without the variant prefix
    pub fn message(&self) -> &str {
        match self {
            Error::BackendError(msg)
            | Error::AdapterQueryError(msg)
            | Error::UnsupportedCapabilityError(msg)
            | Error::InvalidState(msg) => msg,
            Error::ResourceCreationError { message, .. }
            | Error::TransitionError { message, .. } => message,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
