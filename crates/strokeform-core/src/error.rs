//! Error types for the StrokeForm system.
//!
//! This module provides error handling using [`thiserror`] for automatic
//! `Display` and `Error` trait implementations.
//!
//! # Error Hierarchy
//!
//! - [`CoreError`]: Top-level error type that encompasses all subsystem errors
//! - [`PoseSourceError`]: Errors from the external pose-estimation boundary
//!
//! Two conditions are deliberately **not** errors:
//!
//! - Degenerate geometry (coincident points, non-finite coordinates) —
//!   geometry functions return `None` instead.
//! - Insufficient keypoint coverage — the analysis layer produces a degraded
//!   result with a visibility report instead of failing the call.
//!
//! # Example
//!
//! ```rust
//! use strokeform_core::error::{CoreError, PoseSourceError};
//!
//! fn run_estimation() -> Result<(), CoreError> {
//!     Err(PoseSourceError::estimation_failed("backend lost").into())
//! }
//!
//! assert!(run_estimation().unwrap_err().is_recoverable());
//! ```

use thiserror::Error;

/// A specialized `Result` type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Top-level error type for the StrokeForm system.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CoreError {
    /// Pose estimation boundary error
    #[error("Pose source error: {0}")]
    PoseSource(#[from] PoseSourceError),

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
    },

    /// Validation error for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Description of what validation failed
        message: String,
    },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },
}

impl CoreError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// A recoverable error means the frame loop should keep scheduling
    /// future frames; a single failed frame must not halt the analysis
    /// cycle.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::PoseSource(e) => e.is_recoverable(),
            Self::Configuration { .. } | Self::Validation { .. } | Self::Internal { .. } => false,
        }
    }
}

/// Errors from the external pose-estimation model boundary.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PoseSourceError {
    /// The estimation call itself failed (backend error, lost context, ...)
    #[error("Pose estimation failed: {reason}")]
    EstimationFailed {
        /// Reason for the failure
        reason: String,
    },

    /// The model is not loaded or not warmed up yet
    #[error("Pose model not ready: {name}")]
    ModelNotReady {
        /// Name of the model that is not ready
        name: String,
    },

    /// The submitted frame cannot be consumed by the model
    #[error("Invalid frame: {message}")]
    InvalidFrame {
        /// Description of the frame problem
        message: String,
    },
}

impl PoseSourceError {
    /// Creates a new estimation failure.
    #[must_use]
    pub fn estimation_failed(reason: impl Into<String>) -> Self {
        Self::EstimationFailed {
            reason: reason.into(),
        }
    }

    /// Creates a new model-not-ready error.
    #[must_use]
    pub fn model_not_ready(name: impl Into<String>) -> Self {
        Self::ModelNotReady { name: name.into() }
    }

    /// Creates a new invalid-frame error.
    #[must_use]
    pub fn invalid_frame(message: impl Into<String>) -> Self {
        Self::InvalidFrame {
            message: message.into(),
        }
    }

    /// Returns `true` if this error is recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::EstimationFailed { .. } | Self::ModelNotReady { .. } => true,
            Self::InvalidFrame { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_display() {
        let err = CoreError::configuration("update interval must be positive");
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("update interval"));
    }

    #[test]
    fn test_pose_source_error_recoverable() {
        let recoverable = PoseSourceError::estimation_failed("transient backend loss");
        assert!(recoverable.is_recoverable());

        let non_recoverable = PoseSourceError::invalid_frame("zero-sized image");
        assert!(!non_recoverable.is_recoverable());
    }

    #[test]
    fn test_error_conversion() {
        let source_err = PoseSourceError::model_not_ready("movenet-lightning");
        let core_err: CoreError = source_err.into();
        assert!(matches!(core_err, CoreError::PoseSource(_)));
        assert!(core_err.is_recoverable());
    }

    #[test]
    fn test_validation_error_not_recoverable() {
        let err = CoreError::validation("confidence out of range");
        assert!(!err.is_recoverable());
    }
}
