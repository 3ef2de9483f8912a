//! StrokeForm keypoint conditioning library.
//!
//! This crate turns the pose model's noisy per-frame keypoint estimates into
//! stable, analysis-ready coordinates:
//!
//! - **Temporal Smoothing**: Exponential previous-frame-weighted filtering
//!   to suppress frame-to-frame jitter
//! - **Adaptive Estimation**: Per-axis recursive (Kalman) estimation with
//!   confidence-driven measurement noise
//! - **Missing-Keypoint Estimation**: Structural inference of undetected
//!   shoulders, elbows, and hips from detected neighbors
//! - **Viewpoint Correction**: Camera-angle classification and
//!   viewpoint-specific coordinate correction
//!
//! All stages are deterministic given the same input sequence and initial
//! state, and all session-scoped state implements
//! [`strokeform_core::Resettable`].
//!
//! # Example
//!
//! ```rust
//! use strokeform_filter::{KalmanBank, TemporalSmoother};
//! use strokeform_core::{KeypointArray, Resettable};
//!
//! let mut smoother = TemporalSmoother::default();
//! let mut bank = KalmanBank::default();
//!
//! let frame: KeypointArray = [None; 17];
//! let smoothed = smoother.smooth(&frame);
//! let filtered = bank.apply(&smoothed);
//! # let _ = filtered;
//! smoother.reset();
//! bank.reset();
//! ```

#![forbid(unsafe_code)]

pub mod estimate;
pub mod kalman;
pub mod temporal;
pub mod viewpoint;

// Re-export main types for convenience
pub use estimate::{estimate_missing, EstimationOutcome};
pub use kalman::{KalmanBank, KalmanConfig, ScalarKalman};
pub use temporal::{TemporalSmoother, TemporalSmootherConfig};
pub use viewpoint::{classify_viewpoint, correct_for_viewpoint, ViewpointCorrector};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common result type for filtering operations
pub type Result<T> = std::result::Result<T, FilterError>;

/// Unified error type for keypoint conditioning operations
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FilterError {
    /// Invalid filter configuration
    #[error("Invalid filter configuration: {0}")]
    InvalidConfig(String),
}
