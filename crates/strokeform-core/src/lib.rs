//! # StrokeForm Core
//!
//! Core types, traits, and utilities for the StrokeForm tennis stroke
//! analysis system.
//!
//! This crate provides the foundational building blocks used throughout the
//! StrokeForm ecosystem, including:
//!
//! - **Core Data Types**: [`Pose`], [`Keypoint`], [`BodyLandmark`],
//!   [`Confidence`], [`StrokeType`], and [`CameraViewpoint`] for representing
//!   per-frame pose estimates and analysis configuration.
//!
//! - **Geometry Utilities**: Defensive angle/distance/inclination computation
//!   via the [`geometry`] module. Degenerate input never panics and never
//!   produces NaN; it yields `None`.
//!
//! - **Error Types**: Error handling via the [`error`] module, with specific
//!   error types for the pose-source boundary.
//!
//! - **Traits**: Core abstractions like [`PoseSource`], [`PoseRenderer`], and
//!   [`Resettable`] that define the contracts at the system's boundaries.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization via serde
//! - `async`: Enable async trait definitions
//!
//! ## Example
//!
//! ```rust
//! use strokeform_core::{BodyLandmark, Confidence, Keypoint};
//!
//! let keypoint = Keypoint::new(
//!     BodyLandmark::RightWrist,
//!     412.0,
//!     305.5,
//!     Confidence::new(0.92).unwrap(),
//! );
//!
//! assert!(keypoint.is_valid_at(0.15));
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod geometry;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types at the crate root
pub use error::{CoreError, CoreResult, PoseSourceError};
pub use traits::{
    AnalysisStage, EstimationConfig, FrameImage, PoseRenderer, PoseSource, RenderStyle, Resettable,
};
pub use types::{
    BodyLandmark, CameraViewpoint, Confidence, FrameId, Keypoint, KeypointArray, Pose, StrokeType,
    Timestamp, Viewpoint,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of body landmarks per pose (COCO format)
pub const MAX_KEYPOINTS: usize = 17;

/// Default confidence threshold below which a keypoint is not trusted
/// for geometric analysis.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.15;

/// Confidence floor below which temporal filters pass keypoints through
/// unfiltered rather than letting near-noise observations drag the state.
pub const SMOOTHING_CONFIDENCE_FLOOR: f32 = 0.1;

/// Confidence floor for storing a keypoint into the motion history.
pub const STORE_CONFIDENCE_THRESHOLD: f32 = 0.2;

/// Prelude module for convenient imports.
///
/// ```rust
/// use strokeform_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{CoreError, CoreResult, PoseSourceError};
    pub use crate::traits::{
        EstimationConfig, FrameImage, PoseRenderer, PoseSource, RenderStyle, Resettable,
    };
    pub use crate::types::{
        BodyLandmark, CameraViewpoint, Confidence, FrameId, Keypoint, KeypointArray, Pose,
        StrokeType, Timestamp, Viewpoint,
    };
}
