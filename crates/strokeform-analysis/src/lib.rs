//! StrokeForm stroke analysis library.
//!
//! This crate converts conditioned per-frame keypoints into biomechanical
//! quality scores for tennis strokes:
//!
//! - **Motion History**: A bounded rolling window of filtered keypoints,
//!   derived joint angles, and per-landmark velocities
//! - **Coverage Policy**: Whether the keypoint set for a stroke/viewpoint
//!   combination is sufficient for full analysis, and what is missing
//! - **Feature Extraction**: Per-stroke, per-viewpoint geometric features
//!   (joint angles, alignments, flexion ratios)
//! - **Scoring**: Gaussian proximity-to-ideal component scores, a weighted
//!   composite, and an independent probabilistic scorer
//! - **Stroke Detection**: Instantaneous and trajectory-based stroke-type
//!   classification, each with a confidence
//! - **Session Pipeline**: [`AnalysisSession`] owns all per-session state and
//!   runs the full filtering → estimation → correction → scoring pipeline
//!   once per frame
//!
//! # Example
//!
//! ```rust
//! use strokeform_analysis::{AnalysisSession, SessionConfig};
//! use strokeform_core::Timestamp;
//!
//! let mut session = AnalysisSession::new(SessionConfig::default()).unwrap();
//! // No subject in frame yet: nothing to report.
//! let outcome = session.process_frame(None, Timestamp::from_millis(0));
//! assert!(outcome.analysis.is_none());
//! ```

#![forbid(unsafe_code)]

pub mod coverage;
pub mod detect;
pub mod features;
pub mod history;
pub mod scoring;
pub mod session;

// Re-export main types for convenience
pub use coverage::{
    detection_status, has_required_coverage, required_landmarks, DetectionStatus, CORE_LANDMARKS,
};
pub use detect::{
    detect_instant, detect_trajectory, StrokeDetection, SwingPhase, TrajectoryDetection,
    MIN_DETECTION_CONFIDENCE,
};
pub use features::{
    extract_features, extract_partial_features, DetectionNote, FeatureKind, MotionData,
    VisibilityIssue,
};
pub use history::{JointAngles, MotionHistory, MotionSnapshot, Velocity};
pub use scoring::{
    acceleration_score, compound_score, gaussian_score, movement_flow_score, posture_score,
    probabilistic_score, stability_score, velocity_score, ComponentScores, ScorePolicy,
};
pub use session::{
    AnalysisResult, AnalysisSession, FrameOutcome, ReportSink, SessionConfig,
    SessionConfigBuilder, StrokeSelection, DEGRADED_SCORE,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common result type for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Unified error type for analysis operations
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AnalysisError {
    /// Invalid session configuration
    #[error("Invalid session configuration: {0}")]
    InvalidConfig(String),

    /// Filtering-stage configuration error
    #[error("Filter error: {0}")]
    Filter(#[from] strokeform_filter::FilterError),
}
