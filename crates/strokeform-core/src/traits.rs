//! Core trait definitions for the StrokeForm system.
//!
//! This module defines the abstractions at the system's boundaries,
//! enabling a modular and testable architecture.
//!
//! # Traits
//!
//! - [`PoseSource`]: The external pose-estimation model, treated as a black
//!   box producing per-frame keypoint sets
//! - [`PoseRenderer`]: Outbound drawing collaborator (skeleton/keypoint/angle
//!   overlays); the core performs no pixel drawing itself
//! - [`AnalysisStage`]: Pipeline-stage composition
//! - [`Resettable`]: Session-scoped state that clears on restart
//!
//! # Design Philosophy
//!
//! 1. **Single Responsibility**: Each trait handles one concern
//! 2. **Testability**: All traits can be easily mocked for unit testing
//! 3. **Async-Ready**: Async versions available with the `async` feature
//! 4. **Error Handling**: Consistent use of `Result` types with domain errors

use crate::error::{CoreError, CoreResult, PoseSourceError};
use crate::types::{Pose, StrokeType, Viewpoint};

/// Configuration passed to the pose source on every estimation call.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct EstimationConfig {
    /// Maximum number of subjects to detect (this system analyzes one)
    pub max_subjects: usize,
    /// Whether the model should apply its own internal smoothing
    pub smoothing: bool,
    /// Minimum per-keypoint score for the model to report a keypoint
    pub score_threshold: f32,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            max_subjects: 1,
            smoothing: true,
            score_threshold: 0.3,
        }
    }
}

impl EstimationConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_subjects` is zero or the score threshold is
    /// outside [0.0, 1.0].
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_subjects == 0 {
            return Err(CoreError::configuration("max_subjects must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(CoreError::configuration(format!(
                "score_threshold must be in [0.0, 1.0], got {}",
                self.score_threshold
            )));
        }
        Ok(())
    }
}

/// One decoded video frame handed to the pose source.
///
/// Video decoding is outside this core; the frame arrives as an owned RGBA
/// buffer.
#[derive(Debug, Clone)]
pub struct FrameImage {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// RGBA pixel data, row-major, `width * height * 4` bytes
    pub pixels: Vec<u8>,
}

impl FrameImage {
    /// Creates a new frame image.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer length does not match the dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> CoreResult<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(CoreError::validation(format!(
                "Frame buffer length {} does not match {width}x{height} RGBA ({expected})",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }
}

/// The external pose-estimation model boundary.
///
/// One call per frame. Absence of a pose (`Ok(None)`) is a valid,
/// recoverable state — no subject was in frame — distinct from an
/// estimation error.
pub trait PoseSource: Send {
    /// Returns the current estimation configuration.
    fn config(&self) -> &EstimationConfig;

    /// Updates the estimation configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    fn set_config(&mut self, config: EstimationConfig) -> CoreResult<()>;

    /// Returns `true` if the model is loaded and ready.
    fn is_ready(&self) -> bool;

    /// Returns the model version string.
    fn model_version(&self) -> &str;

    /// Estimates the pose of the single tracked subject in `frame`.
    ///
    /// Returns `Ok(None)` when no subject is detected.
    ///
    /// # Errors
    ///
    /// Returns an error if estimation itself fails; callers recover by
    /// reusing the previous analysis result and scheduling the next frame.
    fn estimate(&mut self, frame: &FrameImage) -> Result<Option<Pose>, PoseSourceError>;
}

/// Per-viewpoint drawing style handed to the renderer.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RenderStyle {
    /// Keypoint marker radius in pixels
    pub keypoint_radius: f32,
    /// Keypoint marker color
    pub keypoint_color: String,
    /// Skeleton line width in pixels
    pub line_width: f32,
    /// Skeleton line color
    pub line_color: String,
    /// Angle-overlay text color
    pub text_color: String,
    /// Angle-overlay font
    pub text_font: String,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            keypoint_radius: 6.0,
            keypoint_color: "#ff0000".to_owned(),
            line_width: 4.0,
            line_color: "#00ff00".to_owned(),
            text_color: "rgba(255, 255, 0, 0.7)".to_owned(),
            text_font: "16px Arial".to_owned(),
        }
    }
}

impl RenderStyle {
    /// Returns the drawing style for an effective viewpoint.
    ///
    /// Rear-elevated footage gets larger markers (the subject is farther
    /// away); side footage gets a distinct palette.
    #[must_use]
    pub fn for_viewpoint(viewpoint: Viewpoint) -> Self {
        let base = Self::default();
        match viewpoint {
            Viewpoint::RearElevated => Self {
                keypoint_radius: 8.0,
                line_width: 5.0,
                ..base
            },
            Viewpoint::Side => Self {
                keypoint_color: "#ff9900".to_owned(),
                line_color: "#0099ff".to_owned(),
                ..base
            },
            Viewpoint::Front => base,
        }
    }
}

/// Outbound rendering collaborator.
///
/// Receives a pose plus style/viewpoint/stroke configuration to draw
/// skeleton, keypoints, and angle overlays. May be called every frame,
/// independently of the throttled analysis cadence.
pub trait PoseRenderer {
    /// Draws one frame's pose.
    fn render(&mut self, pose: &Pose, style: &RenderStyle, viewpoint: Viewpoint, stroke: StrokeType);
}

/// Extension trait for pipeline-stage composition.
pub trait AnalysisStage {
    /// The input type for this pipeline stage.
    type Input;
    /// The output type for this pipeline stage.
    type Output;

    /// Processes input and produces output.
    fn process(&mut self, input: Self::Input) -> Self::Output;
}

/// Trait for session-scoped state that can be reset to its initial state.
pub trait Resettable {
    /// Resets the instance to its initial state.
    fn reset(&mut self);
}

// =============================================================================
// Async Trait Definitions (with `async` feature)
// =============================================================================

#[cfg(feature = "async")]
use async_trait::async_trait;

/// Async version of [`PoseSource`].
///
/// The estimation call is the pipeline's one asynchronous suspension point;
/// everything downstream of it runs synchronously to completion within a
/// frame tick.
#[cfg(feature = "async")]
#[async_trait]
pub trait AsyncPoseSource: Send {
    /// Returns the current estimation configuration.
    fn config(&self) -> &EstimationConfig;

    /// Updates the estimation configuration.
    async fn set_config(&mut self, config: EstimationConfig) -> CoreResult<()>;

    /// Returns `true` if the model is loaded and ready.
    fn is_ready(&self) -> bool;

    /// Returns the model version string.
    fn model_version(&self) -> &str;

    /// Estimates the pose of the single tracked subject in `frame`.
    async fn estimate(&mut self, frame: &FrameImage) -> Result<Option<Pose>, PoseSourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimation_config_default() {
        let config = EstimationConfig::default();
        assert_eq!(config.max_subjects, 1);
        assert!(config.smoothing);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_estimation_config_validation() {
        let config = EstimationConfig {
            max_subjects: 0,
            ..EstimationConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EstimationConfig {
            score_threshold: 1.5,
            ..EstimationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_frame_image_buffer_check() {
        assert!(FrameImage::new(2, 2, vec![0; 16]).is_ok());
        assert!(FrameImage::new(2, 2, vec![0; 15]).is_err());
    }

    #[test]
    fn test_render_style_per_viewpoint() {
        let rear = RenderStyle::for_viewpoint(Viewpoint::RearElevated);
        assert_eq!(rear.keypoint_radius, 8.0);
        assert_eq!(rear.line_width, 5.0);

        let side = RenderStyle::for_viewpoint(Viewpoint::Side);
        assert_eq!(side.keypoint_color, "#ff9900");

        let front = RenderStyle::for_viewpoint(Viewpoint::Front);
        assert_eq!(front.keypoint_radius, 6.0);
    }
}
