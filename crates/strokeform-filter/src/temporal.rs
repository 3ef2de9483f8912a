//! Exponential temporal smoothing of keypoint positions.
//!
//! A previous-frame-weighted filter: `smoothed = α·current + (1−α)·previous`
//! applied per axis. Smoothing only engages when both the current and the
//! previous frame's keypoint clear a low confidence floor — a keypoint that
//! just reappeared after dropout snaps to its new position instead of being
//! dragged from stale state. Carried-forward confidence decays by 5% per
//! frame, modeling staleness.

use strokeform_core::{
    AnalysisStage, Confidence, Keypoint, KeypointArray, Resettable, MAX_KEYPOINTS,
    SMOOTHING_CONFIDENCE_FLOOR,
};

/// Fraction of the previous confidence retained when carried forward.
const STALENESS_DECAY: f32 = 0.95;

/// Configuration for [`TemporalSmoother`].
#[derive(Debug, Clone)]
pub struct TemporalSmootherConfig {
    /// Weight of the current frame; `1 − alpha` weights the previous frame
    pub alpha: f32,
    /// Confidence floor below which keypoints pass through unfiltered
    pub confidence_floor: f32,
}

impl Default for TemporalSmootherConfig {
    fn default() -> Self {
        Self {
            alpha: 0.8,
            confidence_floor: SMOOTHING_CONFIDENCE_FLOOR,
        }
    }
}

impl TemporalSmootherConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `alpha` is outside (0.0, 1.0] or the floor is
    /// outside [0.0, 1.0).
    pub fn validate(&self) -> crate::Result<()> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(crate::FilterError::InvalidConfig(format!(
                "alpha must be in (0.0, 1.0], got {}",
                self.alpha
            )));
        }
        if !(0.0..1.0).contains(&self.confidence_floor) {
            return Err(crate::FilterError::InvalidConfig(format!(
                "confidence_floor must be in [0.0, 1.0), got {}",
                self.confidence_floor
            )));
        }
        Ok(())
    }
}

/// Stateful exponential smoother over one session's keypoint stream.
///
/// The first frame of a session passes through unchanged while seeding the
/// state. Applied to a constant input sequence the output equals the input
/// from the second frame on (no drift on steady input).
#[derive(Debug, Clone, Default)]
pub struct TemporalSmoother {
    config: TemporalSmootherConfig,
    previous: Option<KeypointArray>,
}

impl TemporalSmoother {
    /// Creates a smoother with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: TemporalSmootherConfig) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            previous: None,
        })
    }

    /// Returns the current configuration.
    #[must_use]
    pub fn config(&self) -> &TemporalSmootherConfig {
        &self.config
    }

    /// Smooths one frame of keypoints and advances the filter state.
    pub fn smooth(&mut self, current: &KeypointArray) -> KeypointArray {
        let Some(previous) = self.previous.as_ref() else {
            self.previous = Some(*current);
            return *current;
        };

        let alpha = self.config.alpha;
        let floor = self.config.confidence_floor;
        let mut smoothed = *current;

        for i in 0..MAX_KEYPOINTS {
            let (Some(cur), Some(prev)) = (&current[i], &previous[i]) else {
                continue;
            };
            if !(cur.confidence.exceeds(floor) && prev.confidence.exceeds(floor)) {
                continue;
            }

            smoothed[i] = Some(Keypoint::new(
                cur.landmark,
                alpha * cur.x + (1.0 - alpha) * prev.x,
                alpha * cur.y + (1.0 - alpha) * prev.y,
                Confidence::clamped(
                    cur.confidence
                        .value()
                        .max(prev.confidence.value() * STALENESS_DECAY),
                ),
            ));
        }

        self.previous = Some(smoothed);
        smoothed
    }
}

impl Resettable for TemporalSmoother {
    fn reset(&mut self) {
        self.previous = None;
    }
}

impl AnalysisStage for TemporalSmoother {
    type Input = KeypointArray;
    type Output = KeypointArray;

    fn process(&mut self, input: Self::Input) -> Self::Output {
        self.smooth(&input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use strokeform_core::BodyLandmark;

    fn frame_with(landmark: BodyLandmark, x: f32, y: f32, confidence: f32) -> KeypointArray {
        let mut frame: KeypointArray = [None; MAX_KEYPOINTS];
        frame[landmark as usize] = Some(Keypoint::new(
            landmark,
            x,
            y,
            Confidence::new(confidence).unwrap(),
        ));
        frame
    }

    #[test]
    fn first_frame_passes_through() {
        let mut smoother = TemporalSmoother::default();
        let frame = frame_with(BodyLandmark::RightWrist, 100.0, 200.0, 0.9);
        let out = smoother.smooth(&frame);
        assert_eq!(out, frame);
    }

    #[test]
    fn constant_input_is_fixed_point() {
        let mut smoother = TemporalSmoother::default();
        let frame = frame_with(BodyLandmark::RightWrist, 100.0, 200.0, 0.9);

        smoother.smooth(&frame);
        let second = smoother.smooth(&frame);
        let kp = second[BodyLandmark::RightWrist as usize].unwrap();
        assert_abs_diff_eq!(kp.x, 100.0, epsilon = 1e-5);
        assert_abs_diff_eq!(kp.y, 200.0, epsilon = 1e-5);

        // Still fixed after many more identical frames.
        for _ in 0..10 {
            let out = smoother.smooth(&frame);
            let kp = out[BodyLandmark::RightWrist as usize].unwrap();
            assert_abs_diff_eq!(kp.x, 100.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn blends_toward_previous_position() {
        let mut smoother = TemporalSmoother::default();
        smoother.smooth(&frame_with(BodyLandmark::RightWrist, 0.0, 0.0, 0.9));
        let out = smoother.smooth(&frame_with(BodyLandmark::RightWrist, 100.0, 0.0, 0.9));

        // alpha = 0.8: 0.8 * 100 + 0.2 * 0 = 80
        let kp = out[BodyLandmark::RightWrist as usize].unwrap();
        assert_abs_diff_eq!(kp.x, 80.0, epsilon = 1e-4);
    }

    #[test]
    fn low_confidence_bypasses_smoothing() {
        let mut smoother = TemporalSmoother::default();
        smoother.smooth(&frame_with(BodyLandmark::RightWrist, 0.0, 0.0, 0.9));

        // Current frame below the floor: raw pass-through.
        let noisy = frame_with(BodyLandmark::RightWrist, 100.0, 0.0, 0.05);
        let out = smoother.smooth(&noisy);
        let kp = out[BodyLandmark::RightWrist as usize].unwrap();
        assert_eq!(kp.x, 100.0);
    }

    #[test]
    fn carried_confidence_decays() {
        let mut smoother = TemporalSmoother::default();
        smoother.smooth(&frame_with(BodyLandmark::RightWrist, 0.0, 0.0, 1.0));
        let out = smoother.smooth(&frame_with(BodyLandmark::RightWrist, 0.0, 0.0, 0.5));

        // max(0.5, 1.0 * 0.95) = 0.95
        let kp = out[BodyLandmark::RightWrist as usize].unwrap();
        assert_abs_diff_eq!(kp.confidence.value(), 0.95, epsilon = 1e-6);
    }

    #[test]
    fn reset_reseeds_on_next_frame() {
        let mut smoother = TemporalSmoother::default();
        smoother.smooth(&frame_with(BodyLandmark::RightWrist, 0.0, 0.0, 0.9));
        smoother.reset();

        let frame = frame_with(BodyLandmark::RightWrist, 500.0, 0.0, 0.9);
        let out = smoother.smooth(&frame);
        // No blending against pre-reset state.
        assert_eq!(out, frame);
    }

    #[test]
    fn config_validation() {
        assert!(TemporalSmoother::new(TemporalSmootherConfig {
            alpha: 0.0,
            confidence_floor: 0.1,
        })
        .is_err());
        assert!(TemporalSmoother::new(TemporalSmootherConfig {
            alpha: 0.8,
            confidence_floor: 1.0,
        })
        .is_err());
        assert!(TemporalSmoother::new(TemporalSmootherConfig::default()).is_ok());
    }
}
