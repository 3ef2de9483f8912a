//! Camera-viewpoint classification and coordinate correction.
//!
//! The base feature-extraction formulas assume a frontal projection.
//! Footage from other camera positions distorts the geometry those formulas
//! read, so keypoints are corrected before feature extraction:
//!
//! - **Rear-elevated**: perspective foreshortens the distant, elevated
//!   subject — upper keypoints are rescaled upward and the shoulders widened.
//! - **Side**: front/back joint separation collapses — shoulder and hip
//!   offsets from the body midline are exaggerated.
//! - **Front**: identity.
//!
//! Classification (for the `auto` setting) is a deliberate heuristic
//! decision tree, not a trained classifier; ambiguous cases fall through to
//! the rear-elevated default, the most common recording setup.

use strokeform_core::{BodyLandmark, CameraViewpoint, Keypoint, KeypointArray, Viewpoint};

/// Face-confidence ceiling below which the camera is assumed to be behind
/// the player.
const REAR_FACE_CONFIDENCE: f32 = 0.2;

/// Face-confidence floor for the front classification.
const FRONT_FACE_CONFIDENCE: f32 = 0.7;

/// Shoulder horizontal separation (pixels) under which the subject is seen
/// edge-on.
const SIDE_SHOULDER_SEPARATION: f32 = 30.0;

/// Per-keypoint vertical rescale strength for rear-elevated footage.
const REAR_VERTICAL_GAIN: f64 = 0.15;

/// Outward shoulder widening for rear-elevated footage, in pixels per side.
const REAR_SHOULDER_WIDENING: f32 = 10.0;

/// Midline-offset exaggeration factor for side footage.
const SIDE_DEPTH_GAIN: f32 = 0.1;

fn confidence_of(kp: &Option<Keypoint>) -> f32 {
    kp.as_ref().map_or(0.0, |kp| kp.confidence.value())
}

/// Classifies the camera viewpoint from one frame's keypoint pattern.
///
/// Used only when the configured viewpoint is [`CameraViewpoint::Auto`].
#[must_use]
pub fn classify_viewpoint(keypoints: &KeypointArray) -> Viewpoint {
    use BodyLandmark::{LeftEye, LeftHip, LeftShoulder, Nose, RightEye, RightHip, RightShoulder};

    let left_shoulder = &keypoints[LeftShoulder as usize];
    let right_shoulder = &keypoints[RightShoulder as usize];

    let shoulder_width = strokeform_core::geometry::distance(
        left_shoulder.as_ref(),
        right_shoulder.as_ref(),
    );
    let hip_width = strokeform_core::geometry::distance(
        keypoints[LeftHip as usize].as_ref(),
        keypoints[RightHip as usize].as_ref(),
    );
    let (Some(shoulder_width), Some(hip_width)) = (shoulder_width, hip_width) else {
        return Viewpoint::RearElevated;
    };

    let face_confidence = (confidence_of(&keypoints[Nose as usize])
        + confidence_of(&keypoints[LeftEye as usize])
        + confidence_of(&keypoints[RightEye as usize]))
        / 3.0;

    if face_confidence < REAR_FACE_CONFIDENCE {
        return Viewpoint::RearElevated;
    }

    let width_ratio = if hip_width > 0.0 {
        shoulder_width / hip_width
    } else {
        f64::INFINITY
    };
    if face_confidence > FRONT_FACE_CONFIDENCE && width_ratio > 0.8 && width_ratio < 1.2 {
        return Viewpoint::Front;
    }

    if let (Some(ls), Some(rs)) = (left_shoulder, right_shoulder) {
        if (ls.x - rs.x).abs() < SIDE_SHOULDER_SEPARATION {
            return Viewpoint::Side;
        }
    }

    Viewpoint::RearElevated
}

/// Applies the correction for an effective viewpoint.
///
/// Pure function of one frame's keypoints; the input is never mutated.
#[must_use]
pub fn correct_for_viewpoint(keypoints: &KeypointArray, viewpoint: Viewpoint) -> KeypointArray {
    match viewpoint {
        Viewpoint::RearElevated => correct_rear_elevated(keypoints),
        Viewpoint::Side => correct_side(keypoints),
        Viewpoint::Front => *keypoints,
    }
}

/// Rear-elevated correction: vertical perspective rescale plus shoulder
/// widening.
fn correct_rear_elevated(keypoints: &KeypointArray) -> KeypointArray {
    use BodyLandmark::{
        LeftAnkle, LeftEar, LeftEye, LeftShoulder, Nose, RightAnkle, RightEar, RightEye,
        RightShoulder,
    };

    let mut corrected = *keypoints;

    let top_y = [
        Nose,
        LeftEye,
        RightEye,
        LeftEar,
        RightEar,
        LeftShoulder,
        RightShoulder,
    ]
    .iter()
    .filter_map(|lm| keypoints[*lm as usize].map(|kp| kp.y))
    .fold(None::<f32>, |acc, y| Some(acc.map_or(y, |a| a.min(y))));

    let bottom_y = [LeftAnkle, RightAnkle]
        .iter()
        .filter_map(|lm| keypoints[*lm as usize].map(|kp| kp.y))
        .fold(None::<f32>, |acc, y| Some(acc.map_or(y, |a| a.max(y))));

    if let (Some(top), Some(bottom)) = (top_y, bottom_y) {
        let span = f64::from(bottom - top);
        if span > 0.0 {
            for slot in &mut corrected {
                let Some(kp) = slot else { continue };

                // Points higher above the ankle line are foreshortened more;
                // scale their height from the bottom proportionally.
                let above = f64::from(bottom) - f64::from(kp.y);
                let vertical_factor = 1.0 + REAR_VERTICAL_GAIN * (above / span);
                kp.y = (f64::from(bottom) - above * vertical_factor) as f32;

                if kp.landmark == LeftShoulder {
                    kp.x -= REAR_SHOULDER_WIDENING;
                } else if kp.landmark == RightShoulder {
                    kp.x += REAR_SHOULDER_WIDENING;
                }
            }
        }
    }

    corrected
}

/// Side correction: exaggerate shoulder/hip offsets from the shoulder
/// midline to recover front/back separation lost in the projection.
fn correct_side(keypoints: &KeypointArray) -> KeypointArray {
    use BodyLandmark::{LeftHip, LeftShoulder, RightHip, RightShoulder};

    let (Some(ls), Some(rs)) = (
        keypoints[LeftShoulder as usize],
        keypoints[RightShoulder as usize],
    ) else {
        return *keypoints;
    };
    let midline_x = (ls.x + rs.x) / 2.0;

    let mut corrected = *keypoints;
    for lm in [LeftShoulder, RightShoulder, LeftHip, RightHip] {
        if let Some(kp) = &mut corrected[lm as usize] {
            let offset = kp.x - midline_x;
            kp.x += offset * SIDE_DEPTH_GAIN;
        }
    }

    corrected
}

/// Viewpoint resolution + correction as one session-owned step.
///
/// Holds the configured [`CameraViewpoint`]; `Auto` re-classifies every
/// frame and is never stored as an effective viewpoint.
#[derive(Debug, Clone, Default)]
pub struct ViewpointCorrector {
    camera: CameraViewpoint,
}

impl ViewpointCorrector {
    /// Creates a corrector for a configured camera viewpoint.
    #[must_use]
    pub fn new(camera: CameraViewpoint) -> Self {
        Self { camera }
    }

    /// Returns the configured camera viewpoint.
    #[must_use]
    pub fn camera(&self) -> CameraViewpoint {
        self.camera
    }

    /// Resolves the effective viewpoint for this frame and applies its
    /// correction.
    #[must_use]
    pub fn resolve_and_correct(&self, keypoints: &KeypointArray) -> (KeypointArray, Viewpoint) {
        let viewpoint = self
            .camera
            .fixed()
            .unwrap_or_else(|| classify_viewpoint(keypoints));
        (correct_for_viewpoint(keypoints, viewpoint), viewpoint)
    }
}
