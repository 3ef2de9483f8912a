//! Keypoint validity and completeness policy.
//!
//! Which landmarks a stroke/viewpoint combination needs is a static lookup
//! table, auditable as data. Whether analysis may proceed is a deliberately
//! disjunctive rule: either enough of the required set is visible, or enough
//! of the core upper-body joints are — a player whose ankles are cropped out
//! of frame can still have their swing analyzed.

use serde::{Deserialize, Serialize};
use strokeform_core::{BodyLandmark, Keypoint, KeypointArray, StrokeType, Viewpoint};

use BodyLandmark::{
    LeftElbow, LeftHip, LeftKnee, LeftShoulder, LeftWrist, RightAnkle, RightElbow, RightHip,
    RightKnee, RightShoulder, RightWrist,
};

/// The joints that matter most for stroke analysis: both sides' shoulders,
/// elbows, and wrists.
pub const CORE_LANDMARKS: [BodyLandmark; 6] = [
    RightShoulder,
    RightElbow,
    RightWrist,
    LeftShoulder,
    LeftElbow,
    LeftWrist,
];

/// Minimum fraction of required landmarks for full analysis.
const MIN_REQUIRED_RATIO: f64 = 0.5;

/// Minimum fraction of required core landmarks for full analysis.
const MIN_CORE_RATIO: f64 = 0.4;

/// Detection ratio reported as the target in status reports.
const TARGET_DETECTION_RATIO: f64 = 0.6;

/// Returns the landmarks required to analyze `stroke` from `viewpoint`.
///
/// Rear-elevated footage never requires face landmarks (they are behind the
/// player); side footage trades ankles for the off-side shoulder.
#[must_use]
pub fn required_landmarks(stroke: StrokeType, viewpoint: Viewpoint) -> &'static [BodyLandmark; 6] {
    match viewpoint {
        Viewpoint::RearElevated => match stroke {
            StrokeType::Forehand => &[RightShoulder, RightElbow, RightWrist, RightHip, RightKnee, RightAnkle],
            StrokeType::Backhand => &[LeftShoulder, RightShoulder, LeftElbow, LeftWrist, LeftHip, LeftKnee],
            StrokeType::Serve => &[LeftShoulder, RightShoulder, RightElbow, RightWrist, LeftHip, RightHip],
            StrokeType::Volley => &[LeftShoulder, RightShoulder, RightElbow, RightWrist, LeftKnee, RightKnee],
        },
        Viewpoint::Side => match stroke {
            StrokeType::Forehand => &[LeftShoulder, RightShoulder, RightElbow, RightWrist, RightHip, RightKnee],
            StrokeType::Backhand => &[LeftShoulder, RightShoulder, LeftElbow, LeftWrist, LeftHip, LeftKnee],
            StrokeType::Serve => &[LeftShoulder, RightShoulder, RightElbow, RightWrist, RightHip, RightKnee],
            StrokeType::Volley => &[RightShoulder, RightElbow, RightWrist, RightHip, RightKnee, RightAnkle],
        },
        Viewpoint::Front => match stroke {
            StrokeType::Forehand => &[RightShoulder, RightElbow, RightWrist, RightHip, RightKnee, RightAnkle],
            StrokeType::Backhand => &[LeftShoulder, RightShoulder, LeftElbow, LeftWrist, LeftHip, LeftKnee],
            StrokeType::Serve => &[LeftShoulder, RightShoulder, RightElbow, RightWrist, LeftHip, RightHip],
            StrokeType::Volley => &[LeftShoulder, RightShoulder, RightElbow, RightWrist, LeftKnee, RightKnee],
        },
    }
}

/// Returns `true` if the keypoint is present and valid at `threshold`.
#[must_use]
pub fn is_valid(keypoint: Option<&Keypoint>, threshold: f32) -> bool {
    keypoint.is_some_and(|kp| kp.is_valid_at(threshold))
}

fn valid_fraction(keypoints: &KeypointArray, landmarks: &[BodyLandmark], threshold: f32) -> f64 {
    if landmarks.is_empty() {
        return 0.0;
    }
    let valid = landmarks
        .iter()
        .filter(|lm| is_valid(keypoints[**lm as usize].as_ref(), threshold))
        .count();
    valid as f64 / landmarks.len() as f64
}

/// Returns `true` if enough of `required` is visible for full analysis.
///
/// Passes when at least half of the required landmarks are individually
/// valid, OR when at least 40% of the required core upper-body joints are —
/// peripheral joints (e.g. ankles) being out of frame must not block
/// analysis of a visible swing.
#[must_use]
pub fn has_required_coverage(
    keypoints: &KeypointArray,
    required: &[BodyLandmark],
    threshold: f32,
) -> bool {
    let required_ratio = valid_fraction(keypoints, required, threshold);
    if required_ratio >= MIN_REQUIRED_RATIO {
        return true;
    }

    let required_core: Vec<BodyLandmark> = required
        .iter()
        .copied()
        .filter(|lm| CORE_LANDMARKS.contains(lm))
        .collect();
    if required_core.is_empty() {
        return false;
    }
    valid_fraction(keypoints, &required_core, threshold) >= MIN_CORE_RATIO
}

/// Detection-state report driving partial-result output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionStatus {
    /// Fraction of required landmarks currently valid
    pub detected_ratio: f64,
    /// The target fraction reports are measured against
    pub required_ratio: f64,
    /// Human-readable names of required landmarks that are missing
    pub missing_parts: Vec<String>,
}

/// Computes detected/required ratios and the list of missing body parts.
#[must_use]
pub fn detection_status(
    keypoints: &KeypointArray,
    required: &[BodyLandmark],
    threshold: f32,
) -> DetectionStatus {
    let detected_ratio = valid_fraction(keypoints, required, threshold);

    let missing_parts = required
        .iter()
        .filter(|lm| !lm.is_face() && !is_valid(keypoints[**lm as usize].as_ref(), threshold))
        .map(|lm| lm.display_name().to_owned())
        .collect();

    DetectionStatus {
        detected_ratio,
        required_ratio: TARGET_DETECTION_RATIO,
        missing_parts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strokeform_core::{Confidence, MAX_KEYPOINTS};

    const THRESHOLD: f32 = 0.15;

    fn frame_with(landmarks: &[BodyLandmark]) -> KeypointArray {
        let mut frame: KeypointArray = [None; MAX_KEYPOINTS];
        for lm in landmarks {
            frame[*lm as usize] = Some(Keypoint::new(
                *lm,
                100.0,
                100.0,
                Confidence::new(0.8).unwrap(),
            ));
        }
        frame
    }

    #[test]
    fn table_covers_every_combination() {
        for stroke in StrokeType::all() {
            for viewpoint in [Viewpoint::RearElevated, Viewpoint::Side, Viewpoint::Front] {
                let required = required_landmarks(*stroke, viewpoint);
                assert_eq!(required.len(), 6);
                // Rear-elevated footage can never require face landmarks.
                if viewpoint == Viewpoint::RearElevated {
                    assert!(required.iter().all(|lm| !lm.is_face()));
                }
            }
        }
    }

    #[test]
    fn five_of_six_required_passes_without_ankle() {
        // Forehand from rear-elevated: shoulder, elbow, wrist, hip, knee
        // visible, ankle missing — the ≥50% rule passes.
        let frame = frame_with(&[RightShoulder, RightElbow, RightWrist, RightHip, RightKnee]);
        let required = required_landmarks(StrokeType::Forehand, Viewpoint::RearElevated);
        assert!(has_required_coverage(&frame, required, THRESHOLD));
    }

    #[test]
    fn core_rule_rescues_upper_body_only_detection() {
        // Only shoulder and elbow of the required set: 2/6 < 50%, but 2/3
        // of the required core joints clears the 40% core rule.
        let frame = frame_with(&[RightShoulder, RightElbow]);
        let required = required_landmarks(StrokeType::Forehand, Viewpoint::RearElevated);
        assert!(has_required_coverage(&frame, required, THRESHOLD));
    }

    #[test]
    fn lower_body_only_detection_fails() {
        let frame = frame_with(&[RightHip, RightKnee]);
        let required = required_landmarks(StrokeType::Forehand, Viewpoint::RearElevated);
        assert!(!has_required_coverage(&frame, required, THRESHOLD));
    }

    #[test]
    fn detection_status_names_missing_parts() {
        let frame = frame_with(&[RightShoulder, RightElbow]);
        let required = required_landmarks(StrokeType::Forehand, Viewpoint::RearElevated);
        let status = detection_status(&frame, required, THRESHOLD);

        assert!((status.detected_ratio - 2.0 / 6.0).abs() < 1e-9);
        assert_eq!(status.required_ratio, 0.6);
        assert_eq!(
            status.missing_parts,
            vec!["right wrist", "right hip", "right knee", "right ankle"]
        );
    }

    #[test]
    fn full_detection_reports_nothing_missing() {
        let required = required_landmarks(StrokeType::Serve, Viewpoint::RearElevated);
        let frame = frame_with(required);
        let status = detection_status(&frame, required, THRESHOLD);
        assert_eq!(status.detected_ratio, 1.0);
        assert!(status.missing_parts.is_empty());
    }

    #[test]
    fn is_valid_uses_strict_threshold() {
        let kp = Keypoint::new(RightWrist, 0.0, 0.0, Confidence::new(0.15).unwrap());
        assert!(!is_valid(Some(&kp), 0.15));
        assert!(is_valid(Some(&kp), 0.1));
        assert!(!is_valid(None, 0.0));
    }
}
