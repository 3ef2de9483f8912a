//! Per-stroke, per-viewpoint geometric feature extraction.
//!
//! Each stroke type reads a fixed, documented set of joint angles,
//! alignments, and distances from the corrected keypoints. A feature whose
//! geometry cannot be computed (missing joint, degenerate configuration) is
//! simply omitted from the map — downstream scoring substitutes a neutral
//! default so one missing joint never collapses the whole posture score.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strokeform_core::{
    geometry, BodyLandmark, Keypoint, KeypointArray, StrokeType, Viewpoint,
};

use crate::coverage::{is_valid, DetectionStatus};

/// Named geometric features, keyed stably for serialization and for the
/// probabilistic scorer's ideal-value tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeatureKind {
    /// Hip–shoulder–elbow take-back angle on the racket side
    ShoulderToElbowAngle,
    /// Shoulder-line inclination from vertical (signed)
    ShoulderAlignment,
    /// Knee-to-ankle distance over hip-to-ankle distance (smaller = deeper bend)
    KneeFlexionRatio,
    /// Shoulder–elbow–wrist angle on the racket side
    ElbowToWristAngle,
    /// Racket-side elbow angle (frontal-projection variant)
    ElbowAngle,
    /// Hip–knee–ankle angle on the racket side
    HipKneeAngle,
    /// Horizontal offset between shoulder span and hip span (torso rotation)
    ShoulderHipAlignment,
    /// Horizontal hip separation (weight transfer)
    CenterShift,
    /// Shoulder-to-wrist reach distance
    ShoulderToWristDistance,
    /// Mean of both knee angles
    AvgKneeAngle,
    /// Distance between the two wrists (two-handed grip compactness)
    HandsDistance,
    /// Upper-spine extension during the trophy position (not yet extracted)
    BackArch,
    /// Elbow height relative to the shoulder line (not yet extracted)
    ElbowHeight,
    /// Right shoulder–elbow–wrist angle from partial data
    RightArmAngle,
    /// Left shoulder–elbow–wrist angle from partial data
    LeftArmAngle,
    /// Right hip–knee–ankle angle from partial data
    RightLegAngle,
    /// Left hip–knee–ankle angle from partial data
    LeftLegAngle,
}

impl FeatureKind {
    /// Returns the feature's stable name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ShoulderToElbowAngle => "shoulderToElbowAngle",
            Self::ShoulderAlignment => "shoulderAlignment",
            Self::KneeFlexionRatio => "kneeFlexionRatio",
            Self::ElbowToWristAngle => "elbowToWristAngle",
            Self::ElbowAngle => "elbowAngle",
            Self::HipKneeAngle => "hipKneeAngle",
            Self::ShoulderHipAlignment => "shoulderHipAlignment",
            Self::CenterShift => "centerShift",
            Self::ShoulderToWristDistance => "shoulderToWristDistance",
            Self::AvgKneeAngle => "avgKneeAngle",
            Self::HandsDistance => "handsDistance",
            Self::BackArch => "backArch",
            Self::ElbowHeight => "elbowHeight",
            Self::RightArmAngle => "rightArmAngle",
            Self::LeftArmAngle => "leftArmAngle",
            Self::RightLegAngle => "rightLegAngle",
            Self::LeftLegAngle => "leftLegAngle",
        }
    }
}

/// Report attached to a degraded result when coverage is insufficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityIssue {
    /// Fraction of required landmarks detected
    pub detected: f64,
    /// Target fraction
    pub required: f64,
    /// Human-readable names of missing landmarks
    pub missing_parts: Vec<String>,
}

impl From<DetectionStatus> for VisibilityIssue {
    fn from(status: DetectionStatus) -> Self {
        Self {
            detected: status.detected_ratio,
            required: status.required_ratio,
            missing_parts: status.missing_parts,
        }
    }
}

/// Note attached when detection is complete enough to analyze but below
/// full confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionNote {
    /// Fraction of required landmarks detected
    pub ratio: f64,
    /// Operator-facing explanation
    pub message: String,
}

/// The per-tick feature map handed to scoring and reporting.
///
/// Either `features` is populated (full analysis) or `visibility_issue` is
/// set with whatever partial features were recoverable (degraded analysis) —
/// reporting collaborators must handle both shapes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MotionData {
    /// Extracted feature values
    pub features: BTreeMap<FeatureKind, f64>,
    /// Present when required-keypoint coverage was insufficient
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility_issue: Option<VisibilityIssue>,
    /// Present when coverage sufficed but detection was incomplete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection_confidence: Option<DetectionNote>,
}

impl MotionData {
    /// Returns a feature value, if it was extracted.
    #[must_use]
    pub fn get(&self, kind: FeatureKind) -> Option<f64> {
        self.features.get(&kind).copied()
    }
}

fn kp(keypoints: &KeypointArray, lm: BodyLandmark) -> Option<&Keypoint> {
    keypoints[lm as usize].as_ref()
}

fn insert_if(map: &mut BTreeMap<FeatureKind, f64>, kind: FeatureKind, value: Option<f64>) {
    if let Some(value) = value {
        map.insert(kind, value);
    }
}

/// Extracts the feature set for `stroke` as seen from `viewpoint`.
///
/// The keypoints must already be viewpoint-corrected; the forehand reads a
/// different feature set from rear-elevated footage than from a frontal
/// projection, while the remaining strokes share one set across viewpoints.
#[must_use]
pub fn extract_features(
    keypoints: &KeypointArray,
    stroke: StrokeType,
    viewpoint: Viewpoint,
) -> BTreeMap<FeatureKind, f64> {
    use BodyLandmark::{
        LeftAnkle, LeftElbow, LeftHip, LeftKnee, LeftShoulder, LeftWrist, RightAnkle, RightElbow,
        RightHip, RightKnee, RightShoulder, RightWrist,
    };

    let g = |lm: BodyLandmark| kp(keypoints, lm);
    let mut features = BTreeMap::new();

    match (stroke, viewpoint) {
        (StrokeType::Forehand, Viewpoint::RearElevated) => {
            insert_if(
                &mut features,
                FeatureKind::ShoulderToElbowAngle,
                geometry::angle_at(g(RightHip), g(RightShoulder), g(RightElbow)),
            );
            insert_if(
                &mut features,
                FeatureKind::ShoulderAlignment,
                geometry::inclination(g(LeftShoulder), g(RightShoulder)),
            );
            let knee_flexion = match (
                geometry::distance(g(RightKnee), g(RightAnkle)),
                geometry::distance(g(RightHip), g(RightAnkle)),
            ) {
                (Some(knee), Some(hip)) if hip > 0.0 => Some(knee / hip),
                _ => None,
            };
            insert_if(&mut features, FeatureKind::KneeFlexionRatio, knee_flexion);
            insert_if(
                &mut features,
                FeatureKind::ElbowToWristAngle,
                geometry::angle_at(g(RightShoulder), g(RightElbow), g(RightWrist)),
            );
        }
        (StrokeType::Forehand, _) => {
            insert_if(
                &mut features,
                FeatureKind::ElbowAngle,
                geometry::angle_at(g(RightShoulder), g(RightElbow), g(RightWrist)),
            );
            insert_if(
                &mut features,
                FeatureKind::HipKneeAngle,
                geometry::angle_at(g(RightHip), g(RightKnee), g(RightAnkle)),
            );
            if let (Some(rs), Some(ls), Some(rh), Some(lh)) =
                (g(RightShoulder), g(LeftShoulder), g(RightHip), g(LeftHip))
            {
                let rotation = f64::from((rs.x - ls.x) - (rh.x - lh.x)).abs();
                features.insert(FeatureKind::ShoulderHipAlignment, rotation);
            }
            if let (Some(rh), Some(lh)) = (g(RightHip), g(LeftHip)) {
                features.insert(FeatureKind::CenterShift, f64::from(rh.x - lh.x));
            }
        }
        (StrokeType::Backhand, _) => {
            insert_if(
                &mut features,
                FeatureKind::ShoulderToElbowAngle,
                geometry::angle_at(g(LeftHip), g(LeftShoulder), g(LeftElbow)),
            );
            insert_if(
                &mut features,
                FeatureKind::ShoulderAlignment,
                geometry::inclination(g(LeftShoulder), g(RightShoulder)),
            );
            insert_if(
                &mut features,
                FeatureKind::ElbowToWristAngle,
                geometry::angle_at(g(LeftShoulder), g(LeftElbow), g(LeftWrist)),
            );
            insert_if(
                &mut features,
                FeatureKind::HipKneeAngle,
                geometry::angle_at(g(LeftHip), g(LeftKnee), g(LeftAnkle)),
            );
            insert_if(
                &mut features,
                FeatureKind::HandsDistance,
                geometry::distance(g(LeftWrist), g(RightWrist)),
            );
        }
        (StrokeType::Serve, _) => {
            insert_if(
                &mut features,
                FeatureKind::ShoulderToElbowAngle,
                geometry::angle_at(g(RightHip), g(RightShoulder), g(RightElbow)),
            );
            insert_if(
                &mut features,
                FeatureKind::ShoulderAlignment,
                geometry::inclination(g(LeftShoulder), g(RightShoulder)),
            );
            insert_if(
                &mut features,
                FeatureKind::ElbowToWristAngle,
                geometry::angle_at(g(RightShoulder), g(RightElbow), g(RightWrist)),
            );
            insert_if(
                &mut features,
                FeatureKind::HipKneeAngle,
                geometry::angle_at(g(RightHip), g(RightKnee), g(RightAnkle)),
            );
        }
        (StrokeType::Volley, _) => {
            insert_if(
                &mut features,
                FeatureKind::ShoulderToElbowAngle,
                geometry::angle_at(g(RightHip), g(RightShoulder), g(RightElbow)),
            );
            insert_if(
                &mut features,
                FeatureKind::ShoulderToWristDistance,
                geometry::distance(g(RightShoulder), g(RightWrist)),
            );
            let knees: Vec<f64> = [
                geometry::angle_at(g(RightHip), g(RightKnee), g(RightAnkle)),
                geometry::angle_at(g(LeftHip), g(LeftKnee), g(LeftAnkle)),
            ]
            .into_iter()
            .flatten()
            .collect();
            if !knees.is_empty() {
                features.insert(
                    FeatureKind::AvgKneeAngle,
                    knees.iter().sum::<f64>() / knees.len() as f64,
                );
            }
            insert_if(
                &mut features,
                FeatureKind::ShoulderAlignment,
                geometry::inclination(g(LeftShoulder), g(RightShoulder)),
            );
        }
    }

    features
}

/// Extracts whatever per-landmark basic features the individually-valid
/// required keypoints allow — the degraded-analysis payload.
#[must_use]
pub fn extract_partial_features(
    keypoints: &KeypointArray,
    required: &[BodyLandmark],
    threshold: f32,
) -> BTreeMap<FeatureKind, f64> {
    use BodyLandmark::{
        LeftAnkle, LeftElbow, LeftHip, LeftKnee, LeftShoulder, LeftWrist, RightAnkle, RightElbow,
        RightHip, RightKnee, RightShoulder, RightWrist,
    };

    let g = |lm: BodyLandmark| kp(keypoints, lm);
    let ok = |lm: BodyLandmark| is_valid(g(lm), threshold);
    let mut features = BTreeMap::new();

    for landmark in required {
        if !ok(*landmark) {
            continue;
        }
        match landmark {
            BodyLandmark::RightShoulder | BodyLandmark::LeftShoulder => {
                if ok(RightShoulder) && ok(LeftShoulder) {
                    insert_if(
                        &mut features,
                        FeatureKind::ShoulderAlignment,
                        geometry::inclination(g(LeftShoulder), g(RightShoulder)),
                    );
                }
            }
            BodyLandmark::RightElbow | BodyLandmark::RightWrist => {
                if ok(RightShoulder) && ok(RightElbow) && ok(RightWrist) {
                    insert_if(
                        &mut features,
                        FeatureKind::RightArmAngle,
                        geometry::angle_at(g(RightShoulder), g(RightElbow), g(RightWrist)),
                    );
                }
            }
            BodyLandmark::LeftElbow | BodyLandmark::LeftWrist => {
                if ok(LeftShoulder) && ok(LeftElbow) && ok(LeftWrist) {
                    insert_if(
                        &mut features,
                        FeatureKind::LeftArmAngle,
                        geometry::angle_at(g(LeftShoulder), g(LeftElbow), g(LeftWrist)),
                    );
                }
            }
            BodyLandmark::RightKnee | BodyLandmark::RightAnkle => {
                if ok(RightHip) && ok(RightKnee) && ok(RightAnkle) {
                    insert_if(
                        &mut features,
                        FeatureKind::RightLegAngle,
                        geometry::angle_at(g(RightHip), g(RightKnee), g(RightAnkle)),
                    );
                }
            }
            BodyLandmark::LeftKnee | BodyLandmark::LeftAnkle => {
                if ok(LeftHip) && ok(LeftKnee) && ok(LeftAnkle) {
                    insert_if(
                        &mut features,
                        FeatureKind::LeftLegAngle,
                        geometry::angle_at(g(LeftHip), g(LeftKnee), g(LeftAnkle)),
                    );
                }
            }
            _ => {}
        }
    }

    features
}
