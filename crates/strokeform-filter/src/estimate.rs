//! Structural inference of missing keypoints.
//!
//! When the model fails to detect a structurally-predictable landmark, a
//! plausible position is inferred from detected neighbors so downstream
//! analysis degrades instead of failing. Estimation runs in dependency
//! order — shoulders first, then elbows (which may hang off an estimated
//! shoulder), then hips.
//!
//! Every synthesized keypoint carries a confidence strictly below the
//! keypoints it was derived from, so consumers can always tell observed
//! from inferred values by confidence alone; the returned
//! [`EstimationOutcome`] additionally lists what was synthesized.

use strokeform_core::{BodyLandmark, Keypoint, KeypointArray};

/// Horizontal offset used when mirroring a lone detected shoulder, in
/// source-frame pixels.
const SHOULDER_MIRROR_OFFSET: f32 = 100.0;

/// Vertical drop from shoulder to the assumed elbow rest position when no
/// wrist is available to interpolate against.
const ELBOW_DROP_OFFSET: f32 = 60.0;

/// Confidence retained by a mirrored shoulder.
const SHOULDER_ATTENUATION: f32 = 0.8;

/// Confidence retained by a wrist-interpolated elbow.
const ELBOW_MIDPOINT_ATTENUATION: f32 = 0.9;

/// Confidence retained by a dropped elbow or an inferred hip.
const STRUCTURAL_ATTENUATION: f32 = 0.7;

/// Result of a missing-keypoint estimation pass.
#[derive(Debug, Clone)]
pub struct EstimationOutcome {
    /// The keypoint set with estimates filled in
    pub keypoints: KeypointArray,
    /// Landmarks synthesized by this pass, in estimation order
    pub synthesized: Vec<BodyLandmark>,
}

fn valid(kp: &Option<Keypoint>, threshold: f32) -> Option<&Keypoint> {
    kp.as_ref().filter(|kp| kp.is_valid_at(threshold))
}

/// Infers positions for undetected shoulders, elbows, and hips from
/// detected neighbors.
///
/// Pure function of one frame; the input is never mutated. Landmarks
/// already valid at `threshold` pass through untouched, and nothing is
/// inferred when neither shoulder is trustworthy — the shoulders anchor
/// every other estimate.
#[must_use]
pub fn estimate_missing(keypoints: &KeypointArray, threshold: f32) -> EstimationOutcome {
    use BodyLandmark::{
        LeftElbow, LeftHip, LeftShoulder, LeftWrist, Nose, RightElbow, RightHip, RightShoulder,
        RightWrist,
    };

    let mut result = *keypoints;
    let mut synthesized = Vec::new();

    let left_ok = valid(&keypoints[LeftShoulder as usize], threshold).is_some();
    let right_ok = valid(&keypoints[RightShoulder as usize], threshold).is_some();
    if !left_ok && !right_ok {
        return EstimationOutcome {
            keypoints: result,
            synthesized,
        };
    }

    // Shoulders: mirror the lone detected one across the body axis.
    if !left_ok {
        if let Some(rs) = valid(&keypoints[RightShoulder as usize], threshold) {
            result[LeftShoulder as usize] = Some(Keypoint::new(
                LeftShoulder,
                rs.x - SHOULDER_MIRROR_OFFSET,
                rs.y,
                rs.confidence.scaled(SHOULDER_ATTENUATION),
            ));
            synthesized.push(LeftShoulder);
        }
    }
    if !right_ok {
        if let Some(ls) = valid(&keypoints[LeftShoulder as usize], threshold) {
            result[RightShoulder as usize] = Some(Keypoint::new(
                RightShoulder,
                ls.x + SHOULDER_MIRROR_OFFSET,
                ls.y,
                ls.confidence.scaled(SHOULDER_ATTENUATION),
            ));
            synthesized.push(RightShoulder);
        }
    }

    // Elbows: midpoint of shoulder and wrist when the wrist is visible,
    // otherwise a fixed drop below the shoulder. The shoulder may itself
    // be an estimate from the step above.
    for (elbow, shoulder, wrist) in [
        (LeftElbow, LeftShoulder, LeftWrist),
        (RightElbow, RightShoulder, RightWrist),
    ] {
        if valid(&keypoints[elbow as usize], threshold).is_some() {
            continue;
        }
        let Some(sh) = valid(&result[shoulder as usize], threshold).copied() else {
            continue;
        };

        let estimated = if let Some(wr) = valid(&keypoints[wrist as usize], threshold) {
            let weakest = sh.confidence.value().min(wr.confidence.value());
            Keypoint::new(
                elbow,
                (sh.x + wr.x) / 2.0,
                (sh.y + wr.y) / 2.0,
                strokeform_core::Confidence::clamped(weakest * ELBOW_MIDPOINT_ATTENUATION),
            )
        } else {
            Keypoint::new(
                elbow,
                sh.x,
                sh.y + ELBOW_DROP_OFFSET,
                sh.confidence.scaled(STRUCTURAL_ATTENUATION),
            )
        };
        result[elbow as usize] = Some(estimated);
        synthesized.push(elbow);
    }

    // Hips: anchored on the shoulder midpoint, pushed down by the
    // nose-to-shoulder vertical distance. Needs the nose for torso scale
    // and both shoulders (observed or estimated) for the midline.
    if let (Some(nose), Some(ls), Some(rs)) = (
        valid(&keypoints[Nose as usize], threshold),
        valid(&result[LeftShoulder as usize], threshold).copied(),
        valid(&result[RightShoulder as usize], threshold).copied(),
    ) {
        let mid_x = (ls.x + rs.x) / 2.0;
        let mid_y = (ls.y + rs.y) / 2.0;
        let hip_y = mid_y + (mid_y - nose.y);
        let half_span = (rs.x - ls.x) / 2.0;

        for (hip, anchor, x) in [
            (LeftHip, &ls, mid_x - half_span),
            (RightHip, &rs, mid_x + half_span),
        ] {
            if valid(&keypoints[hip as usize], threshold).is_some() {
                continue;
            }
            result[hip as usize] = Some(Keypoint::new(
                hip,
                x,
                hip_y,
                anchor.confidence.scaled(STRUCTURAL_ATTENUATION),
            ));
            synthesized.push(hip);
        }
    }

    EstimationOutcome {
        keypoints: result,
        synthesized,
    }
}
