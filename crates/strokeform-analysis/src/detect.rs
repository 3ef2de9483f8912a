//! Stroke-type auto-detection.
//!
//! Two independent, confidence-scored heuristics:
//!
//! - [`detect_instant`] classifies from one frame's wrist/shoulder/elbow
//!   geometry and drives the surfaced stroke label.
//! - [`detect_trajectory`] classifies from the recent wrist trajectory in
//!   the motion history and also estimates the swing phase.
//!
//! Neither is authoritative over the other; they are two available signals
//! a caller may combine or expose separately. A detection is only surfaced
//! to the user at or above [`MIN_DETECTION_CONFIDENCE`] — below that the
//! UI must show an explicit "detecting" state, never a guess.

use serde::{Deserialize, Serialize};
use strokeform_core::{
    geometry, BodyLandmark, Keypoint, KeypointArray, StrokeType, STORE_CONFIDENCE_THRESHOLD,
};

use crate::history::MotionHistory;

/// Minimum confidence at which a detected stroke may be surfaced.
pub const MIN_DETECTION_CONFIDENCE: f32 = 0.7;

/// Snapshots consulted for trajectory classification.
const TRAJECTORY_WINDOW: usize = 20;

/// Minimum history length before trajectory detection is attempted.
const TRAJECTORY_MIN_HISTORY: usize = 10;

/// Minimum wrist samples for a usable trajectory.
const TRAJECTORY_MIN_SAMPLES: usize = 5;

/// Dominance factor: one axis must carry 1.5× the other's displacement to
/// be called horizontal- or vertical-dominant.
const AXIS_DOMINANCE: f64 = 1.5;

/// Minimum per-axis displacement (pixels) for a diagonal classification.
const DIAGONAL_MIN_DISPLACEMENT: f64 = 50.0;

/// An elbow bent less than this (degrees) reads as a swing preparation;
/// straighter reads as a punch/block.
const BENT_ELBOW_LIMIT: f64 = 160.0;

/// Result of instantaneous stroke classification.
///
/// `stroke == None` is the explicit "detecting" state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeDetection {
    /// The classified stroke, if any
    pub stroke: Option<StrokeType>,
    /// Classification confidence in [0, 1]
    pub confidence: f32,
}

impl StrokeDetection {
    /// The "still detecting" state.
    pub const DETECTING: Self = Self {
        stroke: None,
        confidence: 0.0,
    };

    /// Returns the stroke only if it is confident enough to show a user.
    #[must_use]
    pub fn surfaced(&self) -> Option<StrokeType> {
        if self.confidence >= MIN_DETECTION_CONFIDENCE {
            self.stroke
        } else {
            None
        }
    }
}

/// Phase of the swing inferred from recent wrist speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SwingPhase {
    /// Slow positioning before the swing
    Preparation,
    /// Peak-speed ball contact
    Impact,
    /// Deceleration after contact
    FollowThrough,
}

/// Result of trajectory-based stroke classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryDetection {
    /// The classified stroke, if the trajectory was decisive
    pub stroke: Option<StrokeType>,
    /// Classification confidence in [0, 1]
    pub confidence: f32,
    /// Swing phase, when recent velocity data exists
    pub phase: Option<SwingPhase>,
}

fn usable(kp: Option<&Keypoint>) -> Option<&Keypoint> {
    kp.filter(|kp| kp.is_valid_at(STORE_CONFIDENCE_THRESHOLD))
}

/// Classifies the stroke from one frame's geometry.
///
/// Requires wrists, shoulders, and elbows on both sides; anything less is
/// the "detecting" state at zero confidence.
#[must_use]
pub fn detect_instant(keypoints: &KeypointArray) -> StrokeDetection {
    use BodyLandmark::{
        LeftElbow, LeftShoulder, LeftWrist, RightElbow, RightShoulder, RightWrist,
    };

    let g = |lm: BodyLandmark| usable(keypoints[lm as usize].as_ref());

    let (Some(rw), Some(lw), Some(rs), Some(ls), Some(re), Some(le)) = (
        g(RightWrist),
        g(LeftWrist),
        g(RightShoulder),
        g(LeftShoulder),
        g(RightElbow),
        g(LeftElbow),
    ) else {
        return StrokeDetection::DETECTING;
    };

    let right_elbow_angle = geometry::angle_between(Some(rs), Some(re), Some(rw));
    let left_elbow_angle = geometry::angle_between(Some(ls), Some(le), Some(lw));
    let bent = |angle: Option<f64>| angle.is_some_and(|a| a < BENT_ELBOW_LIMIT);
    let straight = |angle: Option<f64>| angle.is_some_and(|a| a > BENT_ELBOW_LIMIT);

    // Both hands above the shoulders: the trophy position of a serve.
    if rw.y < rs.y && lw.y < ls.y {
        return StrokeDetection {
            stroke: Some(StrokeType::Serve),
            confidence: 0.8,
        };
    }

    // Racket hand outside its shoulder with a bent elbow: a ground-stroke
    // take-back, sided by which arm is loaded.
    if rw.x > rs.x && bent(right_elbow_angle) {
        return StrokeDetection {
            stroke: Some(StrokeType::Forehand),
            confidence: 0.75,
        };
    }
    if lw.x < ls.x && bent(left_elbow_angle) {
        return StrokeDetection {
            stroke: Some(StrokeType::Backhand),
            confidence: 0.75,
        };
    }

    // A near-straight arm with the wrist above the elbow: a volley punch.
    if (straight(right_elbow_angle) || straight(left_elbow_angle)) && (rw.y < re.y || lw.y < le.y) {
        return StrokeDetection {
            stroke: Some(StrokeType::Volley),
            confidence: 0.7,
        };
    }

    StrokeDetection::DETECTING
}

/// Classifies the stroke from the recent racket-wrist trajectory.
///
/// `current` selects which wrist is tracked (backhand loads the left arm)
/// and breaks ties for horizontal movement. Returns `None` until enough
/// history has accumulated.
#[must_use]
pub fn detect_trajectory(
    history: &MotionHistory,
    current: StrokeType,
) -> Option<TrajectoryDetection> {
    if history.len() < TRAJECTORY_MIN_HISTORY {
        return None;
    }

    let wrist = current.racket_wrist();
    let positions: Vec<(f64, f64)> = history
        .recent(TRAJECTORY_WINDOW)
        .filter_map(|s| s.keypoints[wrist as usize].as_ref())
        .map(|kp| (f64::from(kp.x), f64::from(kp.y)))
        .collect();

    let phase = swing_phase(history, wrist);

    if positions.len() < TRAJECTORY_MIN_SAMPLES {
        return Some(TrajectoryDetection {
            stroke: None,
            confidence: 0.0,
            phase,
        });
    }

    let mut horizontal = 0.0;
    let mut vertical = 0.0;
    for pair in positions.windows(2) {
        horizontal += pair[1].0 - pair[0].0;
        vertical += pair[1].1 - pair[0].1;
    }
    let h_mag = horizontal.abs();
    let v_mag = vertical.abs();

    let (stroke, confidence) = if h_mag > v_mag * AXIS_DOMINANCE {
        if horizontal > 0.0 {
            // Rightward sweep: the configured side's natural drive.
            let stroke = if current == StrokeType::Backhand {
                StrokeType::Backhand
            } else {
                StrokeType::Forehand
            };
            (Some(stroke), 0.7)
        } else {
            let stroke = if current == StrokeType::Backhand {
                StrokeType::Forehand
            } else {
                StrokeType::Backhand
            };
            (Some(stroke), 0.6)
        }
    } else if v_mag > h_mag * AXIS_DOMINANCE {
        if vertical < 0.0 {
            // Upward-dominant: serve or overhead.
            (Some(StrokeType::Serve), 0.8)
        } else {
            // Downward-dominant: a volley put-away.
            (Some(StrokeType::Volley), 0.6)
        }
    } else if h_mag > DIAGONAL_MIN_DISPLACEMENT && v_mag > DIAGONAL_MIN_DISPLACEMENT {
        if vertical < 0.0 && horizontal > 0.0 {
            (Some(StrokeType::Serve), 0.6)
        } else if vertical < 0.0 && horizontal < 0.0 {
            (Some(StrokeType::Backhand), 0.6)
        } else {
            (Some(current), 0.4)
        }
    } else {
        (None, 0.0)
    };

    Some(TrajectoryDetection {
        stroke,
        confidence,
        phase,
    })
}

/// Swing phase from the mean racket-wrist speed over the last few frames.
fn swing_phase(history: &MotionHistory, wrist: BodyLandmark) -> Option<SwingPhase> {
    let speeds: Vec<f64> = history
        .recent(5)
        .filter_map(|s| s.velocities[wrist as usize])
        .map(|v| v.speed)
        .collect();
    if speeds.is_empty() {
        return None;
    }

    let avg = speeds.iter().sum::<f64>() / speeds.len() as f64;
    Some(if avg < 50.0 {
        SwingPhase::Preparation
    } else if avg > 300.0 {
        SwingPhase::Impact
    } else {
        SwingPhase::FollowThrough
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strokeform_core::{Confidence, Timestamp, MAX_KEYPOINTS};

    fn set(frame: &mut KeypointArray, lm: BodyLandmark, x: f32, y: f32) {
        frame[lm as usize] = Some(Keypoint::new(lm, x, y, Confidence::new(0.9).unwrap()));
    }

    fn upper_body(
        rw: (f32, f32),
        lw: (f32, f32),
        re: (f32, f32),
        le: (f32, f32),
    ) -> KeypointArray {
        let mut frame: KeypointArray = [None; MAX_KEYPOINTS];
        set(&mut frame, BodyLandmark::RightShoulder, 400.0, 300.0);
        set(&mut frame, BodyLandmark::LeftShoulder, 300.0, 300.0);
        set(&mut frame, BodyLandmark::RightWrist, rw.0, rw.1);
        set(&mut frame, BodyLandmark::LeftWrist, lw.0, lw.1);
        set(&mut frame, BodyLandmark::RightElbow, re.0, re.1);
        set(&mut frame, BodyLandmark::LeftElbow, le.0, le.1);
        frame
    }

    #[test]
    fn both_wrists_overhead_is_serve() {
        let frame = upper_body(
            (420.0, 150.0),
            (280.0, 160.0),
            (430.0, 250.0),
            (270.0, 250.0),
        );
        let detection = detect_instant(&frame);
        assert_eq!(detection.stroke, Some(StrokeType::Serve));
        assert_eq!(detection.confidence, 0.8);
        assert_eq!(detection.surfaced(), Some(StrokeType::Serve));
    }

    #[test]
    fn loaded_right_arm_is_forehand() {
        // Wrist outside the right shoulder, elbow bent to ~90°.
        let frame = upper_body(
            (520.0, 380.0),
            (320.0, 400.0),
            (520.0, 300.0),
            (280.0, 380.0),
        );
        let detection = detect_instant(&frame);
        assert_eq!(detection.stroke, Some(StrokeType::Forehand));
        assert_eq!(detection.confidence, 0.75);
    }

    #[test]
    fn loaded_left_arm_is_backhand() {
        let frame = upper_body(
            (420.0, 400.0),
            (180.0, 380.0),
            (420.0, 380.0),
            (180.0, 300.0),
        );
        let detection = detect_instant(&frame);
        assert_eq!(detection.stroke, Some(StrokeType::Backhand));
        assert_eq!(detection.confidence, 0.75);
    }

    #[test]
    fn straight_arm_wrist_high_is_volley() {
        // Right arm fully extended (shoulder–elbow–wrist collinear) with the
        // wrist above the elbow, kept inside the shoulder so the forehand
        // branch does not fire; left arm hangs low so serve does not fire.
        let frame = upper_body(
            (320.0, 260.0),
            (310.0, 420.0),
            (360.0, 280.0),
            (290.0, 380.0),
        );
        let detection = detect_instant(&frame);
        assert_eq!(detection.stroke, Some(StrokeType::Volley));
        assert_eq!(detection.confidence, 0.7);
    }

    #[test]
    fn missing_keypoints_stay_detecting() {
        let mut frame = upper_body(
            (420.0, 150.0),
            (280.0, 160.0),
            (430.0, 250.0),
            (270.0, 250.0),
        );
        frame[BodyLandmark::LeftElbow as usize] = None;
        let detection = detect_instant(&frame);
        assert_eq!(detection, StrokeDetection::DETECTING);
        assert_eq!(detection.surfaced(), None);
    }

    #[test]
    fn sub_threshold_confidence_is_not_surfaced() {
        let low = StrokeDetection {
            stroke: Some(StrokeType::Volley),
            confidence: 0.4,
        };
        assert_eq!(low.surfaced(), None);
    }

    fn history_with_track(positions: &[(f32, f32)], wrist: BodyLandmark) -> MotionHistory {
        let mut history = MotionHistory::default();
        for (i, (x, y)) in positions.iter().enumerate() {
            let mut frame: KeypointArray = [None; MAX_KEYPOINTS];
            set(&mut frame, wrist, *x, *y);
            history.push(&frame, Timestamp::from_millis(i as i64 * 33));
        }
        history
    }

    #[test]
    fn downward_trajectory_classifies_volley() {
        // 20 frames moving purely downward (+y, x static).
        let track: Vec<(f32, f32)> = (0..20).map(|i| (400.0, 100.0 + i as f32 * 10.0)).collect();
        let history = history_with_track(&track, BodyLandmark::RightWrist);

        let detection = detect_trajectory(&history, StrokeType::Forehand).unwrap();
        assert_eq!(detection.stroke, Some(StrokeType::Volley));
        assert_eq!(detection.confidence, 0.6);
    }

    #[test]
    fn upward_trajectory_classifies_serve() {
        let track: Vec<(f32, f32)> = (0..20).map(|i| (400.0, 500.0 - i as f32 * 12.0)).collect();
        let history = history_with_track(&track, BodyLandmark::RightWrist);

        let detection = detect_trajectory(&history, StrokeType::Forehand).unwrap();
        assert_eq!(detection.stroke, Some(StrokeType::Serve));
        assert_eq!(detection.confidence, 0.8);
    }

    #[test]
    fn rightward_sweep_matches_configured_side() {
        let track: Vec<(f32, f32)> = (0..20).map(|i| (100.0 + i as f32 * 15.0, 400.0)).collect();

        let right = history_with_track(&track, BodyLandmark::RightWrist);
        let detection = detect_trajectory(&right, StrokeType::Forehand).unwrap();
        assert_eq!(detection.stroke, Some(StrokeType::Forehand));
        assert_eq!(detection.confidence, 0.7);

        let left = history_with_track(&track, BodyLandmark::LeftWrist);
        let detection = detect_trajectory(&left, StrokeType::Backhand).unwrap();
        assert_eq!(detection.stroke, Some(StrokeType::Backhand));
        assert_eq!(detection.confidence, 0.7);
    }

    #[test]
    fn up_left_diagonal_classifies_backhand() {
        let track: Vec<(f32, f32)> = (0..20)
            .map(|i| (500.0 - i as f32 * 5.0, 500.0 - i as f32 * 5.0))
            .collect();
        let history = history_with_track(&track, BodyLandmark::RightWrist);

        let detection = detect_trajectory(&history, StrokeType::Forehand).unwrap();
        assert_eq!(detection.stroke, Some(StrokeType::Backhand));
        assert_eq!(detection.confidence, 0.6);
    }

    #[test]
    fn short_history_yields_no_detection() {
        let track: Vec<(f32, f32)> = (0..5).map(|i| (400.0, 100.0 + i as f32 * 10.0)).collect();
        let history = history_with_track(&track, BodyLandmark::RightWrist);
        assert!(detect_trajectory(&history, StrokeType::Forehand).is_none());
    }

    #[test]
    fn phase_tracks_wrist_speed() {
        // 8 px per 33 ms ≈ 242 px/s: past preparation, short of impact.
        let track: Vec<(f32, f32)> = (0..20).map(|i| (400.0, 100.0 + i as f32 * 8.0)).collect();
        let history = history_with_track(&track, BodyLandmark::RightWrist);
        let detection = detect_trajectory(&history, StrokeType::Forehand).unwrap();
        assert_eq!(detection.phase, Some(SwingPhase::FollowThrough));

        // Near-static wrist: preparation.
        let slow: Vec<(f32, f32)> = (0..20).map(|i| (400.0, 100.0 + i as f32 * 0.5)).collect();
        let history = history_with_track(&slow, BodyLandmark::RightWrist);
        let detection = detect_trajectory(&history, StrokeType::Forehand).unwrap();
        assert_eq!(detection.phase, Some(SwingPhase::Preparation));
    }
}
