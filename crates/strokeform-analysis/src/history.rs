//! Bounded rolling window of recent motion state.
//!
//! Each analysis frame appends one [`MotionSnapshot`] holding the filtered
//! keypoints worth remembering, derived joint angles, and per-landmark
//! velocities against the previous snapshot. The window is a ring: once
//! capacity is reached the oldest snapshot is evicted.
//!
//! Consumers only ever read fixed-size suffixes of the window — the last 5
//! snapshots for stability, 10 for movement flow, 20 for trajectory
//! detection.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use strokeform_core::{
    geometry, BodyLandmark, KeypointArray, Resettable, Timestamp, MAX_KEYPOINTS,
    STORE_CONFIDENCE_THRESHOLD,
};

/// Default window capacity: about two seconds of 30 fps footage.
pub const DEFAULT_CAPACITY: usize = 60;

/// The documented "short" window configuration.
pub const SHORT_CAPACITY: usize = 30;

/// Minimum inter-frame interval for velocity computation, in seconds.
/// Below this the position delta is dominated by estimation noise.
const MIN_VELOCITY_INTERVAL: f64 = 0.016;

/// Landmarks tracked across frames. Face detail beyond the nose carries no
/// stroke information and is not worth remembering.
pub const IMPORTANT_LANDMARKS: [BodyLandmark; 11] = [
    BodyLandmark::RightWrist,
    BodyLandmark::LeftWrist,
    BodyLandmark::RightElbow,
    BodyLandmark::LeftElbow,
    BodyLandmark::RightShoulder,
    BodyLandmark::LeftShoulder,
    BodyLandmark::RightHip,
    BodyLandmark::LeftHip,
    BodyLandmark::RightKnee,
    BodyLandmark::LeftKnee,
    BodyLandmark::Nose,
];

/// Instantaneous velocity of one landmark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    /// Speed in pixels per second
    pub speed: f64,
    /// Direction in radians (`atan2(dy, dx)`; y grows downward)
    pub direction: f64,
}

/// Joint angles derived at snapshot time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JointAngles {
    /// Right elbow angle (shoulder–elbow–wrist), degrees
    pub right_elbow: Option<f64>,
    /// Left elbow angle (shoulder–elbow–wrist), degrees
    pub left_elbow: Option<f64>,
    /// Shoulder-line direction (left → right shoulder), degrees
    pub shoulder_alignment: Option<f64>,
}

/// One frame's remembered motion state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionSnapshot {
    /// When the frame was captured
    pub timestamp: Timestamp,
    /// Important landmarks that cleared the storage confidence floor
    pub keypoints: KeypointArray,
    /// Derived joint angles
    pub angles: JointAngles,
    /// Per-landmark velocity against the previous snapshot
    pub velocities: [Option<Velocity>; MAX_KEYPOINTS],
}

/// Bounded FIFO of recent motion snapshots.
///
/// Exactly one exists per analysis session — switching stroke type does not
/// reset it, only changes which derived features are read from it. Lazily
/// usable from empty; cleared on session reset.
#[derive(Debug, Clone)]
pub struct MotionHistory {
    snapshots: VecDeque<MotionSnapshot>,
    capacity: usize,
}

impl MotionHistory {
    /// Creates a history with the given capacity (clamped to at least 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            snapshots: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Returns the configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of stored snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Returns `true` if no snapshots are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Returns the most recent snapshot.
    #[must_use]
    pub fn last(&self) -> Option<&MotionSnapshot> {
        self.snapshots.back()
    }

    /// Iterates the last `n` snapshots in chronological order.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &MotionSnapshot> {
        let skip = self.snapshots.len().saturating_sub(n);
        self.snapshots.iter().skip(skip)
    }

    /// Appends one frame of filtered keypoints.
    ///
    /// Only [`IMPORTANT_LANDMARKS`] at or above the storage confidence floor
    /// are remembered. Velocities are computed against the previous snapshot
    /// only when the inter-frame interval is long enough to be meaningful.
    /// Evicts the oldest snapshot beyond capacity.
    pub fn push(&mut self, keypoints: &KeypointArray, timestamp: Timestamp) {
        let mut stored: KeypointArray = [None; MAX_KEYPOINTS];
        for landmark in IMPORTANT_LANDMARKS {
            if let Some(kp) = &keypoints[landmark as usize] {
                if kp.confidence.value() >= STORE_CONFIDENCE_THRESHOLD {
                    stored[landmark as usize] = Some(*kp);
                }
            }
        }

        let velocities = self.compute_velocities(&stored, timestamp);
        let angles = derive_angles(&stored);

        self.snapshots.push_back(MotionSnapshot {
            timestamp,
            keypoints: stored,
            angles,
            velocities,
        });

        while self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
        }
    }

    fn compute_velocities(
        &self,
        stored: &KeypointArray,
        timestamp: Timestamp,
    ) -> [Option<Velocity>; MAX_KEYPOINTS] {
        let mut velocities = [None; MAX_KEYPOINTS];
        let Some(prev) = self.snapshots.back() else {
            return velocities;
        };

        let delta = timestamp.duration_since(&prev.timestamp);
        if delta <= MIN_VELOCITY_INTERVAL {
            return velocities;
        }

        for landmark in IMPORTANT_LANDMARKS {
            let idx = landmark as usize;
            let (Some(cur), Some(old)) = (&stored[idx], &prev.keypoints[idx]) else {
                continue;
            };
            let dx = f64::from(cur.x - old.x);
            let dy = f64::from(cur.y - old.y);
            velocities[idx] = Some(Velocity {
                speed: dx.hypot(dy) / delta,
                direction: dy.atan2(dx),
            });
        }

        velocities
    }
}

impl Default for MotionHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl Resettable for MotionHistory {
    fn reset(&mut self) {
        self.snapshots.clear();
    }
}

fn derive_angles(stored: &KeypointArray) -> JointAngles {
    use BodyLandmark::{
        LeftElbow, LeftShoulder, LeftWrist, RightElbow, RightShoulder, RightWrist,
    };

    let kp = |lm: BodyLandmark| stored[lm as usize].as_ref();

    let shoulder_alignment = match (kp(LeftShoulder), kp(RightShoulder)) {
        (Some(ls), Some(rs)) => {
            let dx = f64::from(rs.x - ls.x);
            let dy = f64::from(rs.y - ls.y);
            Some(dy.atan2(dx).to_degrees())
        }
        _ => None,
    };

    JointAngles {
        right_elbow: geometry::angle_at(kp(RightShoulder), kp(RightElbow), kp(RightWrist)),
        left_elbow: geometry::angle_at(kp(LeftShoulder), kp(LeftElbow), kp(LeftWrist)),
        shoulder_alignment,
    }
}
