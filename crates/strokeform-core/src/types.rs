//! Core data types for the StrokeForm system.
//!
//! This module defines the fundamental data structures used throughout the
//! StrokeForm ecosystem for representing per-frame pose estimates and
//! analysis configuration.
//!
//! # Type Categories
//!
//! - **Pose Types**: [`Pose`], [`Keypoint`], [`BodyLandmark`]
//! - **Configuration Types**: [`StrokeType`], [`CameraViewpoint`], [`Viewpoint`]
//! - **Common Types**: [`Confidence`], [`Timestamp`], [`FrameId`]

use chrono::{DateTime, Utc};
use ndarray::Array1;
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::MAX_KEYPOINTS;

// =============================================================================
// Common Types
// =============================================================================

/// Unique identifier for an analysis result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameId(Uuid);

impl FrameId {
    /// Creates a new unique frame ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a frame ID from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for FrameId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// High-precision timestamp for frame data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timestamp {
    /// Seconds since Unix epoch
    pub seconds: i64,
    /// Nanoseconds within the second
    pub nanos: u32,
}

impl Timestamp {
    /// Creates a new timestamp from seconds and nanoseconds.
    #[must_use]
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    /// Creates a timestamp from the current time.
    #[must_use]
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            seconds: now.timestamp(),
            nanos: now.timestamp_subsec_nanos(),
        }
    }

    /// Creates a timestamp from milliseconds since Unix epoch.
    #[must_use]
    pub fn from_millis(millis: i64) -> Self {
        let seconds = millis.div_euclid(1000);
        let nanos = (millis.rem_euclid(1000) as u32) * 1_000_000;
        Self { seconds, nanos }
    }

    /// Creates a timestamp from a `DateTime<Utc>`.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self {
            seconds: dt.timestamp(),
            nanos: dt.timestamp_subsec_nanos(),
        }
    }

    /// Converts to `DateTime<Utc>`.
    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanos)
    }

    /// Returns the timestamp as total nanoseconds since epoch.
    #[must_use]
    pub fn as_nanos(&self) -> i128 {
        i128::from(self.seconds) * 1_000_000_000 + i128::from(self.nanos)
    }

    /// Returns the timestamp as total milliseconds since epoch.
    #[must_use]
    pub fn as_millis(&self) -> i64 {
        self.seconds * 1000 + i64::from(self.nanos) / 1_000_000
    }

    /// Returns the duration between two timestamps in seconds.
    #[must_use]
    pub fn duration_since(&self, earlier: &Self) -> f64 {
        let diff_nanos = self.as_nanos() - earlier.as_nanos();
        diff_nanos as f64 / 1_000_000_000.0
    }
}

/// Confidence score in the range [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Confidence(f32);

impl Confidence {
    /// Creates a new confidence value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range [0.0, 1.0].
    pub fn new(value: f32) -> CoreResult<Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(CoreError::validation(format!(
                "Confidence must be in [0.0, 1.0], got {value}"
            )));
        }
        Ok(Self(value))
    }

    /// Creates a confidence value, clamping out-of-range input to [0.0, 1.0].
    ///
    /// Non-finite input clamps to 0.0.
    #[must_use]
    pub fn clamped(value: f32) -> Self {
        if value.is_finite() {
            Self(value.clamp(0.0, 1.0))
        } else {
            Self(0.0)
        }
    }

    /// Returns the raw confidence value.
    #[must_use]
    pub fn value(&self) -> f32 {
        self.0
    }

    /// Returns `true` if the confidence is strictly above the given threshold.
    #[must_use]
    pub fn exceeds(&self, threshold: f32) -> bool {
        self.0 > threshold
    }

    /// Returns a confidence attenuated by `factor`, clamped to [0.0, 1.0].
    ///
    /// Used for provenance attenuation of estimated keypoints: an inferred
    /// keypoint always carries less confidence than its sources.
    #[must_use]
    pub fn scaled(&self, factor: f32) -> Self {
        Self::clamped(self.0 * factor)
    }

    /// Maximum confidence (1.0).
    pub const MAX: Self = Self(1.0);

    /// Minimum confidence (0.0).
    pub const MIN: Self = Self(0.0);
}

impl Default for Confidence {
    fn default() -> Self {
        Self(0.0)
    }
}

// =============================================================================
// Pose Types
// =============================================================================

/// Body landmarks following the COCO 17-keypoint format.
///
/// The discriminant values are the fixed index assignment every component
/// of the pipeline agrees on; [`Pose::keypoints`] is indexed by them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum BodyLandmark {
    /// Nose
    Nose = 0,
    /// Left eye
    LeftEye = 1,
    /// Right eye
    RightEye = 2,
    /// Left ear
    LeftEar = 3,
    /// Right ear
    RightEar = 4,
    /// Left shoulder
    LeftShoulder = 5,
    /// Right shoulder
    RightShoulder = 6,
    /// Left elbow
    LeftElbow = 7,
    /// Right elbow
    RightElbow = 8,
    /// Left wrist
    LeftWrist = 9,
    /// Right wrist
    RightWrist = 10,
    /// Left hip
    LeftHip = 11,
    /// Right hip
    RightHip = 12,
    /// Left knee
    LeftKnee = 13,
    /// Right knee
    RightKnee = 14,
    /// Left ankle
    LeftAnkle = 15,
    /// Right ankle
    RightAnkle = 16,
}

impl BodyLandmark {
    /// Returns all landmarks in index order.
    #[must_use]
    pub fn all() -> &'static [Self; MAX_KEYPOINTS] {
        &[
            Self::Nose,
            Self::LeftEye,
            Self::RightEye,
            Self::LeftEar,
            Self::RightEar,
            Self::LeftShoulder,
            Self::RightShoulder,
            Self::LeftElbow,
            Self::RightElbow,
            Self::LeftWrist,
            Self::RightWrist,
            Self::LeftHip,
            Self::RightHip,
            Self::LeftKnee,
            Self::RightKnee,
            Self::LeftAnkle,
            Self::RightAnkle,
        ]
    }

    /// Returns the landmark name as a string.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }

    /// Returns a human-readable name, used in missing-part reports.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left eye",
            Self::RightEye => "right eye",
            Self::LeftEar => "left ear",
            Self::RightEar => "right ear",
            Self::LeftShoulder => "left shoulder",
            Self::RightShoulder => "right shoulder",
            Self::LeftElbow => "left elbow",
            Self::RightElbow => "right elbow",
            Self::LeftWrist => "left wrist",
            Self::RightWrist => "right wrist",
            Self::LeftHip => "left hip",
            Self::RightHip => "right hip",
            Self::LeftKnee => "left knee",
            Self::RightKnee => "right knee",
            Self::LeftAnkle => "left ankle",
            Self::RightAnkle => "right ankle",
        }
    }

    /// Returns `true` if this is a face landmark.
    #[must_use]
    pub fn is_face(&self) -> bool {
        matches!(
            self,
            Self::Nose | Self::LeftEye | Self::RightEye | Self::LeftEar | Self::RightEar
        )
    }

    /// Returns `true` if this is an upper body landmark.
    #[must_use]
    pub fn is_upper_body(&self) -> bool {
        matches!(
            self,
            Self::LeftShoulder
                | Self::RightShoulder
                | Self::LeftElbow
                | Self::RightElbow
                | Self::LeftWrist
                | Self::RightWrist
        )
    }

    /// Returns `true` if this is a lower body landmark.
    #[must_use]
    pub fn is_lower_body(&self) -> bool {
        matches!(
            self,
            Self::LeftHip
                | Self::RightHip
                | Self::LeftKnee
                | Self::RightKnee
                | Self::LeftAnkle
                | Self::RightAnkle
        )
    }

    /// Returns the landmark mirrored across the body's left/right axis.
    ///
    /// The nose is its own mirror.
    #[must_use]
    pub fn mirrored(&self) -> Self {
        match self {
            Self::Nose => Self::Nose,
            Self::LeftEye => Self::RightEye,
            Self::RightEye => Self::LeftEye,
            Self::LeftEar => Self::RightEar,
            Self::RightEar => Self::LeftEar,
            Self::LeftShoulder => Self::RightShoulder,
            Self::RightShoulder => Self::LeftShoulder,
            Self::LeftElbow => Self::RightElbow,
            Self::RightElbow => Self::LeftElbow,
            Self::LeftWrist => Self::RightWrist,
            Self::RightWrist => Self::LeftWrist,
            Self::LeftHip => Self::RightHip,
            Self::RightHip => Self::LeftHip,
            Self::LeftKnee => Self::RightKnee,
            Self::RightKnee => Self::LeftKnee,
            Self::LeftAnkle => Self::RightAnkle,
            Self::RightAnkle => Self::LeftAnkle,
        }
    }
}

impl TryFrom<u8> for BodyLandmark {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Nose),
            1 => Ok(Self::LeftEye),
            2 => Ok(Self::RightEye),
            3 => Ok(Self::LeftEar),
            4 => Ok(Self::RightEar),
            5 => Ok(Self::LeftShoulder),
            6 => Ok(Self::RightShoulder),
            7 => Ok(Self::LeftElbow),
            8 => Ok(Self::RightElbow),
            9 => Ok(Self::LeftWrist),
            10 => Ok(Self::RightWrist),
            11 => Ok(Self::LeftHip),
            12 => Ok(Self::RightHip),
            13 => Ok(Self::LeftKnee),
            14 => Ok(Self::RightKnee),
            15 => Ok(Self::LeftAnkle),
            16 => Ok(Self::RightAnkle),
            _ => Err(CoreError::validation(format!(
                "Invalid body landmark index: {value}"
            ))),
        }
    }
}

/// One frame's keypoint slots, indexed by [`BodyLandmark`] discriminant.
///
/// This is the working representation the filtering and analysis stages
/// pass between each other; [`Pose`] wraps it with the model's overall
/// score.
pub type KeypointArray = [Option<Keypoint>; MAX_KEYPOINTS];

/// A single body keypoint with position and confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keypoint {
    /// Which landmark this keypoint represents
    pub landmark: BodyLandmark,
    /// X coordinate in source-frame pixels
    pub x: f32,
    /// Y coordinate in source-frame pixels (grows downward)
    pub y: f32,
    /// Detection confidence
    pub confidence: Confidence,
}

impl Keypoint {
    /// Creates a new keypoint.
    #[must_use]
    pub fn new(landmark: BodyLandmark, x: f32, y: f32, confidence: Confidence) -> Self {
        Self {
            landmark,
            x,
            y,
            confidence,
        }
    }

    /// Returns the 2D position as a tuple.
    #[must_use]
    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    /// Returns `true` if the keypoint's confidence is strictly above
    /// `threshold` — the validity contract every consumer shares.
    #[must_use]
    pub fn is_valid_at(&self, threshold: f32) -> bool {
        self.confidence.exceeds(threshold)
    }

    /// Calculates the Euclidean distance to another keypoint.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.hypot(dy)
    }
}

/// One detected subject's full keypoint set for one frame.
///
/// `keypoints` is indexed by [`BodyLandmark`] discriminant; a `None` slot
/// means the model produced nothing for that landmark. At most one pose is
/// analyzed per frame (single-subject constraint).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// All keypoints, indexed by landmark
    pub keypoints: [Option<Keypoint>; MAX_KEYPOINTS],
    /// Overall pose confidence reported by the model
    pub score: Confidence,
}

impl Pose {
    /// Creates a new empty pose.
    #[must_use]
    pub fn new() -> Self {
        Self {
            keypoints: [None; MAX_KEYPOINTS],
            score: Confidence::MIN,
        }
    }

    /// Sets a keypoint at its landmark's slot.
    pub fn set_keypoint(&mut self, keypoint: Keypoint) {
        self.keypoints[keypoint.landmark as usize] = Some(keypoint);
    }

    /// Gets a keypoint by landmark.
    #[must_use]
    pub fn keypoint(&self, landmark: BodyLandmark) -> Option<&Keypoint> {
        self.keypoints[landmark as usize].as_ref()
    }

    /// Returns the number of keypoints valid at `threshold`.
    #[must_use]
    pub fn valid_keypoint_count(&self, threshold: f32) -> usize {
        self.keypoints
            .iter()
            .filter(|kp| kp.as_ref().is_some_and(|kp| kp.is_valid_at(threshold)))
            .count()
    }

    /// Converts keypoints to a flat array `[x0, y0, conf0, x1, y1, conf1, ...]`
    /// for model interop; absent keypoints export as zeros.
    #[must_use]
    pub fn to_flat_array(&self) -> Array1<f32> {
        let mut arr = Array1::zeros(MAX_KEYPOINTS * 3);
        for (i, kp_opt) in self.keypoints.iter().enumerate() {
            if let Some(kp) = kp_opt {
                arr[i * 3] = kp.x;
                arr[i * 3 + 1] = kp.y;
                arr[i * 3 + 2] = kp.confidence.value();
            }
        }
        arr
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Configuration Types
// =============================================================================

/// Configured camera viewpoint, including the `Auto` request.
///
/// `Auto` triggers runtime classification; it is never persisted as the
/// effective viewpoint past that point (see [`Viewpoint`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum CameraViewpoint {
    /// Camera behind and above the court (the most common recording setup)
    #[default]
    RearElevated,
    /// Camera at court side
    Side,
    /// Camera facing the player
    Front,
    /// Classify the viewpoint at runtime from the keypoint pattern
    Auto,
}

impl CameraViewpoint {
    /// Returns the fixed effective viewpoint, or `None` for `Auto`.
    #[must_use]
    pub fn fixed(&self) -> Option<Viewpoint> {
        match self {
            Self::RearElevated => Some(Viewpoint::RearElevated),
            Self::Side => Some(Viewpoint::Side),
            Self::Front => Some(Viewpoint::Front),
            Self::Auto => None,
        }
    }
}

/// Effective camera viewpoint after any auto-classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Viewpoint {
    /// Camera behind and above the court
    #[default]
    RearElevated,
    /// Camera at court side
    Side,
    /// Camera facing the player
    Front,
}

impl Viewpoint {
    /// Returns the viewpoint name as a string.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::RearElevated => "rear-elevated",
            Self::Side => "side",
            Self::Front => "front",
        }
    }
}

/// Tennis stroke type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StrokeType {
    /// Forehand ground stroke
    #[default]
    Forehand,
    /// Backhand ground stroke
    Backhand,
    /// Overhead serve
    Serve,
    /// Net volley
    Volley,
}

impl StrokeType {
    /// Returns all stroke types.
    #[must_use]
    pub fn all() -> &'static [Self; 4] {
        &[Self::Forehand, Self::Backhand, Self::Serve, Self::Volley]
    }

    /// Returns the stroke name as a string.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Forehand => "forehand",
            Self::Backhand => "backhand",
            Self::Serve => "serve",
            Self::Volley => "volley",
        }
    }

    /// Returns the wrist landmark tracked for this stroke.
    ///
    /// Backhand is analyzed on the left arm; all other strokes on the right.
    /// History-dependent scoring and trajectory detection both track this
    /// landmark.
    #[must_use]
    pub fn racket_wrist(&self) -> BodyLandmark {
        match self {
            Self::Backhand => BodyLandmark::LeftWrist,
            _ => BodyLandmark::RightWrist,
        }
    }

    /// Returns the elbow landmark paired with [`Self::racket_wrist`].
    #[must_use]
    pub fn racket_elbow(&self) -> BodyLandmark {
        match self {
            Self::Backhand => BodyLandmark::LeftElbow,
            _ => BodyLandmark::RightElbow,
        }
    }
}

impl std::fmt::Display for StrokeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
