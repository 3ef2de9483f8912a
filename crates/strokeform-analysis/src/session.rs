//! The per-session analysis pipeline.
//!
//! [`AnalysisSession`] owns every piece of session-scoped state — the
//! temporal smoother, the Kalman bank, the motion history, the stroke
//! selection, and the last result — and runs one full analysis cycle per
//! frame:
//!
//! smoothing → missing-keypoint estimation → history update → (throttled)
//! viewpoint correction → coverage check → feature extraction → scoring.
//!
//! Sessions are independent: two videos analyzed concurrently simply own
//! two sessions. All state mutation happens on the single caller's
//! execution path; no locking is required as long as that invariant holds.
//!
//! Analysis output is throttled (default every 500 ms) independently of the
//! frame rate: `process_frame` still returns conditioned keypoints every
//! frame for rendering, while `analysis` only refreshes on update ticks.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use strokeform_core::{
    CameraViewpoint, FrameId, KeypointArray, Pose, PoseSourceError, Resettable, StrokeType,
    Timestamp, Viewpoint, DEFAULT_CONFIDENCE_THRESHOLD, SMOOTHING_CONFIDENCE_FLOOR,
    STORE_CONFIDENCE_THRESHOLD,
};
use strokeform_filter::{
    estimate_missing, KalmanBank, KalmanConfig, TemporalSmoother, TemporalSmootherConfig,
    ViewpointCorrector,
};

use crate::coverage::{detection_status, has_required_coverage, required_landmarks};
use crate::detect::{detect_instant, detect_trajectory, StrokeDetection, TrajectoryDetection};
use crate::features::{
    extract_features, extract_partial_features, DetectionNote, MotionData,
};
use crate::history::{MotionHistory, DEFAULT_CAPACITY};
use crate::scoring::{
    acceleration_score, compound_score, movement_flow_score, posture_score, probabilistic_score,
    stability_score, velocity_score, ComponentScores, ScorePolicy,
};
use crate::AnalysisError;

/// Score reported when required-keypoint coverage is insufficient.
pub const DEGRADED_SCORE: u8 = 20;

/// Minimum valid keypoints (at the storage floor) for a frame to replace
/// the previous analysis.
const MIN_FRAME_KEYPOINTS: usize = 6;

/// Detection ratio under which a confidence note is attached to the result.
const DETECTION_NOTE_RATIO: f64 = 0.9;

/// How the analyzed stroke type is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeSelection {
    /// Analyze a fixed, user-selected stroke
    Manual(StrokeType),
    /// Follow the instantaneous auto-detector
    Auto,
}

impl Default for StrokeSelection {
    fn default() -> Self {
        Self::Manual(StrokeType::Forehand)
    }
}

/// Configuration for an [`AnalysisSession`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Stroke selection mode
    pub stroke: StrokeSelection,
    /// Configured camera viewpoint (`Auto` classifies per frame)
    pub camera: CameraViewpoint,
    /// Keypoint validity threshold for analysis decisions
    pub validity_threshold: f32,
    /// Confidence floor below which filters pass keypoints through
    pub smoothing_floor: f32,
    /// Minimum interval between analysis updates, in milliseconds
    pub update_interval_ms: u64,
    /// Motion-history window capacity, in frames
    pub history_capacity: usize,
    /// Which overall scorer the reported score comes from
    pub score_policy: ScorePolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stroke: StrokeSelection::default(),
            camera: CameraViewpoint::default(),
            validity_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            smoothing_floor: SMOOTHING_CONFIDENCE_FLOOR,
            update_interval_ms: 500,
            history_capacity: DEFAULT_CAPACITY,
            score_policy: ScorePolicy::default(),
        }
    }
}

impl SessionConfig {
    /// Create a new config builder.
    #[must_use]
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::new()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a threshold is out of range, the update interval
    /// is zero, or the history capacity is zero.
    pub fn validate(&self) -> crate::Result<()> {
        if !(0.0..1.0).contains(&self.validity_threshold) {
            return Err(AnalysisError::InvalidConfig(format!(
                "validity_threshold must be in [0.0, 1.0), got {}",
                self.validity_threshold
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing_floor) {
            return Err(AnalysisError::InvalidConfig(format!(
                "smoothing_floor must be in [0.0, 1.0), got {}",
                self.smoothing_floor
            )));
        }
        if self.update_interval_ms == 0 {
            return Err(AnalysisError::InvalidConfig(
                "update_interval_ms must be positive".into(),
            ));
        }
        if self.history_capacity == 0 {
            return Err(AnalysisError::InvalidConfig(
                "history_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
        }
    }

    /// Set the stroke selection mode.
    #[must_use]
    pub fn stroke(mut self, stroke: StrokeSelection) -> Self {
        self.config.stroke = stroke;
        self
    }

    /// Set the configured camera viewpoint.
    #[must_use]
    pub fn camera(mut self, camera: CameraViewpoint) -> Self {
        self.config.camera = camera;
        self
    }

    /// Set the keypoint validity threshold.
    #[must_use]
    pub fn validity_threshold(mut self, threshold: f32) -> Self {
        self.config.validity_threshold = threshold;
        self
    }

    /// Set the filter bypass floor.
    #[must_use]
    pub fn smoothing_floor(mut self, floor: f32) -> Self {
        self.config.smoothing_floor = floor;
        self
    }

    /// Set the analysis update interval.
    #[must_use]
    pub fn update_interval_ms(mut self, interval: u64) -> Self {
        self.config.update_interval_ms = interval;
        self
    }

    /// Set the motion-history capacity.
    #[must_use]
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.config.history_capacity = capacity;
        self
    }

    /// Set the reported-score policy.
    #[must_use]
    pub fn score_policy(mut self, policy: ScorePolicy) -> Self {
        self.config.score_policy = policy;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> SessionConfig {
        self.config
    }
}

/// One throttled analysis update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Unique identifier for this result
    pub id: FrameId,
    /// When the analyzed frame was captured
    pub timestamp: Timestamp,
    /// The stroke that was analyzed
    pub stroke: StrokeType,
    /// The effective viewpoint the analysis assumed
    pub viewpoint: Viewpoint,
    /// Extracted features, or the visibility report on degraded results
    pub motion_data: MotionData,
    /// The reported overall score, 0–100
    pub score: u8,
    /// Component scores, exposed for display and diagnostics
    pub components: ComponentScores,
    /// The component-weighted compound score (diagnostic; see `score`)
    pub compound: u8,
    /// Trajectory-based detection, when enough history exists
    pub trajectory: Option<TrajectoryDetection>,
}

/// What one processed frame produced.
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    /// Conditioned keypoints for rendering, when a subject was in frame
    pub keypoints: Option<KeypointArray>,
    /// The current analysis result (freshly computed or carried forward);
    /// `None` means "no data yet"
    pub analysis: Option<AnalysisResult>,
    /// `true` if `analysis` was computed on this frame
    pub updated: bool,
    /// Instantaneous stroke detection, on auto-mode update ticks
    pub detection: Option<StrokeDetection>,
}

/// Outbound UI reporting collaborator.
///
/// Receives the analysis result on each throttled update tick. Implementors
/// must handle both result shapes: a fully-populated feature map, and the
/// visibility-issue variant carrying only partial data.
pub trait ReportSink {
    /// Consumes one analysis update.
    fn report(&mut self, analysis: &AnalysisResult);
}

/// A complete, self-contained analysis session.
///
/// Owns the 34 Kalman estimators, the exponential smoother, the motion
/// history, and the last reported result. Dropping or resetting the
/// session discards all of it.
#[derive(Debug)]
pub struct AnalysisSession {
    config: SessionConfig,
    smoother: TemporalSmoother,
    kalman: KalmanBank,
    corrector: ViewpointCorrector,
    history: MotionHistory,
    active_stroke: StrokeType,
    last_result: Option<AnalysisResult>,
    last_update: Option<Timestamp>,
}

impl AnalysisSession {
    /// Creates a session from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: SessionConfig) -> crate::Result<Self> {
        config.validate()?;

        let smoother = TemporalSmoother::new(TemporalSmootherConfig {
            confidence_floor: config.smoothing_floor,
            ..TemporalSmootherConfig::default()
        })?;
        let kalman = KalmanBank::new(KalmanConfig {
            confidence_floor: config.smoothing_floor,
            ..KalmanConfig::default()
        })?;

        let active_stroke = match config.stroke {
            StrokeSelection::Manual(stroke) => stroke,
            StrokeSelection::Auto => StrokeType::default(),
        };

        info!(camera = ?config.camera, stroke = ?config.stroke, "analysis session started");

        Ok(Self {
            corrector: ViewpointCorrector::new(config.camera),
            history: MotionHistory::with_capacity(config.history_capacity),
            smoother,
            kalman,
            active_stroke,
            last_result: None,
            last_update: None,
            config,
        })
    }

    /// Returns the session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the stroke currently being analyzed.
    #[must_use]
    pub fn active_stroke(&self) -> StrokeType {
        self.active_stroke
    }

    /// Returns the most recent analysis result.
    #[must_use]
    pub fn last_result(&self) -> Option<&AnalysisResult> {
        self.last_result.as_ref()
    }

    /// Returns the motion history (read-only).
    #[must_use]
    pub fn history(&self) -> &MotionHistory {
        &self.history
    }

    /// Changes the stroke selection.
    ///
    /// Does NOT reset the motion history — switching stroke type only
    /// changes which derived features are read from it.
    pub fn set_stroke(&mut self, stroke: StrokeSelection) {
        self.config.stroke = stroke;
        if let StrokeSelection::Manual(stroke) = stroke {
            self.active_stroke = stroke;
        }
    }

    /// Changes the configured camera viewpoint.
    pub fn set_camera(&mut self, camera: CameraViewpoint) {
        self.config.camera = camera;
        self.corrector = ViewpointCorrector::new(camera);
    }

    /// Absorbs a pose-source result, recovering from estimation failure.
    ///
    /// A failed estimation is logged and treated as a frame with no
    /// subject; the analysis cycle continues. This is the entry point that
    /// guarantees no error escapes to the frame scheduler.
    pub fn ingest_frame(
        &mut self,
        estimation: Result<Option<Pose>, PoseSourceError>,
        now: Timestamp,
    ) -> FrameOutcome {
        match estimation {
            Ok(pose) => self.process_frame(pose, now),
            Err(error) => {
                warn!(%error, "pose estimation failed; reusing previous result");
                self.process_frame(None, now)
            }
        }
    }

    /// Runs one analysis cycle.
    ///
    /// `None` pose (no subject detected) carries the previous result
    /// forward. Analysis recomputes only on update ticks; between ticks the
    /// conditioned keypoints are still returned for rendering.
    pub fn process_frame(&mut self, pose: Option<Pose>, now: Timestamp) -> FrameOutcome {
        let Some(pose) = pose else {
            debug!("no subject in frame");
            return FrameOutcome {
                keypoints: None,
                analysis: self.last_result.clone(),
                updated: false,
                detection: None,
            };
        };

        // A frame with almost nothing detected must not replace an existing
        // result; keep rendering and carry the previous analysis forward.
        let usable_keypoints = pose.valid_keypoint_count(STORE_CONFIDENCE_THRESHOLD);
        if usable_keypoints < MIN_FRAME_KEYPOINTS && self.last_result.is_some() {
            debug!(usable_keypoints, "sparse frame; reusing previous result");
            return FrameOutcome {
                keypoints: Some(pose.keypoints),
                analysis: self.last_result.clone(),
                updated: false,
                detection: None,
            };
        }

        // Conditioning: exponential smoothing feeds the analysis path; the
        // independent Kalman path feeds the motion history.
        let smoothed = self.smoother.smooth(&pose.keypoints);
        let enhanced = estimate_missing(&smoothed, self.config.validity_threshold).keypoints;

        let filtered = self.kalman.apply(&pose.keypoints);
        self.history.push(&filtered, now);

        let due = self.last_update.map_or(true, |last| {
            now.duration_since(&last) * 1000.0 > self.config.update_interval_ms as f64
        });
        if !due {
            return FrameOutcome {
                keypoints: Some(enhanced),
                analysis: self.last_result.clone(),
                updated: false,
                detection: None,
            };
        }

        // Update tick: resolve the stroke, correct for the viewpoint, and
        // run the full analysis.
        let detection = match self.config.stroke {
            StrokeSelection::Auto => {
                let detection = detect_instant(&enhanced);
                if let Some(stroke) = detection.stroke {
                    self.active_stroke = stroke;
                }
                Some(detection)
            }
            StrokeSelection::Manual(stroke) => {
                self.active_stroke = stroke;
                None
            }
        };
        let stroke = self.active_stroke;

        let (corrected, viewpoint) = self.corrector.resolve_and_correct(&enhanced);
        let result = self.analyze(&corrected, stroke, viewpoint, now);

        self.last_result = Some(result.clone());
        self.last_update = Some(now);

        FrameOutcome {
            keypoints: Some(corrected),
            analysis: Some(result),
            updated: true,
            detection,
        }
    }

    fn analyze(
        &self,
        keypoints: &KeypointArray,
        stroke: StrokeType,
        viewpoint: Viewpoint,
        now: Timestamp,
    ) -> AnalysisResult {
        let threshold = self.config.validity_threshold;
        let required = required_landmarks(stroke, viewpoint);
        let status = detection_status(keypoints, required, threshold);

        if !has_required_coverage(keypoints, required, threshold) {
            debug!(
                detected = status.detected_ratio,
                missing = ?status.missing_parts,
                "insufficient keypoint coverage; reporting degraded result"
            );
            let motion_data = MotionData {
                features: extract_partial_features(keypoints, required, threshold),
                visibility_issue: Some(status.into()),
                detection_confidence: None,
            };
            return AnalysisResult {
                id: FrameId::new(),
                timestamp: now,
                stroke,
                viewpoint,
                motion_data,
                score: DEGRADED_SCORE,
                components: ComponentScores::default(),
                compound: DEGRADED_SCORE,
                trajectory: detect_trajectory(&self.history, stroke),
            };
        }

        let detection_confidence = (status.detected_ratio < DETECTION_NOTE_RATIO).then(|| {
            DetectionNote {
                ratio: status.detected_ratio,
                message: "Some body parts were not reliably detected; analysis accuracy may be reduced."
                    .to_owned(),
            }
        });

        let motion_data = MotionData {
            features: extract_features(keypoints, stroke, viewpoint),
            visibility_issue: None,
            detection_confidence,
        };

        let components = self.component_scores(&motion_data, stroke, viewpoint);
        let compound = compound_score(&components);
        let probabilistic = probabilistic_score(&motion_data, stroke);
        let score = match self.config.score_policy {
            ScorePolicy::Probabilistic => probabilistic,
            ScorePolicy::ComponentWeighted => compound,
        };

        AnalysisResult {
            id: FrameId::new(),
            timestamp: now,
            stroke,
            viewpoint,
            motion_data,
            score,
            components,
            compound,
            trajectory: detect_trajectory(&self.history, stroke),
        }
    }

    fn component_scores(
        &self,
        motion_data: &MotionData,
        stroke: StrokeType,
        viewpoint: Viewpoint,
    ) -> ComponentScores {
        let wrist = stroke.racket_wrist();
        let elbow = stroke.racket_elbow();

        let mut components = ComponentScores {
            posture: posture_score(&motion_data.features, stroke, viewpoint),
            stability: stability_score(&self.history, wrist),
            movement: movement_flow_score(&self.history, wrist, elbow),
            timing: velocity_score(&self.history, wrist),
            acceleration: acceleration_score(&self.history, wrist),
        };

        // Frontal-projection forehand analysis has no velocity model;
        // those components are left uncomputed and renormalized away.
        if stroke == StrokeType::Forehand && viewpoint != Viewpoint::RearElevated {
            components.timing = 0;
            components.acceleration = 0;
        }

        components
    }

    /// Resets all session-scoped state (stop, or a new video source).
    ///
    /// The configuration survives; the filters, history, and last result do
    /// not.
    pub fn reset(&mut self) {
        self.smoother.reset();
        self.kalman.reset();
        self.history.reset();
        self.last_result = None;
        self.last_update = None;
        self.active_stroke = match self.config.stroke {
            StrokeSelection::Manual(stroke) => stroke,
            StrokeSelection::Auto => StrokeType::default(),
        };
        info!("analysis session reset");
    }
}

impl Resettable for AnalysisSession {
    fn reset(&mut self) {
        Self::reset(self);
    }
}
