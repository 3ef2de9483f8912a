//! Adaptive recursive (Kalman) estimation of keypoint coordinates.
//!
//! One independent scalar estimator per coordinate axis per landmark —
//! 34 filters in total. Measurement noise widens when the incoming
//! keypoint's confidence is low, so shaky detections pull the estimate less
//! than confident ones. Keypoints below a floor confidence bypass filtering
//! entirely and pass through raw.

use strokeform_core::{
    AnalysisStage, Keypoint, KeypointArray, Resettable, MAX_KEYPOINTS, SMOOTHING_CONFIDENCE_FLOOR,
};

/// Configuration for the per-axis estimators.
#[derive(Debug, Clone)]
pub struct KalmanConfig {
    /// Process noise `Q`
    pub process_noise: f64,
    /// Baseline measurement noise `R`
    pub measurement_noise: f64,
    /// Confidence floor below which keypoints bypass filtering
    pub confidence_floor: f32,
}

impl Default for KalmanConfig {
    fn default() -> Self {
        Self {
            process_noise: 0.01,
            measurement_noise: 0.1,
            confidence_floor: SMOOTHING_CONFIDENCE_FLOOR,
        }
    }
}

impl KalmanConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if either noise constant is not positive.
    pub fn validate(&self) -> crate::Result<()> {
        if self.process_noise <= 0.0 || self.measurement_noise <= 0.0 {
            return Err(crate::FilterError::InvalidConfig(format!(
                "noise constants must be positive, got Q={} R={}",
                self.process_noise, self.measurement_noise
            )));
        }
        Ok(())
    }

    /// Measurement noise for a given keypoint confidence.
    ///
    /// Three tiers: unreliable detections are allowed to move the estimate
    /// the least.
    #[must_use]
    pub fn noise_for_confidence(&self, confidence: f32) -> f64 {
        if confidence < 0.3 {
            0.5
        } else if confidence < 0.6 {
            0.3
        } else {
            self.measurement_noise
        }
    }
}

/// A two-parameter predict/update scalar estimator.
#[derive(Debug, Clone)]
pub struct ScalarKalman {
    /// Current state estimate
    x: f64,
    /// Current estimate uncertainty
    p: f64,
    /// Process noise
    q: f64,
    /// Baseline measurement noise
    r: f64,
    /// Whether any measurement has been absorbed yet
    initialized: bool,
}

impl ScalarKalman {
    /// Creates an estimator with the given noise constants.
    #[must_use]
    pub fn new(process_noise: f64, measurement_noise: f64) -> Self {
        Self {
            x: 0.0,
            p: 1.0,
            q: process_noise,
            r: measurement_noise,
            initialized: false,
        }
    }

    /// Returns the current estimate.
    #[must_use]
    pub fn estimate(&self) -> f64 {
        self.x
    }

    /// Returns the current uncertainty.
    #[must_use]
    pub fn uncertainty(&self) -> f64 {
        self.p
    }

    /// Absorbs a measurement `z` and returns the updated estimate.
    ///
    /// `noise` overrides the baseline measurement noise for this update.
    /// With constant noise the uncertainty is monotonically non-increasing
    /// toward its fixed point.
    pub fn update(&mut self, z: f64, noise: Option<f64>) -> f64 {
        // The first measurement seeds the state so the estimate does not
        // have to converge from zero.
        if !self.initialized {
            self.x = z;
            self.initialized = true;
        }

        let r = noise.unwrap_or(self.r);

        // Predict
        let p_pred = self.p + self.q;

        // Update
        let k = p_pred / (p_pred + r);
        self.x += k * (z - self.x);
        self.p = (1.0 - k) * p_pred;

        self.x
    }

    /// Resets the estimator to an initial position.
    pub fn reset_to(&mut self, x: f64) {
        self.x = x;
        self.p = 1.0;
        self.initialized = true;
    }
}

impl Resettable for ScalarKalman {
    fn reset(&mut self) {
        self.x = 0.0;
        self.p = 1.0;
        self.initialized = false;
    }
}

/// The full bank of per-landmark, per-axis estimators.
///
/// Lazily usable from construction: the first frame a landmark appears
/// seeds its pair of estimators.
#[derive(Debug, Clone)]
pub struct KalmanBank {
    config: KalmanConfig,
    x_axis: [ScalarKalman; MAX_KEYPOINTS],
    y_axis: [ScalarKalman; MAX_KEYPOINTS],
}

impl KalmanBank {
    /// Creates a bank with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: KalmanConfig) -> crate::Result<Self> {
        config.validate()?;
        let (q, r) = (config.process_noise, config.measurement_noise);
        Ok(Self {
            config,
            x_axis: std::array::from_fn(|_| ScalarKalman::new(q, r)),
            y_axis: std::array::from_fn(|_| ScalarKalman::new(q, r)),
        })
    }

    /// Returns the current configuration.
    #[must_use]
    pub fn config(&self) -> &KalmanConfig {
        &self.config
    }

    /// Filters one frame of keypoints.
    ///
    /// Keypoints below the confidence floor (and absent slots) pass through
    /// untouched — the estimators keep their state rather than absorbing
    /// near-noise measurements.
    pub fn apply(&mut self, keypoints: &KeypointArray) -> KeypointArray {
        let mut filtered = *keypoints;

        for i in 0..MAX_KEYPOINTS {
            let Some(kp) = &keypoints[i] else { continue };
            if !kp.confidence.exceeds(self.config.confidence_floor) {
                continue;
            }

            let noise = self.config.noise_for_confidence(kp.confidence.value());
            let x = self.x_axis[i].update(f64::from(kp.x), Some(noise)) as f32;
            let y = self.y_axis[i].update(f64::from(kp.y), Some(noise)) as f32;

            filtered[i] = Some(Keypoint::new(kp.landmark, x, y, kp.confidence));
        }

        filtered
    }
}

impl Default for KalmanBank {
    fn default() -> Self {
        Self::new(KalmanConfig::default()).expect("default config is valid")
    }
}

impl Resettable for KalmanBank {
    fn reset(&mut self) {
        for filter in self.x_axis.iter_mut().chain(self.y_axis.iter_mut()) {
            filter.reset();
        }
    }
}

impl AnalysisStage for KalmanBank {
    type Input = KeypointArray;
    type Output = KeypointArray;

    fn process(&mut self, input: Self::Input) -> Self::Output {
        self.apply(&input)
    }
}
