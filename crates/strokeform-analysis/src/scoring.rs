//! Scoring models: Gaussian proximity-to-ideal, history-dependent
//! components, the weighted composite, and the probabilistic scorer.
//!
//! Two independent overall scorers coexist:
//!
//! - [`compound_score`] — a weighted mean over the five component scores
//!   (posture, stability, movement, timing, acceleration), renormalized
//!   over the components actually computed.
//! - [`probabilistic_score`] — compares the raw feature map against
//!   stroke-specific ideal value/weight/range triples and applies an
//!   S-curve post-correction.
//!
//! They are not reconciled; [`ScorePolicy`] makes the choice explicit, and
//! the default reports the probabilistic score while the component scores
//! remain exposed for diagnostics.

use serde::{Deserialize, Serialize};
use strokeform_core::{
    utils, BodyLandmark, StrokeType, Viewpoint, DEFAULT_CONFIDENCE_THRESHOLD,
};

use crate::features::{FeatureKind, MotionData};
use crate::history::MotionHistory;

/// Score reported when a component or feature cannot be computed.
pub const NEUTRAL_SCORE: u8 = 50;

/// Acceleration-pattern scoring is not yet modeled; every analysis reports
/// this constant rather than fabricating precision.
pub const ACCELERATION_PLACEHOLDER: u8 = 70;

/// Snapshots consulted for stability scoring.
const STABILITY_WINDOW: usize = 5;

/// Snapshots consulted for movement-flow scoring.
const FLOW_WINDOW: usize = 10;

/// Snapshots consulted for velocity scoring.
const VELOCITY_WINDOW: usize = 5;

/// Gaussian proximity score: 100 at the ideal mean, decaying per a normal
/// curve, clamped to [0, 100] and rounded.
#[must_use]
pub fn gaussian_score(value: f64, ideal_mean: f64, std_dev: f64) -> f64 {
    if !value.is_finite() || std_dev <= 0.0 {
        return 0.0;
    }
    let score = 100.0 * (-(value - ideal_mean).powi(2) / (2.0 * std_dev.powi(2))).exp();
    utils::clamp(score, 0.0, 100.0).round()
}

/// How one posture feature is scored.
#[derive(Debug, Clone, Copy)]
enum ScoreRule {
    /// Gaussian proximity to an expert ideal
    Gaussian { mean: f64, std_dev: f64 },
    /// A fixed score whenever the feature is present
    Fixed(f64),
}

/// The expert ideal-form table: which features make up each stroke's
/// posture score, and their Gaussian targets.
fn ideal_form(stroke: StrokeType, viewpoint: Viewpoint) -> &'static [(FeatureKind, ScoreRule)] {
    use FeatureKind as F;
    use ScoreRule::{Fixed, Gaussian};

    match (stroke, viewpoint) {
        (StrokeType::Forehand, Viewpoint::RearElevated) => &[
            (F::ShoulderToElbowAngle, Gaussian { mean: 60.0, std_dev: 15.0 }),
            (F::ShoulderAlignment, Gaussian { mean: 30.0, std_dev: 12.0 }),
            (F::KneeFlexionRatio, Gaussian { mean: 0.55, std_dev: 0.1 }),
            (F::ElbowToWristAngle, Gaussian { mean: 140.0, std_dev: 20.0 }),
        ],
        (StrokeType::Forehand, _) => &[
            (F::ElbowAngle, Gaussian { mean: 140.0, std_dev: 20.0 }),
            (F::HipKneeAngle, Gaussian { mean: 150.0, std_dev: 15.0 }),
            (F::ShoulderHipAlignment, Gaussian { mean: 40.0, std_dev: 10.0 }),
            // Weight-transfer scoring from a single frontal frame is not
            // discriminative; presence earns a flat score.
            (F::CenterShift, Fixed(70.0)),
        ],
        (StrokeType::Backhand, _) => &[
            (F::ShoulderToElbowAngle, Gaussian { mean: 65.0, std_dev: 15.0 }),
            (F::ShoulderAlignment, Gaussian { mean: -30.0, std_dev: 12.0 }),
            (F::ElbowToWristAngle, Gaussian { mean: 145.0, std_dev: 15.0 }),
            (F::HipKneeAngle, Gaussian { mean: 145.0, std_dev: 15.0 }),
        ],
        (StrokeType::Serve, _) => &[
            (F::ShoulderToElbowAngle, Gaussian { mean: 130.0, std_dev: 20.0 }),
            (F::ShoulderAlignment, Gaussian { mean: 50.0, std_dev: 15.0 }),
            (F::ElbowToWristAngle, Gaussian { mean: 160.0, std_dev: 15.0 }),
            (F::HipKneeAngle, Gaussian { mean: 140.0, std_dev: 15.0 }),
        ],
        (StrokeType::Volley, _) => &[
            (F::ShoulderToElbowAngle, Gaussian { mean: 90.0, std_dev: 15.0 }),
            (F::ShoulderToWristDistance, Gaussian { mean: 80.0, std_dev: 20.0 }),
            (F::AvgKneeAngle, Gaussian { mean: 140.0, std_dev: 10.0 }),
            (F::ShoulderAlignment, Gaussian { mean: 0.0, std_dev: 8.0 }),
        ],
    }
}

/// Scores the posture component: the mean over the stroke's ideal-form
/// features, with missing features contributing the neutral default.
#[must_use]
pub fn posture_score(
    features: &std::collections::BTreeMap<FeatureKind, f64>,
    stroke: StrokeType,
    viewpoint: Viewpoint,
) -> u8 {
    let table = ideal_form(stroke, viewpoint);
    let scores: Vec<f64> = table
        .iter()
        .map(|(kind, rule)| match (features.get(kind), rule) {
            (Some(value), ScoreRule::Gaussian { mean, std_dev }) => {
                gaussian_score(*value, *mean, *std_dev)
            }
            (Some(_), ScoreRule::Fixed(score)) => *score,
            (None, _) => f64::from(NEUTRAL_SCORE),
        })
        .collect();
    utils::mean(&scores).round() as u8
}

/// Stability: variability of the tracked landmark's recent position.
///
/// Tennis strokes need purposeful but controlled motion — both a frozen
/// wrist and a wildly scattering one score poorly.
#[must_use]
pub fn stability_score(history: &MotionHistory, landmark: BodyLandmark) -> u8 {
    if history.len() < STABILITY_WINDOW {
        return NEUTRAL_SCORE;
    }

    let mut xs = Vec::with_capacity(STABILITY_WINDOW);
    let mut ys = Vec::with_capacity(STABILITY_WINDOW);
    for snapshot in history.recent(STABILITY_WINDOW) {
        if let Some(kp) = &snapshot.keypoints[landmark as usize] {
            if kp.is_valid_at(DEFAULT_CONFIDENCE_THRESHOLD) {
                xs.push(f64::from(kp.x));
                ys.push(f64::from(kp.y));
            }
        }
    }
    if xs.len() < 3 {
        return NEUTRAL_SCORE;
    }

    let variability = utils::std_deviation(&xs).hypot(utils::std_deviation(&ys));

    if variability < 10.0 {
        40 // barely moving: no stroke is happening
    } else if variability > 120.0 {
        30 // erratic
    } else if variability <= 80.0 {
        90 // purposeful, controlled swing motion
    } else {
        70 // a little hot but acceptable
    }
}

/// Movement flow: mean jerk of the wrist/elbow pair over the recent window.
/// Lower jerk reads as a smoother, better-connected swing.
#[must_use]
pub fn movement_flow_score(
    history: &MotionHistory,
    wrist: BodyLandmark,
    elbow: BodyLandmark,
) -> u8 {
    if history.len() < FLOW_WINDOW {
        return NEUTRAL_SCORE;
    }

    let positions = |landmark: BodyLandmark| -> Vec<(f64, f64)> {
        history
            .recent(FLOW_WINDOW)
            .filter_map(|s| s.keypoints[landmark as usize].as_ref())
            .filter(|kp| kp.is_valid_at(DEFAULT_CONFIDENCE_THRESHOLD))
            .map(|kp| (f64::from(kp.x), f64::from(kp.y)))
            .collect()
    };
    let wrist_pos = positions(wrist);
    let elbow_pos = positions(elbow);
    if wrist_pos.len() < 5 || elbow_pos.len() < 5 {
        return NEUTRAL_SCORE;
    }

    let step = |p: &[(f64, f64)], i: usize| -> f64 {
        let (ax, ay) = p[i - 1];
        let (bx, by) = p[i];
        (bx - ax).hypot(by - ay)
    };

    let n = wrist_pos.len().min(elbow_pos.len());
    let mut total_jerk = 0.0;
    let mut count = 0u32;
    for i in 2..n {
        let wrist_jerk = (step(&wrist_pos, i) - step(&wrist_pos, i - 1)).abs();
        let elbow_jerk = (step(&elbow_pos, i) - step(&elbow_pos, i - 1)).abs();
        total_jerk += wrist_jerk + elbow_jerk;
        count += 1;
    }
    if count == 0 {
        return NEUTRAL_SCORE;
    }

    let avg_jerk = total_jerk / f64::from(count);
    if avg_jerk < 5.0 {
        90
    } else if avg_jerk < 15.0 {
        75
    } else if avg_jerk < 30.0 {
        60
    } else {
        40
    }
}

/// Timing: peak recent speed of the tracked landmark against a fixed
/// optimal band.
#[must_use]
pub fn velocity_score(history: &MotionHistory, landmark: BodyLandmark) -> u8 {
    let peak = history
        .recent(VELOCITY_WINDOW)
        .filter_map(|s| s.velocities[landmark as usize])
        .map(|v| v.speed)
        .fold(None::<f64>, |acc, s| Some(acc.map_or(s, |a| a.max(s))));

    let Some(peak) = peak else {
        return NEUTRAL_SCORE;
    };

    if peak < 5.0 {
        30 // too slow to be a stroke
    } else if peak < 10.0 {
        70
    } else if peak < 20.0 {
        90 // optimal band
    } else if peak < 30.0 {
        80
    } else {
        60 // rushing
    }
}

/// Acceleration-pattern score.
///
/// TODO: model the load/accelerate/decelerate phases from the velocity
/// history; until then this is explicitly a placeholder constant.
#[must_use]
pub fn acceleration_score(_history: &MotionHistory, _landmark: BodyLandmark) -> u8 {
    ACCELERATION_PLACEHOLDER
}

/// The five per-tick component scores, each in [0, 100].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentScores {
    /// Posture accuracy against the ideal-form table
    pub posture: u8,
    /// Motion stability
    pub stability: u8,
    /// Movement flow / smoothness
    pub movement: u8,
    /// Timing (velocity band)
    pub timing: u8,
    /// Acceleration pattern (placeholder)
    pub acceleration: u8,
}

/// Component weights for the compound score.
const COMPONENT_WEIGHTS: [(f64, fn(&ComponentScores) -> u8); 5] = [
    (0.35, |s| s.posture),
    (0.15, |s| s.stability),
    (0.25, |s| s.movement),
    (0.15, |s| s.timing),
    (0.10, |s| s.acceleration),
];

/// Weighted mean of the component scores, renormalized over the components
/// actually present.
///
/// A component scoring exactly 0 is treated as "not computed" and excluded
/// from the weighting — absent components do not silently count as zero.
/// When nothing was computed the result is the neutral default.
#[must_use]
pub fn compound_score(scores: &ComponentScores) -> u8 {
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;

    for (weight, get) in COMPONENT_WEIGHTS {
        let score = get(scores);
        if score > 0 {
            weighted_sum += f64::from(score) * weight;
            weight_sum += weight;
        }
    }

    if weight_sum == 0.0 {
        return NEUTRAL_SCORE;
    }
    utils::clamp((weighted_sum / weight_sum).round(), 0.0, 100.0) as u8
}

/// Which overall scorer is authoritative for the reported result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScorePolicy {
    /// Report the probabilistic score (the historical behavior)
    #[default]
    Probabilistic,
    /// Report the component-weighted compound score
    ComponentWeighted,
}

/// An expert ideal for one feature in the probabilistic model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureTarget {
    /// Ideal value
    pub value: f64,
    /// Relative weight in the weighted mean
    pub weight: f64,
    /// Deviation normalization range
    pub range: f64,
}

const fn target(value: f64, weight: f64, range: f64) -> FeatureTarget {
    FeatureTarget {
        value,
        weight,
        range,
    }
}

/// The probabilistic scorer's per-stroke ideal tables.
///
/// The tables are data, not code paths: entries the extractor does not
/// currently produce (e.g. back arch) stay listed and are simply skipped at
/// lookup time.
fn ideal_targets(stroke: StrokeType) -> &'static [(FeatureKind, FeatureTarget)] {
    use FeatureKind as F;
    const FOREHAND: &[(FeatureKind, FeatureTarget)] = &[
        (F::ShoulderToElbowAngle, target(60.0, 1.5, 20.0)),
        (F::ShoulderAlignment, target(30.0, 1.2, 15.0)),
        (F::KneeFlexionRatio, target(0.55, 1.0, 0.15)),
        (F::ElbowToWristAngle, target(140.0, 1.3, 25.0)),
        (F::ElbowAngle, target(120.0, 1.3, 20.0)),
        (F::HipKneeAngle, target(150.0, 1.0, 20.0)),
        (F::ShoulderHipAlignment, target(40.0, 0.8, 15.0)),
        (F::CenterShift, target(25.0, 0.7, 15.0)),
    ];
    const BACKHAND: &[(FeatureKind, FeatureTarget)] = &[
        (F::ShoulderToElbowAngle, target(65.0, 1.5, 20.0)),
        (F::ShoulderAlignment, target(-30.0, 1.2, 15.0)),
        (F::HipKneeAngle, target(140.0, 1.0, 20.0)),
        (F::HandsDistance, target(60.0, 1.2, 30.0)),
    ];
    const SERVE: &[(FeatureKind, FeatureTarget)] = &[
        (F::ElbowToWristAngle, target(160.0, 1.5, 20.0)),
        (F::ShoulderToElbowAngle, target(120.0, 1.2, 30.0)),
        (F::BackArch, target(20.0, 1.0, 10.0)),
        (F::HipKneeAngle, target(140.0, 0.8, 20.0)),
    ];
    const VOLLEY: &[(FeatureKind, FeatureTarget)] = &[
        (F::ShoulderToWristDistance, target(100.0, 1.2, 25.0)),
        (F::AvgKneeAngle, target(145.0, 1.0, 20.0)),
        (F::ShoulderAlignment, target(5.0, 0.8, 10.0)),
        (F::ElbowHeight, target(10.0, 0.9, 15.0)),
    ];
    match stroke {
        StrokeType::Forehand => FOREHAND,
        StrokeType::Backhand => BACKHAND,
        StrokeType::Serve => SERVE,
        StrokeType::Volley => VOLLEY,
    }
}

/// Probabilistic overall score over the raw feature map.
///
/// Each extracted feature with an ideal entry contributes
/// `100·exp(−(|v−ideal|/range)²)` at its weight; the weighted mean is then
/// pushed through an S-curve (scores below 50 pulled down, above 50 pulled
/// up) for a more decisive distribution, clamped and rounded.
#[must_use]
pub fn probabilistic_score(motion_data: &MotionData, stroke: StrokeType) -> u8 {
    let targets = ideal_targets(stroke);

    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for (kind, value) in &motion_data.features {
        let Some((_, target)) = targets.iter().find(|(k, _)| k == kind) else {
            continue;
        };
        if !value.is_finite() || target.range <= 0.0 {
            continue;
        }

        let normalized_deviation = (value - target.value).abs() / target.range;
        let component = 100.0 * (-normalized_deviation.powi(2)).exp();
        weighted_sum += component * target.weight;
        total_weight += target.weight;
    }

    if total_weight == 0.0 {
        return NEUTRAL_SCORE;
    }

    let weighted = weighted_sum / total_weight;
    let corrected = if weighted < 50.0 {
        50.0 * (weighted / 50.0).powf(1.2)
    } else {
        50.0 + 50.0 * ((weighted - 50.0) / 50.0).powf(0.8)
    };

    utils::clamp(corrected.round(), 0.0, 100.0) as u8
}
