//! Defensive 2D geometry over keypoints.
//!
//! Every function in this module returns `Option` instead of panicking or
//! producing NaN: a missing keypoint, a non-finite coordinate, or a
//! degenerate configuration (coincident points) yields `None`, which callers
//! treat as "feature unavailable".
//!
//! Two angle conventions coexist and are kept distinct:
//!
//! - [`angle_at`] — signed sweep normalized to [0, 360), rounded to integer
//!   degrees. Used by feature extraction (a take-back swept past 180° is a
//!   different posture than its mirror).
//! - [`angle_between`] — unsigned magnitude folded to [0, 180]. Used by the
//!   instantaneous stroke detector, which only cares about joint flexion.

use crate::types::Keypoint;

/// Returns the finite (x, y) position of a keypoint, if usable.
fn finite_position(kp: Option<&Keypoint>) -> Option<(f64, f64)> {
    let kp = kp?;
    let (x, y) = (f64::from(kp.x), f64::from(kp.y));
    if x.is_finite() && y.is_finite() {
        Some((x, y))
    } else {
        None
    }
}

/// Angle at vertex `b` subtended by rays to `a` and `c`, in degrees,
/// normalized to [0, 360) and rounded to integer granularity.
///
/// Returns `None` when any point is missing or non-finite, or when either
/// ray has zero length (`a == b` or `c == b`).
#[must_use]
pub fn angle_at(a: Option<&Keypoint>, b: Option<&Keypoint>, c: Option<&Keypoint>) -> Option<f64> {
    let (ax, ay) = finite_position(a)?;
    let (bx, by) = finite_position(b)?;
    let (cx, cy) = finite_position(c)?;

    // Coincident vertex means a zero-length ray; the angle is undefined.
    if (ax == bx && ay == by) || (cx == bx && cy == by) {
        return None;
    }

    let radians = (cy - by).atan2(cx - bx) - (ay - by).atan2(ax - bx);
    if radians.is_nan() {
        return None;
    }

    let mut degrees = radians.to_degrees();
    if degrees < 0.0 {
        degrees += 360.0;
    }

    let rounded = degrees.round();
    // 359.5..360 rounds up to the excluded bound; fold it back to 0.
    if rounded >= 360.0 {
        Some(0.0)
    } else {
        Some(rounded)
    }
}

/// Unsigned angle at vertex `b`, folded to [0, 180] degrees, unrounded.
///
/// Same defensive contract as [`angle_at`].
#[must_use]
pub fn angle_between(
    a: Option<&Keypoint>,
    b: Option<&Keypoint>,
    c: Option<&Keypoint>,
) -> Option<f64> {
    let (ax, ay) = finite_position(a)?;
    let (bx, by) = finite_position(b)?;
    let (cx, cy) = finite_position(c)?;

    if (ax == bx && ay == by) || (cx == bx && cy == by) {
        return None;
    }

    let radians = (cy - by).atan2(cx - bx) - (ay - by).atan2(ax - bx);
    if radians.is_nan() {
        return None;
    }

    let mut degrees = radians.to_degrees().abs();
    if degrees > 180.0 {
        degrees = 360.0 - degrees;
    }
    Some(degrees)
}

/// Euclidean distance between two keypoints.
///
/// Returns `None` when either point is missing or non-finite.
#[must_use]
pub fn distance(a: Option<&Keypoint>, b: Option<&Keypoint>) -> Option<f64> {
    let (ax, ay) = finite_position(a)?;
    let (bx, by) = finite_position(b)?;
    Some((bx - ax).hypot(by - ay))
}

/// Signed inclination of the segment `upper` → `lower` from vertical,
/// in degrees.
///
/// Zero means the segment hangs straight down; positive tilts toward +x.
/// Used for shoulder-line tilt, where the sign distinguishes open and
/// closed shoulder rotation.
#[must_use]
pub fn inclination(upper: Option<&Keypoint>, lower: Option<&Keypoint>) -> Option<f64> {
    let (ux, uy) = finite_position(upper)?;
    let (lx, ly) = finite_position(lower)?;

    let dx = lx - ux;
    let dy = ly - uy;
    Some(dx.atan2(dy).to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BodyLandmark, Confidence};
    use approx::assert_abs_diff_eq;

    fn kp(x: f32, y: f32) -> Keypoint {
        Keypoint::new(BodyLandmark::Nose, x, y, Confidence::new(0.9).unwrap())
    }

    #[test]
    fn right_angle() {
        let a = kp(0.0, -10.0);
        let b = kp(0.0, 0.0);
        let c = kp(10.0, 0.0);
        // a is straight up from b, c is to the right: the sweep from
        // ray(b→a) to ray(b→c) is 90°.
        assert_eq!(angle_at(Some(&a), Some(&b), Some(&c)), Some(90.0));
        let folded = angle_between(Some(&a), Some(&b), Some(&c)).unwrap();
        assert_abs_diff_eq!(folded, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn straight_line_is_180() {
        let a = kp(-10.0, 0.0);
        let b = kp(0.0, 0.0);
        let c = kp(10.0, 0.0);
        assert_eq!(angle_at(Some(&a), Some(&b), Some(&c)), Some(180.0));
        assert_abs_diff_eq!(
            angle_between(Some(&a), Some(&b), Some(&c)).unwrap(),
            180.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn degenerate_inputs_yield_none() {
        let p = kp(1.0, 1.0);
        let q = kp(2.0, 3.0);

        // Missing points
        assert_eq!(angle_at(None, Some(&p), Some(&q)), None);
        assert_eq!(angle_at(Some(&p), None, Some(&q)), None);
        assert_eq!(distance(Some(&p), None), None);
        assert_eq!(inclination(None, Some(&p)), None);

        // Coincident vertex
        assert_eq!(angle_at(Some(&p), Some(&p), Some(&q)), None);
        assert_eq!(angle_at(Some(&q), Some(&p), Some(&p)), None);
        assert_eq!(angle_between(Some(&p), Some(&p), Some(&q)), None);

        // Non-finite coordinates
        let nan = kp(f32::NAN, 0.0);
        let inf = kp(0.0, f32::INFINITY);
        assert_eq!(angle_at(Some(&nan), Some(&p), Some(&q)), None);
        assert_eq!(angle_at(Some(&p), Some(&inf), Some(&q)), None);
        assert_eq!(distance(Some(&nan), Some(&p)), None);
        assert_eq!(inclination(Some(&p), Some(&inf)), None);
    }

    #[test]
    fn angle_is_translation_invariant() {
        let (a, b, c) = (kp(1.0, 2.0), kp(4.0, 6.0), kp(9.0, 1.0));
        let base = angle_at(Some(&a), Some(&b), Some(&c)).unwrap();

        for (dx, dy) in [(37.0, -12.0), (-250.0, 480.0), (0.5, 0.5)] {
            let shift = |p: &Keypoint| kp(p.x + dx, p.y + dy);
            let (ta, tb, tc) = (shift(&a), shift(&b), shift(&c));
            let moved = angle_at(Some(&ta), Some(&tb), Some(&tc)).unwrap();
            assert_abs_diff_eq!(moved, base, epsilon = 1.0);
        }
    }

    #[test]
    fn reversed_sweep_is_complement() {
        let (a, b, c) = (kp(0.0, -10.0), kp(0.0, 0.0), kp(7.0, 3.0));
        let forward = angle_at(Some(&a), Some(&b), Some(&c)).unwrap();
        let reverse = angle_at(Some(&c), Some(&b), Some(&a)).unwrap();
        // angle_at(a,b,c) + angle_at(c,b,a) == 360 up to rounding.
        let sum = forward + reverse;
        assert!((sum - 360.0).abs() <= 1.0, "sum was {sum}");
    }

    #[test]
    fn distance_is_euclidean() {
        let a = kp(0.0, 0.0);
        let b = kp(3.0, 4.0);
        assert_abs_diff_eq!(distance(Some(&a), Some(&b)).unwrap(), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn inclination_sign_convention() {
        let upper = kp(0.0, 0.0);

        // Straight down: no tilt.
        let below = kp(0.0, 10.0);
        assert_abs_diff_eq!(
            inclination(Some(&upper), Some(&below)).unwrap(),
            0.0,
            epsilon = 1e-9
        );

        // Tilted toward +x: positive.
        let right_down = kp(10.0, 10.0);
        assert_abs_diff_eq!(
            inclination(Some(&upper), Some(&right_down)).unwrap(),
            45.0,
            epsilon = 1e-9
        );

        // Tilted toward -x: negative.
        let left_down = kp(-10.0, 10.0);
        assert_abs_diff_eq!(
            inclination(Some(&upper), Some(&left_down)).unwrap(),
            -45.0,
            epsilon = 1e-9
        );
    }
}
