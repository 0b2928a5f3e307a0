//! Geometry kernel
//!
//! Pure, stateless functions that turn landmark coordinates into clinical
//! angle and ratio metrics. Degenerate inputs (zero-length vectors, near-zero
//! denominators) and physically implausible results are reported as `None`,
//! never as exceptions and never silently defaulted to zero.

use crate::types::{Landmark, PoseFrame, Side};
use serde::{Deserialize, Serialize};

/// Body height below which shoulder asymmetry normalization is degenerate.
const MIN_BODY_HEIGHT: f64 = 0.01;

/// Ankle height below which the arch ratio denominator is degenerate.
const MIN_ANKLE_HEIGHT: f64 = 0.001;

/// Plausibility band for the medial arch height ratio. Values outside it are
/// treated as landmark-detection artifacts, not real measurements.
const ARCH_RATIO_MAX: f64 = 0.6;

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Euclidean distance between two landmarks.
///
/// Uses the z component when present; a missing z contributes 0 (the point is
/// treated as lying in the camera plane).
pub fn distance(a: &Landmark, b: &Landmark) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z_or_zero() - b.z_or_zero();
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Euclidean distance in the image plane only.
pub fn distance_2d(a: &Landmark, b: &Landmark) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Angle of the line from `a` to `b` relative to the horizontal axis, in
/// degrees. The coordinate system is y-down, so a positive angle means `b`
/// sits below `a` in the frame.
pub fn angle_of_line(a: &Landmark, b: &Landmark) -> f64 {
    let dy = b.y - a.y;
    let dx = b.x - a.x;
    dy.atan2(dx).to_degrees()
}

/// Angle at vertex `b` between the rays `b→a` and `b→c`, in degrees.
///
/// Computed from the clamped dot-product cosine, so the result is always in
/// `[0, 180]` and symmetric in `a` and `c`. Returns `None` when either ray
/// has zero length.
pub fn joint_angle(a: &Landmark, b: &Landmark, c: &Landmark) -> Option<f64> {
    let v1 = (a.x - b.x, a.y - b.y);
    let v2 = (c.x - b.x, c.y - b.y);

    let mag1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
    let mag2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();
    if mag1 == 0.0 || mag2 == 0.0 {
        return None;
    }

    let dot = v1.0 * v2.0 + v1.1 * v2.1;
    // Clamp before acos: floating-point overshoot past ±1 would produce NaN.
    let cos_theta = (dot / (mag1 * mag2)).clamp(-1.0, 1.0);
    Some(cos_theta.acos().to_degrees())
}

/// Craniovertebral angle (CVA) for forward head posture assessment.
///
/// Angle between the postural line `shoulder→ear` and the head-orientation
/// line `ear→nose`, converted via `180° − interior angle`. Neutral posture
/// reads ~50-60°; lower values indicate forward head posture.
///
/// Returns `None` when either vector has zero length. Rounded to 1 decimal.
pub fn craniovertebral_angle(
    nose: &Landmark,
    ear: &Landmark,
    shoulder: &Landmark,
) -> Option<f64> {
    let shoulder_to_ear = (ear.x - shoulder.x, ear.y - shoulder.y);
    let ear_to_nose = (nose.x - ear.x, nose.y - ear.y);

    let mag_postural = (shoulder_to_ear.0 * shoulder_to_ear.0
        + shoulder_to_ear.1 * shoulder_to_ear.1)
        .sqrt();
    let mag_head = (ear_to_nose.0 * ear_to_nose.0 + ear_to_nose.1 * ear_to_nose.1).sqrt();
    if mag_postural == 0.0 || mag_head == 0.0 {
        return None;
    }

    let dot = shoulder_to_ear.0 * ear_to_nose.0 + shoulder_to_ear.1 * ear_to_nose.1;
    let cos_theta = (dot / (mag_postural * mag_head)).clamp(-1.0, 1.0);
    let interior = cos_theta.acos().to_degrees();

    Some(round1(180.0 - interior))
}

/// Shoulder height asymmetry as a percentage of body height.
///
/// `|leftShoulder.y − rightShoulder.y| / bodyHeight × 100`, where body height
/// is the vertical span from the shoulder midpoint down to the ankle
/// midpoint. Returns `None` when the body height is degenerate (subject not
/// upright in frame). Rounded to 1 decimal.
pub fn shoulder_height_asymmetry(pose: &PoseFrame) -> Option<f64> {
    let shoulder_y = (pose.left_shoulder.y + pose.right_shoulder.y) / 2.0;
    let ankle_y = (pose.left_ankle.y + pose.right_ankle.y) / 2.0;

    let body_height = (ankle_y - shoulder_y).abs();
    if body_height < MIN_BODY_HEIGHT {
        return None;
    }

    let height_difference = (pose.left_shoulder.y - pose.right_shoulder.y).abs();
    Some(round1(height_difference / body_height * 100.0))
}

/// Medial arch height ratio for one foot.
///
/// The navicular point is approximated as the midpoint of the ankle and
/// foot-index landmarks; the ratio is arch height over ankle height, both
/// measured vertically from the heel. Lower values mean a flatter arch.
///
/// Returns `None` when the ankle height is degenerate or the ratio falls
/// outside the plausibility band `[0, 0.6]`. Rounded to 3 decimals.
pub fn foot_arch_ratio(pose: &PoseFrame, side: Side) -> Option<f64> {
    let ankle = pose.ankle(side);
    let heel = pose.heel(side);
    let foot_index = pose.foot_index(side);

    let navicular_y = (ankle.y + foot_index.y) / 2.0;
    let arch_height = (navicular_y - heel.y).abs();
    let ankle_height = (ankle.y - heel.y).abs();

    if ankle_height < MIN_ANKLE_HEIGHT {
        return None;
    }

    let ratio = arch_height / ankle_height;
    if !(0.0..=ARCH_RATIO_MAX).contains(&ratio) {
        return None;
    }

    Some(round3(ratio))
}

/// Arch ratios for both feet plus their average and left-right asymmetry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FootArchSummary {
    pub left: Option<f64>,
    pub right: Option<f64>,
    /// Mean of the available sides, or the single available side.
    pub average: Option<f64>,
    /// `|left − right|`, only when both sides are available.
    pub asymmetry: Option<f64>,
}

/// Compute [`foot_arch_ratio`] for both feet.
///
/// When only one side survives the plausibility checks, the average falls
/// back to that side alone and the asymmetry is `None`.
pub fn foot_arch_both_sides(pose: &PoseFrame) -> FootArchSummary {
    let left = foot_arch_ratio(pose, Side::Left);
    let right = foot_arch_ratio(pose, Side::Right);

    let average = match (left, right) {
        (Some(l), Some(r)) => Some(round3((l + r) / 2.0)),
        (Some(l), None) => Some(l),
        (None, Some(r)) => Some(r),
        (None, None) => None,
    };

    let asymmetry = match (left, right) {
        (Some(l), Some(r)) => Some(round3((l - r).abs())),
        _ => None,
    };

    FootArchSummary {
        left,
        right,
        average,
        asymmetry,
    }
}

/// Pelvic obliquity: magnitude of the hip-line angle from horizontal, degrees.
///
/// Despite the clinical shorthand "pelvic tilt" used elsewhere in the
/// pipeline, this measures lateral hip obliquity (one hip higher than the
/// other), not anterior/posterior tilt — the latter is unreliable from 2D
/// keypoints. Callers must not conflate the two.
///
/// The raw line angle is normalized into `[-90, 90]` before taking the
/// absolute value, so left/right landmark ordering does not matter.
/// Rounded to 1 decimal.
pub fn pelvic_obliquity(pose: &PoseFrame) -> f64 {
    let dx = pose.right_hip.x - pose.left_hip.x;
    let dy = pose.right_hip.y - pose.left_hip.y;

    let mut angle = dy.atan2(dx).to_degrees();
    if angle > 90.0 {
        angle -= 180.0;
    }
    if angle < -90.0 {
        angle += 180.0;
    }

    round1(angle.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::POSE_LANDMARK_COUNT;

    fn make_pose() -> PoseFrame {
        // Upright subject roughly centered in frame.
        let mut points = vec![Landmark::new(0.5, 0.5); POSE_LANDMARK_COUNT];
        points[0] = Landmark::new(0.50, 0.10); // nose
        points[7] = Landmark::new(0.48, 0.12); // left ear
        points[11] = Landmark::new(0.40, 0.25); // left shoulder
        points[12] = Landmark::new(0.60, 0.25); // right shoulder
        points[23] = Landmark::new(0.43, 0.50); // left hip
        points[24] = Landmark::new(0.57, 0.50); // right hip
        points[25] = Landmark::new(0.43, 0.70); // left knee
        points[26] = Landmark::new(0.57, 0.70); // right knee
        points[27] = Landmark::new(0.43, 0.88); // left ankle
        points[28] = Landmark::new(0.57, 0.88); // right ankle
        points[29] = Landmark::new(0.42, 0.95); // left heel
        points[30] = Landmark::new(0.58, 0.95); // right heel
        points[31] = Landmark::new(0.47, 0.94); // left foot index
        points[32] = Landmark::new(0.53, 0.94); // right foot index
        PoseFrame::from_landmarks(&points).unwrap()
    }

    #[test]
    fn test_distance_symmetry_and_identity() {
        let a = Landmark::with_z(0.1, 0.2, -0.05);
        let b = Landmark::new(0.7, 0.9);

        assert_eq!(distance(&a, &b), distance(&b, &a));
        assert_eq!(distance(&a, &a), 0.0);
        assert_eq!(distance_2d(&a, &b), distance_2d(&b, &a));
    }

    #[test]
    fn test_distance_uses_depth_when_present() {
        let a = Landmark::with_z(0.0, 0.0, 0.0);
        let b = Landmark::with_z(0.0, 0.0, 0.3);
        assert!((distance(&a, &b) - 0.3).abs() < 1e-12);
        assert_eq!(distance_2d(&a, &b), 0.0);
    }

    #[test]
    fn test_angle_of_line_y_down() {
        let a = Landmark::new(0.2, 0.5);
        let below = Landmark::new(0.8, 0.8);
        // b below a in a y-down frame gives a positive angle.
        assert!(angle_of_line(&a, &below) > 0.0);

        let level = Landmark::new(0.8, 0.5);
        assert_eq!(angle_of_line(&a, &level), 0.0);
    }

    #[test]
    fn test_joint_angle_symmetric_and_bounded() {
        let a = Landmark::new(0.2, 0.1);
        let b = Landmark::new(0.5, 0.5);
        let c = Landmark::new(0.9, 0.3);

        let forward = joint_angle(&a, &b, &c).unwrap();
        let reversed = joint_angle(&c, &b, &a).unwrap();
        assert!((forward - reversed).abs() < 1e-9);
        assert!((0.0..=180.0).contains(&forward));
    }

    #[test]
    fn test_joint_angle_straight_line() {
        let a = Landmark::new(0.5, 0.2);
        let b = Landmark::new(0.5, 0.5);
        let c = Landmark::new(0.5, 0.8);
        let angle = joint_angle(&a, &b, &c).unwrap();
        assert!((angle - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_joint_angle_degenerate_ray() {
        let a = Landmark::new(0.5, 0.5);
        let b = Landmark::new(0.5, 0.5);
        let c = Landmark::new(0.9, 0.3);
        assert_eq!(joint_angle(&a, &b, &c), None);
    }

    #[test]
    fn test_cva_zero_length_vectors() {
        let nose = Landmark::new(0.5, 0.1);
        let ear = Landmark::new(0.48, 0.12);
        let shoulder = Landmark::new(0.4, 0.25);

        assert_eq!(craniovertebral_angle(&nose, &ear, &ear), None);
        assert_eq!(craniovertebral_angle(&ear, &ear, &shoulder), None);
        assert!(craniovertebral_angle(&nose, &ear, &shoulder).is_some());
    }

    #[test]
    fn test_cva_stable_under_perturbation() {
        let nose = Landmark::new(0.50, 0.10);
        let ear = Landmark::new(0.48, 0.12);
        let shoulder = Landmark::new(0.40, 0.25);

        let base = craniovertebral_angle(&nose, &ear, &shoulder).unwrap();
        assert!(base.is_finite());

        let nudged_nose = Landmark::new(0.5001, 0.1001);
        let nudged = craniovertebral_angle(&nudged_nose, &ear, &shoulder).unwrap();
        assert!(nudged.is_finite());
        assert!((base - nudged).abs() < 1.0);
    }

    #[test]
    fn test_cva_rounding() {
        let nose = Landmark::new(0.53, 0.11);
        let ear = Landmark::new(0.47, 0.13);
        let shoulder = Landmark::new(0.41, 0.27);
        let cva = craniovertebral_angle(&nose, &ear, &shoulder).unwrap();
        assert_eq!(cva, round1(cva));
    }

    #[test]
    fn test_shoulder_asymmetry_level_shoulders() {
        let pose = make_pose();
        assert_eq!(shoulder_height_asymmetry(&pose), Some(0.0));
    }

    #[test]
    fn test_shoulder_asymmetry_percentage() {
        let mut pose = make_pose();
        // Raise the left shoulder by 3% of frame height; body height is 0.63.
        pose.left_shoulder.y = 0.22;
        let expected = (0.03 / ((0.88 - 0.235_f64).abs())) * 100.0;
        let got = shoulder_height_asymmetry(&pose).unwrap();
        assert!((got - round1(expected)).abs() < 0.11);
    }

    #[test]
    fn test_shoulder_asymmetry_degenerate_body_height() {
        let mut pose = make_pose();
        pose.left_ankle.y = pose.left_shoulder.y;
        pose.right_ankle.y = pose.right_shoulder.y;
        assert_eq!(shoulder_height_asymmetry(&pose), None);
    }

    #[test]
    fn test_foot_arch_ratio_plausible() {
        let pose = make_pose();
        let ratio = foot_arch_ratio(&pose, Side::Left).unwrap();
        assert!((0.0..=0.6).contains(&ratio));
        assert_eq!(ratio, round3(ratio));
    }

    #[test]
    fn test_foot_arch_ratio_rejects_implausible() {
        let mut pose = make_pose();
        // Navicular far above the ankle produces a ratio above the band.
        pose.left_foot_index.y = 0.10;
        assert_eq!(foot_arch_ratio(&pose, Side::Left), None);
    }

    #[test]
    fn test_foot_arch_ratio_degenerate_ankle_height() {
        let mut pose = make_pose();
        pose.left_heel.y = pose.left_ankle.y;
        assert_eq!(foot_arch_ratio(&pose, Side::Left), None);
    }

    #[test]
    fn test_foot_arch_both_sides_fallback() {
        let mut pose = make_pose();
        let both = foot_arch_both_sides(&pose);
        assert!(both.left.is_some());
        assert!(both.right.is_some());
        assert!(both.average.is_some());
        assert!(both.asymmetry.is_some());

        // Knock out the left side; the average falls back to the right foot.
        pose.left_heel.y = pose.left_ankle.y;
        let partial = foot_arch_both_sides(&pose);
        assert_eq!(partial.left, None);
        assert_eq!(partial.average, partial.right);
        assert_eq!(partial.asymmetry, None);
    }

    #[test]
    fn test_pelvic_obliquity_level_hips() {
        let pose = make_pose();
        assert_eq!(pelvic_obliquity(&pose), 0.0);
    }

    #[test]
    fn test_pelvic_obliquity_magnitude_and_normalization() {
        let mut pose = make_pose();
        pose.right_hip.y = pose.left_hip.y + 0.02;
        let tilt = pelvic_obliquity(&pose);
        assert!(tilt > 0.0 && tilt <= 90.0);

        // Swapping hip order flips the raw angle by 180°; the normalized
        // magnitude is unchanged.
        std::mem::swap(&mut pose.left_hip, &mut pose.right_hip);
        assert_eq!(pelvic_obliquity(&pose), tilt);
    }
}
