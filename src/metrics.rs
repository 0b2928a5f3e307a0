//! Per-frame metric extraction
//!
//! This module turns one typed landmark frame into the metric records the
//! pattern analyzer consumes. Face metrics are normalized by the inter-iris
//! distance so they are invariant to how far the subject stands from the
//! camera; body metrics delegate to the geometry kernel.

use crate::geometry::{
    angle_of_line, craniovertebral_angle, distance, foot_arch_both_sides, joint_angle,
    pelvic_obliquity, round1, round3, shoulder_height_asymmetry,
};
use crate::types::{BodyMetrics, CombinedMetrics, FaceFrame, FaceMetrics, PoseFrame};

/// Derive face metrics from one face landmark frame.
///
/// All asymmetry metrics are divided by the inter-iris distance. When the
/// iris landmarks coincide (width 0) the divisor falls back to 1.0 — the one
/// deliberate neutral default in the extractor, kept so a single corrupt
/// frame yields oversized-but-finite values instead of infinities.
pub fn extract_face_metrics(face: &FaceFrame) -> FaceMetrics {
    let iris_width = distance(&face.left_iris, &face.right_iris);
    let norm_factor = if iris_width > 0.0 { iris_width } else { 1.0 };

    let eye_diff_y = (face.left_eye_outer.y - face.right_eye_outer.y).abs();
    let eye_sym = round3(eye_diff_y / norm_factor);

    let jaw_diff_x = (face.chin.x - face.nose_bridge.x).abs();
    let jaw_shift = round3(jaw_diff_x / norm_factor);

    let tilt = angle_of_line(&face.left_eye_outer, &face.right_eye_outer);
    let head_tilt = round1(tilt.abs());

    let dist_left = distance(&face.nose_tip, &face.left_nostril);
    let dist_right = distance(&face.nose_tip, &face.right_nostril);
    let nostril_asym = round3((dist_left - dist_right).abs() / norm_factor);

    FaceMetrics {
        eye_sym: Some(eye_sym),
        jaw_shift: Some(jaw_shift),
        head_tilt: Some(head_tilt),
        nostril_asym: Some(nostril_asym),
        iris_width: Some(iris_width),
    }
}

/// Derive body metrics from one pose landmark frame.
///
/// The CVA and knee angle use the left-side landmark chain (the capture flow
/// has the subject facing right, putting the left side toward the camera).
/// Degenerate or implausible measurements propagate as `None`.
pub fn extract_body_metrics(pose: &PoseFrame) -> BodyMetrics {
    let shoulder_height = shoulder_height_asymmetry(pose);

    let fhp_angle = craniovertebral_angle(&pose.nose, &pose.left_ear, &pose.left_shoulder);

    let pelvic_tilt = Some(pelvic_obliquity(pose));

    let knee_angle =
        joint_angle(&pose.left_hip, &pose.left_knee, &pose.left_ankle).map(round1);

    let foot_arch_ratio = foot_arch_both_sides(pose).average;

    BodyMetrics {
        shoulder_height,
        fhp_angle,
        pelvic_tilt,
        knee_angle,
        foot_arch_ratio,
    }
}

/// Derive metrics from whichever frames were detected this tick.
///
/// An absent frame is a valid "not detected" state; the corresponding metric
/// record stays at its all-`None` default.
pub fn extract_combined(
    face: Option<&FaceFrame>,
    pose: Option<&PoseFrame>,
) -> CombinedMetrics {
    CombinedMetrics {
        face: face.map(extract_face_metrics).unwrap_or_default(),
        body: pose.map(extract_body_metrics).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Landmark, FACE_LANDMARK_COUNT, POSE_LANDMARK_COUNT};

    fn make_face() -> FaceFrame {
        let mut points = vec![Landmark::new(0.5, 0.5); FACE_LANDMARK_COUNT];
        points[1] = Landmark::new(0.50, 0.35); // nose tip
        points[6] = Landmark::new(0.50, 0.30); // nose bridge
        points[33] = Landmark::new(0.44, 0.30); // left eye outer
        points[98] = Landmark::new(0.48, 0.37); // left nostril
        points[152] = Landmark::new(0.50, 0.48); // chin
        points[263] = Landmark::new(0.56, 0.30); // right eye outer
        points[327] = Landmark::new(0.52, 0.37); // right nostril
        points[468] = Landmark::new(0.46, 0.31); // left iris
        points[473] = Landmark::new(0.54, 0.31); // right iris
        FaceFrame::from_landmarks(&points).unwrap()
    }

    fn make_pose() -> PoseFrame {
        let mut points = vec![Landmark::new(0.5, 0.5); POSE_LANDMARK_COUNT];
        points[0] = Landmark::new(0.50, 0.10);
        points[7] = Landmark::new(0.48, 0.12);
        points[11] = Landmark::new(0.40, 0.25);
        points[12] = Landmark::new(0.60, 0.25);
        points[23] = Landmark::new(0.43, 0.50);
        points[24] = Landmark::new(0.57, 0.50);
        points[25] = Landmark::new(0.44, 0.70);
        points[26] = Landmark::new(0.56, 0.70);
        points[27] = Landmark::new(0.43, 0.88);
        points[28] = Landmark::new(0.57, 0.88);
        points[29] = Landmark::new(0.42, 0.95);
        points[30] = Landmark::new(0.58, 0.95);
        points[31] = Landmark::new(0.47, 0.94);
        points[32] = Landmark::new(0.53, 0.94);
        PoseFrame::from_landmarks(&points).unwrap()
    }

    #[test]
    fn test_face_metrics_symmetric_face() {
        let metrics = extract_face_metrics(&make_face());

        // A perfectly symmetric fixture reads near-zero on every asymmetry.
        assert_eq!(metrics.eye_sym, Some(0.0));
        assert_eq!(metrics.head_tilt, Some(0.0));
        assert_eq!(metrics.jaw_shift, Some(0.0));
        assert_eq!(metrics.nostril_asym, Some(0.0));
        assert!((metrics.iris_width.unwrap() - 0.08).abs() < 1e-9);
    }

    #[test]
    fn test_face_metrics_tilted_head() {
        let mut points = vec![Landmark::new(0.5, 0.5); FACE_LANDMARK_COUNT];
        points[1] = Landmark::new(0.50, 0.35);
        points[6] = Landmark::new(0.50, 0.30);
        points[33] = Landmark::new(0.44, 0.28); // left eye raised
        points[98] = Landmark::new(0.48, 0.37);
        points[152] = Landmark::new(0.50, 0.48);
        points[263] = Landmark::new(0.56, 0.32); // right eye lowered
        points[327] = Landmark::new(0.52, 0.37);
        points[468] = Landmark::new(0.46, 0.30);
        points[473] = Landmark::new(0.54, 0.30);
        let face = FaceFrame::from_landmarks(&points).unwrap();

        let metrics = extract_face_metrics(&face);
        assert!(metrics.head_tilt.unwrap() > 10.0);
        assert!(metrics.eye_sym.unwrap() > 0.0);
    }

    #[test]
    fn test_face_metrics_zero_iris_width_fallback() {
        let mut points = vec![Landmark::new(0.5, 0.5); FACE_LANDMARK_COUNT];
        points[33] = Landmark::new(0.44, 0.30);
        points[263] = Landmark::new(0.56, 0.32);
        // Both iris points coincide: norm factor falls back to 1.0.
        points[468] = Landmark::new(0.50, 0.31);
        points[473] = Landmark::new(0.50, 0.31);
        let face = FaceFrame::from_landmarks(&points).unwrap();

        let metrics = extract_face_metrics(&face);
        assert_eq!(metrics.iris_width, Some(0.0));
        // eye_sym = raw Δy / 1.0
        assert_eq!(metrics.eye_sym, Some(0.02));
    }

    #[test]
    fn test_body_metrics_upright_pose() {
        let metrics = extract_body_metrics(&make_pose());

        assert_eq!(metrics.shoulder_height, Some(0.0));
        assert_eq!(metrics.pelvic_tilt, Some(0.0));
        assert!(metrics.fhp_angle.is_some());
        // Hip→knee→ankle is nearly collinear for the upright fixture.
        assert!(metrics.knee_angle.unwrap() > 170.0);
        assert!(metrics.foot_arch_ratio.is_some());
    }

    #[test]
    fn test_body_metrics_propagate_none() {
        let mut pose = make_pose();
        // Collapse the body height: shoulder asymmetry becomes degenerate.
        for point in [
            &mut pose.left_ankle,
            &mut pose.right_ankle,
        ] {
            point.y = 0.25;
        }
        let metrics = extract_body_metrics(&pose);
        assert_eq!(metrics.shoulder_height, None);
        // The remaining metrics are unaffected.
        assert!(metrics.fhp_angle.is_some());
    }

    #[test]
    fn test_extract_combined_missing_frames() {
        let combined = extract_combined(None, None);
        assert_eq!(combined.face, FaceMetrics::default());
        assert_eq!(combined.body, BodyMetrics::default());

        let pose = make_pose();
        let body_only = extract_combined(None, Some(&pose));
        assert_eq!(body_only.face, FaceMetrics::default());
        assert!(body_only.body.fhp_angle.is_some());
    }
}
