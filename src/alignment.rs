//! Stage alignment gates
//!
//! Four independent per-stage predicates, each consuming one frame's typed
//! landmarks and answering "is the subject positioned for this capture" plus
//! a single corrective feedback message. The predicates hold no state across
//! calls; all temporal behavior (hold timing, countdowns) lives in the
//! capture state machine.
//!
//! Gate ordering matters: orientation and visibility checks run before fine
//! position checks, so a subject who has not turned sideways is told to turn,
//! never nudged left or right.

use crate::types::{CaptureStage, FaceFrame, Landmark, PoseFrame};
use serde::Serialize;

/// Nose-tip tolerance box for the face stage.
const FACE_X_RANGE: (f64, f64) = (0.40, 0.60);
const FACE_Y_RANGE: (f64, f64) = (0.25, 0.45);

/// Torso-center tolerance box for the upper-front stage.
const TORSO_X_RANGE: (f64, f64) = (0.42, 0.58);
const TORSO_Y_RANGE: (f64, f64) = (0.35, 0.55);

/// Shoulder-center tolerance box for the upper-side stage.
const SHOULDER_X_RANGE: (f64, f64) = (0.40, 0.60);
const SHOULDER_Y_RANGE: (f64, f64) = (0.30, 0.50);

/// Hip-center tolerance box for the lower-side stage.
const HIP_X_RANGE: (f64, f64) = (0.35, 0.65);
const HIP_Y_RANGE: (f64, f64) = (0.30, 0.70);

/// Maximum shoulder x-separation still counting as a side-on profile.
const SIDE_SHOULDER_SEPARATION: f64 = 0.15;

/// Maximum hip x-separation still counting as a side-on profile (stage 4).
const SIDE_HIP_SEPARATION: f64 = 0.10;

/// Shoulder-separation ceiling confirming the stage-4 hip reading.
const SIDE_SHOULDER_CONFIRMATION: f64 = 0.13;

/// Required z-depth gap confirming the subject turned right, not left.
const RIGHT_SIDE_DEPTH_GAP: f64 = 0.05;

/// Frame-height fraction below which a knee counts as "in the lower half".
const KNEE_LOWER_FRAME_Y: f64 = 0.45;

/// Frame-height fraction below which foot landmarks count as "near the floor".
const FOOT_LOWER_FRAME_Y: f64 = 0.70;

/// Result of one alignment check tick.
///
/// Fully recomputed on every tick and replaces the previous value; it is
/// never merged with prior results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AlignmentResult {
    pub aligned: bool,
    /// Corrective instruction for the user; empty when nothing needs fixing.
    pub feedback: &'static str,
}

impl AlignmentResult {
    fn ok(feedback: &'static str) -> Self {
        Self {
            aligned: true,
            feedback,
        }
    }

    fn misaligned(feedback: &'static str) -> Self {
        Self {
            aligned: false,
            feedback,
        }
    }
}

fn in_range(value: f64, range: (f64, f64)) -> bool {
    value >= range.0 && value <= range.1
}

/// Stage 1: face capture.
///
/// Aligned iff the nose tip sits inside the centered tolerance box.
/// Horizontal correction takes priority over vertical.
pub fn check_face_alignment(face: Option<&FaceFrame>) -> AlignmentResult {
    let Some(face) = face else {
        return AlignmentResult::misaligned("FACE NOT DETECTED");
    };

    let nose = face.nose_tip;
    let x_aligned = in_range(nose.x, FACE_X_RANGE);
    let y_aligned = in_range(nose.y, FACE_Y_RANGE);

    if x_aligned && y_aligned {
        return AlignmentResult::ok("");
    }

    if !x_aligned {
        let feedback = if nose.x < 0.35 {
            if nose.x < 0.25 {
                "MOVE LEFT"
            } else {
                "A BIT LEFT"
            }
        } else if nose.x > 0.75 {
            "MOVE RIGHT"
        } else {
            "A BIT RIGHT"
        };
        return AlignmentResult::misaligned(feedback);
    }

    let feedback = if nose.y < 0.20 {
        if nose.y < 0.10 {
            "MOVE DOWN"
        } else {
            "A BIT DOWN"
        }
    } else if nose.y > 0.60 {
        "MOVE UP"
    } else {
        "A BIT UP"
    };
    AlignmentResult::misaligned(feedback)
}

/// Stage 2: upper-body front capture.
///
/// Requires the full body visible (head, shoulders, hips, knees, and feet or
/// ankles), then the torso center inside its tolerance box. Missing-landmark
/// feedback outranks position feedback, horizontal outranks distance.
pub fn check_upper_front_alignment(pose: Option<&PoseFrame>) -> AlignmentResult {
    let Some(pose) = pose else {
        return AlignmentResult::misaligned("BODY NOT DETECTED");
    };

    let has_head = pose.nose.is_visible();
    let has_shoulders = pose.left_shoulder.is_visible() && pose.right_shoulder.is_visible();
    let has_hips = pose.left_hip.is_visible() && pose.right_hip.is_visible();
    let has_knees = pose.left_knee.is_visible() && pose.right_knee.is_visible();
    let has_feet = (pose.left_foot_index.is_visible() && pose.right_foot_index.is_visible())
        || (pose.left_ankle.is_visible() && pose.right_ankle.is_visible());

    if !has_head {
        return AlignmentResult::misaligned("SHOW YOUR HEAD");
    }
    if !has_shoulders {
        return AlignmentResult::misaligned("SHOW SHOULDERS");
    }
    if !has_hips {
        return AlignmentResult::misaligned("SHOW HIPS");
    }
    if !has_knees {
        return AlignmentResult::misaligned("SHOW KNEES");
    }
    if !has_feet {
        return AlignmentResult::misaligned("STEP BACK - SHOW FULL BODY");
    }

    let shoulder_center_x = (pose.left_shoulder.x + pose.right_shoulder.x) / 2.0;
    let shoulder_center_y = (pose.left_shoulder.y + pose.right_shoulder.y) / 2.0;
    let hip_center_x = (pose.left_hip.x + pose.right_hip.x) / 2.0;
    let hip_center_y = (pose.left_hip.y + pose.right_hip.y) / 2.0;

    let torso_center_x = (shoulder_center_x + hip_center_x) / 2.0;
    let torso_center_y = (shoulder_center_y + hip_center_y) / 2.0;

    let x_aligned = in_range(torso_center_x, TORSO_X_RANGE);
    let y_aligned = in_range(torso_center_y, TORSO_Y_RANGE);

    if x_aligned && y_aligned {
        return AlignmentResult::ok("");
    }

    if !x_aligned {
        let feedback = if torso_center_x < 0.40 {
            if torso_center_x < 0.30 {
                "MOVE LEFT"
            } else {
                "A BIT LEFT"
            }
        } else if torso_center_x > 0.70 {
            "MOVE RIGHT"
        } else {
            "A BIT RIGHT"
        };
        return AlignmentResult::misaligned(feedback);
    }

    // Vertical torso position doubles as a distance cue: low in frame means
    // too close, high means too far.
    let feedback = if torso_center_y > 0.60 {
        if torso_center_y > 0.70 {
            "STEP BACK"
        } else {
            "A BIT BACK"
        }
    } else if torso_center_y < 0.25 {
        "COME CLOSER"
    } else {
        "A BIT CLOSER"
    };
    AlignmentResult::misaligned(feedback)
}

/// Stage 3: upper-body side capture.
///
/// Requires a side-on profile (shoulders nearly overlapping in x) facing the
/// correct way (left shoulder closer to the camera than the right), then the
/// shoulder center inside its tolerance box.
pub fn check_upper_side_alignment(pose: Option<&PoseFrame>) -> AlignmentResult {
    let Some(pose) = pose else {
        return AlignmentResult::misaligned("BODY NOT DETECTED");
    };

    let shoulder_distance = (pose.left_shoulder.x - pose.right_shoulder.x).abs();
    let is_side_view = shoulder_distance < SIDE_SHOULDER_SEPARATION;

    let left_z = pose.left_shoulder.z_or_zero();
    let right_z = pose.right_shoulder.z_or_zero();
    let is_right_side = left_z < right_z - RIGHT_SIDE_DEPTH_GAP;

    if !is_side_view {
        return AlignmentResult::misaligned("TURN TO YOUR RIGHT SIDE");
    }
    if !is_right_side {
        return AlignmentResult::misaligned("TURN TO YOUR RIGHT (NOT LEFT)");
    }

    let center_x = (pose.left_shoulder.x + pose.right_shoulder.x) / 2.0;
    let center_y = (pose.left_shoulder.y + pose.right_shoulder.y) / 2.0;
    let x_aligned = in_range(center_x, SHOULDER_X_RANGE);
    let y_aligned = in_range(center_y, SHOULDER_Y_RANGE);

    if x_aligned && y_aligned {
        return AlignmentResult::ok("");
    }

    if !x_aligned {
        let feedback = if center_x < 0.35 {
            if center_x < 0.25 {
                "MOVE LEFT"
            } else {
                "A BIT LEFT"
            }
        } else if center_x > 0.75 {
            "MOVE RIGHT"
        } else {
            "A BIT RIGHT"
        };
        return AlignmentResult::misaligned(feedback);
    }

    let feedback = if center_y < 0.25 {
        if center_y < 0.15 {
            "MOVE DOWN"
        } else {
            "A BIT DOWN"
        }
    } else if center_y > 0.65 {
        "MOVE UP"
    } else {
        "A BIT UP"
    };
    AlignmentResult::misaligned(feedback)
}

/// Stage 4: lower-body side capture.
///
/// The strictest gate: a side-on profile read from the hips and confirmed by
/// the shoulders, correct turn direction from hip depth, head and a knee in
/// view, two lower-leg anchors near the floor, then the hip center inside its
/// tolerance box.
pub fn check_lower_side_alignment(pose: Option<&PoseFrame>) -> AlignmentResult {
    let Some(pose) = pose else {
        return AlignmentResult::misaligned("BODY NOT DETECTED");
    };

    let hip_distance = (pose.left_hip.x - pose.right_hip.x).abs();
    let is_side_view = hip_distance < SIDE_HIP_SEPARATION;

    // A hip reading alone can pass with the subject merely twisted at the
    // waist; the shoulder separation confirms a whole-body turn.
    let shoulder_distance = (pose.left_shoulder.x - pose.right_shoulder.x).abs();
    let shoulders_confirm = shoulder_distance < SIDE_SHOULDER_CONFIRMATION;

    let left_z = pose.left_hip.z_or_zero();
    let right_z = pose.right_hip.z_or_zero();
    let is_right_side = left_z < right_z - RIGHT_SIDE_DEPTH_GAP;

    if !is_side_view {
        return AlignmentResult::misaligned("TURN TO YOUR RIGHT SIDE");
    }
    if !shoulders_confirm {
        return AlignmentResult::misaligned("TURN YOUR SHOULDERS SIDEWAYS TOO");
    }
    if !is_right_side {
        return AlignmentResult::misaligned("TURN TO YOUR RIGHT (NOT LEFT)");
    }

    let has_head = pose.nose.is_visible();
    let knee_in_lower_frame = knee_in_lower_half(&pose.left_knee)
        || knee_in_lower_half(&pose.right_knee);
    let foot_anchor_count = [
        pose.left_ankle,
        pose.right_ankle,
        pose.left_heel,
        pose.right_heel,
        pose.left_foot_index,
        pose.right_foot_index,
    ]
    .iter()
    .filter(|p| p.is_visible() && p.y > FOOT_LOWER_FRAME_Y)
    .count();

    if !has_head {
        return AlignmentResult::misaligned("SHOW YOUR HEAD");
    }
    if !knee_in_lower_frame {
        return AlignmentResult::misaligned("SHOW YOUR KNEES");
    }
    if foot_anchor_count < 2 {
        return AlignmentResult::misaligned("STEP BACK - SHOW YOUR FEET");
    }

    let hip_center_x = (pose.left_hip.x + pose.right_hip.x) / 2.0;
    let hip_center_y = (pose.left_hip.y + pose.right_hip.y) / 2.0;
    let x_aligned = in_range(hip_center_x, HIP_X_RANGE);
    let y_aligned = in_range(hip_center_y, HIP_Y_RANGE);

    if x_aligned && y_aligned {
        return AlignmentResult::ok("PERFECT! HOLD STILL");
    }

    if !x_aligned {
        let feedback = if hip_center_x < 0.35 {
            if hip_center_x < 0.25 {
                "MOVE LEFT"
            } else {
                "A BIT LEFT"
            }
        } else if hip_center_x > 0.75 {
            "MOVE RIGHT"
        } else {
            "A BIT RIGHT"
        };
        return AlignmentResult::misaligned(feedback);
    }

    let feedback = if hip_center_y > 0.70 {
        if hip_center_y > 0.80 {
            "STEP BACK"
        } else {
            "A BIT BACK"
        }
    } else if hip_center_y < 0.20 {
        "COME CLOSER"
    } else {
        "A BIT CLOSER"
    };
    AlignmentResult::misaligned(feedback)
}

fn knee_in_lower_half(knee: &Landmark) -> bool {
    knee.is_visible() && knee.y > KNEE_LOWER_FRAME_Y
}

/// Route an alignment check to the current stage's predicate.
pub fn check_alignment(
    stage: CaptureStage,
    face: Option<&FaceFrame>,
    pose: Option<&PoseFrame>,
) -> AlignmentResult {
    match stage {
        CaptureStage::Face => check_face_alignment(face),
        CaptureStage::UpperFront => check_upper_front_alignment(pose),
        CaptureStage::UpperSide => check_upper_side_alignment(pose),
        CaptureStage::LowerSide => check_lower_side_alignment(pose),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FACE_LANDMARK_COUNT, POSE_LANDMARK_COUNT};

    fn face_with_nose(x: f64, y: f64) -> FaceFrame {
        let mut points = vec![Landmark::new(0.5, 0.5); FACE_LANDMARK_COUNT];
        points[1] = Landmark::new(x, y);
        FaceFrame::from_landmarks(&points).unwrap()
    }

    /// Front-facing, centered, full-body pose.
    fn front_pose() -> PoseFrame {
        let mut points = vec![Landmark::new(0.5, 0.5); POSE_LANDMARK_COUNT];
        points[0] = Landmark::new(0.50, 0.10);
        points[7] = Landmark::new(0.48, 0.12);
        points[11] = Landmark::new(0.40, 0.28);
        points[12] = Landmark::new(0.60, 0.28);
        points[23] = Landmark::new(0.44, 0.55);
        points[24] = Landmark::new(0.56, 0.55);
        points[25] = Landmark::new(0.44, 0.72);
        points[26] = Landmark::new(0.56, 0.72);
        points[27] = Landmark::new(0.44, 0.88);
        points[28] = Landmark::new(0.56, 0.88);
        points[29] = Landmark::new(0.43, 0.93);
        points[30] = Landmark::new(0.57, 0.93);
        points[31] = Landmark::new(0.47, 0.92);
        points[32] = Landmark::new(0.53, 0.92);
        PoseFrame::from_landmarks(&points).unwrap()
    }

    /// Right-side-on profile with the left side toward the camera.
    fn side_pose() -> PoseFrame {
        let mut pose = front_pose();
        pose.left_shoulder = Landmark::with_z(0.49, 0.38, -0.10);
        pose.right_shoulder = Landmark::with_z(0.51, 0.38, 0.10);
        pose.left_hip = Landmark::with_z(0.49, 0.55, -0.10);
        pose.right_hip = Landmark::with_z(0.51, 0.55, 0.10);
        pose.left_knee = Landmark::new(0.49, 0.72);
        pose.right_knee = Landmark::new(0.51, 0.72);
        pose.left_ankle = Landmark::new(0.49, 0.88);
        pose.right_ankle = Landmark::new(0.51, 0.88);
        pose.left_heel = Landmark::new(0.48, 0.93);
        pose.right_heel = Landmark::new(0.52, 0.93);
        pose.left_foot_index = Landmark::new(0.53, 0.92);
        pose.right_foot_index = Landmark::new(0.55, 0.92);
        pose
    }

    #[test]
    fn test_face_centered_nose_aligned() {
        let result = check_face_alignment(Some(&face_with_nose(0.5, 0.35)));
        assert!(result.aligned);
        assert_eq!(result.feedback, "");
    }

    #[test]
    fn test_face_horizontal_feedback_outranks_vertical() {
        // Nose far left: the message must be a left/right correction even
        // though a vertical nudge could also apply.
        let result = check_face_alignment(Some(&face_with_nose(0.2, 0.35)));
        assert!(!result.aligned);
        assert_eq!(result.feedback, "MOVE LEFT");

        let result = check_face_alignment(Some(&face_with_nose(0.2, 0.05)));
        assert_eq!(result.feedback, "MOVE LEFT");
    }

    #[test]
    fn test_face_vertical_feedback() {
        let high = check_face_alignment(Some(&face_with_nose(0.5, 0.08)));
        assert_eq!(high.feedback, "MOVE DOWN");

        let low = check_face_alignment(Some(&face_with_nose(0.5, 0.70)));
        assert_eq!(low.feedback, "MOVE UP");
    }

    #[test]
    fn test_face_not_detected() {
        let result = check_face_alignment(None);
        assert!(!result.aligned);
        assert_eq!(result.feedback, "FACE NOT DETECTED");
    }

    #[test]
    fn test_upper_front_aligned() {
        let result = check_upper_front_alignment(Some(&front_pose()));
        assert!(result.aligned, "feedback: {}", result.feedback);
    }

    #[test]
    fn test_upper_front_missing_knees_outranks_position() {
        let mut pose = front_pose();
        pose.left_knee.visibility = Some(0.1);
        // Also push the torso off-center; the visibility message still wins.
        pose.left_shoulder.x = 0.10;
        pose.right_shoulder.x = 0.30;
        let result = check_upper_front_alignment(Some(&pose));
        assert!(!result.aligned);
        assert_eq!(result.feedback, "SHOW KNEES");
    }

    #[test]
    fn test_upper_front_missing_feet_with_ankle_fallback() {
        let mut pose = front_pose();
        // Feet landmarks out of frame, ankles still visible: feet gate passes.
        pose.left_foot_index.y = 1.2;
        pose.right_foot_index.y = 1.2;
        assert!(check_upper_front_alignment(Some(&pose)).aligned);

        // Ankles gone too: full-body message.
        pose.left_ankle.visibility = Some(0.1);
        let result = check_upper_front_alignment(Some(&pose));
        assert_eq!(result.feedback, "STEP BACK - SHOW FULL BODY");
    }

    #[test]
    fn test_upper_front_horizontal_nudge() {
        let mut pose = front_pose();
        for point in [
            &mut pose.left_shoulder,
            &mut pose.right_shoulder,
            &mut pose.left_hip,
            &mut pose.right_hip,
        ] {
            point.x -= 0.15;
        }
        let result = check_upper_front_alignment(Some(&pose));
        assert!(!result.aligned);
        assert_eq!(result.feedback, "A BIT LEFT");
    }

    #[test]
    fn test_upper_side_turn_feedback_outranks_position() {
        // Front-facing subject standing off-center: must be told to turn,
        // not to move sideways.
        let mut pose = front_pose();
        for point in [&mut pose.left_shoulder, &mut pose.right_shoulder] {
            point.x -= 0.2;
        }
        let result = check_upper_side_alignment(Some(&pose));
        assert!(!result.aligned);
        assert_eq!(result.feedback, "TURN TO YOUR RIGHT SIDE");
    }

    #[test]
    fn test_upper_side_wrong_direction() {
        let mut pose = side_pose();
        // Right shoulder closer to the camera: turned left instead of right.
        pose.left_shoulder.z = Some(0.10);
        pose.right_shoulder.z = Some(-0.10);
        let result = check_upper_side_alignment(Some(&pose));
        assert_eq!(result.feedback, "TURN TO YOUR RIGHT (NOT LEFT)");
    }

    #[test]
    fn test_upper_side_aligned() {
        let result = check_upper_side_alignment(Some(&side_pose()));
        assert!(result.aligned, "feedback: {}", result.feedback);
    }

    #[test]
    fn test_lower_side_aligned() {
        let result = check_lower_side_alignment(Some(&side_pose()));
        assert!(result.aligned, "feedback: {}", result.feedback);
        assert_eq!(result.feedback, "PERFECT! HOLD STILL");
    }

    #[test]
    fn test_lower_side_shoulder_confirmation() {
        let mut pose = side_pose();
        // Hips side-on but shoulders square: twisted at the waist.
        pose.left_shoulder.x = 0.40;
        pose.right_shoulder.x = 0.60;
        let result = check_lower_side_alignment(Some(&pose));
        assert!(!result.aligned);
        assert_eq!(result.feedback, "TURN YOUR SHOULDERS SIDEWAYS TOO");
    }

    #[test]
    fn test_lower_side_requires_foot_anchors() {
        let mut pose = side_pose();
        // Everything below the ankles cropped out of frame.
        for point in [
            &mut pose.left_ankle,
            &mut pose.right_ankle,
            &mut pose.left_heel,
            &mut pose.right_heel,
            &mut pose.left_foot_index,
            &mut pose.right_foot_index,
        ] {
            point.y = 1.3;
        }
        let result = check_lower_side_alignment(Some(&pose));
        assert!(!result.aligned);
        assert_eq!(result.feedback, "STEP BACK - SHOW YOUR FEET");
    }

    #[test]
    fn test_lower_side_knee_gate() {
        let mut pose = side_pose();
        pose.left_knee.visibility = Some(0.1);
        pose.right_knee.visibility = Some(0.1);
        let result = check_lower_side_alignment(Some(&pose));
        assert_eq!(result.feedback, "SHOW YOUR KNEES");
    }

    #[test]
    fn test_body_not_detected() {
        for stage in [
            CaptureStage::UpperFront,
            CaptureStage::UpperSide,
            CaptureStage::LowerSide,
        ] {
            let result = check_alignment(stage, None, None);
            assert!(!result.aligned);
            assert_eq!(result.feedback, "BODY NOT DETECTED");
        }
    }

    #[test]
    fn test_router_dispatches_by_stage() {
        let face = face_with_nose(0.5, 0.35);
        let pose = side_pose();

        assert!(check_alignment(CaptureStage::Face, Some(&face), Some(&pose)).aligned);
        assert!(check_alignment(CaptureStage::UpperSide, None, Some(&pose)).aligned);
        assert!(check_alignment(CaptureStage::LowerSide, None, Some(&pose)).aligned);
        // The face stage ignores the pose frame entirely.
        assert!(!check_alignment(CaptureStage::Face, None, Some(&pose)).aligned);
    }
}
