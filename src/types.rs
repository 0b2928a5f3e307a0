//! Core types for the posturekit pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw landmarks, typed landmark frames, per-frame metric records,
//! and the pattern/severity vocabulary shared by the analyzer and the fusion
//! engine.

use serde::{Deserialize, Serialize};

/// Detection-confidence floor below which a landmark is treated as unseen.
pub const VISIBILITY_THRESHOLD: f64 = 0.4;

/// Minimum number of points in a usable pose landmark array.
pub const POSE_LANDMARK_COUNT: usize = 33;

/// Minimum number of points in a usable face-mesh landmark array.
///
/// The extractor reads up to index 473 (right iris), so anything shorter is
/// treated as "not detected this tick".
pub const FACE_LANDMARK_COUNT: usize = 474;

/// A single detected landmark, normalized to the frame.
///
/// `x` and `y` are frame-relative in `[0, 1]` with y increasing downward.
/// `z` is relative depth (more negative = closer to the camera) and
/// `visibility` is the detector's per-point confidence; both are optional.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            visibility: None,
        }
    }

    pub fn with_z(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z: Some(z),
            visibility: None,
        }
    }

    /// Depth with the neutral default of 0.0 when the detector omits z.
    pub fn z_or_zero(&self) -> f64 {
        self.z.unwrap_or(0.0)
    }

    /// Whether the point lies inside the normalized frame.
    pub fn is_in_frame(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }

    /// In-frame and either unscored or above the visibility floor.
    pub fn is_visible(&self) -> bool {
        self.is_in_frame()
            && self
                .visibility
                .map(|v| v > VISIBILITY_THRESHOLD)
                .unwrap_or(true)
    }
}

/// Body side selector for paired landmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// Face landmark frame with named fields.
///
/// Populated once per inference tick from the raw indexed face-mesh array so
/// that downstream code never touches magic indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceFrame {
    pub nose_tip: Landmark,        // mesh index 1
    pub nose_bridge: Landmark,     // mesh index 6
    pub left_eye_outer: Landmark,  // mesh index 33
    pub left_nostril: Landmark,    // mesh index 98
    pub chin: Landmark,            // mesh index 152
    pub right_eye_outer: Landmark, // mesh index 263
    pub right_nostril: Landmark,   // mesh index 327
    pub left_iris: Landmark,       // mesh index 468
    pub right_iris: Landmark,      // mesh index 473
}

impl FaceFrame {
    /// Build from a raw face-mesh array. Returns `None` when the array is too
    /// short to cover the iris landmarks — a valid "not detected" state, not
    /// an error.
    pub fn from_landmarks(landmarks: &[Landmark]) -> Option<Self> {
        if landmarks.len() < FACE_LANDMARK_COUNT {
            return None;
        }
        Some(Self {
            nose_tip: landmarks[1],
            nose_bridge: landmarks[6],
            left_eye_outer: landmarks[33],
            left_nostril: landmarks[98],
            chin: landmarks[152],
            right_eye_outer: landmarks[263],
            right_nostril: landmarks[327],
            left_iris: landmarks[468],
            right_iris: landmarks[473],
        })
    }
}

/// Pose landmark frame with named fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseFrame {
    pub nose: Landmark,             // pose index 0
    pub left_ear: Landmark,         // pose index 7
    pub left_shoulder: Landmark,    // pose index 11
    pub right_shoulder: Landmark,   // pose index 12
    pub left_hip: Landmark,         // pose index 23
    pub right_hip: Landmark,        // pose index 24
    pub left_knee: Landmark,        // pose index 25
    pub right_knee: Landmark,       // pose index 26
    pub left_ankle: Landmark,       // pose index 27
    pub right_ankle: Landmark,      // pose index 28
    pub left_heel: Landmark,        // pose index 29
    pub right_heel: Landmark,       // pose index 30
    pub left_foot_index: Landmark,  // pose index 31
    pub right_foot_index: Landmark, // pose index 32
}

impl PoseFrame {
    /// Build from a raw pose array. Returns `None` for arrays shorter than the
    /// full 33-point skeleton.
    pub fn from_landmarks(landmarks: &[Landmark]) -> Option<Self> {
        if landmarks.len() < POSE_LANDMARK_COUNT {
            return None;
        }
        Some(Self {
            nose: landmarks[0],
            left_ear: landmarks[7],
            left_shoulder: landmarks[11],
            right_shoulder: landmarks[12],
            left_hip: landmarks[23],
            right_hip: landmarks[24],
            left_knee: landmarks[25],
            right_knee: landmarks[26],
            left_ankle: landmarks[27],
            right_ankle: landmarks[28],
            left_heel: landmarks[29],
            right_heel: landmarks[30],
            left_foot_index: landmarks[31],
            right_foot_index: landmarks[32],
        })
    }

    pub fn ankle(&self, side: Side) -> Landmark {
        match side {
            Side::Left => self.left_ankle,
            Side::Right => self.right_ankle,
        }
    }

    pub fn heel(&self, side: Side) -> Landmark {
        match side {
            Side::Left => self.left_heel,
            Side::Right => self.right_heel,
        }
    }

    pub fn foot_index(&self, side: Side) -> Landmark {
        match side {
            Side::Left => self.left_foot_index,
            Side::Right => self.right_foot_index,
        }
    }
}

/// Per-frame face metrics derived from a [`FaceFrame`].
///
/// All values are `None` when the underlying measurement was degenerate or
/// implausible; `None` is propagated, never defaulted to zero, so downstream
/// scoring can distinguish "undetected" from "no deviation".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceMetrics {
    /// Eye-line vertical asymmetry, iris-width normalized.
    pub eye_sym: Option<f64>,
    /// Chin-to-nose-bridge horizontal offset, iris-width normalized.
    pub jaw_shift: Option<f64>,
    /// Absolute angle of the eye line from horizontal, degrees.
    pub head_tilt: Option<f64>,
    /// Left/right nostril distance asymmetry, iris-width normalized.
    pub nostril_asym: Option<f64>,
    /// Inter-iris distance used as the normalization factor.
    pub iris_width: Option<f64>,
}

/// Per-frame body metrics derived from a [`PoseFrame`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyMetrics {
    /// Shoulder height asymmetry as a percentage of body height.
    pub shoulder_height: Option<f64>,
    /// Craniovertebral angle (forward head posture), degrees.
    pub fhp_angle: Option<f64>,
    /// Pelvic obliquity magnitude, degrees. Lateral hip-line tilt, not
    /// anterior/posterior tilt.
    pub pelvic_tilt: Option<f64>,
    /// Hip-knee-ankle joint angle, degrees.
    pub knee_angle: Option<f64>,
    /// Averaged left/right medial arch height ratio.
    pub foot_arch_ratio: Option<f64>,
}

/// Combined face + body metrics consumed by the pattern analyzer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedMetrics {
    pub face: FaceMetrics,
    pub body: BodyMetrics,
}

/// The four capture stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStage {
    Face,
    UpperFront,
    UpperSide,
    LowerSide,
}

impl CaptureStage {
    /// Following stage, or `None` after the last one.
    pub fn next(&self) -> Option<CaptureStage> {
        match self {
            CaptureStage::Face => Some(CaptureStage::UpperFront),
            CaptureStage::UpperFront => Some(CaptureStage::UpperSide),
            CaptureStage::UpperSide => Some(CaptureStage::LowerSide),
            CaptureStage::LowerSide => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureStage::Face => "face",
            CaptureStage::UpperFront => "upper_front",
            CaptureStage::UpperSide => "upper_side",
            CaptureStage::LowerSide => "lower_side",
        }
    }
}

impl std::fmt::Display for CaptureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metrics committed by the face capture stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceStageMetrics {
    pub eye_sym: Option<f64>,
    pub jaw_shift: Option<f64>,
    pub head_tilt: Option<f64>,
    pub nostril_asym: Option<f64>,
}

impl From<FaceMetrics> for FaceStageMetrics {
    fn from(m: FaceMetrics) -> Self {
        Self {
            eye_sym: m.eye_sym,
            jaw_shift: m.jaw_shift,
            head_tilt: m.head_tilt,
            nostril_asym: m.nostril_asym,
        }
    }
}

/// Metrics committed by the upper-front capture stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpperFrontStageMetrics {
    pub shoulder_height: Option<f64>,
}

/// Metrics committed by the upper-side capture stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpperSideStageMetrics {
    pub fhp_angle: Option<f64>,
}

/// Metrics committed by the lower-side capture stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowerSideStageMetrics {
    pub pelvic_tilt: Option<f64>,
    pub knee_angle: Option<f64>,
    pub foot_arch_ratio: Option<f64>,
}

/// Per-stage metric storage for one capture session.
///
/// Each slot is filled exactly once when the user confirms that stage's
/// capture, and cleared only by a retake or a full session reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageData {
    pub face: Option<FaceStageMetrics>,
    pub upper_front: Option<UpperFrontStageMetrics>,
    pub upper_side: Option<UpperSideStageMetrics>,
    pub lower_side: Option<LowerSideStageMetrics>,
}

impl StageData {
    /// Whether all four stages have committed metrics.
    pub fn is_complete(&self) -> bool {
        self.face.is_some()
            && self.upper_front.is_some()
            && self.upper_side.is_some()
            && self.lower_side.is_some()
    }

    /// Stages still missing committed metrics, in capture order.
    pub fn missing_stages(&self) -> Vec<CaptureStage> {
        let mut missing = Vec::new();
        if self.face.is_none() {
            missing.push(CaptureStage::Face);
        }
        if self.upper_front.is_none() {
            missing.push(CaptureStage::UpperFront);
        }
        if self.upper_side.is_none() {
            missing.push(CaptureStage::UpperSide);
        }
        if self.lower_side.is_none() {
            missing.push(CaptureStage::LowerSide);
        }
        missing
    }

    /// Assemble the combined analyzer input from the committed stages.
    ///
    /// Returns `None` until all four stages are present.
    pub fn combined(&self) -> Option<CombinedMetrics> {
        let face = self.face?;
        let upper_front = self.upper_front?;
        let upper_side = self.upper_side?;
        let lower_side = self.lower_side?;

        Some(CombinedMetrics {
            face: FaceMetrics {
                eye_sym: face.eye_sym,
                jaw_shift: face.jaw_shift,
                head_tilt: face.head_tilt,
                nostril_asym: face.nostril_asym,
                iris_width: None,
            },
            body: BodyMetrics {
                shoulder_height: upper_front.shoulder_height,
                fhp_angle: upper_side.fhp_angle,
                pelvic_tilt: lower_side.pelvic_tilt,
                knee_angle: lower_side.knee_angle,
                foot_arch_ratio: lower_side.foot_arch_ratio,
            },
        })
    }
}

/// The four somatic patterns scored by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatternKey {
    UpperCompression,
    LowerCompression,
    ThoracicCollapse,
    LateralAsymmetry,
}

impl PatternKey {
    pub const ALL: [PatternKey; 4] = [
        PatternKey::UpperCompression,
        PatternKey::LowerCompression,
        PatternKey::ThoracicCollapse,
        PatternKey::LateralAsymmetry,
    ];

    /// camelCase wire key, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKey::UpperCompression => "upperCompression",
            PatternKey::LowerCompression => "lowerCompression",
            PatternKey::ThoracicCollapse => "thoracicCollapse",
            PatternKey::LateralAsymmetry => "lateralAsymmetry",
        }
    }

    /// kebab-case identifier used in exported reports.
    pub fn id(&self) -> &'static str {
        match self {
            PatternKey::UpperCompression => "upper-compression",
            PatternKey::LowerCompression => "lower-compression",
            PatternKey::ThoracicCollapse => "thoracic-collapse",
            PatternKey::LateralAsymmetry => "lateral-asymmetry",
        }
    }

    /// Human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            PatternKey::UpperCompression => "Upper Compression",
            PatternKey::LowerCompression => "Lower Compression",
            PatternKey::ThoracicCollapse => "Thoracic Collapse",
            PatternKey::LateralAsymmetry => "Lateral Asymmetry",
        }
    }
}

impl std::fmt::Display for PatternKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value per somatic pattern.
///
/// Used for raw questionnaire points, normalized scores, fused scores and
/// modality contributions alike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerPattern<T> {
    pub upper_compression: T,
    pub lower_compression: T,
    pub thoracic_collapse: T,
    pub lateral_asymmetry: T,
}

impl<T> PerPattern<T> {
    pub fn get(&self, key: PatternKey) -> &T {
        match key {
            PatternKey::UpperCompression => &self.upper_compression,
            PatternKey::LowerCompression => &self.lower_compression,
            PatternKey::ThoracicCollapse => &self.thoracic_collapse,
            PatternKey::LateralAsymmetry => &self.lateral_asymmetry,
        }
    }

    pub fn get_mut(&mut self, key: PatternKey) -> &mut T {
        match key {
            PatternKey::UpperCompression => &mut self.upper_compression,
            PatternKey::LowerCompression => &mut self.lower_compression,
            PatternKey::ThoracicCollapse => &mut self.thoracic_collapse,
            PatternKey::LateralAsymmetry => &mut self.lateral_asymmetry,
        }
    }

    /// Build by evaluating `f` for each pattern key.
    pub fn from_fn(mut f: impl FnMut(PatternKey) -> T) -> Self {
        Self {
            upper_compression: f(PatternKey::UpperCompression),
            lower_compression: f(PatternKey::LowerCompression),
            thoracic_collapse: f(PatternKey::ThoracicCollapse),
            lateral_asymmetry: f(PatternKey::LateralAsymmetry),
        }
    }
}

impl<T: Copy> PerPattern<T> {
    pub fn values(&self) -> [T; 4] {
        [
            self.upper_compression,
            self.lower_compression,
            self.thoracic_collapse,
            self.lateral_asymmetry,
        ]
    }
}

/// Severity band for a pattern score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    None,
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    /// Fixed clinical mapping applied to fused scores:
    /// `<30 → none, 30-49 → mild, 50-69 → moderate, ≥70 → severe`.
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            Severity::Severe
        } else if score >= 50.0 {
            Severity::Moderate
        } else if score >= 30.0 {
            Severity::Mild
        } else {
            Severity::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_visibility() {
        let seen = Landmark {
            x: 0.5,
            y: 0.5,
            z: None,
            visibility: Some(0.9),
        };
        assert!(seen.is_visible());

        let low_confidence = Landmark {
            visibility: Some(0.2),
            ..seen
        };
        assert!(!low_confidence.is_visible());

        let unscored = Landmark::new(0.5, 0.5);
        assert!(unscored.is_visible());

        let out_of_frame = Landmark::new(1.2, 0.5);
        assert!(!out_of_frame.is_visible());
    }

    #[test]
    fn test_pose_frame_requires_full_skeleton() {
        let short = vec![Landmark::new(0.5, 0.5); 20];
        assert!(PoseFrame::from_landmarks(&short).is_none());

        let full = vec![Landmark::new(0.5, 0.5); POSE_LANDMARK_COUNT];
        assert!(PoseFrame::from_landmarks(&full).is_some());
    }

    #[test]
    fn test_face_frame_requires_iris_coverage() {
        let short = vec![Landmark::new(0.5, 0.5); 200];
        assert!(FaceFrame::from_landmarks(&short).is_none());

        let full = vec![Landmark::new(0.5, 0.5); 478];
        assert!(FaceFrame::from_landmarks(&full).is_some());
    }

    #[test]
    fn test_pattern_key_serialization() {
        let json = serde_json::to_string(&PatternKey::UpperCompression).unwrap();
        assert_eq!(json, "\"upperCompression\"");

        let parsed: PatternKey = serde_json::from_str("\"lateralAsymmetry\"").unwrap();
        assert_eq!(parsed, PatternKey::LateralAsymmetry);
    }

    #[test]
    fn test_per_pattern_access() {
        let mut scores = PerPattern::<f64>::default();
        *scores.get_mut(PatternKey::ThoracicCollapse) = 42.0;
        assert_eq!(*scores.get(PatternKey::ThoracicCollapse), 42.0);
        assert_eq!(scores.values(), [0.0, 0.0, 42.0, 0.0]);
    }

    #[test]
    fn test_severity_fixed_mapping() {
        assert_eq!(Severity::from_score(29.9), Severity::None);
        assert_eq!(Severity::from_score(30.0), Severity::Mild);
        assert_eq!(Severity::from_score(50.0), Severity::Moderate);
        assert_eq!(Severity::from_score(69.9), Severity::Moderate);
        assert_eq!(Severity::from_score(70.0), Severity::Severe);
    }

    #[test]
    fn test_stage_data_completion() {
        let mut data = StageData::default();
        assert!(!data.is_complete());
        assert_eq!(data.missing_stages().len(), 4);

        data.face = Some(FaceStageMetrics::default());
        data.upper_front = Some(UpperFrontStageMetrics {
            shoulder_height: Some(1.8),
        });
        data.upper_side = Some(UpperSideStageMetrics {
            fhp_angle: Some(54.0),
        });
        assert_eq!(data.missing_stages(), vec![CaptureStage::LowerSide]);
        assert!(data.combined().is_none());

        data.lower_side = Some(LowerSideStageMetrics {
            pelvic_tilt: Some(2.0),
            knee_angle: Some(176.0),
            foot_arch_ratio: Some(0.31),
        });
        assert!(data.is_complete());

        let combined = data.combined().unwrap();
        assert_eq!(combined.body.shoulder_height, Some(1.8));
        assert_eq!(combined.body.fhp_angle, Some(54.0));
        assert_eq!(combined.body.foot_arch_ratio, Some(0.31));
    }
}
