//! Somatic pattern configuration
//!
//! Static tables defining the four patterns: which metrics feed each one,
//! their weights and flag thresholds, the piecewise normalization curves that
//! map raw measurements onto 0-100 dysfunction scores, per-pattern severity
//! bands, and the recommendation lists surfaced in reports.
//!
//! The curve breakpoints and weights encode biomechanical calibration and are
//! versioned together with the questionnaire table. Every curve output is
//! clamped to `[0, 100]`, 0 meaning ideal and 100 maximal deviation,
//! regardless of the metric's native unit.

use crate::types::{BodyMetrics, CombinedMetrics, PatternKey, Severity};
use serde::{Deserialize, Serialize};

/// Identifies one metric input to a pattern score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKey {
    FhpAngle,
    ShoulderHeight,
    HeadTilt,
    JawShift,
    EyeSym,
    NostrilAsym,
    PelvicTilt,
    KneeAngle,
    FootArchRatio,
    ThoracicProxy,
    PelvicShiftProxy,
    RibCageProxy,
    WeightDistProxy,
}

impl MetricKey {
    /// Display name for breakdowns and reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            MetricKey::FhpAngle => "Forward Head Posture",
            MetricKey::ShoulderHeight => "Shoulder Asymmetry",
            MetricKey::HeadTilt => "Head Tilt",
            MetricKey::JawShift => "Jaw Shift",
            MetricKey::EyeSym => "Eye Symmetry",
            MetricKey::NostrilAsym => "Nostril Asymmetry",
            MetricKey::PelvicTilt => "Pelvic Tilt",
            MetricKey::KneeAngle => "Knee Alignment",
            MetricKey::FootArchRatio => "Foot Arch",
            MetricKey::ThoracicProxy => "Upper Back Rounding",
            MetricKey::PelvicShiftProxy => "Pelvic Shift",
            MetricKey::RibCageProxy => "Rib Cage Compression",
            MetricKey::WeightDistProxy => "Weight Distribution",
        }
    }

    /// Fetch this metric's raw value from the combined metrics.
    ///
    /// Direct metrics propagate `None` when the measurement is missing.
    /// Derived proxies always produce a value; a missing input contributes 0
    /// to the proxy formula — an explicit neutral default, since proxies
    /// blend several inputs and one gap should not void the others.
    pub fn resolve(&self, metrics: &CombinedMetrics) -> Option<f64> {
        match self {
            MetricKey::FhpAngle => metrics.body.fhp_angle,
            MetricKey::ShoulderHeight => metrics.body.shoulder_height,
            MetricKey::HeadTilt => metrics.face.head_tilt,
            MetricKey::JawShift => metrics.face.jaw_shift,
            MetricKey::EyeSym => metrics.face.eye_sym,
            MetricKey::NostrilAsym => metrics.face.nostril_asym,
            MetricKey::PelvicTilt => metrics.body.pelvic_tilt,
            MetricKey::KneeAngle => metrics.body.knee_angle,
            MetricKey::FootArchRatio => metrics.body.foot_arch_ratio,
            MetricKey::ThoracicProxy => Some(thoracic_proxy(&metrics.body)),
            MetricKey::PelvicShiftProxy => Some(pelvic_shift_proxy(&metrics.body)),
            MetricKey::RibCageProxy => Some(rib_cage_proxy(&metrics.body)),
            MetricKey::WeightDistProxy => Some(weight_dist_proxy(&metrics.body)),
        }
    }
}

/// Thoracic kyphosis proxy from the CVA magnitude.
fn thoracic_proxy(body: &BodyMetrics) -> f64 {
    body.fhp_angle.unwrap_or(0.0).abs() * 0.8
}

/// Lateral pelvic shift proxy from shoulder asymmetry.
fn pelvic_shift_proxy(body: &BodyMetrics) -> f64 {
    body.shoulder_height.unwrap_or(0.0).abs() * 50.0
}

/// Rib cage compression proxy from CVA and shoulder asymmetry.
fn rib_cage_proxy(body: &BodyMetrics) -> f64 {
    let fhp_contribution = body.fhp_angle.unwrap_or(0.0).abs() * 0.6;
    let shoulder_contribution = body.shoulder_height.unwrap_or(0.0).abs() * 20.0;
    (fhp_contribution + shoulder_contribution).min(100.0)
}

/// Weight distribution proxy from shoulder asymmetry and pelvic obliquity.
fn weight_dist_proxy(body: &BodyMetrics) -> f64 {
    let asymmetry = body.shoulder_height.unwrap_or(0.0).abs() * 40.0
        + body.pelvic_tilt.unwrap_or(0.0).abs() * 2.0;
    asymmetry.min(100.0)
}

/// Where a metric's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricSource {
    Face,
    Body,
    Derived,
}

/// Normalization curve mapping a raw metric onto 0-100 dysfunction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalizeCurve {
    /// `min(100, |v| × 10)` — fallback for metrics without a dedicated curve.
    Default,
    /// `min(100, |v| / span × 100)` — proportional deviation up to `span`.
    Linear { span: f64 },
    /// Craniovertebral angle: higher angle is better posture.
    /// `≥60° → 0-10, 50-60° → 10-30, 45-50° → 30-50, 40-45° → 50-70,
    /// <40° → 70-100`.
    Craniovertebral,
    /// Pelvic obliquity: `≤3° → 0, 3-8° → 30, 8-15° → 60,
    /// >15° → 60 + 2.5/degree`.
    PelvicObliquity,
    /// Knee joint angle: deviation from a straight 180° leg over a 20° span.
    KneeDeviation,
    /// Foot arch ratio: deviation from the 0.30 ideal over a 0.20 span.
    FootArchDeviation,
}

impl NormalizeCurve {
    /// Apply the curve. The result is always clamped into `[0, 100]`.
    pub fn apply(&self, value: f64) -> f64 {
        let score = match self {
            NormalizeCurve::Default => value.abs() * 10.0,
            NormalizeCurve::Linear { span } => value.abs() / span * 100.0,
            NormalizeCurve::Craniovertebral => {
                if value >= 60.0 {
                    (10.0 - (value - 60.0) / 3.0).max(0.0)
                } else if value >= 50.0 {
                    30.0 - (value - 50.0) * 2.0
                } else if value >= 45.0 {
                    50.0 - (value - 45.0) * 4.0
                } else if value >= 40.0 {
                    70.0 - (value - 40.0) * 4.0
                } else {
                    70.0 + (40.0 - value) * 2.0
                }
            }
            NormalizeCurve::PelvicObliquity => {
                let magnitude = value.abs();
                if magnitude <= 3.0 {
                    0.0
                } else if magnitude <= 8.0 {
                    30.0
                } else if magnitude <= 15.0 {
                    60.0
                } else {
                    60.0 + (magnitude - 15.0) * 2.5
                }
            }
            NormalizeCurve::KneeDeviation => (value - 180.0).abs() / 20.0 * 100.0,
            NormalizeCurve::FootArchDeviation => (value - 0.30).abs() / 0.20 * 100.0,
        };
        score.clamp(0.0, 100.0)
    }
}

/// One metric's contribution config within a pattern.
#[derive(Debug, Clone, Copy)]
pub struct MetricConfig {
    pub key: MetricKey,
    pub weight: f64,
    pub source: MetricSource,
    /// Raw-value magnitude beyond which the breakdown flags this metric.
    pub threshold: Option<f64>,
    pub normalize: NormalizeCurve,
}

/// Per-pattern severity cut points for analyzer-level labeling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityThresholds {
    pub mild: f64,
    pub moderate: f64,
    pub severe: f64,
}

impl SeverityThresholds {
    pub fn severity_for(&self, score: f64) -> Severity {
        if score >= self.severe {
            Severity::Severe
        } else if score >= self.moderate {
            Severity::Moderate
        } else if score >= self.mild {
            Severity::Mild
        } else {
            Severity::None
        }
    }
}

/// Recommendation lists keyed by severity.
#[derive(Debug, Clone, Copy)]
pub struct Recommendations {
    pub mild: &'static [&'static str],
    pub moderate: &'static [&'static str],
    pub severe: &'static [&'static str],
}

impl Recommendations {
    pub fn for_severity(&self, severity: Severity) -> &'static [&'static str] {
        match severity {
            Severity::None => &[],
            Severity::Mild => self.mild,
            Severity::Moderate => self.moderate,
            Severity::Severe => self.severe,
        }
    }
}

/// Full configuration for one somatic pattern.
#[derive(Debug, Clone, Copy)]
pub struct PatternConfig {
    pub key: PatternKey,
    pub name: &'static str,
    pub description: &'static str,
    pub severity_thresholds: SeverityThresholds,
    pub metrics: &'static [MetricConfig],
    pub recommendations: Recommendations,
}

/// Look up one pattern's configuration.
pub fn pattern_config(key: PatternKey) -> &'static PatternConfig {
    match key {
        PatternKey::UpperCompression => &PATTERNS[0],
        PatternKey::LowerCompression => &PATTERNS[1],
        PatternKey::ThoracicCollapse => &PATTERNS[2],
        PatternKey::LateralAsymmetry => &PATTERNS[3],
    }
}

/// All four pattern configurations.
pub static PATTERNS: [PatternConfig; 4] = [
    PatternConfig {
        key: PatternKey::UpperCompression,
        name: "Upper Compression Pattern",
        description: "Forward head posture, shoulder tension, jaw clenching",
        severity_thresholds: SeverityThresholds {
            mild: 30.0,
            moderate: 50.0,
            severe: 70.0,
        },
        metrics: &[
            MetricConfig {
                key: MetricKey::FhpAngle,
                weight: 0.35,
                source: MetricSource::Body,
                threshold: Some(15.0),
                normalize: NormalizeCurve::Craniovertebral,
            },
            MetricConfig {
                key: MetricKey::ShoulderHeight,
                weight: 0.25,
                source: MetricSource::Body,
                threshold: Some(0.05),
                normalize: NormalizeCurve::Linear { span: 0.15 },
            },
            MetricConfig {
                key: MetricKey::HeadTilt,
                weight: 0.10,
                source: MetricSource::Face,
                threshold: Some(5.0),
                normalize: NormalizeCurve::Linear { span: 15.0 },
            },
            MetricConfig {
                key: MetricKey::JawShift,
                weight: 0.10,
                source: MetricSource::Face,
                threshold: Some(0.02),
                normalize: NormalizeCurve::Linear { span: 0.08 },
            },
            MetricConfig {
                key: MetricKey::EyeSym,
                weight: 0.10,
                source: MetricSource::Face,
                threshold: Some(0.02),
                normalize: NormalizeCurve::Linear { span: 0.08 },
            },
            MetricConfig {
                key: MetricKey::ThoracicProxy,
                weight: 0.10,
                source: MetricSource::Derived,
                threshold: None,
                normalize: NormalizeCurve::Default,
            },
        ],
        recommendations: Recommendations {
            mild: &[
                "Chin tucks: 3 sets of 10 reps daily",
                "Shoulder blade squeezes: 2 sets of 15 reps",
                "Neck stretches: Hold 30 seconds each side",
                "Take breaks from screen time every 30 minutes",
            ],
            moderate: &[
                "All mild exercises plus:",
                "Wall angels: 3 sets of 12 reps",
                "Thoracic extension on foam roller: 2 minutes daily",
                "Consider ergonomic workspace assessment",
                "Practice proper head positioning during daily activities",
            ],
            severe: &[
                "All moderate exercises plus:",
                "Professional physical therapy assessment recommended",
                "Postural bracing may be beneficial",
                "Comprehensive ergonomic evaluation",
                "Consider chiropractic or osteopathic consultation",
            ],
        },
    },
    PatternConfig {
        key: PatternKey::LowerCompression,
        name: "Lower Compression Pattern",
        description: "Anterior pelvic tilt, knee issues, foot pronation",
        severity_thresholds: SeverityThresholds {
            mild: 30.0,
            moderate: 50.0,
            severe: 70.0,
        },
        metrics: &[
            MetricConfig {
                key: MetricKey::PelvicTilt,
                weight: 0.30,
                source: MetricSource::Body,
                threshold: Some(10.0),
                normalize: NormalizeCurve::PelvicObliquity,
            },
            MetricConfig {
                key: MetricKey::KneeAngle,
                weight: 0.25,
                source: MetricSource::Body,
                threshold: Some(5.0),
                normalize: NormalizeCurve::KneeDeviation,
            },
            MetricConfig {
                key: MetricKey::FootArchRatio,
                weight: 0.25,
                source: MetricSource::Body,
                threshold: Some(0.05),
                normalize: NormalizeCurve::FootArchDeviation,
            },
            MetricConfig {
                key: MetricKey::PelvicShiftProxy,
                weight: 0.20,
                source: MetricSource::Derived,
                threshold: None,
                normalize: NormalizeCurve::Default,
            },
        ],
        recommendations: Recommendations {
            mild: &[
                "Hip flexor stretches: 3 sets of 30 seconds each side",
                "Glute bridges: 3 sets of 15 reps",
                "Foot arch strengthening exercises",
                "Calf stretches: 2 sets of 30 seconds each side",
            ],
            moderate: &[
                "All mild exercises plus:",
                "Dead bugs: 3 sets of 10 reps",
                "Single-leg balance work: 2 minutes each side",
                "Consider orthotic assessment",
                "Strengthen core stabilizers",
            ],
            severe: &[
                "All moderate exercises plus:",
                "Professional biomechanical assessment recommended",
                "Gait analysis recommended",
                "Custom orthotics may be necessary",
                "Consider podiatry consultation",
            ],
        },
    },
    PatternConfig {
        key: PatternKey::ThoracicCollapse,
        name: "Thoracic Collapse Pattern",
        description: "Upper back rounding, chest compression, shallow breathing",
        severity_thresholds: SeverityThresholds {
            mild: 30.0,
            moderate: 50.0,
            severe: 70.0,
        },
        metrics: &[
            // CVA carries half the weight here: forward head and thoracic
            // rounding travel together and it is the most reliable signal.
            MetricConfig {
                key: MetricKey::FhpAngle,
                weight: 0.50,
                source: MetricSource::Body,
                threshold: Some(20.0),
                normalize: NormalizeCurve::Craniovertebral,
            },
            MetricConfig {
                key: MetricKey::ShoulderHeight,
                weight: 0.30,
                source: MetricSource::Body,
                threshold: Some(0.05),
                normalize: NormalizeCurve::Linear { span: 0.15 },
            },
            MetricConfig {
                key: MetricKey::RibCageProxy,
                weight: 0.20,
                source: MetricSource::Derived,
                threshold: None,
                normalize: NormalizeCurve::Default,
            },
        ],
        recommendations: Recommendations {
            mild: &[
                "Thoracic extensions: 3 sets of 10 reps",
                "Doorway chest stretches: 3 sets of 30 seconds",
                "Deep breathing exercises: 5 minutes daily",
                "Cat-cow stretches: 2 sets of 10 reps",
            ],
            moderate: &[
                "All mild exercises plus:",
                "Foam roller thoracic mobilization: 3 minutes daily",
                "Scapular wall slides: 3 sets of 12 reps",
                "Breathing pattern assessment recommended",
                "Strengthen mid-back muscles",
            ],
            severe: &[
                "All moderate exercises plus:",
                "Manual therapy recommended",
                "Postural restoration therapy",
                "Respiratory function assessment",
                "Consider structural integration therapy",
            ],
        },
    },
    PatternConfig {
        key: PatternKey::LateralAsymmetry,
        name: "Lateral/Rotational Asymmetry Pattern",
        description: "One-sided tension, uneven loading, rotational patterns",
        severity_thresholds: SeverityThresholds {
            mild: 25.0,
            moderate: 45.0,
            severe: 65.0,
        },
        metrics: &[
            MetricConfig {
                key: MetricKey::ShoulderHeight,
                weight: 0.30,
                source: MetricSource::Body,
                threshold: Some(0.03),
                normalize: NormalizeCurve::Linear { span: 0.12 },
            },
            MetricConfig {
                key: MetricKey::PelvicTilt,
                weight: 0.25,
                source: MetricSource::Body,
                threshold: Some(8.0),
                normalize: NormalizeCurve::PelvicObliquity,
            },
            MetricConfig {
                key: MetricKey::HeadTilt,
                weight: 0.20,
                source: MetricSource::Face,
                threshold: Some(3.0),
                normalize: NormalizeCurve::Linear { span: 12.0 },
            },
            MetricConfig {
                key: MetricKey::JawShift,
                weight: 0.10,
                source: MetricSource::Face,
                threshold: Some(0.015),
                normalize: NormalizeCurve::Linear { span: 0.06 },
            },
            MetricConfig {
                key: MetricKey::NostrilAsym,
                weight: 0.10,
                source: MetricSource::Face,
                threshold: Some(0.015),
                normalize: NormalizeCurve::Linear { span: 0.06 },
            },
            MetricConfig {
                key: MetricKey::WeightDistProxy,
                weight: 0.05,
                source: MetricSource::Derived,
                threshold: None,
                normalize: NormalizeCurve::Default,
            },
        ],
        recommendations: Recommendations {
            mild: &[
                "Unilateral stretching (focus on tight side)",
                "Balance exercises: Single-leg stands 2 min each side",
                "Mirror work to increase body awareness",
                "Avoid carrying bags on same shoulder",
            ],
            moderate: &[
                "All mild exercises plus:",
                "Functional movement screening recommended",
                "Corrective exercises for dominant side",
                "Ergonomic assessment of daily activities",
                "Address sleeping position and mattress quality",
            ],
            severe: &[
                "All moderate exercises plus:",
                "Professional structural assessment recommended",
                "Possible scoliosis screening",
                "Neuromuscular re-education therapy",
                "Consider chiropractic or osteopathic evaluation",
            ],
        },
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cva_curve_breakpoints() {
        let curve = NormalizeCurve::Craniovertebral;
        assert_eq!(curve.apply(60.0), 10.0);
        assert_eq!(curve.apply(50.0), 30.0);
        assert_eq!(curve.apply(45.0), 50.0);
        assert_eq!(curve.apply(40.0), 70.0);
        assert_eq!(curve.apply(35.0), 80.0);
        // Saturates at both ends.
        assert_eq!(curve.apply(20.0), 100.0);
        assert_eq!(curve.apply(95.0), 0.0);
    }

    #[test]
    fn test_pelvic_curve_breakpoints() {
        let curve = NormalizeCurve::PelvicObliquity;
        assert_eq!(curve.apply(0.0), 0.0);
        assert_eq!(curve.apply(3.0), 0.0);
        assert_eq!(curve.apply(5.0), 30.0);
        assert_eq!(curve.apply(8.0), 30.0);
        assert_eq!(curve.apply(12.0), 60.0);
        assert_eq!(curve.apply(15.0), 60.0);
        assert_eq!(curve.apply(20.0), 72.5);
        assert_eq!(curve.apply(-5.0), 30.0);
        assert_eq!(curve.apply(40.0), 100.0);
    }

    #[test]
    fn test_deviation_curves() {
        assert_eq!(NormalizeCurve::KneeDeviation.apply(180.0), 0.0);
        assert_eq!(NormalizeCurve::KneeDeviation.apply(170.0), 50.0);
        assert_eq!(NormalizeCurve::KneeDeviation.apply(150.0), 100.0);

        assert_eq!(NormalizeCurve::FootArchDeviation.apply(0.30), 0.0);
        assert_eq!(NormalizeCurve::FootArchDeviation.apply(0.20), 50.0);
        assert_eq!(NormalizeCurve::FootArchDeviation.apply(0.55), 100.0);
    }

    #[test]
    fn test_default_and_linear_curves() {
        assert_eq!(NormalizeCurve::Default.apply(5.0), 50.0);
        assert_eq!(NormalizeCurve::Default.apply(-20.0), 100.0);

        let linear = NormalizeCurve::Linear { span: 0.08 };
        assert_eq!(linear.apply(0.04), 50.0);
        assert_eq!(linear.apply(0.16), 100.0);
    }

    #[test]
    fn test_curves_always_clamped() {
        for curve in [
            NormalizeCurve::Default,
            NormalizeCurve::Linear { span: 0.06 },
            NormalizeCurve::Craniovertebral,
            NormalizeCurve::PelvicObliquity,
            NormalizeCurve::KneeDeviation,
            NormalizeCurve::FootArchDeviation,
        ] {
            for value in [-500.0, -1.0, 0.0, 0.5, 30.0, 180.0, 500.0] {
                let score = curve.apply(value);
                assert!((0.0..=100.0).contains(&score), "{curve:?} on {value}");
            }
        }
    }

    #[test]
    fn test_pattern_weights_sum_to_one() {
        for pattern in PATTERNS.iter() {
            let total: f64 = pattern.metrics.iter().map(|m| m.weight).sum();
            assert!(
                (total - 1.0).abs() < 1e-9,
                "{} weights sum to {total}",
                pattern.name
            );
        }
    }

    #[test]
    fn test_lateral_pattern_uses_lower_thresholds() {
        let lateral = pattern_config(PatternKey::LateralAsymmetry);
        assert_eq!(lateral.severity_thresholds.severity_for(26.0), Severity::Mild);
        assert_eq!(
            lateral.severity_thresholds.severity_for(66.0),
            Severity::Severe
        );

        let upper = pattern_config(PatternKey::UpperCompression);
        assert_eq!(upper.severity_thresholds.severity_for(26.0), Severity::None);
    }

    #[test]
    fn test_pattern_config_lookup() {
        for key in PatternKey::ALL {
            assert_eq!(pattern_config(key).key, key);
        }
    }

    #[test]
    fn test_derived_proxies_neutral_defaults() {
        let empty = CombinedMetrics::default();
        // With no inputs, every proxy collapses to 0, not NaN.
        assert_eq!(MetricKey::ThoracicProxy.resolve(&empty), Some(0.0));
        assert_eq!(MetricKey::PelvicShiftProxy.resolve(&empty), Some(0.0));
        assert_eq!(MetricKey::RibCageProxy.resolve(&empty), Some(0.0));
        assert_eq!(MetricKey::WeightDistProxy.resolve(&empty), Some(0.0));
    }

    #[test]
    fn test_derived_proxy_formulas() {
        let metrics = CombinedMetrics {
            body: BodyMetrics {
                shoulder_height: Some(2.0),
                fhp_angle: Some(50.0),
                pelvic_tilt: Some(10.0),
                knee_angle: None,
                foot_arch_ratio: None,
            },
            ..Default::default()
        };

        assert_eq!(MetricKey::ThoracicProxy.resolve(&metrics), Some(40.0));
        assert_eq!(MetricKey::PelvicShiftProxy.resolve(&metrics), Some(100.0));
        // 50×0.6 + 2×20 = 70
        assert_eq!(MetricKey::RibCageProxy.resolve(&metrics), Some(70.0));
        // 2×40 + 10×2 = 100, capped
        assert_eq!(MetricKey::WeightDistProxy.resolve(&metrics), Some(100.0));
    }

    #[test]
    fn test_direct_metrics_propagate_none() {
        let empty = CombinedMetrics::default();
        assert_eq!(MetricKey::FhpAngle.resolve(&empty), None);
        assert_eq!(MetricKey::EyeSym.resolve(&empty), None);
        assert_eq!(MetricKey::FootArchRatio.resolve(&empty), None);
    }
}
