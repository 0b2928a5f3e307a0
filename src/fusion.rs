//! Integrated pattern fusion
//!
//! Combines the visual pattern analysis and the questionnaire scores into the
//! final classification: fixed 50/30/20 modality weighting, primary/secondary
//! ranking with a 40-point secondary cutoff, and a confidence band derived
//! from cross-modality agreement.
//!
//! The body and face channels are currently fed from one combined visual
//! analysis — the same scores enter at both the 0.50 and 0.30 weights. This
//! is a known limitation of the single-analyzer design and is kept as-is;
//! splitting the channels would silently change every classification.

use crate::analyzer::{analyze_patterns, PatternAnalysis};
use crate::patterns::pattern_config;
use crate::types::{
    BodyMetrics, CombinedMetrics, FaceMetrics, PatternKey, PerPattern, Severity,
};
use serde::Serialize;

/// Modality weight for body metrics.
pub const BODY_WEIGHT: f64 = 0.50;

/// Modality weight for face metrics.
pub const FACE_WEIGHT: f64 = 0.30;

/// Modality weight for the questionnaire.
pub const QUESTIONNAIRE_WEIGHT: f64 = 0.20;

/// A secondary pattern is only reported above this fused score.
pub const SECONDARY_PATTERN_CUTOFF: f64 = 40.0;

/// One pattern with its fused score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedPattern {
    pub key: PatternKey,
    pub score: f64,
}

/// Weighted per-modality contributions to each final score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalityContributions {
    pub body: PerPattern<f64>,
    pub face: PerPattern<f64>,
    pub questionnaire: PerPattern<f64>,
}

/// Unweighted per-modality input scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalityScores {
    pub body: PerPattern<f64>,
    pub face: PerPattern<f64>,
    pub questionnaire: PerPattern<f64>,
}

/// Output of the weighted score fusion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FusedScores {
    pub final_scores: PerPattern<f64>,
    pub modality_contributions: ModalityContributions,
    pub primary_pattern: RankedPattern,
    /// Second-ranked pattern, reported only above the 40-point cutoff.
    pub secondary_pattern: Option<RankedPattern>,
    /// All four patterns, highest fused score first.
    pub all_patterns: Vec<RankedPattern>,
}

/// Fuse the three modality score sets with the fixed 50/30/20 weights.
pub fn fuse_pattern_scores(
    body_scores: &PerPattern<f64>,
    face_scores: &PerPattern<f64>,
    questionnaire_scores: &PerPattern<f64>,
) -> FusedScores {
    let body_contribution =
        PerPattern::from_fn(|key| body_scores.get(key) * BODY_WEIGHT);
    let face_contribution =
        PerPattern::from_fn(|key| face_scores.get(key) * FACE_WEIGHT);
    let questionnaire_contribution =
        PerPattern::from_fn(|key| questionnaire_scores.get(key) * QUESTIONNAIRE_WEIGHT);

    let final_scores = PerPattern::from_fn(|key| {
        body_contribution.get(key)
            + face_contribution.get(key)
            + questionnaire_contribution.get(key)
    });

    let mut all_patterns: Vec<RankedPattern> = PatternKey::ALL
        .iter()
        .map(|&key| RankedPattern {
            key,
            score: *final_scores.get(key),
        })
        .collect();
    all_patterns.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let primary_pattern = all_patterns[0];
    let second = all_patterns[1];
    let secondary_pattern = (second.score > SECONDARY_PATTERN_CUTOFF).then_some(second);

    FusedScores {
        final_scores,
        modality_contributions: ModalityContributions {
            body: body_contribution,
            face: face_contribution,
            questionnaire: questionnaire_contribution,
        },
        primary_pattern,
        secondary_pattern,
        all_patterns,
    }
}

/// Confidence band label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "HIGH",
            ConfidenceLevel::Medium => "MEDIUM",
            ConfidenceLevel::Low => "LOW",
        }
    }

    /// Fixed display percentage per band. A lookup, not a computed
    /// probability — the band heuristic has no statistical calibration
    /// behind these numbers.
    pub fn percentage(&self) -> u8 {
        match self {
            ConfidenceLevel::High => 85,
            ConfidenceLevel::Medium => 65,
            ConfidenceLevel::Low => 35,
        }
    }
}

/// Diagnostic numbers backing a confidence decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceMetrics {
    pub primary_score: f64,
    pub gap: f64,
    pub modality_agreement: u8,
    pub coefficient_of_variation: f64,
    pub score_range: f64,
}

/// Heuristic confidence assessment.
///
/// Deliberately approximate: thresholds on the primary score, the gap to the
/// runner-up, and cross-modality agreement. Not a statistical confidence
/// interval.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Confidence {
    pub level: ConfidenceLevel,
    pub percentage: u8,
    pub reasoning: Vec<String>,
    pub metrics: ConfidenceMetrics,
}

/// Compute the confidence band for a fused result.
pub fn confidence_band(
    body_scores: &PerPattern<f64>,
    face_scores: &PerPattern<f64>,
    questionnaire_scores: &PerPattern<f64>,
    fused: &FusedScores,
) -> Confidence {
    let primary_score = fused.primary_pattern.score;
    let secondary_score = fused.secondary_pattern.map(|p| p.score).unwrap_or(0.0);
    let gap = primary_score - secondary_score;

    let primary_key = fused.primary_pattern.key;
    let scores = [
        *body_scores.get(primary_key),
        *face_scores.get(primary_key),
        *questionnaire_scores.get(primary_key),
    ];

    let mean = scores.iter().sum::<f64>() / 3.0;
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / 3.0;
    let std_dev = variance.sqrt();
    let coefficient_of_variation = if mean > 0.0 {
        std_dev / mean * 100.0
    } else {
        0.0
    };

    let max_score = scores.iter().cloned().fold(f64::MIN, f64::max);
    let min_score = scores.iter().cloned().fold(f64::MAX, f64::min);
    let score_range = max_score - min_score;

    let modality_agreement: u8 = if score_range <= 15.0 {
        3
    } else if score_range <= 25.0 {
        2
    } else {
        1
    };

    let mut reasoning = Vec::new();
    let level = if primary_score > 70.0 && gap > 30.0 && modality_agreement == 3 {
        reasoning.push("Primary pattern score >70%".to_string());
        reasoning.push(format!(
            "Strong gap between primary and secondary ({gap:.1} points)"
        ));
        reasoning.push("All three modalities agree within 15%".to_string());
        ConfidenceLevel::High
    } else if (50.0..=70.0).contains(&primary_score)
        && (15.0..=30.0).contains(&gap)
        && modality_agreement >= 2
    {
        reasoning.push(format!(
            "Primary pattern score {primary_score:.1}% (50-70% range)"
        ));
        reasoning.push(format!("Moderate gap ({gap:.1} points)"));
        reasoning.push("Two or more modalities in agreement".to_string());
        ConfidenceLevel::Medium
    } else {
        if primary_score < 50.0 {
            reasoning.push(format!("Primary pattern score only {primary_score:.1}%"));
        }
        if gap < 15.0 {
            reasoning.push(format!("Small gap between patterns ({gap:.1} points)"));
        }
        if modality_agreement < 2 {
            reasoning.push("High variance across modalities".to_string());
        }
        ConfidenceLevel::Low
    };

    Confidence {
        level,
        percentage: level.percentage(),
        reasoning,
        metrics: ConfidenceMetrics {
            primary_score,
            gap,
            modality_agreement,
            coefficient_of_variation,
            score_range,
        },
    }
}

/// A classified pattern in the final assessment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegratedPattern {
    pub key: PatternKey,
    pub id: &'static str,
    pub name: &'static str,
    pub score: f64,
    pub severity: Severity,
}

impl IntegratedPattern {
    fn from_ranked(ranked: RankedPattern) -> Self {
        Self {
            key: ranked.key,
            id: ranked.key.id(),
            name: ranked.key.display_name(),
            score: ranked.score,
            severity: Severity::from_score(ranked.score),
        }
    }
}

/// Terminal artifact of the classification pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegratedAssessment {
    pub primary_pattern: IntegratedPattern,
    pub secondary_pattern: Option<IntegratedPattern>,
    pub confidence: Confidence,
    pub modality_scores: ModalityScores,
    pub final_scores: PerPattern<f64>,
    pub contributions: ModalityContributions,
    pub all_patterns: Vec<IntegratedPattern>,
    /// The underlying visual analysis, kept for report breakdowns.
    pub visual_analysis: PatternAnalysis,
}

impl IntegratedAssessment {
    /// Recommendation list for the primary pattern at its fused severity.
    pub fn recommendations(&self) -> &'static [&'static str] {
        pattern_config(self.primary_pattern.key)
            .recommendations
            .for_severity(self.primary_pattern.severity)
    }

    /// Prose summary of the classification.
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Based on comprehensive analysis across body posture, facial alignment, \
             and self-assessment, your primary somatic pattern is {} with a {} \
             confidence level ({}%). ",
            self.primary_pattern.name,
            self.confidence.level.as_str().to_lowercase(),
            self.confidence.percentage,
        );
        if let Some(secondary) = &self.secondary_pattern {
            summary.push_str(&format!(
                "A secondary pattern of {} is also present. ",
                secondary.name
            ));
        }
        summary.push_str(
            "This classification integrates: 50% body metrics, 30% facial analysis, \
             and 20% questionnaire responses.",
        );
        summary
    }
}

/// Run the full fusion: visual analysis once, its scores reused for both the
/// body and face channels, then weighting, ranking and confidence.
pub fn integrate_modalities(
    body_metrics: &BodyMetrics,
    face_metrics: &FaceMetrics,
    questionnaire_scores: &PerPattern<f64>,
) -> IntegratedAssessment {
    let visual_analysis = analyze_patterns(&CombinedMetrics {
        face: *face_metrics,
        body: *body_metrics,
    });

    let body_scores = visual_analysis.scores;
    let face_scores = visual_analysis.scores;

    let fused = fuse_pattern_scores(&body_scores, &face_scores, questionnaire_scores);
    let confidence = confidence_band(&body_scores, &face_scores, questionnaire_scores, &fused);

    IntegratedAssessment {
        primary_pattern: IntegratedPattern::from_ranked(fused.primary_pattern),
        secondary_pattern: fused.secondary_pattern.map(IntegratedPattern::from_ranked),
        confidence,
        modality_scores: ModalityScores {
            body: body_scores,
            face: face_scores,
            questionnaire: *questionnaire_scores,
        },
        final_scores: fused.final_scores,
        contributions: fused.modality_contributions,
        all_patterns: fused
            .all_patterns
            .into_iter()
            .map(IntegratedPattern::from_ranked)
            .collect(),
        visual_analysis,
    }
}
