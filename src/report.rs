//! Report encoding
//!
//! Serializes a finished [`Assessment`] into the versioned JSON payload
//! consumed by report renderers and webhook integrations: the
//! classification, the per-modality breakdown with its fixed weights, the
//! per-stage metrics, and the raw questionnaire answers.

use crate::error::ComputeError;
use crate::pipeline::Assessment;
use crate::types::{PerPattern, Severity, StageData};
use crate::{KIT_VERSION, PRODUCER_NAME};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

/// Current report schema version.
pub const REPORT_VERSION: &str = "1.0.0";

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Producer metadata embedded in every report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Where and when the report was computed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportProvenance {
    pub session_id: String,
    pub computed_at_utc: String,
}

/// One classified pattern in the report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPattern {
    pub id: &'static str,
    pub name: &'static str,
    pub score: f64,
    pub severity: Severity,
}

/// Confidence block in the report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfidence {
    pub level: &'static str,
    pub percentage: u8,
    pub reasoning: Vec<String>,
}

/// Final classification section.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportClassification {
    pub primary_pattern: ReportPattern,
    pub secondary_pattern: Option<ReportPattern>,
    pub confidence: ReportConfidence,
    pub summary: String,
    pub recommendations: Vec<String>,
}

/// One modality's slice of the breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct ModalitySection {
    pub weight: &'static str,
    pub scores: PerPattern<f64>,
}

/// Questionnaire slice, with the raw material preserved for transparency.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireSection {
    pub weight: &'static str,
    pub scores: PerPattern<f64>,
    pub raw_scores: PerPattern<i32>,
    pub answers: Vec<Option<&'static str>>,
}

/// Per-modality breakdown with the fixed fusion weights.
#[derive(Debug, Clone, Serialize)]
pub struct ModalityBreakdown {
    pub body: ModalitySection,
    pub face: ModalitySection,
    pub questionnaire: QuestionnaireSection,
}

/// Complete report payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload {
    pub report_version: String,
    pub producer: ReportProducer,
    pub provenance: ReportProvenance,
    pub classification: ReportClassification,
    pub modality_breakdown: ModalityBreakdown,
    pub all_pattern_scores: PerPattern<f64>,
    pub stage_metrics: StageData,
}

/// Report encoder producing the versioned JSON payload.
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create an encoder with a unique instance ID.
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID.
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Build the report payload from a finished assessment.
    pub fn encode(&self, assessment: &Assessment) -> ReportPayload {
        let classification = &assessment.classification;
        let primary = &classification.primary_pattern;

        let report_pattern = |pattern: &crate::fusion::IntegratedPattern| ReportPattern {
            id: pattern.id,
            name: pattern.name,
            score: round2(pattern.score),
            severity: pattern.severity,
        };

        ReportPayload {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: KIT_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            provenance: ReportProvenance {
                session_id: assessment.session_id.to_string(),
                computed_at_utc: Utc::now().to_rfc3339(),
            },
            classification: ReportClassification {
                primary_pattern: report_pattern(primary),
                secondary_pattern: classification
                    .secondary_pattern
                    .as_ref()
                    .map(report_pattern),
                confidence: ReportConfidence {
                    level: classification.confidence.level.as_str(),
                    percentage: classification.confidence.percentage,
                    reasoning: classification.confidence.reasoning.clone(),
                },
                summary: classification.summary(),
                recommendations: classification
                    .recommendations()
                    .iter()
                    .map(|r| r.to_string())
                    .collect(),
            },
            modality_breakdown: ModalityBreakdown {
                body: ModalitySection {
                    weight: "50%",
                    scores: classification.modality_scores.body,
                },
                face: ModalitySection {
                    weight: "30%",
                    scores: classification.modality_scores.face,
                },
                questionnaire: QuestionnaireSection {
                    weight: "20%",
                    scores: classification.modality_scores.questionnaire,
                    raw_scores: assessment.questionnaire.raw_scores,
                    answers: assessment
                        .answers
                        .iter()
                        .map(|a| a.map(|label| label.as_str()))
                        .collect(),
                },
            },
            all_pattern_scores: classification.final_scores,
            stage_metrics: assessment.stage_data,
        }
    }

    /// Encode straight to pretty-printed JSON.
    pub fn encode_to_json(&self, assessment: &Assessment) -> Result<String, ComputeError> {
        let payload = self.encode(assessment);
        serde_json::to_string_pretty(&payload).map_err(ComputeError::JsonError)
    }
}
