//! Pipeline orchestration
//!
//! The public API tying the pieces together. Two entry points:
//!
//! - [`assess`] — one-shot: already-measured metrics plus a completed answer
//!   sheet in, full assessment out.
//! - [`ScanProcessor`] — stateful: owns the four-stage capture session and
//!   the questionnaire scores, and enforces the fusion preconditions (all
//!   four stages committed, questionnaire present) before producing the
//!   assessment. Fusing with missing inputs would silently corrupt the
//!   classification, so those paths fail loudly instead of defaulting.

use crate::capture::{CaptureSession, TimingVariant};
use crate::error::ComputeError;
use crate::fusion::{integrate_modalities, IntegratedAssessment};
use crate::questionnaire::{score_answers, AnswerLabel, QuestionnaireScores};
use crate::types::{
    BodyMetrics, FaceMetrics, FaceStageMetrics, LowerSideStageMetrics, StageData,
    UpperFrontStageMetrics, UpperSideStageMetrics,
};
use serde::Serialize;
use uuid::Uuid;

/// Complete assessment: classification plus everything that produced it.
///
/// Plain immutable data with no behavior beyond convenience accessors;
/// serializable for the report/export consumer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub session_id: Uuid,
    pub stage_data: StageData,
    pub questionnaire: QuestionnaireScores,
    pub answers: Vec<Option<AnswerLabel>>,
    pub classification: IntegratedAssessment,
}

/// One-shot assessment from pre-measured metrics and a completed answer
/// sheet.
pub fn assess(
    body: &BodyMetrics,
    face: &FaceMetrics,
    answers: &[Option<AnswerLabel>],
) -> Result<Assessment, ComputeError> {
    let questionnaire = score_answers(answers)?;
    let classification = integrate_modalities(body, face, &questionnaire.normalized_scores);

    // Synthesize the per-stage records a capture session would have
    // committed, so the report shape is identical either way.
    let stage_data = StageData {
        face: Some(FaceStageMetrics {
            eye_sym: face.eye_sym,
            jaw_shift: face.jaw_shift,
            head_tilt: face.head_tilt,
            nostril_asym: face.nostril_asym,
        }),
        upper_front: Some(UpperFrontStageMetrics {
            shoulder_height: body.shoulder_height,
        }),
        upper_side: Some(UpperSideStageMetrics {
            fhp_angle: body.fhp_angle,
        }),
        lower_side: Some(LowerSideStageMetrics {
            pelvic_tilt: body.pelvic_tilt,
            knee_angle: body.knee_angle,
            foot_arch_ratio: body.foot_arch_ratio,
        }),
    };

    Ok(Assessment {
        session_id: Uuid::new_v4(),
        stage_data,
        questionnaire,
        answers: answers.to_vec(),
        classification,
    })
}

/// Stateful processor for the full capture-and-classify flow.
pub struct ScanProcessor {
    session: CaptureSession,
    questionnaire: Option<QuestionnaireScores>,
    answers: Vec<Option<AnswerLabel>>,
}

impl Default for ScanProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanProcessor {
    /// Processor with the long (5 s hold) capture timing.
    pub fn new() -> Self {
        Self::with_variant(TimingVariant::Long)
    }

    pub fn with_variant(variant: TimingVariant) -> Self {
        Self {
            session: CaptureSession::new(variant),
            questionnaire: None,
            answers: Vec::new(),
        }
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut CaptureSession {
        &mut self.session
    }

    pub fn questionnaire(&self) -> Option<&QuestionnaireScores> {
        self.questionnaire.as_ref()
    }

    /// Score and store the questionnaire. Usually called before the capture
    /// flow starts; must have happened before [`Self::finish`].
    pub fn set_questionnaire(
        &mut self,
        answers: &[Option<AnswerLabel>],
    ) -> Result<&QuestionnaireScores, ComputeError> {
        let scores = score_answers(answers)?;
        self.answers = answers.to_vec();
        self.questionnaire = Some(scores);
        Ok(self.questionnaire.as_ref().expect("just set"))
    }

    /// Produce the final assessment.
    ///
    /// Precondition: all four stage metrics committed and the questionnaire
    /// scored. Anything missing is a flow bug in the caller and is rejected,
    /// never papered over with zeroed data.
    pub fn finish(&self) -> Result<Assessment, ComputeError> {
        let stage_data = self.session.stage_data();
        let missing = stage_data.missing_stages();
        if !missing.is_empty() {
            return Err(ComputeError::MissingStageData(missing));
        }

        let questionnaire = self
            .questionnaire
            .as_ref()
            .ok_or(ComputeError::MissingQuestionnaire)?;

        let combined = stage_data
            .combined()
            .expect("stage data verified complete above");

        let classification = integrate_modalities(
            &combined.body,
            &combined.face,
            &questionnaire.normalized_scores,
        );

        Ok(Assessment {
            session_id: self.session.id(),
            stage_data: *stage_data,
            questionnaire: *questionnaire,
            answers: self.answers.clone(),
            classification,
        })
    }

    /// Full restart: fresh capture session, cleared questionnaire.
    pub fn reset(&mut self) {
        self.session.reset();
        self.questionnaire = None;
        self.answers.clear();
    }
}
