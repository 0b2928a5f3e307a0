//! Questionnaire scoring
//!
//! Accumulates the 20-question self-assessment into raw per-pattern point
//! totals and normalizes them onto the 0-100 scale the fusion engine
//! consumes. The question table itself lives in [`data`] and is versioned
//! alongside the pattern configuration, since the scoring vectors and the
//! pattern weights are calibrated together.

pub mod data;

use crate::error::ComputeError;
use crate::types::{PatternKey, PerPattern};
use serde::{Deserialize, Serialize};

pub use data::{AnswerOption, Question, QUESTIONNAIRE, QUESTION_COUNT};

/// Offset added to raw totals before normalization.
///
/// Together with [`RAW_SCORE_RANGE`] this is a fixed affine calibration that
/// assumes raw totals land roughly in `[-10, 50]`. It is a deliberate
/// calibration constant, not derived from the scoring table's actual
/// min/max; changing the table does not change these numbers.
pub const RAW_SCORE_OFFSET: f64 = 10.0;

/// Divisor applied to offset raw totals before scaling to 0-100.
pub const RAW_SCORE_RANGE: f64 = 60.0;

/// Answer label for one question.
///
/// Not every question offers all four options; a label with no matching
/// option for its question contributes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerLabel {
    A,
    B,
    C,
    D,
}

impl AnswerLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerLabel::A => "A",
            AnswerLabel::B => "B",
            AnswerLabel::C => "C",
            AnswerLabel::D => "D",
        }
    }
}

/// Scored questionnaire result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireScores {
    /// Summed scoring vectors, can be negative.
    pub raw_scores: PerPattern<i32>,
    /// Raw scores mapped onto 0-100 via the affine calibration.
    pub normalized_scores: PerPattern<f64>,
    /// How many of the 20 questions were answered.
    pub answered_count: usize,
    /// Sum of all raw points across the four patterns.
    pub total_raw_points: i32,
    /// `answered_count / 20`, as a percentage.
    pub completion_percentage: f64,
}

/// Score a complete answer sheet.
///
/// The sheet must contain exactly [`QUESTION_COUNT`] entries — one per
/// question, in order. Unanswered questions (`None`) contribute nothing.
/// Anything else is a caller contract violation and fails immediately,
/// before the scores can reach the fusion engine.
pub fn score_answers(
    answers: &[Option<AnswerLabel>],
) -> Result<QuestionnaireScores, ComputeError> {
    if answers.len() != QUESTION_COUNT {
        return Err(ComputeError::InvalidAnswerCount(answers.len()));
    }

    let mut raw_scores = PerPattern::<i32>::default();
    let mut answered_count = 0;

    for (question, answer) in QUESTIONNAIRE.iter().zip(answers) {
        let Some(label) = answer else {
            continue;
        };
        answered_count += 1;

        let Some(option) = question.options.iter().find(|o| o.label == *label) else {
            // Label with no option on this question (e.g. D on a 3-option
            // question): skipped, same as unanswered.
            continue;
        };

        for key in PatternKey::ALL {
            *raw_scores.get_mut(key) += *option.scoring.get(key);
        }
    }

    let normalized_scores = PerPattern::from_fn(|key| {
        let raw = f64::from(*raw_scores.get(key));
        (((raw + RAW_SCORE_OFFSET) / RAW_SCORE_RANGE) * 100.0).clamp(0.0, 100.0)
    });

    let total_raw_points = PatternKey::ALL
        .iter()
        .map(|key| raw_scores.get(*key))
        .sum();

    Ok(QuestionnaireScores {
        raw_scores,
        normalized_scores,
        answered_count,
        total_raw_points,
        completion_percentage: (answered_count as f64 / QUESTION_COUNT as f64) * 100.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use super::AnswerLabel::{A, B, C, D};

    fn sheet(labels: [AnswerLabel; QUESTION_COUNT]) -> Vec<Option<AnswerLabel>> {
        labels.into_iter().map(Some).collect()
    }

    #[test]
    fn test_table_shape() {
        assert_eq!(QUESTIONNAIRE.len(), QUESTION_COUNT);
        for (index, question) in QUESTIONNAIRE.iter().enumerate() {
            assert_eq!(question.id as usize, index + 1);
            assert!(
                (3..=4).contains(&question.options.len()),
                "question {} has {} options",
                question.id,
                question.options.len()
            );
        }
    }

    #[test]
    fn test_wrong_length_rejected() {
        let nineteen = vec![Some(A); 19];
        assert!(matches!(
            score_answers(&nineteen),
            Err(ComputeError::InvalidAnswerCount(19))
        ));

        let twenty_one = vec![Some(A); 21];
        assert!(matches!(
            score_answers(&twenty_one),
            Err(ComputeError::InvalidAnswerCount(21))
        ));
    }

    #[test]
    fn test_all_unanswered_hits_calibration_floor() {
        let blank = vec![None; QUESTION_COUNT];
        let scores = score_answers(&blank).unwrap();

        assert_eq!(scores.answered_count, 0);
        assert_eq!(scores.total_raw_points, 0);
        // (0 + 10) / 60 × 100 ≈ 16.7 on every pattern.
        for value in scores.normalized_scores.values() {
            assert!((value - 16.666_666_666_666_668).abs() < 1e-9);
        }
    }

    #[test]
    fn test_upper_compression_dominant_sheet() {
        let answers = sheet([
            A, A, B, A, B, A, B, A, A, A, A, B, A, C, A, C, C, D, A, A,
        ]);
        let scores = score_answers(&answers).unwrap();

        assert_eq!(scores.raw_scores.upper_compression, 36);
        assert_eq!(scores.raw_scores.lower_compression, 0);
        assert_eq!(scores.raw_scores.thoracic_collapse, -2);
        assert_eq!(scores.raw_scores.lateral_asymmetry, -3);

        let normalized = scores.normalized_scores;
        assert!((normalized.upper_compression - (46.0 / 60.0) * 100.0).abs() < 1e-9);
        assert!((normalized.lower_compression - (10.0 / 60.0) * 100.0).abs() < 1e-9);
        assert!((normalized.thoracic_collapse - (8.0 / 60.0) * 100.0).abs() < 1e-9);
        assert!((normalized.lateral_asymmetry - (7.0 / 60.0) * 100.0).abs() < 1e-9);

        assert_eq!(scores.answered_count, QUESTION_COUNT);
        assert_eq!(scores.completion_percentage, 100.0);
    }

    #[test]
    fn test_normalized_scores_stay_in_band() {
        let answers = sheet([
            C, D, C, C, A, B, C, C, C, A, A, A, A, A, A, C, C, D, A, C,
        ]);
        let scores = score_answers(&answers).unwrap();
        for value in scores.normalized_scores.values() {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn test_label_without_option_contributes_nothing() {
        // Question 16 offers only A-C; answering D is skipped, not an error.
        let mut answers = vec![None; QUESTION_COUNT];
        answers[15] = Some(D);
        let with_invalid = score_answers(&answers).unwrap();

        let blank = score_answers(&vec![None; QUESTION_COUNT]).unwrap();
        assert_eq!(with_invalid.raw_scores, blank.raw_scores);
        // It still counts as answered for completion purposes.
        assert_eq!(with_invalid.answered_count, 1);
    }
}
