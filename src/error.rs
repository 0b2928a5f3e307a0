//! Error types for posturekit
//!
//! Per-frame and per-metric failures are represented as data (`None` values,
//! `aligned = false`) and never cross a boundary as errors. The variants here
//! cover structural contract violations only: wrong-shaped questionnaire
//! input, fusion invoked before its inputs exist, and session misuse.

use crate::types::CaptureStage;
use thiserror::Error;

/// Errors that can occur during computation
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Questionnaire requires exactly 20 answers, got {0}")]
    InvalidAnswerCount(usize),

    #[error("Stage metrics missing for fusion: {0:?}")]
    MissingStageData(Vec<CaptureStage>),

    #[error("Questionnaire scores missing for fusion")]
    MissingQuestionnaire,

    #[error("Capture session is not running")]
    SessionNotRunning,

    #[error("No capture awaiting review in stage {0}")]
    NoPendingCapture(CaptureStage),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}
