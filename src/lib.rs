//! Posturekit - On-device compute engine for somatic pattern classification
//!
//! Posturekit turns raw pose/face landmark detections into a clinical-style
//! somatic pattern assessment through a deterministic pipeline: landmark
//! typing → geometric metric extraction → alignment gating → timed capture →
//! pattern scoring → three-modality fusion.
//!
//! ## Modules
//!
//! - **Geometry & Metrics**: pure functions from landmark coordinates to
//!   clinical angle/ratio metrics
//! - **Alignment & Capture**: per-stage alignment gates and the
//!   hold-then-countdown capture state machine
//! - **Scoring & Fusion**: questionnaire scoring, pattern analysis, and the
//!   weighted body/face/questionnaire fusion with its confidence band

pub mod alignment;
pub mod analyzer;
pub mod capture;
pub mod error;
pub mod fusion;
pub mod geometry;
pub mod metrics;
pub mod patterns;
pub mod pipeline;
pub mod questionnaire;
pub mod report;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use error::ComputeError;
pub use fusion::{integrate_modalities, IntegratedAssessment};
pub use pipeline::{assess, Assessment, ScanProcessor};

// Capture exports
pub use capture::{CaptureSession, FrameResult, TimingVariant};

// Questionnaire exports
pub use questionnaire::{score_answers, AnswerLabel, QuestionnaireScores};

/// Posturekit version embedded in all report payloads
pub const KIT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report payloads
pub const PRODUCER_NAME: &str = "posturekit";
