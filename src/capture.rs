//! Capture timing state machine
//!
//! The temporal half of the capture flow: a hold-then-countdown timer layered
//! on top of the per-tick alignment boolean, a per-stage review gate, and the
//! one error-driven automatic transition (validation failure → bounded
//! retry). The alignment predicates themselves are stateless; every piece of
//! temporal state lives here, owned by an explicit session object with a
//! start/stop/reset lifecycle — no ambient singletons, no detached timers.

use crate::alignment::{check_alignment, AlignmentResult};
use crate::error::ComputeError;
use crate::metrics::extract_combined;
use crate::types::{
    CaptureStage, CombinedMetrics, FaceFrame, FaceStageMetrics, LowerSideStageMetrics,
    PoseFrame, StageData, UpperFrontStageMetrics, UpperSideStageMetrics,
};
use serde::Serialize;
use uuid::Uuid;

/// Fixed tick interval for the hold timer and inference cadence.
pub const TICK_MS: u32 = 100;

/// Alignment is re-evaluated at half the inference cadence, reusing the most
/// recent metrics in between.
pub const ALIGNMENT_CHECK_INTERVAL_MS: u32 = 200;

/// How long a failed capture validation blocks before auto-returning to
/// `Waiting`.
pub const RETRY_DELAY_MS: u32 = 2000;

/// Hold-timer duration profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingVariant {
    /// 3000 ms total, countdown shown from the first aligned tick.
    Short,
    /// 5000 ms total: a 2000 ms silent hold, then a 3000 ms countdown.
    Long,
}

impl TimingVariant {
    pub fn total_ms(&self) -> u32 {
        match self {
            TimingVariant::Short => 3000,
            TimingVariant::Long => 5000,
        }
    }

    /// Leading portion of the hold with no numeric countdown shown.
    pub fn silent_hold_ms(&self) -> u32 {
        match self {
            TimingVariant::Short => 0,
            TimingVariant::Long => 2000,
        }
    }
}

/// Accumulates aligned hold time and fires exactly one capture trigger per
/// threshold crossing.
///
/// The trigger resets the accumulated duration atomically, so holding past
/// the threshold cannot re-fire.
#[derive(Debug, Clone, Copy)]
pub struct HoldTimer {
    variant: TimingVariant,
    hold_duration_ms: u32,
}

impl HoldTimer {
    pub fn new(variant: TimingVariant) -> Self {
        Self {
            variant,
            hold_duration_ms: 0,
        }
    }

    /// Advance one 100 ms tick. Returns `true` exactly when the accumulated
    /// hold crosses the variant's total duration. Any unaligned tick resets
    /// the accumulator to zero.
    pub fn tick(&mut self, aligned: bool) -> bool {
        if !aligned {
            self.hold_duration_ms = 0;
            return false;
        }

        self.hold_duration_ms += TICK_MS;
        if self.hold_duration_ms >= self.variant.total_ms() {
            self.hold_duration_ms = 0;
            return true;
        }
        false
    }

    pub fn hold_duration_ms(&self) -> u32 {
        self.hold_duration_ms
    }

    pub fn reset(&mut self) {
        self.hold_duration_ms = 0;
    }

    /// Descending integer to display, or `None` while idle or inside the
    /// silent hold phase.
    pub fn countdown(&self) -> Option<u32> {
        if self.hold_duration_ms == 0 {
            return None;
        }
        let silent = self.variant.silent_hold_ms();
        if self.hold_duration_ms < silent {
            return None;
        }
        let window = self.variant.total_ms() - silent;
        let elapsed = self.hold_duration_ms - silent;
        let remaining = window - elapsed;
        Some(remaining.div_ceil(1000))
    }
}

/// Where the session currently sits within one stage's capture cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum CapturePhase {
    /// Not aligned; hold duration is zero.
    Waiting,
    /// Aligned and accumulating hold time.
    Holding,
    /// Capture taken and validated; waiting for the user's Retake/Continue.
    Reviewing,
    /// Capture validation failed; counting down to an automatic return to
    /// `Waiting`. The only auto-advancing transition in the machine.
    Retrying { remaining_ms: u32 },
    /// All four stages committed; ready for fusion.
    Complete,
}

/// Discrete events surfaced by [`CaptureSession::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum CaptureEvent {
    /// The hold threshold was crossed and the captured frame validated;
    /// the session is now in the review gate.
    Captured { stage: CaptureStage },
    /// The captured frame lacked the stage's required landmarks; the session
    /// will auto-retry after [`RETRY_DELAY_MS`].
    ValidationFailed {
        stage: CaptureStage,
        error: &'static str,
    },
    /// The auto-retry delay elapsed; the session returned to `Waiting`.
    RetryElapsed { stage: CaptureStage },
}

/// Immutable per-tick result emitted to consumers.
///
/// UI layers subscribe to this event stream instead of polling mutable
/// session internals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameResult {
    pub stage: CaptureStage,
    pub phase: CapturePhase,
    pub metrics: CombinedMetrics,
    pub alignment: AlignmentResult,
    pub hold_duration_ms: u32,
    pub countdown: Option<u32>,
    pub event: Option<CaptureEvent>,
}

/// Metrics snapshotted at the capture instant, parked until the user decides.
#[derive(Debug, Clone, Copy)]
struct PendingCapture {
    metrics: CombinedMetrics,
}

/// One user's four-stage capture session.
///
/// Stages are strictly sequential: stage N's metrics are committed through
/// the review gate before stage N+1's alignment gate is ever evaluated.
#[derive(Debug)]
pub struct CaptureSession {
    id: Uuid,
    variant: TimingVariant,
    stage: CaptureStage,
    phase: CapturePhase,
    hold: HoldTimer,
    last_alignment: AlignmentResult,
    latest_metrics: CombinedMetrics,
    pending: Option<PendingCapture>,
    stage_data: StageData,
    running: bool,
    ticks: u64,
}

impl CaptureSession {
    pub fn new(variant: TimingVariant) -> Self {
        Self {
            id: Uuid::new_v4(),
            variant,
            stage: CaptureStage::Face,
            phase: CapturePhase::Waiting,
            hold: HoldTimer::new(variant),
            last_alignment: AlignmentResult {
                aligned: false,
                feedback: "",
            },
            latest_metrics: CombinedMetrics::default(),
            pending: None,
            stage_data: StageData::default(),
            running: false,
            ticks: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn stage(&self) -> CaptureStage {
        self.stage
    }

    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stage_data(&self) -> &StageData {
        &self.stage_data
    }

    pub fn latest_metrics(&self) -> &CombinedMetrics {
        &self.latest_metrics
    }

    /// Begin accepting ticks.
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stop the session and cancel all outstanding timers. Committed stage
    /// data is retained; a pending (unconfirmed) capture is discarded.
    pub fn stop(&mut self) {
        self.running = false;
        self.hold.reset();
        self.pending = None;
        if matches!(
            self.phase,
            CapturePhase::Retrying { .. } | CapturePhase::Reviewing
        ) {
            self.phase = CapturePhase::Waiting;
        }
    }

    /// Full restart: back to stage 1 with cleared data, a fresh session id,
    /// and all timers cancelled.
    pub fn reset(&mut self) {
        *self = Self::new(self.variant);
    }

    /// Drive the session by one 100 ms tick with this tick's detection
    /// result. Absent frames are a valid "not detected" state.
    pub fn tick(
        &mut self,
        face: Option<&FaceFrame>,
        pose: Option<&PoseFrame>,
    ) -> Result<FrameResult, ComputeError> {
        if !self.running {
            return Err(ComputeError::SessionNotRunning);
        }

        let tick_index = self.ticks;
        self.ticks += 1;

        // Review gate and completion freeze the timer; ticks are no-ops
        // until the user acts.
        if matches!(self.phase, CapturePhase::Reviewing | CapturePhase::Complete) {
            return Ok(self.frame_result(None));
        }

        if let CapturePhase::Retrying { remaining_ms } = self.phase {
            let remaining = remaining_ms.saturating_sub(TICK_MS);
            if remaining == 0 {
                self.phase = CapturePhase::Waiting;
                self.hold.reset();
                return Ok(self.frame_result(Some(CaptureEvent::RetryElapsed {
                    stage: self.stage,
                })));
            }
            self.phase = CapturePhase::Retrying {
                remaining_ms: remaining,
            };
            return Ok(self.frame_result(None));
        }

        // Metrics refresh every tick; alignment re-checks at half that
        // cadence, reusing the latest metrics in between.
        self.latest_metrics = extract_combined(face, pose);
        let check_alignment_now =
            tick_index % u64::from(ALIGNMENT_CHECK_INTERVAL_MS / TICK_MS) == 0;
        if check_alignment_now {
            self.last_alignment = check_alignment(self.stage, face, pose);
        }

        let triggered = self.hold.tick(self.last_alignment.aligned);
        let event = if triggered {
            Some(self.handle_capture_trigger(face, pose))
        } else {
            None
        };

        if !matches!(
            self.phase,
            CapturePhase::Reviewing | CapturePhase::Retrying { .. }
        ) {
            self.phase = if self.hold.hold_duration_ms() > 0 {
                CapturePhase::Holding
            } else {
                CapturePhase::Waiting
            };
        }

        Ok(self.frame_result(event))
    }

    /// User chose Retake: discard the pending capture and re-arm the stage.
    pub fn retake(&mut self) -> Result<(), ComputeError> {
        if self.phase != CapturePhase::Reviewing {
            return Err(ComputeError::NoPendingCapture(self.stage));
        }
        self.pending = None;
        self.hold.reset();
        self.phase = CapturePhase::Waiting;
        Ok(())
    }

    /// User chose Continue: commit the pending metrics for this stage and
    /// advance. Returns the next stage, or `None` once all four stages are
    /// committed and the session is ready for fusion.
    pub fn confirm(&mut self) -> Result<Option<CaptureStage>, ComputeError> {
        if self.phase != CapturePhase::Reviewing {
            return Err(ComputeError::NoPendingCapture(self.stage));
        }
        let pending = self
            .pending
            .take()
            .ok_or(ComputeError::NoPendingCapture(self.stage))?;

        self.commit_stage_metrics(&pending.metrics);
        self.hold.reset();

        match self.stage.next() {
            Some(next) => {
                self.stage = next;
                self.phase = CapturePhase::Waiting;
                Ok(Some(next))
            }
            None => {
                self.phase = CapturePhase::Complete;
                Ok(None)
            }
        }
    }

    fn handle_capture_trigger(
        &mut self,
        face: Option<&FaceFrame>,
        pose: Option<&PoseFrame>,
    ) -> CaptureEvent {
        match validate_captured_frame(self.stage, face, pose) {
            Ok(()) => {
                self.pending = Some(PendingCapture {
                    metrics: self.latest_metrics,
                });
                self.phase = CapturePhase::Reviewing;
                CaptureEvent::Captured { stage: self.stage }
            }
            Err(error) => {
                self.phase = CapturePhase::Retrying {
                    remaining_ms: RETRY_DELAY_MS,
                };
                CaptureEvent::ValidationFailed {
                    stage: self.stage,
                    error,
                }
            }
        }
    }

    fn commit_stage_metrics(&mut self, metrics: &CombinedMetrics) {
        match self.stage {
            CaptureStage::Face => {
                self.stage_data.face = Some(FaceStageMetrics::from(metrics.face));
            }
            CaptureStage::UpperFront => {
                self.stage_data.upper_front = Some(UpperFrontStageMetrics {
                    shoulder_height: metrics.body.shoulder_height,
                });
            }
            CaptureStage::UpperSide => {
                self.stage_data.upper_side = Some(UpperSideStageMetrics {
                    fhp_angle: metrics.body.fhp_angle,
                });
            }
            CaptureStage::LowerSide => {
                self.stage_data.lower_side = Some(LowerSideStageMetrics {
                    pelvic_tilt: metrics.body.pelvic_tilt,
                    knee_angle: metrics.body.knee_angle,
                    foot_arch_ratio: metrics.body.foot_arch_ratio,
                });
            }
        }
    }

    fn frame_result(&self, event: Option<CaptureEvent>) -> FrameResult {
        FrameResult {
            stage: self.stage,
            phase: self.phase,
            metrics: self.latest_metrics,
            alignment: self.last_alignment,
            hold_duration_ms: self.hold.hold_duration_ms(),
            countdown: self.hold.countdown(),
            event,
        }
    }
}

/// Capture-time validation: the frame at the capture instant must carry the
/// stage's required landmarks.
fn validate_captured_frame(
    stage: CaptureStage,
    face: Option<&FaceFrame>,
    pose: Option<&PoseFrame>,
) -> Result<(), &'static str> {
    match stage {
        CaptureStage::Face => {
            if face.is_none() {
                return Err("Face landmarks not detected");
            }
        }
        CaptureStage::UpperFront | CaptureStage::UpperSide | CaptureStage::LowerSide => {
            if pose.is_none() {
                return Err("Body landmarks not detected");
            }
        }
    }
    Ok(())
}
