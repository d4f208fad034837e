use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

/// Phases a pitch session can rest in between transitions.
///
/// The transient "processing" the UI shows while a pipeline runs is not a
/// phase of its own: it is the window between planning a transition and
/// applying (or aborting) it, exposed through [`Snapshot::pending`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No bench drawn yet, or the session has been fully reset.
    Idle,
    /// A single judge is on the bench, waiting for the pitch.
    JudgeSelected,
    /// A four-judge panel is on the bench, waiting for the pitch.
    PanelSelected,
    /// The user is recording their pitch.
    Recording,
    /// A single judge's verdict is on screen.
    Feedback,
    /// The panel's verdicts are on screen.
    PanelFeedback,
    /// The scored report card is on screen.
    ReportCard,
    /// A pipeline failed; only a reset leads out.
    Error,
}

/// Events driving the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Draw a single judge from the idle state.
    DrawJudge,
    /// Draw a four-judge panel from the idle state.
    DrawPanel,
    /// Redraw the current bench; stays in the same selected phase.
    Reroll,
    /// Begin recording the pitch.
    StartRecording,
    /// Recording finished and the single-judge pipeline delivered.
    DeliverFeedback,
    /// Recording finished and the panel pipeline delivered.
    DeliverPanelFeedback,
    /// Generate the report card from the feedback on screen.
    RequestReportCard,
    /// Submit the report card to the leaderboard and finish the round.
    SubmitEntry,
    /// A pipeline failed in a way that poisons the session.
    Fail,
    /// Explicitly return to idle from anywhere.
    Reset,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// Phase the machine was in when the invalid event arrived.
    pub from: SessionPhase,
    /// The rejected event.
    pub event: SessionEvent,
}

/// Errors that can occur when planning a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The requested transition is not valid from the current phase.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Errors that can occur when aborting a planned transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned transition.
pub type PlanId = Uuid;

/// A transition that has been validated but not yet applied. While a plan is
/// pending the session presents as "processing".
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Phase the machine is currently in.
    pub from: SessionPhase,
    /// Phase the machine will move to on apply.
    pub to: SessionPhase,
    /// Event that triggered the transition.
    pub event: SessionEvent,
    /// Timestamp when this plan was created.
    pub pending_since: Instant,
}

/// Point-in-time view of the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase.
    pub phase: SessionPhase,
    /// Destination of the pending transition, if one is in flight.
    pub pending: Option<SessionPhase>,
}

/// State machine driving one pitch session from draw to leaderboard.
#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    phase: SessionPhase,
    pending: Option<Plan>,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            pending: None,
        }
    }
}

impl SessionStateMachine {
    /// Create a machine resting in the idle phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Capture the current phase and any in-flight transition.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            pending: self.pending.as_ref().map(|plan| plan.to),
        }
    }

    /// Validate that `event` applies from the current phase and park it as a
    /// pending plan.
    pub fn plan(&mut self, event: SessionEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = self
            .compute_transition(event)
            .map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.phase,
            to: next,
            event,
            pending_since: Instant::now(),
        };

        self.pending = Some(plan.clone());
        Ok(plan)
    }

    /// Commit a pending plan, moving the machine to the planned phase.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<SessionPhase, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected,
                got: plan_id,
            });
        }

        self.phase = plan.to;
        Ok(self.phase)
    }

    /// Discard a pending plan, leaving the machine in its previous phase.
    /// This is how a failed report-card or submission attempt returns the
    /// user to the screen they came from.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    fn compute_transition(
        &self,
        event: SessionEvent,
    ) -> Result<SessionPhase, InvalidTransition> {
        use SessionEvent as E;
        use SessionPhase as P;

        let next = match (self.phase, event) {
            (P::Idle, E::DrawJudge) => P::JudgeSelected,
            (P::Idle, E::DrawPanel) => P::PanelSelected,
            (P::JudgeSelected, E::Reroll) => P::JudgeSelected,
            (P::PanelSelected, E::Reroll) => P::PanelSelected,
            (P::JudgeSelected | P::PanelSelected, E::StartRecording) => P::Recording,
            (P::Recording, E::DeliverFeedback) => P::Feedback,
            (P::Recording, E::DeliverPanelFeedback) => P::PanelFeedback,
            (P::Feedback | P::PanelFeedback, E::RequestReportCard) => P::ReportCard,
            (P::ReportCard, E::SubmitEntry) => P::Idle,
            (from, E::Fail) if from != P::Idle => P::Error,
            (_, E::Reset) => P::Idle,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}
