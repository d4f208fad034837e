use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::{SessionPhase, Snapshot};

/// Publicly visible session phase exposed to clients.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisiblePhase {
    /// Session exists but no bench is active.
    Idle,
    /// A single judge is on the bench.
    JudgeSelected,
    /// A four-judge panel is on the bench.
    PanelSelected,
    /// The user is recording their pitch.
    Recording,
    /// A pipeline is running; the outcome is not settled yet.
    Processing,
    /// A single judge's verdict is on screen.
    Feedback,
    /// The panel's verdicts are on screen.
    PanelFeedback,
    /// The scored report card is on screen.
    ReportCard,
    /// A pipeline failed; only a reset leads out.
    Error,
}

impl From<&Snapshot> for VisiblePhase {
    fn from(value: &Snapshot) -> Self {
        if value.pending.is_some() {
            return VisiblePhase::Processing;
        }
        match value.phase {
            SessionPhase::Idle => VisiblePhase::Idle,
            SessionPhase::JudgeSelected => VisiblePhase::JudgeSelected,
            SessionPhase::PanelSelected => VisiblePhase::PanelSelected,
            SessionPhase::Recording => VisiblePhase::Recording,
            SessionPhase::Feedback => VisiblePhase::Feedback,
            SessionPhase::PanelFeedback => VisiblePhase::PanelFeedback,
            SessionPhase::ReportCard => VisiblePhase::ReportCard,
            SessionPhase::Error => VisiblePhase::Error,
        }
    }
}
