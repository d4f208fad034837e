//! DTO definitions for the pitch session REST API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{format_system_time, phase::VisiblePhase, validation::validate_leaderboard_name},
    state::{
        judges::Judge,
        session::{
            Bench, FeedbackOutcome, Grade, JudgeFeedback, PanelFeedback, PitchSession, ReportCard,
            Score,
        },
        state_machine::Snapshot,
    },
};

/// Which kind of bench to draw when opening a session.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BenchMode {
    /// One judge evaluating alone.
    Single,
    /// A four-judge panel.
    Panel,
}

/// Payload used to open a new pitch session.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    /// Bench kind for the opening draw.
    pub mode: BenchMode,
}

/// The bench as shown to clients.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BenchDto {
    /// One judge evaluating alone.
    Single {
        /// The judge on the bench.
        judge: Judge,
    },
    /// A four-judge panel in seat order.
    Panel {
        /// The judges on the bench.
        judges: Vec<Judge>,
    },
}

impl From<&Bench> for BenchDto {
    fn from(value: &Bench) -> Self {
        match value {
            Bench::Single { judge } => BenchDto::Single {
                judge: judge.clone(),
            },
            Bench::Panel { judges } => BenchDto::Panel {
                judges: judges.clone(),
            },
        }
    }
}

/// One judge's verdict as shown to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct JudgeFeedbackDto {
    /// The judge the verdict is attributed to.
    pub judge: Judge,
    /// Verdict text.
    pub response: String,
    /// Lowercased sentiment category.
    pub sentiment: String,
    /// Whether a glitch event replaced the original judge.
    pub is_glitched: bool,
    /// Whether the client should play the text reversed.
    pub reversed_speech: bool,
    /// Playable audio data URI, if synthesis succeeded.
    pub audio_data_uri: Option<String>,
    /// Judges being roasted, present only in fight mode.
    pub target_judges: Option<Vec<Judge>>,
}

impl From<&JudgeFeedback> for JudgeFeedbackDto {
    fn from(value: &JudgeFeedback) -> Self {
        Self {
            judge: value.judge.clone(),
            response: value.response.clone(),
            sentiment: value.sentiment.clone(),
            is_glitched: value.is_glitched,
            reversed_speech: value.reversed_speech,
            audio_data_uri: value.audio_data_uri.clone(),
            target_judges: value.target_judges.clone(),
        }
    }
}

/// Aggregate panel verdict as shown to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct PanelFeedbackDto {
    /// The judges on the bench, in seat order.
    pub judges: Vec<Judge>,
    /// One verdict per seat.
    pub responses: Vec<JudgeFeedbackDto>,
    /// Whether the judges roasted each other instead of the pitch.
    pub is_fight_mode: bool,
}

impl From<&PanelFeedback> for PanelFeedbackDto {
    fn from(value: &PanelFeedback) -> Self {
        Self {
            judges: value.judges.clone(),
            responses: value.responses.iter().map(Into::into).collect(),
            is_fight_mode: value.is_fight_mode,
        }
    }
}

/// Feedback outcome, shaped by the bench.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedbackDto {
    /// Verdict from a single-judge bench.
    Single {
        /// The verdict.
        feedback: JudgeFeedbackDto,
    },
    /// Aggregate verdict from a panel bench.
    Panel {
        /// The panel verdicts.
        feedback: PanelFeedbackDto,
    },
}

impl From<&FeedbackOutcome> for FeedbackDto {
    fn from(value: &FeedbackOutcome) -> Self {
        match value {
            FeedbackOutcome::Single(feedback) => FeedbackDto::Single {
                feedback: feedback.into(),
            },
            FeedbackOutcome::Panel(panel) => FeedbackDto::Panel {
                feedback: panel.into(),
            },
        }
    }
}

/// One graded category on the report card.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreDto {
    /// Category name.
    pub category: String,
    /// Numeric score, 0-100.
    pub score: u8,
    /// Letter grade (`A`, `B`, `C` or `J`).
    pub grade: String,
    /// Witty one-line justification.
    pub reasoning: String,
}

impl From<&Score> for ScoreDto {
    fn from(value: &Score) -> Self {
        Self {
            category: value.category.as_str().to_string(),
            score: value.score,
            grade: grade_letter(value.grade).to_string(),
            reasoning: value.reasoning.clone(),
        }
    }
}

/// Scored report card as shown to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReportCardDto {
    /// Identifier of the pitch this card grades.
    pub pitch_id: Uuid,
    /// Aggregate roast severity, 0-100.
    pub overall_roast_level: u8,
    /// Witty summary of the judges' feedback.
    pub feedback_summary: String,
    /// One entry per grading category.
    pub scores: Vec<ScoreDto>,
    /// Name chosen for the leaderboard, set at submission time.
    pub leaderboard_name: Option<String>,
}

impl From<&ReportCard> for ReportCardDto {
    fn from(value: &ReportCard) -> Self {
        Self {
            pitch_id: value.pitch_id,
            overall_roast_level: value.overall_roast_level,
            feedback_summary: value.feedback_summary.clone(),
            scores: value.scores.iter().map(Into::into).collect(),
            leaderboard_name: value.leaderboard_name.clone(),
        }
    }
}

/// Full projection of a session returned by most session routes.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionSnapshot {
    /// Session identifier.
    pub id: Uuid,
    /// Current visible phase.
    pub phase: VisiblePhase,
    /// The bench on screen.
    pub bench: BenchDto,
    /// Rerolls consumed so far.
    pub reroll_count: u32,
    /// Rerolls still available.
    pub rerolls_remaining: u32,
    /// Transcript of the recorded pitch, once available.
    pub transcript: Option<String>,
    /// Feedback, once delivered.
    pub feedback: Option<FeedbackDto>,
    /// Report card, once generated.
    pub report_card: Option<ReportCardDto>,
    /// Session creation timestamp (RFC 3339).
    pub created_at: String,
}

impl SessionSnapshot {
    /// Project a session and its machine snapshot into the client shape.
    pub fn project(session: &PitchSession, machine: &Snapshot) -> Self {
        Self {
            id: session.id,
            phase: machine.into(),
            bench: (&session.bench).into(),
            reroll_count: session.reroll_count,
            rerolls_remaining: session.rerolls_remaining(),
            transcript: session.transcript.clone(),
            feedback: session.feedback.as_ref().map(Into::into),
            report_card: session.report_card.as_ref().map(Into::into),
            created_at: format_system_time(session.created_at),
        }
    }
}

/// Recorded pitch submission. Either an inline transcript or audio to
/// transcribe must be provided.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PitchRequest {
    /// Transcript typed or transcribed client-side.
    #[serde(default)]
    pub transcript: Option<String>,
    /// Recorded audio as a `data:<mime>;base64,...` URI.
    #[serde(default)]
    pub audio_data_uri: Option<String>,
}

/// Standalone transcription request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TranscribeRequest {
    /// Recorded audio as a `data:<mime>;base64,...` URI.
    pub audio_data_uri: String,
}

/// Standalone transcription result.
#[derive(Debug, Serialize, ToSchema)]
pub struct TranscribeResponse {
    /// The transcribed text.
    pub transcript: String,
}

/// Payload submitting the report card to the leaderboard.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitEntryRequest {
    /// Name to show on the board.
    pub name: String,
}

impl Validate for SubmitEntryRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(err) = validate_leaderboard_name(&self.name) {
            errors.add("name", err);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn grade_letter(grade: Grade) -> &'static str {
    match grade {
        Grade::A => "A",
        Grade::B => "B",
        Grade::C => "C",
        Grade::J => "J",
    }
}
