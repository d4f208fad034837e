use std::time::SystemTime;

use uuid::Uuid;

use crate::state::judges::Judge;

/// Maximum number of judge rerolls allowed before recording.
pub const MAX_REROLLS: u32 = 3;

/// Fallback sentiment used when the analyzer is unavailable.
pub const NEUTRAL_SENTIMENT: &str = "neutral";

/// Which kind of bench the user is pitching to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bench {
    /// One judge evaluating alone.
    Single {
        /// The judge currently on the bench.
        judge: Judge,
    },
    /// A four-judge panel.
    Panel {
        /// The judges currently on the bench, in seat order.
        judges: Vec<Judge>,
    },
}

impl Bench {
    /// True when this is a panel bench.
    pub fn is_panel(&self) -> bool {
        matches!(self, Bench::Panel { .. })
    }
}

/// One judge's verdict on a pitch.
#[derive(Debug, Clone)]
pub struct JudgeFeedback {
    /// The judge the verdict is attributed to. During a glitch event this is
    /// the catalog's glitch judge, not the originally drawn one.
    pub judge: Judge,
    /// Verdict text.
    pub response: String,
    /// Lowercased sentiment category derived from the verdict.
    pub sentiment: String,
    /// Whether a glitch event replaced the original judge.
    pub is_glitched: bool,
    /// Whether the consumer should play the text reversed. No audio is
    /// synthesized when set.
    pub reversed_speech: bool,
    /// Playable audio data URI, absent when synthesis failed or was skipped.
    pub audio_data_uri: Option<String>,
    /// Judges being roasted; only present in fight mode (1-2 entries).
    pub target_judges: Option<Vec<Judge>>,
}

/// Aggregate verdict of a four-judge panel.
#[derive(Debug, Clone)]
pub struct PanelFeedback {
    /// The judges on the bench, in seat order.
    pub judges: Vec<Judge>,
    /// One verdict per seat, same order as `judges`.
    pub responses: Vec<JudgeFeedback>,
    /// Whether the judges roasted each other instead of the pitch.
    pub is_fight_mode: bool,
}

/// Outcome of the feedback stage, shaped by the bench.
#[derive(Debug, Clone)]
pub enum FeedbackOutcome {
    /// Verdict from a single-judge bench.
    Single(JudgeFeedback),
    /// Aggregate verdict from a panel bench.
    Panel(PanelFeedback),
}

impl FeedbackOutcome {
    /// Concatenate judge responses for the report-card generator: one
    /// `"{name}: {response}"` line per panel judge, or the lone response for
    /// a single bench.
    pub fn combined_text(&self) -> String {
        match self {
            FeedbackOutcome::Single(feedback) => feedback.response.clone(),
            FeedbackOutcome::Panel(panel) => panel
                .responses
                .iter()
                .map(|entry| format!("{}: {}", entry.judge.name, entry.response))
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }
}

/// Fixed grading categories on the report card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreCategory {
    /// How novel the idea is.
    Originality,
    /// Whether the idea could survive contact with a market.
    Viability,
    /// How clearly the pitch was delivered.
    Clarity,
}

impl ScoreCategory {
    /// All categories in report-card order.
    pub const ALL: [ScoreCategory; 3] = [
        ScoreCategory::Originality,
        ScoreCategory::Viability,
        ScoreCategory::Clarity,
    ];

    /// Display name as it appears on the card.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreCategory::Originality => "Originality",
            ScoreCategory::Viability => "Viability",
            ScoreCategory::Clarity => "Clarity",
        }
    }
}

/// Letter grade attached to each category score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    /// Awesome, score 85-100.
    A,
    /// Boring, score 60-84.
    B,
    /// Meh, score 40-59.
    C,
    /// Joker, score 0-39.
    J,
}

impl Grade {
    /// Grade band a score falls into.
    pub fn for_score(score: u8) -> Self {
        match score {
            85..=100 => Grade::A,
            60..=84 => Grade::B,
            40..=59 => Grade::C,
            _ => Grade::J,
        }
    }
}

/// One graded category on the report card.
#[derive(Debug, Clone)]
pub struct Score {
    /// Category being graded.
    pub category: ScoreCategory,
    /// Numeric score, 0-100.
    pub score: u8,
    /// Letter grade consistent with the score band.
    pub grade: Grade,
    /// Witty one-line justification.
    pub reasoning: String,
}

/// Scored summary produced after the feedback stage.
#[derive(Debug, Clone)]
pub struct ReportCard {
    /// Identifier of the pitch this card grades.
    pub pitch_id: Uuid,
    /// Aggregate roast severity, 0-100. Generated independently of the
    /// category scores, per the generator contract.
    pub overall_roast_level: u8,
    /// Witty summary of the judges' feedback.
    pub feedback_summary: String,
    /// Exactly one entry per [`ScoreCategory`].
    pub scores: Vec<Score>,
    /// Name chosen for the leaderboard, set at submission time.
    pub leaderboard_name: Option<String>,
}

/// One user's pitch attempt, owned exclusively by that user's request flow.
#[derive(Debug, Clone)]
pub struct PitchSession {
    /// Stable identifier for the session.
    pub id: Uuid,
    /// Anonymous identity recorded with a leaderboard submission.
    pub user_id: Uuid,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Judge or panel currently on the bench.
    pub bench: Bench,
    /// Number of rerolls consumed, capped at [`MAX_REROLLS`].
    pub reroll_count: u32,
    /// Transcript of the recorded pitch, set once recording completes.
    pub transcript: Option<String>,
    /// Feedback accumulated for this pitch.
    pub feedback: Option<FeedbackOutcome>,
    /// Report card generated from the feedback.
    pub report_card: Option<ReportCard>,
}

impl PitchSession {
    /// Start a fresh session around an initial bench draw.
    pub fn new(bench: Bench) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            created_at: SystemTime::now(),
            bench,
            reroll_count: 0,
            transcript: None,
            feedback: None,
            report_card: None,
        }
    }

    /// Rerolls still available before the cap.
    pub fn rerolls_remaining(&self) -> u32 {
        MAX_REROLLS.saturating_sub(self.reroll_count)
    }
}
