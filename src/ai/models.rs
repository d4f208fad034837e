//! Request and response payloads exchanged with the AI gateway.

use serde::{Deserialize, Serialize};

use crate::state::judges::JudgePersonality;

/// Transcript extracted from a recorded pitch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    /// The transcribed text of the audio pitch.
    pub transcription: String,
}

/// Input for a single judge verdict.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeReplyRequest {
    /// Transcript of the user's pitch.
    pub pitch_transcript: String,
    /// Personality the model should speak as.
    pub judge_personality: JudgePersonality,
}

/// Verdict text produced by a judge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeReply {
    /// The judge's response to the pitch.
    pub judge_response: String,
}

/// Sentiment classification of a piece of feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentVerdict {
    /// One of `positive`, `neutral` or `negative`. Callers lowercase it
    /// before use since models occasionally capitalize.
    pub sentiment: String,
}

/// Output of a broken-judge event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlitchEvent {
    /// Absurd advice from the broken judge.
    pub glitched_advice: String,
    /// Whether the consumer should reverse the speech playback.
    pub reversed_speech: bool,
}

/// One judge's seat in a panel fight, as seen by the model.
#[derive(Debug, Clone, Serialize)]
pub struct FightJudge {
    /// Display name of the judge.
    pub name: String,
    /// Personality label the roast should be written in.
    pub personality: String,
}

/// Input for a panel fight script.
#[derive(Debug, Clone, Serialize)]
pub struct FightRequest {
    /// The panel, in seat order. Roast indices refer to this list.
    pub judges: Vec<FightJudge>,
}

/// One roast line in a fight script.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roast {
    /// Seat index of the judge delivering the roast.
    pub judge_index: usize,
    /// Seat indices of the judges being roasted, 1-2 entries.
    pub target_judge_indices: Vec<usize>,
    /// The roast text.
    pub roast_text: String,
}

/// Full fight script, one roast per judge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FightScript {
    /// Roasts in the order the model produced them.
    pub roasts: Vec<Roast>,
}

/// Input for report-card generation.
#[derive(Debug, Clone, Serialize)]
pub struct ReportCardRequest {
    /// The user's pitch transcript.
    pub pitch: String,
    /// The judges' combined feedback text.
    pub feedback: String,
}

/// One ungraded score line as the model emits it. Values are validated and
/// clamped by the caller before they reach a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreDraft {
    /// Category name, expected to be one of the fixed three.
    pub category: String,
    /// Numeric score, nominally 0-100.
    pub score: i64,
    /// Letter grade, nominally consistent with the score band.
    pub grade: String,
    /// Witty one-line justification.
    pub reasoning: String,
}

/// Report card as the model emits it, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportCardDraft {
    /// Roast severity, nominally 0-100.
    pub overall_roast_level: i64,
    /// Witty summary of the feedback.
    pub feedback_summary: String,
    /// Score lines, expected to cover each category exactly once.
    pub scores: Vec<ScoreDraft>,
}

/// Input for speech synthesis.
#[derive(Debug, Clone, Serialize)]
pub struct SpeechRequest {
    /// Text to speak.
    pub text: String,
    /// Prebuilt voice name to speak with.
    pub voice: String,
}

/// Synthesized speech, ready for playback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechAudio {
    /// Base64 WAV data URI (`data:audio/wav;base64,...`).
    pub audio_data_uri: String,
}
