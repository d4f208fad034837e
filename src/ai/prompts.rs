//! Prompt templates for the generative endpoints.
//!
//! Every prompt asks for JSON so the response can be parsed against the
//! schemas in [`crate::ai::models`].

use crate::ai::models::{FightJudge, JudgeReplyRequest, ReportCardRequest};

/// Personality-driven verdict on a pitch.
pub fn judge_reply(request: &JudgeReplyRequest) -> String {
    format!(
        r#"You are acting as an AI judge with the following personality: {personality}. Your task is to provide feedback on a startup pitch.

Here is the pitch transcript:
{transcript}

Generate a response that is consistent with your assigned personality.
{directive}

Return a JSON object with a single string field "judgeResponse"."#,
        personality = request.judge_personality.as_str(),
        transcript = request.pitch_transcript,
        directive = request.judge_personality.directive(),
    )
}

/// Sentiment classification of a verdict.
pub fn sentiment(text: &str) -> String {
    format!(
        r#"Classify the sentiment of the following judge feedback as exactly one of "positive", "neutral" or "negative".

Feedback:
{text}

Return a JSON object with a single string field "sentiment"."#
    )
}

/// Absurd advice for a broken-judge event.
pub fn glitch_event() -> String {
    r#"You are an AI that generates absurd and humorous advice for a "Broken Judge" event in a startup pitch app.

Generate a single piece of absurd advice.
Determine whether the judge's speech should be reversed for added comedic effect.

Return a JSON object with a string field "glitchedAdvice" and a boolean field "reversedSpeech"."#
        .to_string()
}

/// Panel fight where judges roast each other instead of the pitch.
pub fn judge_fight(judges: &[FightJudge]) -> String {
    let roster = judges
        .iter()
        .enumerate()
        .map(|(index, judge)| {
            format!(
                "- Judge {index}: {name} (Personality: {personality})",
                name = judge.name,
                personality = judge.personality,
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let last = judges.len().saturating_sub(1);
    format!(
        r#"A fight has broken out between the judges! Instead of evaluating the pitch, they're roasting each other based on their personalities.

Here are the judges:
{roster}

Generate a roast from EACH judge directed at 1-2 OTHER judges in the panel. Each roast should:
1. Be consistent with the judge's personality
2. Target at least 1 and at most 2 other judges
3. Be humorous, sarcastic, and personality-driven
4. Reference their contrasting personalities or typical behaviors
5. Be 2-3 sentences long

Make sure every judge roasts someone, creating a chaotic but entertaining fight scene!

IMPORTANT: Each judge (0-{last}) must have exactly ONE roast entry. The targetJudgeIndices array must contain 1-2 different judge indices (not including themselves).

Return a JSON object with a "roasts" array; each entry has an integer "judgeIndex", an integer array "targetJudgeIndices" and a string "roastText"."#
    )
}

/// Scored report card from a pitch and the combined feedback.
pub fn report_card(request: &ReportCardRequest) -> String {
    format!(
        r#"You are an AI that generates a "report card" for a startup pitch roasting session.

Analyze the pitch and the judge's feedback to generate scores, grades, and a summary.

**Pitch:**
{pitch}

**Judge's Feedback:**
{feedback}

Generate the report card with the following fields:
- **scores**: An array of scores for three categories: 'Originality', 'Viability', and 'Clarity'.
  - For each category, provide:
    - **score**: A numerical score from 0-100.
    - **grade**: A letter grade. Use 'A' for Awesome (85+), 'B' for Boring (60-84), 'C' for Meh (40-59), and 'J' for Joker (0-39).
    - **reasoning**: A short, witty, and slightly humorous one-sentence explanation for the grade.
- **overallRoastLevel**: A score from 0-100. A higher score means a more brutal roast. This should be based on the overall negativity and sarcasm of the judge's feedback. A purely positive feedback should be 0. A neutral but unenthusiastic feedback should be around 20-40. A slightly negative or sarcastic comment should be 40-70. A truly brutal, soul-crushing roast should be 80-100.
- **feedbackSummary**: A short, witty, and slightly humorous summary of the judge's feedback. Keep it to one or two sentences.

Generate the report card JSON output with fields "overallRoastLevel", "feedbackSummary" and "scores" (entries have "category", "score", "grade", "reasoning")."#,
        pitch = request.pitch,
        feedback = request.feedback,
    )
}

/// Transcription of a recorded pitch. The audio itself travels as an inline
/// part next to this instruction.
pub fn transcribe() -> String {
    r#"Transcribe the following audio pitch to text.

Return a JSON object with a single string field "transcription"."#
        .to_string()
}
