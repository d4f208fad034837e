//! Feedback pipeline: judge verdicts, glitch events, panel fights, and
//! report-card grading. These helpers call the AI gateway and normalize its
//! output before anything reaches a session.

use futures::future::{join_all, try_join_all};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::{
    ai::{
        AiGateway,
        models::{
            FightJudge, FightRequest, FightScript, JudgeReplyRequest, ReportCardDraft,
            ReportCardRequest, SpeechRequest,
        },
    },
    error::ServiceError,
    state::{
        SharedState,
        judges::{Judge, PANEL_SIZE},
        session::{
            FeedbackOutcome, Grade, JudgeFeedback, NEUTRAL_SENTIMENT, PanelFeedback, ReportCard,
            Score, ScoreCategory,
        },
    },
};

/// Probability that a verdict is hijacked by the broken judge.
pub const GLITCH_CHANCE: f64 = 0.15;

/// Probability that a panel starts roasting each other instead of the pitch.
pub const FIGHT_CHANCE: f64 = 0.40;

/// Sentiment attached to every fight roast.
const FIGHT_SENTIMENT: &str = "negative";

pub(crate) const EMPTY_TRANSCRIPT_ERROR: &str =
    "Pitch transcript is empty. Please record your pitch again.";
pub(crate) const INVALID_JUDGE_ERROR: &str = "Invalid judge selected.";

/// Produce a single judge's verdict on a pitch, rolling for a glitch event.
pub async fn single_feedback(
    state: &SharedState,
    judge: &Judge,
    transcript: &str,
) -> Result<JudgeFeedback, ServiceError> {
    let is_glitched = state.roll(GLITCH_CHANCE);
    single_feedback_with(state, judge, transcript, is_glitched).await
}

/// Single-judge pipeline with the glitch roll already decided.
pub(crate) async fn single_feedback_with(
    state: &SharedState,
    judge: &Judge,
    transcript: &str,
    is_glitched: bool,
) -> Result<JudgeFeedback, ServiceError> {
    ensure_transcript(transcript)?;
    if state.catalog().find(&judge.id).is_none() {
        return Err(ServiceError::InvalidInput(INVALID_JUDGE_ERROR.to_string()));
    }

    let glitch_judge = state.catalog().glitch_judge()?.clone();
    seat_verdict(
        state.ai().clone(),
        glitch_judge,
        judge.clone(),
        transcript.to_string(),
        is_glitched,
    )
    .await
}

/// Produce a full panel verdict, rolling for fight mode and for a glitch on
/// every seat independently.
pub async fn panel_feedback(
    state: &SharedState,
    judges: &[Judge],
    transcript: &str,
) -> Result<PanelFeedback, ServiceError> {
    let is_fight = state.roll(FIGHT_CHANCE);
    let glitch_rolls = judges.iter().map(|_| state.roll(GLITCH_CHANCE)).collect();
    panel_feedback_with(state, judges, transcript, is_fight, glitch_rolls).await
}

/// Panel pipeline with the fight and per-seat glitch rolls already decided.
pub(crate) async fn panel_feedback_with(
    state: &SharedState,
    judges: &[Judge],
    transcript: &str,
    is_fight: bool,
    glitch_rolls: Vec<bool>,
) -> Result<PanelFeedback, ServiceError> {
    ensure_transcript(transcript)?;
    if judges.len() != PANEL_SIZE {
        return Err(ServiceError::InvalidState(format!(
            "panel must seat exactly {PANEL_SIZE} judges, found {}",
            judges.len()
        )));
    }

    let ai = state.ai().clone();
    let responses = if is_fight {
        // Fighting judges are too busy roasting each other to get hacked.
        fight_responses(&ai, judges).await?
    } else {
        let glitch_judge = state.catalog().glitch_judge()?.clone();
        pitch_responses(&ai, &glitch_judge, judges, transcript, &glitch_rolls).await?
    };

    Ok(PanelFeedback {
        judges: judges.to_vec(),
        responses,
        is_fight_mode: is_fight,
    })
}

/// Grade the pitch into a report card, validating and repairing the draft.
pub async fn generate_report_card(
    state: &SharedState,
    pitch_id: Uuid,
    pitch: &str,
    feedback: &FeedbackOutcome,
) -> Result<ReportCard, ServiceError> {
    let draft = state
        .ai()
        .report_card(ReportCardRequest {
            pitch: pitch.to_string(),
            feedback: feedback.combined_text(),
        })
        .await?;
    finalize_report_card(pitch_id, draft)
}

fn ensure_transcript(transcript: &str) -> Result<(), ServiceError> {
    if transcript.trim().is_empty() {
        return Err(ServiceError::InvalidInput(
            EMPTY_TRANSCRIPT_ERROR.to_string(),
        ));
    }
    Ok(())
}

/// Synthesis failures must not sink a verdict; the card renders without
/// audio.
async fn synthesize_or_skip(
    ai: &Arc<dyn AiGateway>,
    text: &str,
    judge: &Judge,
) -> Option<String> {
    match ai
        .synthesize_speech(SpeechRequest {
            text: text.to_string(),
            voice: judge.voice.clone(),
        })
        .await
    {
        Ok(audio) => Some(audio.audio_data_uri),
        Err(err) => {
            warn!(judge = %judge.id, error = %err, "speech synthesis failed, continuing without audio");
            None
        }
    }
}

async fn sentiment_or_neutral(ai: &Arc<dyn AiGateway>, text: &str) -> String {
    match ai.analyze_sentiment(text.to_string()).await {
        Ok(verdict) => verdict.sentiment.to_lowercase(),
        Err(err) => {
            warn!(error = %err, "sentiment analysis failed, defaulting to neutral");
            NEUTRAL_SENTIMENT.to_string()
        }
    }
}

/// One seat's verdict: the drawn judge replies, or the broken judge hijacks
/// the seat when its glitch roll came up.
async fn seat_verdict(
    ai: Arc<dyn AiGateway>,
    glitch_judge: Judge,
    judge: Judge,
    transcript: String,
    is_glitched: bool,
) -> Result<JudgeFeedback, ServiceError> {
    let (final_judge, response, reversed_speech) = if is_glitched {
        let event = ai.glitch_event().await?;
        (glitch_judge, event.glitched_advice, event.reversed_speech)
    } else {
        let reply = ai
            .judge_reply(JudgeReplyRequest {
                pitch_transcript: transcript,
                judge_personality: judge.personality,
            })
            .await?;
        (judge, reply.judge_response, false)
    };

    // Reversed speech is played backwards client-side from the text, so no
    // audio is synthesized for it.
    let audio_data_uri = if reversed_speech {
        None
    } else {
        synthesize_or_skip(&ai, &response, &final_judge).await
    };
    let sentiment = sentiment_or_neutral(&ai, &response).await;

    Ok(JudgeFeedback {
        judge: final_judge,
        response,
        sentiment,
        is_glitched,
        reversed_speech,
        audio_data_uri,
        target_judges: None,
    })
}

async fn fight_responses(
    ai: &Arc<dyn AiGateway>,
    judges: &[Judge],
) -> Result<Vec<JudgeFeedback>, ServiceError> {
    let script = ai
        .judge_fight(FightRequest {
            judges: judges
                .iter()
                .map(|judge| FightJudge {
                    name: judge.name.clone(),
                    personality: judge.personality.as_str().to_string(),
                })
                .collect(),
        })
        .await?;
    if let Err(reason) = validate_fight_script(&script, judges.len()) {
        return Err(ServiceError::Upstream(format!(
            "fight script rejected: {reason}"
        )));
    }

    let audio_futures = judges.iter().enumerate().map(|(seat, judge)| {
        let roast = script
            .roasts
            .iter()
            .find(|roast| roast.judge_index == seat)
            .cloned();
        let ai = ai.clone();
        let judge = judge.clone();
        async move {
            // Validation guarantees one roast per seat.
            let roast = roast.expect("validated fight script covers every seat");
            let audio = synthesize_or_skip(&ai, &roast.roast_text, &judge).await;
            (roast, audio)
        }
    });

    let spoken = join_all(audio_futures).await;
    Ok(spoken
        .into_iter()
        .zip(judges.iter())
        .map(|((roast, audio_data_uri), judge)| JudgeFeedback {
            judge: judge.clone(),
            response: roast.roast_text,
            sentiment: FIGHT_SENTIMENT.to_string(),
            is_glitched: false,
            reversed_speech: false,
            audio_data_uri,
            target_judges: Some(
                roast
                    .target_judge_indices
                    .iter()
                    .map(|&target| judges[target].clone())
                    .collect(),
            ),
        })
        .collect())
}

async fn pitch_responses(
    ai: &Arc<dyn AiGateway>,
    glitch_judge: &Judge,
    judges: &[Judge],
    transcript: &str,
    glitch_rolls: &[bool],
) -> Result<Vec<JudgeFeedback>, ServiceError> {
    let seat_futures = judges.iter().zip(glitch_rolls).map(|(judge, &is_glitched)| {
        seat_verdict(
            ai.clone(),
            glitch_judge.clone(),
            judge.clone(),
            transcript.to_string(),
            is_glitched,
        )
    });
    try_join_all(seat_futures).await
}

/// A usable fight script has exactly one roast per seat, each targeting one
/// or two other seats.
fn validate_fight_script(script: &FightScript, seats: usize) -> Result<(), String> {
    if script.roasts.len() != seats {
        return Err(format!(
            "expected {seats} roasts, got {}",
            script.roasts.len()
        ));
    }

    let mut seen = vec![false; seats];
    for roast in &script.roasts {
        if roast.judge_index >= seats {
            return Err(format!("roaster index {} out of range", roast.judge_index));
        }
        if seen[roast.judge_index] {
            return Err(format!("judge {} roasts more than once", roast.judge_index));
        }
        seen[roast.judge_index] = true;

        let targets = &roast.target_judge_indices;
        if targets.is_empty() || targets.len() > 2 {
            return Err(format!(
                "judge {} must target 1-2 judges, targets {}",
                roast.judge_index,
                targets.len()
            ));
        }
        for &target in targets {
            if target >= seats {
                return Err(format!("target index {target} out of range"));
            }
            if target == roast.judge_index {
                return Err(format!("judge {} targets themselves", roast.judge_index));
            }
        }
        if targets.len() == 2 && targets[0] == targets[1] {
            return Err(format!("judge {} lists a duplicate target", roast.judge_index));
        }
    }
    Ok(())
}

/// Validate a draft against the grading contract, repairing what can be
/// repaired and rejecting what cannot.
fn finalize_report_card(pitch_id: Uuid, draft: ReportCardDraft) -> Result<ReportCard, ServiceError> {
    let mut scores: Vec<Option<Score>> = vec![None; ScoreCategory::ALL.len()];

    for line in draft.scores {
        let Some(slot) = ScoreCategory::ALL
            .iter()
            .position(|category| category.as_str() == line.category)
        else {
            return Err(ServiceError::Upstream(format!(
                "report card rejected: unknown category `{}`",
                line.category
            )));
        };
        if scores[slot].is_some() {
            return Err(ServiceError::Upstream(format!(
                "report card rejected: duplicate category `{}`",
                line.category
            )));
        }

        let score = line.score.clamp(0, 100) as u8;
        let banded = Grade::for_score(score);
        let grade = match parse_grade(&line.grade) {
            Some(grade) if grade == banded => grade,
            Some(_) | None => {
                // Models occasionally mislabel a band. The score wins.
                warn!(
                    category = line.category,
                    score,
                    claimed = line.grade,
                    "grade inconsistent with score band, repairing"
                );
                banded
            }
        };

        scores[slot] = Some(Score {
            category: ScoreCategory::ALL[slot],
            score,
            grade,
            reasoning: line.reasoning,
        });
    }

    let scores = scores
        .into_iter()
        .enumerate()
        .map(|(slot, score)| {
            score.ok_or_else(|| {
                ServiceError::Upstream(format!(
                    "report card rejected: missing category `{}`",
                    ScoreCategory::ALL[slot].as_str()
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ReportCard {
        pitch_id,
        overall_roast_level: draft.overall_roast_level.clamp(0, 100) as u8,
        feedback_summary: draft.feedback_summary,
        scores,
        leaderboard_name: None,
    })
}

fn parse_grade(value: &str) -> Option<Grade> {
    match value {
        "A" => Some(Grade::A),
        "B" => Some(Grade::B),
        "C" => Some(Grade::C),
        "J" => Some(Grade::J),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ai::{
            models::Roast,
            testing::{StubGateway, default_fight_script, default_report_card},
        },
        config::{AppConfig, default_judges},
    };

    fn test_state(ai: Arc<StubGateway>) -> SharedState {
        let config = AppConfig {
            judges: default_judges(),
            rng_seed: Some(7),
        };
        crate::state::AppState::new(config, ai)
    }

    fn drawn_judge(state: &SharedState) -> Judge {
        state.catalog().find("vc-chad").unwrap().clone()
    }

    fn drawn_panel(state: &SharedState) -> Vec<Judge> {
        ["vc-chad", "trollbot69", "modern-dadu", "hype-beast"]
            .iter()
            .map(|id| state.catalog().find(id).unwrap().clone())
            .collect()
    }

    #[tokio::test]
    async fn empty_transcript_is_rejected_with_the_exact_message() {
        let ai = Arc::new(StubGateway::default());
        let state = test_state(ai.clone());
        let judge = drawn_judge(&state);

        let err = single_feedback_with(&state, &judge, "   ", false)
            .await
            .unwrap_err();
        match err {
            ServiceError::InvalidInput(message) => assert_eq!(
                message,
                "Pitch transcript is empty. Please record your pitch again."
            ),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(ai.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_judge_is_rejected() {
        let ai = Arc::new(StubGateway::default());
        let state = test_state(ai.clone());
        let mut judge = drawn_judge(&state);
        judge.id = "no-such-judge".to_string();

        let err = single_feedback_with(&state, &judge, "We make apps.", false)
            .await
            .unwrap_err();
        match err {
            ServiceError::InvalidInput(message) => {
                assert_eq!(message, "Invalid judge selected.")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn normal_verdict_keeps_the_drawn_judge_and_speaks() {
        let ai = Arc::new(StubGateway::default());
        let state = test_state(ai.clone());
        let judge = drawn_judge(&state);

        let feedback = single_feedback_with(&state, &judge, "We make apps.", false)
            .await
            .unwrap();
        assert_eq!(feedback.judge.id, "vc-chad");
        assert!(!feedback.is_glitched);
        assert!(feedback.audio_data_uri.is_some());
        assert_eq!(feedback.sentiment, "negative");
        assert_eq!(ai.call_count("judge_reply"), 1);
        assert_eq!(ai.call_count("glitch_event"), 0);
    }

    #[tokio::test]
    async fn glitch_substitutes_the_broken_judge() {
        let ai = Arc::new(StubGateway::default());
        let state = test_state(ai.clone());
        let judge = drawn_judge(&state);

        let feedback = single_feedback_with(&state, &judge, "We make apps.", true)
            .await
            .unwrap();
        assert_eq!(feedback.judge.id, "broken-judge");
        assert!(feedback.is_glitched);
        assert_eq!(feedback.response, "Pivot to selling clouds by the pound.");
        assert_eq!(ai.call_count("glitch_event"), 1);
        assert_eq!(ai.call_count("judge_reply"), 0);
    }

    #[tokio::test]
    async fn reversed_speech_skips_synthesis() {
        let mut stub = StubGateway::default();
        stub.glitch = Ok(crate::ai::models::GlitchEvent {
            glitched_advice: "sdrawkcab kaepS".to_string(),
            reversed_speech: true,
        });
        let ai = Arc::new(stub);
        let state = test_state(ai.clone());
        let judge = drawn_judge(&state);

        let feedback = single_feedback_with(&state, &judge, "We make apps.", true)
            .await
            .unwrap();
        assert!(feedback.reversed_speech);
        assert!(feedback.audio_data_uri.is_none());
        assert_eq!(ai.call_count("synthesize_speech"), 0);
    }

    #[tokio::test]
    async fn synthesis_failure_is_not_fatal() {
        let mut stub = StubGateway::default();
        stub.speech = Err("voice endpoint down".to_string());
        let ai = Arc::new(stub);
        let state = test_state(ai.clone());
        let judge = drawn_judge(&state);

        let feedback = single_feedback_with(&state, &judge, "We make apps.", false)
            .await
            .unwrap();
        assert!(feedback.audio_data_uri.is_none());
        assert_eq!(feedback.response, "Bold. Terrible, but bold.");
    }

    #[tokio::test]
    async fn sentiment_failure_defaults_to_neutral() {
        let mut stub = StubGateway::default();
        stub.sentiment = Err("sentiment endpoint down".to_string());
        let ai = Arc::new(stub);
        let state = test_state(ai.clone());
        let judge = drawn_judge(&state);

        let feedback = single_feedback_with(&state, &judge, "We make apps.", false)
            .await
            .unwrap();
        assert_eq!(feedback.sentiment, "neutral");
    }

    #[tokio::test]
    async fn sentiment_is_lowercased() {
        let mut stub = StubGateway::default();
        stub.sentiment = Ok(crate::ai::models::SentimentVerdict {
            sentiment: "Positive".to_string(),
        });
        let ai = Arc::new(stub);
        let state = test_state(ai.clone());
        let judge = drawn_judge(&state);

        let feedback = single_feedback_with(&state, &judge, "We make apps.", false)
            .await
            .unwrap();
        assert_eq!(feedback.sentiment, "positive");
    }

    #[tokio::test]
    async fn fight_mode_orders_roasts_by_seat() {
        let ai = Arc::new(StubGateway::default());
        let state = test_state(ai.clone());
        let judges = drawn_panel(&state);

        let panel = panel_feedback_with(&state, &judges, "We make apps.", true, vec![false; 4])
            .await
            .unwrap();
        assert!(panel.is_fight_mode);
        assert_eq!(panel.responses.len(), 4);
        for (seat, response) in panel.responses.iter().enumerate() {
            assert_eq!(response.judge.id, judges[seat].id);
            assert_eq!(response.sentiment, "negative");
            let targets = response.target_judges.as_ref().unwrap();
            assert_eq!(targets.len(), 1);
            assert_eq!(targets[0].id, judges[(seat + 1) % 4].id);
        }
        assert_eq!(ai.call_count("judge_reply"), 0);
    }

    #[tokio::test]
    async fn self_targeting_fight_script_is_rejected() {
        let mut script = default_fight_script();
        script.roasts[2].target_judge_indices = vec![2];
        let mut stub = StubGateway::default();
        stub.fight = Ok(script);
        let ai = Arc::new(stub);
        let state = test_state(ai.clone());
        let judges = drawn_panel(&state);

        let err = panel_feedback_with(&state, &judges, "We make apps.", true, vec![false; 4])
            .await
            .unwrap_err();
        match err {
            ServiceError::Upstream(message) => {
                assert!(message.contains("fight script rejected"), "{message}")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn incomplete_fight_script_is_rejected() {
        let mut script = default_fight_script();
        script.roasts[1] = Roast {
            judge_index: 0,
            target_judge_indices: vec![1],
            roast_text: "Double dipping.".to_string(),
        };
        let mut stub = StubGateway::default();
        stub.fight = Ok(script);
        let ai = Arc::new(stub);
        let state = test_state(ai.clone());
        let judges = drawn_panel(&state);

        assert!(
            panel_feedback_with(&state, &judges, "We make apps.", true, vec![false; 4])
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn normal_panel_queries_every_seat() {
        let ai = Arc::new(StubGateway::default());
        let state = test_state(ai.clone());
        let judges = drawn_panel(&state);

        let panel = panel_feedback_with(&state, &judges, "We make apps.", false, vec![false; 4])
            .await
            .unwrap();
        assert!(!panel.is_fight_mode);
        assert_eq!(panel.responses.len(), 4);
        assert_eq!(ai.call_count("judge_reply"), 4);
        assert!(panel.responses.iter().all(|r| r.target_judges.is_none()));
    }

    #[tokio::test]
    async fn panel_seat_can_be_hijacked_by_the_broken_judge() {
        let ai = Arc::new(StubGateway::default());
        let state = test_state(ai.clone());
        let judges = drawn_panel(&state);

        let panel = panel_feedback_with(
            &state,
            &judges,
            "We make apps.",
            false,
            vec![true, false, false, false],
        )
        .await
        .unwrap();
        assert_eq!(panel.responses.len(), 4);
        assert!(panel.responses[0].is_glitched);
        assert_eq!(panel.responses[0].judge.id, "broken-judge");
        for response in &panel.responses[1..] {
            assert!(!response.is_glitched);
            assert_ne!(response.judge.id, "broken-judge");
        }
        assert_eq!(ai.call_count("glitch_event"), 1);
        assert_eq!(ai.call_count("judge_reply"), 3);
    }

    #[tokio::test]
    async fn panel_draws_glitches_independently_per_seat() {
        let ai = Arc::new(StubGateway::default());
        let state = test_state(ai.clone());
        let judges = drawn_panel(&state);

        // Enough seeded panels that some seats must come up glitched.
        for _ in 0..50 {
            panel_feedback(&state, &judges, "We make apps.").await.unwrap();
        }
        assert!(ai.call_count("glitch_event") > 0);
    }

    #[test]
    fn report_card_orders_and_grades_categories() {
        let card = finalize_report_card(Uuid::new_v4(), default_report_card()).unwrap();
        assert_eq!(card.overall_roast_level, 72);
        let categories: Vec<_> = card.scores.iter().map(|s| s.category).collect();
        assert_eq!(
            categories,
            vec![
                ScoreCategory::Originality,
                ScoreCategory::Viability,
                ScoreCategory::Clarity
            ]
        );
        assert_eq!(card.scores[0].grade, Grade::A);
        assert_eq!(card.scores[1].grade, Grade::J);
        assert!(card.leaderboard_name.is_none());
    }

    #[test]
    fn inconsistent_grade_is_repaired_from_the_score() {
        let mut draft = default_report_card();
        draft.scores[0].score = 50;
        draft.scores[0].grade = "A".to_string();
        let card = finalize_report_card(Uuid::new_v4(), draft).unwrap();
        assert_eq!(card.scores[0].grade, Grade::C);
    }

    #[test]
    fn out_of_range_draft_values_are_clamped() {
        let mut draft = default_report_card();
        draft.overall_roast_level = 140;
        draft.scores[0].score = -12;
        let card = finalize_report_card(Uuid::new_v4(), draft).unwrap();
        assert_eq!(card.overall_roast_level, 100);
        assert_eq!(card.scores[0].score, 0);
        assert_eq!(card.scores[0].grade, Grade::J);
    }

    #[test]
    fn missing_category_is_rejected() {
        let mut draft = default_report_card();
        draft.scores.pop();
        assert!(finalize_report_card(Uuid::new_v4(), draft).is_err());
    }

    #[test]
    fn unknown_category_is_rejected() {
        let mut draft = default_report_card();
        draft.scores[1].category = "Vibes".to_string();
        assert!(finalize_report_card(Uuid::new_v4(), draft).is_err());
    }
}
