//! Business logic powering the session REST routes. These helpers coordinate
//! bench draws, the feedback pipelines, and state-machine transitions while
//! honouring the single-transition-at-a-time requirement.

use std::sync::Arc;
use std::time::SystemTime;

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::models::LeaderboardEntryEntity,
    dto::session::{
        BenchMode, PitchRequest, ReportCardDto, SessionSnapshot, SubmitEntryRequest,
        TranscribeResponse,
    },
    error::ServiceError,
    services::{feedback, leaderboard_service},
    state::{
        FailurePolicy, SessionHandle, SharedState,
        session::{Bench, FeedbackOutcome, MAX_REROLLS},
        state_machine::SessionEvent,
    },
};

pub(crate) const MISSING_AUDIO_ERROR: &str = "Audio data is missing.";
pub(crate) const UNINTELLIGIBLE_AUDIO_ERROR: &str =
    "AI could not understand the audio. Please try again.";

/// Open a session by drawing a bench of the requested kind.
pub async fn create_session(
    state: &SharedState,
    mode: BenchMode,
) -> Result<SessionSnapshot, ServiceError> {
    let bench = draw_bench(state, mode, None)?;
    let handle = state.create_session(bench);
    let event = match mode {
        BenchMode::Single => SessionEvent::DrawJudge,
        BenchMode::Panel => SessionEvent::DrawPanel,
    };
    handle
        .run_transition(event, FailurePolicy::PoisonSession, || async { Ok(()) })
        .await?;

    let snapshot = project(&handle).await;
    info!(session = %snapshot.id, sessions = state.session_count(), "session opened");
    Ok(snapshot)
}

/// Current projection of a session.
pub async fn snapshot(state: &SharedState, id: Uuid) -> Result<SessionSnapshot, ServiceError> {
    let handle = require_session(state, id)?;
    Ok(project(&handle).await)
}

/// Redraw the bench. Once the reroll budget is spent this is a no-op that
/// returns the unchanged session.
pub async fn reroll(state: &SharedState, id: Uuid) -> Result<SessionSnapshot, ServiceError> {
    let handle = require_session(state, id)?;

    let (at_cap, exclude) = handle
        .read_session(|session| {
            let exclude = match &session.bench {
                Bench::Single { judge } => Some(judge.id.clone()),
                Bench::Panel { .. } => None,
            };
            (session.reroll_count >= MAX_REROLLS, exclude)
        })
        .await;
    if at_cap {
        debug!(session = %id, "reroll budget spent, keeping current bench");
        return Ok(project(&handle).await);
    }

    let mode = if handle.read_session(|s| s.bench.is_panel()).await {
        BenchMode::Panel
    } else {
        BenchMode::Single
    };
    handle
        .run_transition(SessionEvent::Reroll, FailurePolicy::PoisonSession, || async {
            let bench = draw_bench(state, mode, exclude.as_deref())?;
            handle
                .with_session_mut(|session| {
                    session.bench = bench;
                    session.reroll_count += 1;
                })
                .await;
            Ok(())
        })
        .await?;

    Ok(project(&handle).await)
}

/// Move the session into the recording phase.
pub async fn start_recording(
    state: &SharedState,
    id: Uuid,
) -> Result<SessionSnapshot, ServiceError> {
    let handle = require_session(state, id)?;
    handle
        .run_transition(
            SessionEvent::StartRecording,
            FailurePolicy::PoisonSession,
            || async { Ok(()) },
        )
        .await?;
    Ok(project(&handle).await)
}

/// Complete the recording: resolve the transcript, run the feedback pipeline
/// matching the bench, and land in the feedback phase.
pub async fn complete_pitch(
    state: &SharedState,
    id: Uuid,
    request: PitchRequest,
) -> Result<SessionSnapshot, ServiceError> {
    let handle = require_session(state, id)?;
    let bench = handle.read_session(|session| session.bench.clone()).await;
    let event = if bench.is_panel() {
        SessionEvent::DeliverPanelFeedback
    } else {
        SessionEvent::DeliverFeedback
    };

    handle
        .run_transition(event, FailurePolicy::PoisonSession, || async {
            let transcript = resolve_transcript(state, request).await?;
            let outcome = match &bench {
                Bench::Single { judge } => FeedbackOutcome::Single(
                    feedback::single_feedback(state, judge, &transcript).await?,
                ),
                Bench::Panel { judges } => FeedbackOutcome::Panel(
                    feedback::panel_feedback(state, judges, &transcript).await?,
                ),
            };
            handle
                .with_session_mut(|session| {
                    session.transcript = Some(transcript);
                    session.feedback = Some(outcome);
                })
                .await;
            Ok(())
        })
        .await?;

    Ok(project(&handle).await)
}

/// Grade the delivered feedback into a report card. Failures leave the
/// session in the feedback phase so the user can retry.
pub async fn generate_report_card(
    state: &SharedState,
    id: Uuid,
) -> Result<SessionSnapshot, ServiceError> {
    let handle = require_session(state, id)?;
    let (pitch_id, transcript, outcome) = handle
        .read_session(|session| {
            (
                session.id,
                session.transcript.clone(),
                session.feedback.clone(),
            )
        })
        .await;
    let transcript = transcript
        .ok_or_else(|| ServiceError::InvalidState("no transcript recorded".to_string()))?;
    let outcome =
        outcome.ok_or_else(|| ServiceError::InvalidState("no feedback delivered".to_string()))?;

    handle
        .run_transition(
            SessionEvent::RequestReportCard,
            FailurePolicy::Revert,
            || async {
                let card =
                    feedback::generate_report_card(state, pitch_id, &transcript, &outcome).await?;
                handle
                    .with_session_mut(|session| session.report_card = Some(card))
                    .await;
                Ok(())
            },
        )
        .await?;

    Ok(project(&handle).await)
}

/// Submit the report card to the leaderboard under the chosen name and close
/// the session. Failures leave the report card on screen.
pub async fn submit_entry(
    state: &SharedState,
    id: Uuid,
    request: SubmitEntryRequest,
) -> Result<ReportCardDto, ServiceError> {
    let handle = require_session(state, id)?;
    let name = request.name.trim().to_string();

    let (user_id, card) = handle
        .read_session(|session| (session.user_id, session.report_card.clone()))
        .await;
    let card =
        card.ok_or_else(|| ServiceError::InvalidState("no report card generated".to_string()))?;

    handle
        .run_transition(SessionEvent::SubmitEntry, FailurePolicy::Revert, || async {
            leaderboard_service::save_entry(
                state,
                LeaderboardEntryEntity {
                    id: Uuid::new_v4(),
                    user_id,
                    leaderboard_name: name.clone(),
                    overall_roast_level: card.overall_roast_level,
                    feedback_summary: card.feedback_summary.clone(),
                    created_at: SystemTime::now(),
                },
            )
            .await?;
            handle
                .with_session_mut(|session| {
                    if let Some(card) = session.report_card.as_mut() {
                        card.leaderboard_name = Some(name.clone());
                    }
                })
                .await;
            Ok(())
        })
        .await?;

    let final_card = handle
        .read_session(|session| session.report_card.clone())
        .await
        .map(|card| ReportCardDto::from(&card))
        .ok_or_else(|| ServiceError::InvalidState("report card vanished".to_string()))?;
    state.remove_session(id);
    info!(session = %id, "session submitted and closed");
    Ok(final_card)
}

/// Drop a session, whatever phase it is in.
pub async fn reset(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    require_session(state, id)?;
    state.remove_session(id);
    info!(session = %id, sessions = state.session_count(), "session reset");
    Ok(())
}

/// Transcribe recorded audio without touching any session.
pub async fn transcribe_pitch(
    state: &SharedState,
    audio_data_uri: String,
) -> Result<TranscribeResponse, ServiceError> {
    if audio_data_uri.trim().is_empty() {
        return Err(ServiceError::InvalidInput(MISSING_AUDIO_ERROR.to_string()));
    }
    let transcription = state.ai().transcribe(audio_data_uri).await?;
    if transcription.transcription.trim().is_empty() {
        return Err(ServiceError::InvalidInput(
            UNINTELLIGIBLE_AUDIO_ERROR.to_string(),
        ));
    }
    Ok(TranscribeResponse {
        transcript: transcription.transcription,
    })
}

async fn project(handle: &SessionHandle) -> SessionSnapshot {
    let machine = handle.machine_snapshot().await;
    handle
        .read_session(|session| SessionSnapshot::project(session, &machine))
        .await
}

fn require_session(state: &SharedState, id: Uuid) -> Result<Arc<SessionHandle>, ServiceError> {
    state
        .session(id)
        .ok_or_else(|| ServiceError::NotFound(format!("session `{id}` not found")))
}

fn draw_bench(
    state: &SharedState,
    mode: BenchMode,
    exclude: Option<&str>,
) -> Result<Bench, ServiceError> {
    match mode {
        BenchMode::Single => Ok(Bench::Single {
            judge: state.with_rng(|rng| state.catalog().draw_single(rng, exclude))?,
        }),
        BenchMode::Panel => Ok(Bench::Panel {
            judges: state.with_rng(|rng| state.catalog().draw_panel(rng))?,
        }),
    }
}

/// Pick the inline transcript when present, otherwise transcribe the audio.
async fn resolve_transcript(
    state: &SharedState,
    request: PitchRequest,
) -> Result<String, ServiceError> {
    if let Some(transcript) = request.transcript {
        if transcript.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                feedback::EMPTY_TRANSCRIPT_ERROR.to_string(),
            ));
        }
        return Ok(transcript);
    }
    let audio = request
        .audio_data_uri
        .ok_or_else(|| ServiceError::InvalidInput(MISSING_AUDIO_ERROR.to_string()))?;
    transcribe_pitch(state, audio)
        .await
        .map(|response| response.transcript)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::sleep;

    use super::*;
    use crate::{
        ai::testing::StubGateway,
        config::{AppConfig, default_judges},
        dto::phase::VisiblePhase,
        services::leaderboard_service::testing::RecordingStore,
        state::AppState,
    };

    fn test_state(ai: Arc<StubGateway>) -> SharedState {
        let config = AppConfig {
            judges: default_judges(),
            rng_seed: Some(42),
        };
        AppState::new(config, ai)
    }

    fn single_pitch() -> PitchRequest {
        PitchRequest {
            transcript: Some("We deliver soup by drone.".to_string()),
            audio_data_uri: None,
        }
    }

    #[tokio::test]
    async fn single_judge_round_trip_lands_back_at_removal() {
        let ai = Arc::new(StubGateway::default());
        let state = test_state(ai.clone());
        let store = Arc::new(RecordingStore::default());
        state.install_leaderboard_store(store.clone()).await;

        let opened = create_session(&state, BenchMode::Single).await.unwrap();
        assert_eq!(opened.phase, VisiblePhase::JudgeSelected);
        assert_eq!(opened.rerolls_remaining, MAX_REROLLS);

        let started = start_recording(&state, opened.id).await.unwrap();
        assert_eq!(started.phase, VisiblePhase::Recording);

        let judged = complete_pitch(&state, opened.id, single_pitch())
            .await
            .unwrap();
        assert_eq!(judged.phase, VisiblePhase::Feedback);
        assert!(judged.feedback.is_some());
        assert_eq!(judged.transcript.as_deref(), Some("We deliver soup by drone."));

        let graded = generate_report_card(&state, opened.id).await.unwrap();
        assert_eq!(graded.phase, VisiblePhase::ReportCard);
        let card = graded.report_card.unwrap();
        assert_eq!(card.scores.len(), 3);

        let submitted = submit_entry(
            &state,
            opened.id,
            SubmitEntryRequest {
                name: "  Soup Drone  ".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(submitted.leaderboard_name.as_deref(), Some("Soup Drone"));
        assert!(state.session(opened.id).is_none());

        for _ in 0..50 {
            if !store.entries.lock().unwrap().is_empty() {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        let entries = store.entries.lock().unwrap().clone();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].leaderboard_name, "Soup Drone");
    }

    #[tokio::test]
    async fn panel_round_trip_delivers_four_verdicts() {
        let ai = Arc::new(StubGateway::default());
        let state = test_state(ai.clone());

        let opened = create_session(&state, BenchMode::Panel).await.unwrap();
        assert_eq!(opened.phase, VisiblePhase::PanelSelected);

        start_recording(&state, opened.id).await.unwrap();
        let judged = complete_pitch(&state, opened.id, single_pitch())
            .await
            .unwrap();
        assert_eq!(judged.phase, VisiblePhase::PanelFeedback);
        match judged.feedback.unwrap() {
            crate::dto::session::FeedbackDto::Panel { feedback } => {
                assert_eq!(feedback.responses.len(), 4);
            }
            other => panic!("expected panel feedback, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reroll_swaps_the_single_judge_and_counts_down() {
        let ai = Arc::new(StubGateway::default());
        let state = test_state(ai.clone());

        let opened = create_session(&state, BenchMode::Single).await.unwrap();
        let before = match &opened.bench {
            crate::dto::session::BenchDto::Single { judge } => judge.id.clone(),
            other => panic!("expected single bench, got {other:?}"),
        };

        let rerolled = reroll(&state, opened.id).await.unwrap();
        assert_eq!(rerolled.reroll_count, 1);
        assert_eq!(rerolled.rerolls_remaining, MAX_REROLLS - 1);
        match &rerolled.bench {
            crate::dto::session::BenchDto::Single { judge } => {
                assert_ne!(judge.id, before);
            }
            other => panic!("expected single bench, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reroll_past_the_cap_is_a_no_op() {
        let ai = Arc::new(StubGateway::default());
        let state = test_state(ai.clone());

        let opened = create_session(&state, BenchMode::Single).await.unwrap();
        for _ in 0..MAX_REROLLS {
            reroll(&state, opened.id).await.unwrap();
        }
        let capped = reroll(&state, opened.id).await.unwrap();
        assert_eq!(capped.reroll_count, MAX_REROLLS);
        assert_eq!(capped.rerolls_remaining, 0);
        assert_eq!(capped.phase, VisiblePhase::JudgeSelected);
    }

    #[tokio::test]
    async fn pitch_without_transcript_or_audio_poisons_the_session() {
        let ai = Arc::new(StubGateway::default());
        let state = test_state(ai.clone());

        let opened = create_session(&state, BenchMode::Single).await.unwrap();
        start_recording(&state, opened.id).await.unwrap();

        let err = complete_pitch(
            &state,
            opened.id,
            PitchRequest {
                transcript: None,
                audio_data_uri: None,
            },
        )
        .await
        .unwrap_err();
        match err {
            ServiceError::InvalidInput(message) => {
                assert_eq!(message, "Audio data is missing.")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let poisoned = snapshot(&state, opened.id).await.unwrap();
        assert_eq!(poisoned.phase, VisiblePhase::Error);
    }

    #[tokio::test]
    async fn audio_pitch_is_transcribed_before_judging() {
        let ai = Arc::new(StubGateway::default());
        let state = test_state(ai.clone());

        let opened = create_session(&state, BenchMode::Single).await.unwrap();
        start_recording(&state, opened.id).await.unwrap();
        let judged = complete_pitch(
            &state,
            opened.id,
            PitchRequest {
                transcript: None,
                audio_data_uri: Some("data:audio/webm;base64,AAAA".to_string()),
            },
        )
        .await
        .unwrap();

        assert_eq!(
            judged.transcript.as_deref(),
            Some("We sell artisanal ice to penguins.")
        );
        assert_eq!(ai.call_count("transcribe"), 1);
    }

    #[tokio::test]
    async fn report_card_failure_reverts_to_feedback() {
        let mut stub = StubGateway::default();
        stub.card = Err("grading endpoint down".to_string());
        let ai = Arc::new(stub);
        let state = test_state(ai.clone());

        let opened = create_session(&state, BenchMode::Single).await.unwrap();
        start_recording(&state, opened.id).await.unwrap();
        complete_pitch(&state, opened.id, single_pitch())
            .await
            .unwrap();

        let err = generate_report_card(&state, opened.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Upstream(_)));

        let reverted = snapshot(&state, opened.id).await.unwrap();
        assert_eq!(reverted.phase, VisiblePhase::Feedback);
    }

    #[tokio::test]
    async fn submission_without_store_keeps_the_report_card() {
        let ai = Arc::new(StubGateway::default());
        let state = test_state(ai.clone());

        let opened = create_session(&state, BenchMode::Single).await.unwrap();
        start_recording(&state, opened.id).await.unwrap();
        complete_pitch(&state, opened.id, single_pitch())
            .await
            .unwrap();
        generate_report_card(&state, opened.id).await.unwrap();

        let err = submit_entry(
            &state,
            opened.id,
            SubmitEntryRequest {
                name: "Roasted".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));

        let kept = snapshot(&state, opened.id).await.unwrap();
        assert_eq!(kept.phase, VisiblePhase::ReportCard);
        assert!(kept.report_card.unwrap().leaderboard_name.is_none());
    }

    #[tokio::test]
    async fn reset_drops_the_session() {
        let ai = Arc::new(StubGateway::default());
        let state = test_state(ai.clone());

        let opened = create_session(&state, BenchMode::Single).await.unwrap();
        reset(&state, opened.id).await.unwrap();
        assert!(state.session(opened.id).is_none());
        assert!(matches!(
            snapshot(&state, opened.id).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn transcription_rejects_unusable_results() {
        let mut stub = StubGateway::default();
        stub.transcription = Ok(crate::ai::models::Transcription {
            transcription: "   ".to_string(),
        });
        let ai = Arc::new(stub);
        let state = test_state(ai.clone());

        let err = transcribe_pitch(&state, "data:audio/webm;base64,AAAA".to_string())
            .await
            .unwrap_err();
        match err {
            ServiceError::InvalidInput(message) => assert_eq!(
                message,
                "AI could not understand the audio. Please try again."
            ),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
