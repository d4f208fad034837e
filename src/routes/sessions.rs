//! REST surface for the pitch session lifecycle.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::session::{
        CreateSessionRequest, PitchRequest, ReportCardDto, SessionSnapshot, SubmitEntryRequest,
        TranscribeRequest, TranscribeResponse,
    },
    error::AppError,
    services::session_service,
    state::SharedState,
};

/// Open a session by drawing a judge or a panel.
#[utoipa::path(
    post,
    path = "/sessions",
    tag = "sessions",
    request_body = CreateSessionRequest,
    responses((status = 201, description = "Session opened", body = SessionSnapshot))
)]
pub async fn create_session(
    State(state): State<SharedState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionSnapshot>), AppError> {
    let snapshot = session_service::create_session(&state, payload.mode).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// Current projection of a session.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Session snapshot", body = SessionSnapshot),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(session_service::snapshot(&state, id).await?))
}

/// Drop a session, whatever phase it is in.
#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 204, description = "Session dropped"),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn delete_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    session_service::reset(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Redraw the bench, consuming one reroll. A no-op once the budget is spent.
#[utoipa::path(
    post,
    path = "/sessions/{id}/reroll",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Bench after the reroll", body = SessionSnapshot),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn reroll(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(session_service::reroll(&state, id).await?))
}

/// Move the session into the recording phase.
#[utoipa::path(
    post,
    path = "/sessions/{id}/start",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Recording started", body = SessionSnapshot),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Not in a phase that can start recording")
    )
)]
pub async fn start_recording(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(session_service::start_recording(&state, id).await?))
}

/// Submit the recorded pitch and run the feedback pipeline.
#[utoipa::path(
    post,
    path = "/sessions/{id}/pitch",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session identifier")),
    request_body = PitchRequest,
    responses(
        (status = 200, description = "Feedback delivered", body = SessionSnapshot),
        (status = 400, description = "No usable transcript or audio"),
        (status = 404, description = "Unknown session"),
        (status = 502, description = "Generation failed")
    )
)]
pub async fn complete_pitch(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PitchRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(
        session_service::complete_pitch(&state, id, payload).await?,
    ))
}

/// Grade the delivered feedback into a report card.
#[utoipa::path(
    post,
    path = "/sessions/{id}/report-card",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Report card generated", body = SessionSnapshot),
        (status = 404, description = "Unknown session"),
        (status = 502, description = "Grading failed; the feedback phase is kept")
    )
)]
pub async fn generate_report_card(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(
        session_service::generate_report_card(&state, id).await?,
    ))
}

/// Submit the report card to the leaderboard and close the session.
#[utoipa::path(
    post,
    path = "/sessions/{id}/leaderboard",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session identifier")),
    request_body = SubmitEntryRequest,
    responses(
        (status = 200, description = "Submitted; final report card", body = ReportCardDto),
        (status = 400, description = "Invalid leaderboard name"),
        (status = 404, description = "Unknown session"),
        (status = 503, description = "Storage unavailable (degraded mode)")
    )
)]
pub async fn submit_entry(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<SubmitEntryRequest>>,
) -> Result<Json<ReportCardDto>, AppError> {
    Ok(Json(session_service::submit_entry(&state, id, payload).await?))
}

/// Transcribe recorded audio without touching any session.
#[utoipa::path(
    post,
    path = "/transcribe",
    tag = "sessions",
    request_body = TranscribeRequest,
    responses(
        (status = 200, description = "Transcript", body = TranscribeResponse),
        (status = 400, description = "Missing or unintelligible audio"),
        (status = 502, description = "Transcription failed")
    )
)]
pub async fn transcribe(
    State(state): State<SharedState>,
    Json(payload): Json<TranscribeRequest>,
) -> Result<Json<TranscribeResponse>, AppError> {
    Ok(Json(
        session_service::transcribe_pitch(&state, payload.audio_data_uri).await?,
    ))
}

/// Configure the session routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/reroll", post(reroll))
        .route("/sessions/{id}/start", post(start_recording))
        .route("/sessions/{id}/pitch", post(complete_pitch))
        .route("/sessions/{id}/report-card", post(generate_report_card))
        .route("/sessions/{id}/leaderboard", post(submit_entry))
        .route("/transcribe", post(transcribe))
}
