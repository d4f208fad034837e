use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the FundMeNot backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::judges::list_judges,
        crate::routes::leaderboard::top_entries,
        crate::routes::sessions::create_session,
        crate::routes::sessions::get_session,
        crate::routes::sessions::delete_session,
        crate::routes::sessions::reroll,
        crate::routes::sessions::start_recording,
        crate::routes::sessions::complete_pitch,
        crate::routes::sessions::generate_report_card,
        crate::routes::sessions::submit_entry,
        crate::routes::sessions::transcribe,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::leaderboard::LeaderboardResponse,
            crate::dto::leaderboard::LeaderboardEntryDto,
            crate::dto::phase::VisiblePhase,
            crate::dto::session::CreateSessionRequest,
            crate::dto::session::SessionSnapshot,
            crate::dto::session::PitchRequest,
            crate::dto::session::SubmitEntryRequest,
            crate::dto::session::TranscribeRequest,
            crate::dto::session::TranscribeResponse,
            crate::dto::session::ReportCardDto,
            crate::state::judges::Judge,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "judges", description = "Judge catalog"),
        (name = "leaderboard", description = "Hall of flame ranking"),
        (name = "sessions", description = "Pitch session lifecycle"),
    )
)]
pub struct ApiDoc;
