use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::leaderboard::LeaderboardResponse, error::AppError, services::leaderboard_service,
    state::SharedState,
};

/// The most roasted submissions, best first.
#[utoipa::path(
    get,
    path = "/leaderboard",
    tag = "leaderboard",
    responses(
        (status = 200, description = "Ranked entries", body = LeaderboardResponse),
        (status = 503, description = "Storage unavailable (degraded mode)")
    )
)]
pub async fn top_entries(
    State(state): State<SharedState>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    Ok(Json(leaderboard_service::top_entries(&state).await?))
}

/// Configure the leaderboard routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/leaderboard", get(top_entries))
}
