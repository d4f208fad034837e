use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Number of live pitch sessions.
    pub live_sessions: usize,
}

impl HealthResponse {
    /// Payload for a fully operational backend.
    pub fn ok(live_sessions: usize) -> Self {
        Self {
            status: "ok".to_string(),
            live_sessions,
        }
    }

    /// Payload for degraded mode, when the leaderboard store is unreachable.
    pub fn degraded(live_sessions: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            live_sessions,
        }
    }
}
