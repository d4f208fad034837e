use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report the backend's health while logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_leaderboard_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    let live_sessions = state.session_count();
    if state.is_degraded() {
        HealthResponse::degraded(live_sessions)
    } else {
        HealthResponse::ok(live_sessions)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        ai::testing::StubGateway,
        config::{AppConfig, default_judges},
        services::leaderboard_service::testing::RecordingStore,
        state::{AppState, session::Bench},
    };

    fn test_state() -> SharedState {
        let config = AppConfig {
            judges: default_judges(),
            rng_seed: Some(1),
        };
        AppState::new(config, Arc::new(StubGateway::default()))
    }

    #[tokio::test]
    async fn reports_degraded_without_a_store() {
        let state = test_state();
        let response = health_status(&state).await;
        assert_eq!(response.status, "degraded");
        assert_eq!(response.live_sessions, 0);
    }

    #[tokio::test]
    async fn reports_ok_and_counts_sessions_with_a_store() {
        let state = test_state();
        state
            .install_leaderboard_store(Arc::new(RecordingStore::default()))
            .await;
        let judge = state.catalog().all()[0].clone();
        state.create_session(Bench::Single { judge });

        let response = health_status(&state).await;
        assert_eq!(response.status, "ok");
        assert_eq!(response.live_sessions, 1);
    }
}
