//! Background task dropping sessions their users walked away from.

use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::info;

use crate::state::SharedState;

/// How long a session may sit untouched before it is dropped.
pub const SESSION_TTL: Duration = Duration::from_secs(30 * 60);

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically sweep the registry. Runs until the process exits.
pub async fn run(state: SharedState) {
    let mut ticker = interval(SWEEP_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let reaped = state.reap_idle_sessions(SESSION_TTL).await;
        if reaped > 0 {
            info!(reaped, sessions = state.session_count(), "reaped idle sessions");
        }
    }
}
