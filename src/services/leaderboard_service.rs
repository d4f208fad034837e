//! Leaderboard persistence and ranking.

use tracing::warn;

use crate::{
    dao::models::LeaderboardEntryEntity,
    dto::leaderboard::LeaderboardResponse,
    error::ServiceError,
    state::SharedState,
};

/// How many entries the public board shows.
pub const LEADERBOARD_LIMIT: i64 = 20;

/// Queue one submission for persistence.
///
/// The write itself is fire-and-forget: the submission flow must not block on
/// or fail because of a slow database, only on the store being absent.
pub async fn save_entry(
    state: &SharedState,
    entry: LeaderboardEntryEntity,
) -> Result<(), ServiceError> {
    let store = state.require_leaderboard_store().await?;
    tokio::spawn(async move {
        let id = entry.id;
        if let Err(err) = store.append_entry(entry).await {
            warn!(entry = %id, error = %err, "failed to persist leaderboard entry");
        }
    });
    Ok(())
}

/// The most roasted entries, best first.
pub async fn top_entries(state: &SharedState) -> Result<LeaderboardResponse, ServiceError> {
    let store = state.require_leaderboard_store().await?;
    let entries = store.top_entries(LEADERBOARD_LIMIT).await?;
    Ok(LeaderboardResponse {
        entries: entries.into_iter().map(Into::into).collect(),
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use futures::future::BoxFuture;

    use crate::dao::{
        leaderboard_store::LeaderboardStore,
        models::LeaderboardEntryEntity,
        storage::{StorageError, StorageResult},
    };

    /// In-memory store that keeps appended entries for assertions.
    #[derive(Default)]
    pub struct RecordingStore {
        pub entries: Arc<Mutex<Vec<LeaderboardEntryEntity>>>,
        pub fail_appends: bool,
    }

    impl RecordingStore {
        pub fn entries(&self) -> Vec<LeaderboardEntryEntity> {
            self.entries.lock().unwrap().clone()
        }
    }

    fn backend_down() -> StorageError {
        StorageError::unavailable(
            "test backend down".to_string(),
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "down"),
        )
    }

    impl LeaderboardStore for RecordingStore {
        fn append_entry(
            &self,
            entry: LeaderboardEntryEntity,
        ) -> BoxFuture<'static, StorageResult<()>> {
            let entries = self.entries.clone();
            let fail = self.fail_appends;
            Box::pin(async move {
                if fail {
                    return Err(backend_down());
                }
                entries.lock().unwrap().push(entry);
                Ok(())
            })
        }

        fn top_entries(
            &self,
            limit: i64,
        ) -> BoxFuture<'static, StorageResult<Vec<LeaderboardEntryEntity>>> {
            let entries = self.entries.clone();
            Box::pin(async move {
                let mut entries = entries.lock().unwrap().clone();
                entries.sort_by(|a, b| b.overall_roast_level.cmp(&a.overall_roast_level));
                entries.truncate(limit as usize);
                Ok(entries)
            })
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, SystemTime};

    use tokio::time::sleep;
    use uuid::Uuid;

    use super::testing::RecordingStore;
    use super::*;
    use crate::{
        ai::testing::StubGateway,
        config::{AppConfig, default_judges},
        state::AppState,
    };

    fn test_state() -> SharedState {
        let config = AppConfig {
            judges: default_judges(),
            rng_seed: Some(1),
        };
        AppState::new(config, Arc::new(StubGateway::default()))
    }

    fn entry(level: u8) -> LeaderboardEntryEntity {
        LeaderboardEntryEntity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            leaderboard_name: format!("roasted-{level}"),
            overall_roast_level: level,
            feedback_summary: "Crispy.".to_string(),
            created_at: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn save_entry_fails_fast_in_degraded_mode() {
        let state = test_state();
        let err = save_entry(&state, entry(50)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
    }

    #[tokio::test]
    async fn save_entry_persists_in_the_background() {
        let state = test_state();
        let store = Arc::new(RecordingStore::default());
        state.install_leaderboard_store(store.clone()).await;

        save_entry(&state, entry(80)).await.unwrap();

        // The write is spawned; poll briefly until it lands.
        for _ in 0..50 {
            if !store.entries().is_empty() {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        let entries = store.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].overall_roast_level, 80);
    }

    #[tokio::test]
    async fn failed_background_write_does_not_surface() {
        let state = test_state();
        let store = Arc::new(RecordingStore {
            fail_appends: true,
            ..Default::default()
        });
        state.install_leaderboard_store(store.clone()).await;

        save_entry(&state, entry(60)).await.unwrap();
        sleep(Duration::from_millis(50)).await;
        assert!(store.entries().is_empty());
    }

    #[tokio::test]
    async fn top_entries_ranks_by_roast_level() {
        let state = test_state();
        let store = Arc::new(RecordingStore::default());
        state.install_leaderboard_store(store.clone()).await;

        for level in [40, 95, 70] {
            save_entry(&state, entry(level)).await.unwrap();
        }
        for _ in 0..50 {
            if store.entries().len() == 3 {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }

        let board = top_entries(&state).await.unwrap();
        let levels: Vec<u8> = board
            .entries
            .iter()
            .map(|entry| entry.overall_roast_level)
            .collect();
        assert_eq!(levels, vec![95, 70, 40]);
    }
}
