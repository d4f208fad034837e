#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;

use crate::dao::models::LeaderboardEntryEntity;
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for hall-of-flame entries.
pub trait LeaderboardStore: Send + Sync {
    /// Persist one submission.
    fn append_entry(&self, entry: LeaderboardEntryEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Entries with the highest roast level, best first, at most `limit`.
    fn top_entries(
        &self,
        limit: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<LeaderboardEntryEntity>>>;
    /// Probe the backend connection.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish a lost backend connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
