use std::{sync::Arc, time::Duration};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Binary, DateTime, doc, spec::BinarySubtype},
    options::{ClientOptions, IndexOptions},
};
use serde::{Deserialize, Serialize};
use tokio::{sync::RwLock, time::sleep};
use tracing::info;
use uuid::Uuid;

use crate::dao::{
    leaderboard_store::LeaderboardStore,
    models::LeaderboardEntryEntity,
    storage::StorageResult,
};

use super::{
    MongoConfig,
    error::{MongoDaoError, MongoResult},
};

const ENTRY_COLLECTION_NAME: &str = "leaderboard_entries";
const MAX_CONNECT_ATTEMPTS: u32 = 10;
const BASE_RETRY_DELAY_MS: u64 = 250;

/// MongoDB-backed [`LeaderboardStore`] implementation.
#[derive(Clone)]
pub struct MongoLeaderboardStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: RwLock<ConnectionState>,
    options: ClientOptions,
    database_name: String,
}

struct ConnectionState {
    _client: Client,
    database: Database,
}

impl MongoLeaderboardStore {
    /// Connect to MongoDB, with exponential backoff on the initial ping, and
    /// ensure the ranking index exists.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;
        ensure_indexes(&database).await?;
        info!(database = %config.database_name, "connected to MongoDB");

        Ok(Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(ConnectionState {
                    _client: client,
                    database,
                }),
                options: config.options,
                database_name: config.database_name,
            }),
        })
    }

    async fn collection(&self) -> Collection<MongoEntryDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoEntryDocument>(ENTRY_COLLECTION_NAME)
    }

    async fn append(&self, entry: LeaderboardEntryEntity) -> MongoResult<()> {
        let id = entry.id;
        let document: MongoEntryDocument = entry.into();
        self.collection()
            .await
            .replace_one(doc! {"_id": uuid_as_binary(id)}, &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::AppendEntry { id, source })?;
        Ok(())
    }

    async fn top(&self, limit: i64) -> MongoResult<Vec<LeaderboardEntryEntity>> {
        let docs: Vec<MongoEntryDocument> = self
            .collection()
            .await
            .find(doc! {})
            .sort(doc! {"overall_roast_level": -1, "created_at": 1})
            .limit(limit)
            .await
            .map_err(|source| MongoDaoError::ListEntries { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListEntries { source })?;

        Ok(docs.into_iter().map(Into::into).collect())
    }

    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.inner.state.read().await;
            guard.database.clone()
        };
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.inner.options, &self.inner.database_name).await?;
        let mut guard = self.inner.state.write().await;
        guard._client = client;
        guard.database = database;
        info!("MongoDB connection re-established");
        Ok(())
    }
}

impl LeaderboardStore for MongoLeaderboardStore {
    fn append_entry(&self, entry: LeaderboardEntryEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.append(entry).await.map_err(Into::into) })
    }

    fn top_entries(
        &self,
        limit: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<LeaderboardEntryEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.top(limit).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.reconnect().await.map_err(Into::into) })
    }
}

async fn establish_connection(
    options: &ClientOptions,
    database_name: &str,
) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(database_name);

    let mut attempts = 0;
    let mut delay = Duration::from_millis(BASE_RETRY_DELAY_MS);

    loop {
        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => break,
            Err(err) => {
                attempts += 1;
                if attempts >= MAX_CONNECT_ATTEMPTS {
                    return Err(MongoDaoError::InitialPing {
                        attempts,
                        source: err,
                    });
                }
                sleep(delay).await;
                delay = (delay * 2).min(Duration::from_secs(5));
            }
        }
    }

    Ok((client, database))
}

/// Index backing the ranked top-N query.
async fn ensure_indexes(database: &Database) -> MongoResult<()> {
    let collection = database.collection::<mongodb::bson::Document>(ENTRY_COLLECTION_NAME);
    let model = IndexModel::builder()
        .keys(doc! {"overall_roast_level": -1})
        .options(
            IndexOptions::builder()
                .name(Some("roast_level_idx".to_string()))
                .build(),
        )
        .build();
    collection
        .create_index(model)
        .await
        .map_err(|source| MongoDaoError::EnsureIndex {
            collection: ENTRY_COLLECTION_NAME,
            index: "roast_level_idx",
            source,
        })?;
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MongoEntryDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    user_id: Uuid,
    leaderboard_name: String,
    overall_roast_level: i32,
    feedback_summary: String,
    created_at: DateTime,
}

impl From<LeaderboardEntryEntity> for MongoEntryDocument {
    fn from(value: LeaderboardEntryEntity) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            leaderboard_name: value.leaderboard_name,
            overall_roast_level: i32::from(value.overall_roast_level),
            feedback_summary: value.feedback_summary,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoEntryDocument> for LeaderboardEntryEntity {
    fn from(value: MongoEntryDocument) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            leaderboard_name: value.leaderboard_name,
            overall_roast_level: value.overall_roast_level.clamp(0, 100) as u8,
            feedback_summary: value.feedback_summary,
            created_at: value.created_at.to_system_time(),
        }
    }
}

fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;

    #[test]
    fn entry_document_round_trips() {
        let entity = LeaderboardEntryEntity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            leaderboard_name: "Toasted".to_string(),
            overall_roast_level: 93,
            feedback_summary: "Incinerated on arrival.".to_string(),
            created_at: SystemTime::now(),
        };
        let document: MongoEntryDocument = entity.clone().into();
        let back: LeaderboardEntryEntity = document.into();

        assert_eq!(back.id, entity.id);
        assert_eq!(back.user_id, entity.user_id);
        assert_eq!(back.leaderboard_name, entity.leaderboard_name);
        assert_eq!(back.overall_roast_level, entity.overall_roast_level);
    }

    #[test]
    fn out_of_range_stored_level_is_clamped() {
        let document = MongoEntryDocument {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            leaderboard_name: "Overflow".to_string(),
            overall_roast_level: 140,
            feedback_summary: "A roast beyond the dial.".to_string(),
            created_at: DateTime::from_system_time(SystemTime::now()),
        };
        let entity: LeaderboardEntryEntity = document.into();
        assert_eq!(entity.overall_roast_level, 100);
    }
}
