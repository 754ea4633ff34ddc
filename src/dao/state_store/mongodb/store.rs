use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use mongodb::{Client, Collection, Database, bson::doc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::time::sleep;
use tracing::{info, warn};

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
};
use crate::dao::{
    models::{MATCH_DATA_DOCUMENT, MatchDataEntity, TEAMS_DOCUMENT, TeamsEntity},
    state_store::StateBackend,
    storage::StorageResult,
};

const STATE_COLLECTION_NAME: &str = "match_state";

/// Exponential backoff used while waiting for the server at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StartupBackoff {
    max_attempts: u32,
    delay: Duration,
    max_delay: Duration,
}

impl Default for StartupBackoff {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl StartupBackoff {
    /// Delay to wait after failed attempt number `attempt` (1-based), or
    /// `None` once the attempts are used up.
    fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        Some(self.delay.saturating_mul(factor).min(self.max_delay))
    }
}

/// Keeps each persisted value in its own document keyed by a fixed `_id`.
#[derive(Debug, Serialize, Deserialize)]
struct StateDocument<T> {
    #[serde(rename = "_id")]
    id: String,
    value: T,
}

#[derive(Clone)]
pub struct MongoStateBackend {
    database: Arc<Database>,
}

impl MongoStateBackend {
    /// Connect to MongoDB and wait until it answers a ping.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let client = Client::with_options(config.options)
            .map_err(|source| MongoDaoError::ClientConstruction { source })?;
        let database = client.database(&config.database_name);
        wait_until_ready(&database, StartupBackoff::default()).await?;
        Ok(Self {
            database: Arc::new(database),
        })
    }

    fn collection<T>(&self) -> Collection<StateDocument<T>>
    where
        T: Send + Sync,
    {
        self.database
            .collection::<StateDocument<T>>(STATE_COLLECTION_NAME)
    }

    async fn load<T>(&self, document: &'static str) -> MongoResult<Option<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        let found = self
            .collection::<T>()
            .find_one(doc! { "_id": document })
            .await
            .map_err(|source| MongoDaoError::Load { document, source })?;
        Ok(found.map(|stored| stored.value))
    }

    async fn save<T>(&self, document: &'static str, value: T) -> MongoResult<()>
    where
        T: Serialize + Send + Sync,
    {
        let replacement = StateDocument {
            id: document.to_string(),
            value,
        };
        self.collection::<T>()
            .replace_one(doc! { "_id": document }, &replacement)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Save { document, source })?;
        Ok(())
    }
}

async fn wait_until_ready(database: &Database, backoff: StartupBackoff) -> MongoResult<()> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => {
                info!(database = database.name(), attempt, "MongoDB is ready");
                return Ok(());
            }
            Err(err) => match backoff.delay_after(attempt) {
                Some(delay) => {
                    warn!(
                        database = database.name(),
                        attempt,
                        retry_in_ms = delay.as_millis() as u64,
                        error = %err,
                        "MongoDB not ready yet"
                    );
                    sleep(delay).await;
                }
                None => {
                    return Err(MongoDaoError::InitialPing {
                        attempts: attempt,
                        source: err,
                    });
                }
            },
        }
    }
}

impl StateBackend for MongoStateBackend {
    fn load_teams(&self) -> BoxFuture<'static, StorageResult<Option<TeamsEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .load::<TeamsEntity>(TEAMS_DOCUMENT)
                .await
                .map_err(Into::into)
        })
    }

    fn load_match_data(&self) -> BoxFuture<'static, StorageResult<Option<MatchDataEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .load::<MatchDataEntity>(MATCH_DATA_DOCUMENT)
                .await
                .map_err(Into::into)
        })
    }

    fn save_teams(&self, teams: TeamsEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .save(TEAMS_DOCUMENT, teams)
                .await
                .map_err(Into::into)
        })
    }

    fn save_match_data(&self, data: MatchDataEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .save(MATCH_DATA_DOCUMENT, data)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .database
                .run_command(doc! { "ping": 1 })
                .await
                .map_err(|source| MongoDaoError::HealthPing { source })?;
            Ok(())
        })
    }
}
