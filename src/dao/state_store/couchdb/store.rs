use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info};

use crate::dao::{
    models::{MATCH_DATA_DOCUMENT, MatchDataEntity, TEAMS_DOCUMENT, TeamsEntity},
    state_store::StateBackend,
    storage::StorageResult,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult, DocumentAction},
};

/// CouchDB document wrapping one persisted value.
#[derive(Debug, Serialize, Deserialize)]
struct CouchStateDocument<T> {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    rev: Option<String>,
    value: T,
}

/// Only the revision is needed before overwriting a document.
#[derive(Debug, Deserialize)]
struct RevisionOnly {
    #[serde(rename = "_rev")]
    rev: String,
}

#[derive(Clone)]
pub struct CouchStateBackend {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchStateBackend {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::Client { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url,
            database,
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some((ref user, ref pass)) = self.auth {
            builder.basic_auth(user.as_ref(), Some(pass.as_ref()))
        } else {
            builder
        }
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.database_url(), path);
        self.authorize(self.client.request(method, url))
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = self.database_url();

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::Unreachable {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .authorize(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::Unreachable {
                        database: database.clone(),
                        source,
                    })?;
                if create.status().is_success() {
                    info!(%database, "created CouchDB database");
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, document: &'static str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, document)
            .send()
            .await
            .map_err(|source| CouchDaoError::Document {
                document,
                action: DocumentAction::Read,
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!(document, "state document not stored yet");
                Ok(None)
            }
            status if status.is_success() => response
                .json::<T>()
                .await
                .map(Some)
                .map_err(|source| CouchDaoError::Decode { document, source }),
            status => Err(CouchDaoError::Rejected {
                document,
                action: DocumentAction::Read,
                status,
            }),
        }
    }

    async fn load<T>(&self, document: &'static str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let stored = self.get_document::<CouchStateDocument<T>>(document).await?;
        Ok(stored.map(|doc| doc.value))
    }

    /// Overwrite `document`, carrying over its current revision when it exists.
    async fn save<T>(&self, document: &'static str, value: T) -> CouchResult<()>
    where
        T: Serialize,
    {
        let rev = self
            .get_document::<RevisionOnly>(document)
            .await?
            .map(|existing| existing.rev);
        let body = CouchStateDocument {
            id: document.to_string(),
            rev,
            value,
        };

        let response = self
            .request(Method::PUT, document)
            .json(&body)
            .send()
            .await
            .map_err(|source| CouchDaoError::Document {
                document,
                action: DocumentAction::Write,
                source,
            })?;

        match response.status() {
            status if status.is_success() => Ok(()),
            status => Err(CouchDaoError::Rejected {
                document,
                action: DocumentAction::Write,
                status,
            }),
        }
    }
}

impl StateBackend for CouchStateBackend {
    fn load_teams(&self) -> BoxFuture<'static, StorageResult<Option<TeamsEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.load(TEAMS_DOCUMENT).await.map_err(Into::into) })
    }

    fn load_match_data(&self) -> BoxFuture<'static, StorageResult<Option<MatchDataEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.load(MATCH_DATA_DOCUMENT).await.map_err(Into::into) })
    }

    fn save_teams(&self, teams: TeamsEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save(TEAMS_DOCUMENT, teams).await.map_err(Into::into) })
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
            let database = store.database.to_string();
            let response = store
                .authorize(store.client.get(store.database_url()))
                .send()
                .await
                .map_err(|source| CouchDaoError::Unreachable {
                    database: database.clone(),
                    source,
                })?;

            match response.status() {
                status if status.is_success() => Ok(()),
                status => Err(CouchDaoError::DatabaseStatus { database, status }.into()),
            }
        })
    }
}
