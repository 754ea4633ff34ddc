//! JSON file backend: one pretty-printed file per document inside a data directory.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use serde::{Serialize, de::DeserializeOwned};
use tokio::fs;

use crate::dao::{
    models::{MATCH_DATA_DOCUMENT, MatchDataEntity, TEAMS_DOCUMENT, TeamsEntity},
    state_store::StateBackend,
    storage::{StorageError, StorageResult},
};

const TEAMS_FILE: &str = "teams.json";
const MATCH_DATA_FILE: &str = "matchData.json";

/// Stores `teams.json` and `matchData.json` under a single directory.
#[derive(Clone, Debug)]
pub struct FileStateBackend {
    dir: Arc<Path>,
}

impl FileStateBackend {
    /// Create a backend rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Arc::from(dir.into()),
        }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }
}

async fn read_document<T>(path: PathBuf, document: &'static str) -> StorageResult<Option<T>>
where
    T: DeserializeOwned,
{
    let contents = match fs::read_to_string(&path).await {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(StorageError::unavailable(
                format!("failed to read `{}`", path.display()),
                err,
            ));
        }
    };

    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|source| StorageError::Corrupt { document, source })
}

async fn write_document<T>(dir: Arc<Path>, path: PathBuf, value: &T) -> StorageResult<()>
where
    T: Serialize,
{
    let contents = serde_json::to_string_pretty(value).map_err(|err| {
        StorageError::unavailable(format!("failed to encode `{}`", path.display()), err)
    })?;

    fs::create_dir_all(&*dir).await.map_err(|err| {
        StorageError::unavailable(format!("failed to create `{}`", dir.display()), err)
    })?;

    fs::write(&path, contents).await.map_err(|err| {
        StorageError::unavailable(format!("failed to write `{}`", path.display()), err)
    })
}

impl StateBackend for FileStateBackend {
    fn load_teams(&self) -> BoxFuture<'static, StorageResult<Option<TeamsEntity>>> {
        let path = self.path(TEAMS_FILE);
        Box::pin(read_document(path, TEAMS_DOCUMENT))
    }

    fn load_match_data(&self) -> BoxFuture<'static, StorageResult<Option<MatchDataEntity>>> {
        let path = self.path(MATCH_DATA_FILE);
        Box::pin(read_document(path, MATCH_DATA_DOCUMENT))
    }

    fn save_teams(&self, teams: TeamsEntity) -> BoxFuture<'static, StorageResult<()>> {
        let dir = self.dir.clone();
        let path = self.path(TEAMS_FILE);
        Box::pin(async move { write_document(dir, path, &teams).await })
    }

    fn save_match_data(&self, data: MatchDataEntity) -> BoxFuture<'static, StorageResult<()>> {
        let dir = self.dir.clone();
        let path = self.path(MATCH_DATA_FILE);
        Box::pin(async move { write_document(dir, path, &data).await })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let dir = self.dir.clone();
        Box::pin(async move {
            match fs::metadata(&*dir).await {
                Ok(meta) if meta.is_dir() => Ok(()),
                Ok(_) => Err(StorageError::unavailable(
                    format!("`{}` is not a directory", dir.display()),
                    std::io::Error::from(ErrorKind::InvalidInput),
                )),
                // Nothing written yet; the directory appears with the first mutation.
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
                Err(err) => Err(StorageError::unavailable(
                    format!("failed to inspect `{}`", dir.display()),
                    err,
                )),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("courtside-file-{}", Uuid::new_v4().simple()))
    }

    #[tokio::test]
    async fn missing_documents_load_as_none() {
        let backend = FileStateBackend::new(scratch_dir());
        assert!(backend.load_teams().await.unwrap().is_none());
        assert!(backend.load_match_data().await.unwrap().is_none());
        assert!(backend.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn documents_are_rewritten_wholesale() {
        let dir = scratch_dir();
        let backend = FileStateBackend::new(&dir);

        backend
            .save_teams(vec!["Alpha".into(), "Beta".into()])
            .await
            .unwrap();
        backend.save_teams(vec!["Beta".into()]).await.unwrap();

        let data = json!({"nextMatch": "Beta vs Gamma", "upcoming": []});
        backend
            .save_match_data(data.as_object().cloned().unwrap())
            .await
            .unwrap();

        assert_eq!(
            backend.load_teams().await.unwrap(),
            Some(vec!["Beta".to_string()])
        );
        assert_eq!(
            backend.load_match_data().await.unwrap().map(serde_json::Value::Object),
            Some(data)
        );

        let raw = std::fs::read_to_string(dir.join(TEAMS_FILE)).unwrap();
        assert_eq!(raw, "[\n  \"Beta\"\n]");

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn unreadable_document_is_reported_as_corrupt() {
        let dir = scratch_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(TEAMS_FILE), "{not json").unwrap();

        let backend = FileStateBackend::new(&dir);
        let err = backend.load_teams().await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Corrupt {
                document: TEAMS_DOCUMENT,
                ..
            }
        ));

        std::fs::remove_dir_all(dir).unwrap();
    }
}
