mod config;
mod error;
mod store;

pub use config::CouchConfig;
pub use error::{CouchDaoError, DocumentAction};
pub use store::CouchStateBackend;

use crate::dao::storage::StorageError;

impl From<CouchDaoError> for StorageError {
    fn from(err: CouchDaoError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}
