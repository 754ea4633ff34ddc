#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod file;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{MatchDataEntity, TeamsEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the durable copy of the team list and the match data.
///
/// Both documents are independent and always rewritten wholesale. A `None`
/// load result means the document was never written.
pub trait StateBackend: Send + Sync {
    fn load_teams(&self) -> BoxFuture<'static, StorageResult<Option<TeamsEntity>>>;
    fn load_match_data(&self) -> BoxFuture<'static, StorageResult<Option<MatchDataEntity>>>;
    fn save_teams(&self, teams: TeamsEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn save_match_data(&self, data: MatchDataEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
