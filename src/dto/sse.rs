use serde::Serialize;
use utoipa::ToSchema;

/// First event sent on a new stream. Snapshots only follow mutations, so the
/// client loads the current state from `snapshot_url` after receiving it.
#[derive(Debug, Serialize, ToSchema)]
pub struct StreamHandshake {
    /// Name of the stream (`updates`).
    pub stream: &'static str,
    /// Pull endpoint returning the current snapshot.
    pub snapshot_url: &'static str,
}
