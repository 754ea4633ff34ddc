//! Persisted document shapes shared by every backend.

use serde_json::{Map, Value};

/// Name of the team list document.
pub const TEAMS_DOCUMENT: &str = "teams";
/// Name of the match data document.
pub const MATCH_DATA_DOCUMENT: &str = "match_data";

/// Team list as written to storage, in roster order.
pub type TeamsEntity = Vec<String>;

/// Match data object as written to storage.
pub type MatchDataEntity = Map<String, Value>;
