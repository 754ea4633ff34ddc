//! In-memory model of the live match document and the team roster.
//!
//! The match document is kept as a raw JSON object: the admin client owns its
//! shape and the server only relies on the few keys touched by the team removal
//! cascade. The typed structs below describe the default document and feed the
//! OpenAPI schema.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

const COURT_KEYS: [&str; 2] = ["court1", "court2"];
const NEXT_MATCH_KEY: &str = "nextMatch";
const UPCOMING_KEY: &str = "upcoming";

/// Ordered set of team display names, unique by exact string comparison.
pub type TeamRoster = IndexSet<String>;

/// Which side of a court currently holds the serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum ServingTeam {
    #[default]
    Team1,
    Team2,
}

/// Display status of a court.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CourtStatus {
    Live,
    #[default]
    Paused,
    Finished,
}

/// Match currently played on one of the two courts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourtState {
    pub team1: String,
    pub team2: String,
    pub serving_team: ServingTeam,
    pub status: CourtStatus,
}

/// Entry of the upcoming schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScheduledMatch {
    pub team1: String,
    pub team2: String,
    pub time: String,
    /// Court number, `"1"` or `"2"`.
    pub court: String,
}

/// Typed view of the default match document, used for documentation and seeding.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchDataDocument {
    pub court1: CourtState,
    pub court2: CourtState,
    pub next_match: String,
    pub upcoming: Vec<ScheduledMatch>,
}

/// Process-wide match document broadcast to viewers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchData(Map<String, Value>);

impl Default for MatchData {
    fn default() -> Self {
        match serde_json::to_value(MatchDataDocument::default()) {
            Ok(Value::Object(map)) => Self(map),
            _ => Self(Map::new()),
        }
    }
}

impl From<Map<String, Value>> for MatchData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl MatchData {
    /// Borrow the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Look up a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Shallow merge: each top-level key of `patch` replaces the stored value
    /// wholesale, keys absent from `patch` are kept.
    pub fn merge(&mut self, patch: Map<String, Value>) {
        for (key, value) in patch {
            self.0.insert(key, value);
        }
    }

    /// Drop every reference to `team` after it left the roster.
    ///
    /// `nextMatch` is compared by substring against its `"A vs B"` text, so a
    /// team whose name is contained in another team's name clears it as well.
    pub fn clear_team(&mut self, team: &str) {
        for court in COURT_KEYS {
            if let Some(Value::Object(court)) = self.0.get_mut(court) {
                for side in ["team1", "team2"] {
                    if court.get(side).and_then(Value::as_str) == Some(team) {
                        court.insert(side.to_string(), Value::String(String::new()));
                    }
                }
            }
        }

        if let Some(Value::Array(upcoming)) = self.0.get_mut(UPCOMING_KEY) {
            upcoming.retain(|entry| !references_team(entry, team));
        }

        if let Some(Value::String(next)) = self.0.get_mut(NEXT_MATCH_KEY) {
            if next.contains(team) {
                next.clear();
            }
        }
    }
}

fn references_team(entry: &Value, team: &str) -> bool {
    ["team1", "team2"]
        .iter()
        .any(|side| entry.get(side).and_then(Value::as_str) == Some(team))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn data(value: Value) -> MatchData {
        match value {
            Value::Object(map) => MatchData::from(map),
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn default_document_matches_initial_layout() {
        let value = serde_json::to_value(MatchData::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "court1": {"team1": "", "team2": "", "servingTeam": "team1", "status": "paused"},
                "court2": {"team1": "", "team2": "", "servingTeam": "team1", "status": "paused"},
                "nextMatch": "",
                "upcoming": []
            })
        );
    }

    #[test]
    fn merge_replaces_whole_court() {
        let mut stored = MatchData::default();
        stored.merge(
            json!({"court1": {"team1": "A", "team2": "B", "servingTeam": "team1", "status": "live"}})
                .as_object()
                .cloned()
                .unwrap(),
        );
        stored.merge(json!({"court1": {"team1": "X"}}).as_object().cloned().unwrap());

        assert_eq!(stored.get("court1"), Some(&json!({"team1": "X"})));
        assert_eq!(stored.get("nextMatch"), Some(&json!("")));
    }

    #[test]
    fn merge_passes_unknown_keys_through() {
        let mut stored = MatchData::default();
        stored.merge(json!({"banner": "Finals"}).as_object().cloned().unwrap());
        assert_eq!(stored.get("banner"), Some(&json!("Finals")));
        assert!(stored.get("court2").is_some());
    }

    #[test]
    fn clear_team_empties_matching_court_sides() {
        let mut stored = data(json!({
            "court1": {"team1": "Alpha", "team2": "Beta", "servingTeam": "team1", "status": "live"},
            "court2": {"team1": "Gamma", "team2": "Alpha", "servingTeam": "team2", "status": "paused"},
            "nextMatch": "",
            "upcoming": []
        }));

        stored.clear_team("Alpha");

        assert_eq!(stored.get("court1").unwrap()["team1"], json!(""));
        assert_eq!(stored.get("court1").unwrap()["team2"], json!("Beta"));
        assert_eq!(stored.get("court2").unwrap()["team1"], json!("Gamma"));
        assert_eq!(stored.get("court2").unwrap()["team2"], json!(""));
    }

    #[test]
    fn clear_team_filters_upcoming() {
        let mut stored = data(json!({
            "upcoming": [
                {"team1": "Alpha", "team2": "Beta", "time": "10:00", "court": "1"},
                {"team1": "Gamma", "team2": "Delta", "time": "10:30", "court": "2"},
                {"team1": "Delta", "team2": "Alpha", "time": "11:00", "court": "1"}
            ]
        }));

        stored.clear_team("Alpha");

        assert_eq!(
            stored.get("upcoming"),
            Some(&json!([{"team1": "Gamma", "team2": "Delta", "time": "10:30", "court": "2"}]))
        );
    }

    #[test]
    fn clear_team_uses_substring_match_for_next_match() {
        let mut stored = data(json!({"nextMatch": "Alphabet vs Beta"}));
        stored.clear_team("Alpha");
        assert_eq!(stored.get("nextMatch"), Some(&json!("")));

        let mut untouched = data(json!({"nextMatch": "Gamma vs Beta"}));
        untouched.clear_team("Alpha");
        assert_eq!(untouched.get("nextMatch"), Some(&json!("Gamma vs Beta")));
    }

    #[test]
    fn clear_team_ignores_unexpected_shapes() {
        let mut stored = data(json!({"court1": "closed", "upcoming": {"team1": "Alpha"}, "nextMatch": 3}));
        let before = stored.clone();
        stored.clear_team("Alpha");
        assert_eq!(stored, before);
    }
}
