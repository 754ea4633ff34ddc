//! DTOs for the match data endpoints.

use serde::Serialize;
use utoipa::ToSchema;

use crate::{dto::STATUS_SUCCESS, state::match_data::MatchDataDocument};

/// Acknowledgement returned by `/api/update-match`.
#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateMatchResponse {
    pub status: &'static str,
}

impl UpdateMatchResponse {
    /// Plain `{"status":"success"}` acknowledgement.
    pub fn success() -> Self {
        Self {
            status: STATUS_SUCCESS,
        }
    }
}

/// Schema of the `{match_data, teams}` snapshot served by `/api/match-data`
/// and pushed on `/stream`. Unknown keys sent by the admin appear verbatim
/// inside `match_data`.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchSnapshot {
    pub match_data: MatchDataDocument,
    pub teams: Vec<String>,
}
