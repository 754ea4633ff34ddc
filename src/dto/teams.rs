//! DTOs for the team roster endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::STATUS_SUCCESS;

/// Payload used to add a team to the roster.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTeamRequest {
    /// Display name, unique by exact match. `null` counts as missing.
    #[serde(default)]
    #[validate(
        required(message = "Team name is required"),
        length(min = 1, message = "Team name is required")
    )]
    pub team: Option<String>,
}

/// Roster returned after a successful add or remove.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamsResponse {
    pub status: &'static str,
    pub teams: Vec<String>,
}

impl TeamsResponse {
    /// Wrap the current roster into a success response.
    pub fn success(teams: Vec<String>) -> Self {
        Self {
            status: STATUS_SUCCESS,
            teams,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use validator::Validate;

    use super::*;

    fn parse(body: serde_json::Value) -> CreateTeamRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn missing_null_and_empty_names_fail_validation() {
        for body in [json!({}), json!({"team": null}), json!({"team": ""})] {
            let request = parse(body.clone());
            assert!(request.validate().is_err(), "{body} should be rejected");
        }
    }

    #[test]
    fn present_name_passes() {
        let request = parse(json!({"team": "Alpha"}));
        assert!(request.validate().is_ok());
        assert_eq!(request.team.as_deref(), Some("Alpha"));
    }
}
