//! Business logic behind the admin write endpoints.
//!
//! Every operation holds the store guard from validation to publish, so the
//! snapshot each viewer receives reflects exactly one applied mutation and
//! snapshots reach viewers in mutation order. Failed operations publish nothing.

use serde_json::Value;
use tracing::{debug, info};
use validator::Validate;

use crate::{
    dto::teams::CreateTeamRequest,
    error::ServiceError,
    state::SharedState,
};

/// Append a team to the roster and publish the new snapshot.
pub async fn add_team(
    state: &SharedState,
    request: CreateTeamRequest,
) -> Result<Vec<String>, ServiceError> {
    request.validate()?;
    let Some(name) = request.team else {
        return Err(ServiceError::InvalidInput("Team name is required".into()));
    };

    let mut guard = state.store().lock().await;
    if guard.teams().contains(&name) {
        return Err(ServiceError::Conflict("Team already exists".into()));
    }

    let mut teams = guard.teams().clone();
    teams.insert(name.clone());
    guard.replace_teams(teams).await;

    let report = state.publish(&guard);
    info!(team = %name, delivered = report.delivered, "team added");
    Ok(guard.teams().iter().cloned().collect())
}

/// Remove a team, clear every reference to it in the match data and publish.
pub async fn remove_team(state: &SharedState, name: &str) -> Result<Vec<String>, ServiceError> {
    let mut guard = state.store().lock().await;
    if !guard.teams().contains(name) {
        return Err(ServiceError::NotFound("Team not found".into()));
    }

    let mut teams = guard.teams().clone();
    teams.shift_remove(name);
    guard.replace_teams(teams).await;

    let mut match_data = guard.match_data().clone();
    match_data.clear_team(name);
    guard.replace_match_data(match_data).await;

    let report = state.publish(&guard);
    info!(team = %name, delivered = report.delivered, "team removed");
    Ok(guard.teams().iter().cloned().collect())
}

/// Shallow-merge `patch` into the match data and publish.
///
/// Only the top level is inspected: any object is accepted and each of its
/// keys replaces the stored value wholesale.
pub async fn update_match_data(state: &SharedState, patch: Value) -> Result<(), ServiceError> {
    let Value::Object(patch) = patch else {
        return Err(ServiceError::InvalidInput(
            "match data patch must be a JSON object".into(),
        ));
    };

    let keys: Vec<String> = patch.keys().cloned().collect();
    let mut guard = state.store().lock().await;
    guard.patch_match_data(patch).await;

    let report = state.publish(&guard);
    debug!(?keys, delivered = report.delivered, "match data updated");
    Ok(())
}
