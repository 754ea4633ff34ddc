//! Read-only projections served by the pull endpoints.

use serde_json::value::RawValue;

use crate::{error::AppError, state::SharedState};

/// Current roster in insertion order.
pub async fn get_teams(state: &SharedState) -> Vec<String> {
    state.store().teams().await
}

/// Current `{match_data, teams}` snapshot, serialized exactly like the pushed one.
pub async fn get_snapshot(state: &SharedState) -> Result<Box<RawValue>, AppError> {
    let raw = state
        .store()
        .snapshot()
        .await
        .map_err(|err| AppError::Internal(format!("failed to serialize snapshot: {err}")))?;
    RawValue::from_string(raw)
        .map_err(|err| AppError::Internal(format!("failed to serialize snapshot: {err}")))
}
