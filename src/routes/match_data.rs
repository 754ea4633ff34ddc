use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};
use serde_json::{Value, value::RawValue};

use crate::{
    dto::match_data::{MatchSnapshot, UpdateMatchResponse},
    error::AppError,
    services::{mutation_service, query_service},
    state::SharedState,
};

/// Match data endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/api/match-data", get(get_match_data))
        .route("/api/update-match", post(update_match))
}

#[utoipa::path(
    get,
    path = "/api/match-data",
    tag = "match",
    responses((status = 200, description = "Current snapshot; viewers load it right after opening /stream", body = MatchSnapshot))
)]
/// Return the full `{match_data, teams}` snapshot.
pub async fn get_match_data(
    State(state): State<SharedState>,
) -> Result<Json<Box<RawValue>>, AppError> {
    Ok(Json(query_service::get_snapshot(&state).await?))
}

#[utoipa::path(
    post,
    path = "/api/update-match",
    tag = "match",
    request_body(content = Object, description = "Partial match data; each top-level key replaces the stored value"),
    responses(
        (status = 200, description = "Merged and broadcast", body = UpdateMatchResponse),
        (status = 400, description = "Body is not a JSON object")
    )
)]
/// Shallow-merge the body into the match data.
pub async fn update_match(
    State(state): State<SharedState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<UpdateMatchResponse>, AppError> {
    let Json(patch) = payload?;
    mutation_service::update_match_data(&state, patch).await?;
    Ok(Json(UpdateMatchResponse::success()))
}
