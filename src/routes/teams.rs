use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::{delete, get},
};

use crate::{
    dto::teams::{CreateTeamRequest, TeamsResponse},
    error::AppError,
    services::{mutation_service, query_service},
    state::SharedState,
};

/// Team roster endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/api/teams", get(list_teams).post(create_team))
        .route("/api/teams/{team}", delete(delete_team))
}

#[utoipa::path(
    get,
    path = "/api/teams",
    tag = "teams",
    responses((status = 200, description = "Current roster in insertion order", body = [String]))
)]
/// Return the team names currently in the roster.
pub async fn list_teams(State(state): State<SharedState>) -> Json<Vec<String>> {
    Json(query_service::get_teams(&state).await)
}

#[utoipa::path(
    post,
    path = "/api/teams",
    tag = "teams",
    request_body = CreateTeamRequest,
    responses(
        (status = 200, description = "Team added and broadcast", body = TeamsResponse),
        (status = 400, description = "Team name missing or already taken")
    )
)]
/// Add a team to the roster.
pub async fn create_team(
    State(state): State<SharedState>,
    payload: Result<Json<CreateTeamRequest>, JsonRejection>,
) -> Result<Json<TeamsResponse>, AppError> {
    let Json(request) = payload?;
    let teams = mutation_service::add_team(&state, request).await?;
    Ok(Json(TeamsResponse::success(teams)))
}

#[utoipa::path(
    delete,
    path = "/api/teams/{team}",
    tag = "teams",
    params(("team" = String, Path, description = "Exact name of the team to remove")),
    responses(
        (status = 200, description = "Team removed, references cleared and broadcast", body = TeamsResponse),
        (status = 404, description = "No such team")
    )
)]
/// Remove a team and clear it from courts, the next match and the schedule.
pub async fn delete_team(
    State(state): State<SharedState>,
    Path(team): Path<String>,
) -> Result<Json<TeamsResponse>, AppError> {
    let teams = mutation_service::remove_team(&state, &team).await?;
    Ok(Json(TeamsResponse::success(teams)))
}
