use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Courtside Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::teams::list_teams,
        crate::routes::teams::create_team,
        crate::routes::teams::delete_team,
        crate::routes::match_data::get_match_data,
        crate::routes::match_data::update_match,
        crate::routes::stream::stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::teams::CreateTeamRequest,
            crate::dto::teams::TeamsResponse,
            crate::dto::match_data::UpdateMatchResponse,
            crate::dto::match_data::MatchSnapshot,
            crate::dto::sse::StreamHandshake,
            crate::state::match_data::MatchDataDocument,
            crate::state::match_data::CourtState,
            crate::state::match_data::ScheduledMatch,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "teams", description = "Team roster management"),
        (name = "match", description = "Live match data"),
        (name = "stream", description = "Server-sent events stream for viewers"),
    )
)]
pub struct ApiDoc;
