use axum::{Router, extract::State, response::Response, routing::get};

use crate::{
    services::stream_service::{self, Subscription},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/stream",
    tag = "stream",
    responses((status = 200, description = "`connected` handshake, then one `match_update` event carrying the {match_data, teams} snapshot per mutation. Load /api/match-data after the handshake.", content_type = "text/event-stream", body = String))
)]
/// Open a viewer stream.
pub async fn stream(State(state): State<SharedState>) -> Response {
    let subscription = Subscription::open(&state);
    stream_service::to_sse_stream(subscription, state.keep_alive())
}

/// Configure the viewer stream endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/stream", get(stream))
}
