use axum::{Router, routing::get};

use crate::state::SharedState;

pub mod docs;
pub mod health;
pub mod match_data;
pub mod stream;
pub mod teams;

const WELCOME: &str = "Welcome to the Pickleball Match Tracker API";

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = Router::<SharedState>::new()
        .route("/", get(welcome))
        .merge(health::router())
        .merge(teams::router())
        .merge(match_data::router())
        .merge(stream::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}

async fn welcome() -> &'static str {
    WELCOME
}
