use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report health, probing the persistence backend and logging failures.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let mut backend_healthy = true;
    if let Some(backend) = state.store().backend() {
        if let Err(err) = backend.health_check().await {
            warn!(error = %err, "storage health check failed");
            backend_healthy = false;
        }
    }

    let subscribers = state.broadcaster().subscriber_count();
    if backend_healthy && !state.store().is_degraded() {
        HealthResponse::ok(subscribers)
    } else {
        HealthResponse::degraded(subscribers)
    }
}
