use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Number of viewer streams currently registered.
    pub subscribers: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(subscribers: usize) -> Self {
        Self {
            status: "ok".to_string(),
            subscribers,
        }
    }

    /// Create a health response indicating persistence is failing.
    pub fn degraded(subscribers: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            subscribers,
        }
    }
}
