/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Team and match data mutations followed by a broadcast.
pub mod mutation_service;
/// Read-only projections for the pull endpoints.
pub mod query_service;
/// Viewer subscriptions and their SSE rendering.
pub mod stream_service;
