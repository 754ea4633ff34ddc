/// Persisted document shapes.
pub mod models;
/// Backends persisting the team list and the match data.
pub mod state_store;
/// Storage abstraction layer for persistence operations.
pub mod storage;
