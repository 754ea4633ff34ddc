pub mod health;
pub mod match_data;
pub mod sse;
pub mod teams;

/// Status string carried by every successful mutation response.
pub const STATUS_SUCCESS: &str = "success";
