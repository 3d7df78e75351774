//! GeoHunt API - REST Layer
//!
//! Axum adapter over the unlock engine. Identity arrives from the upstream
//! gateway in headers; every progress operation is scoped to that player.

pub mod config;
pub mod constants;
pub mod error;
pub mod jobs;
pub mod macros;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{AdminExtractor, PlayerContext, PlayerExtractor};
pub use routes::create_api_router;
pub use state::AppState;
pub use types::*;
