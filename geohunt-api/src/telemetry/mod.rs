//! GeoHunt Telemetry
//!
//! Structured JSON logging and per-request instrumentation for the API layer.

pub mod middleware;
pub mod tracer;

pub use middleware::{observability_middleware, RequestId};
pub use tracer::{init_tracer, TelemetryConfig};
