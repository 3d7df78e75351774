//! Concrete flavor providers backed by external services.

pub mod http;
