//! Shared HTTP plumbing: application state, envelope, health.

pub mod http;

pub use http::*;
