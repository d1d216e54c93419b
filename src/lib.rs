//! User management microservice built with Rust.
//!
//! Registration, login, logout, and token refresh over a public HTTP API,
//! plus an internal endpoint other services call to verify a bearer
//! credential.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod external;
pub mod handlers;
pub mod middleware;
pub mod rpc;

pub use config::Config;
pub use error::AppError;
pub use handlers::http::AppState;

use axum::routing::{delete, get, post, put};
use handlers::http;

/// Build the public API router. Used by main and by integration tests.
pub fn create_app(state: AppState) -> axum::Router {
    let user_routes = axum::Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", delete(auth::logout))
        .route("/refresh-token", put(auth::refresh_token));

    axum::Router::new()
        .route("/health", get(http::health))
        .nest("/user/v1", user_routes)
        .with_state(state)
}

/// Build the internal RPC router, bound to its own listener in main.
pub fn create_internal_app(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/internal/v1/validate-token", post(rpc::validate_token))
        .with_state(state)
}
