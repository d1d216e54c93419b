//! Request-boundary middleware: the bearer-credential authentication gate.

pub mod auth;

pub use auth::{AccessSession, RefreshSession};
