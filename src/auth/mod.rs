//! Authentication: accounts, passwords, tokens, session lifecycle.

mod handlers;
mod password;
mod service;
mod token;

pub use handlers::{login, logout, refresh_token, register};
pub use password::{hash_password, verify_password};
pub use service::{LoginOutcome, SessionService};
pub use token::{Claims, TokenCodec, TokenConfig, TokenKind};
