//! Clients for collaborating services.

mod wallet;

pub use wallet::{Wallet, WalletClient};
