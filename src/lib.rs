// ABOUTME: Library root for bastion-relay - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod credentials;
pub mod error;
pub mod keys;
pub mod output;
pub mod relay;
pub mod ssh;
pub mod store;
pub mod transfer;
pub mod tunnel;
pub mod types;
