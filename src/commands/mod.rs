// ABOUTME: Command module aggregator for the bastion-relay CLI.
// ABOUTME: Re-exports server registration, transfer and listing handlers.

mod add_server;
mod relay_connection;
mod stored;
mod transfer;

pub use add_server::{AddServerArgs, add_server};
pub use relay_connection::connect_relay;
pub use stored::{fetch, list, targets};
pub use transfer::{download, stage, upload};
