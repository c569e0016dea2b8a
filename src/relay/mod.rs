// ABOUTME: Bastion-relayed transfers: the scoped relay entry point and caller operations.
// ABOUTME: Composes key parsing, tunnel building, file transfer and teardown.

mod run;
mod service;
mod stored_file;

pub use run::run_relayed;
pub use service::{
    AddServerRequest, BastionRelay, CredentialStatus, EmptyFilePolicy, MappingResult,
    RelaySettings, ServerSpec,
};
pub use stored_file::{StoredFile, StoredLocation};
