// ABOUTME: Application-wide error types for bastion-relay.
// ABOUTME: Carries the relay failure taxonomy and maps layer errors into it.

use std::path::PathBuf;
use thiserror::Error;

use crate::keys::KeyError;
use crate::store::StoreError;
use crate::tunnel::TunnelError;
use crate::types::TargetId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid or unsupported private key format")]
    InvalidKeyFormat,

    #[error("credential input is empty: {0}")]
    EmptyCredentialInput(&'static str),

    #[error("bastion authentication failed: {0}")]
    BastionAuthFailed(String),

    #[error("forwarded channel could not be opened: {0}")]
    ChannelOpenFailed(String),

    #[error("target authentication failed: {0}")]
    TargetAuthFailed(String),

    #[error("remote read failed: {0}")]
    RemoteReadFailed(String),

    #[error("remote write failed: {0}")]
    RemoteWriteFailed(String),

    #[error("credential store unavailable: {0}")]
    CredentialStoreUnavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("remote file is empty: {0}")]
    EmptyRemoteFile(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A later mapping write failed after earlier targets were registered.
    #[error("target {failed} not registered after {} mapping(s) written: {source}", .written.len())]
    PartialRegistration {
        written: Vec<TargetId>,
        failed: TargetId,
        source: Box<Error>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Fieldless view of [`Error`] for matching without caring about details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidKeyFormat,
    EmptyCredentialInput,
    BastionAuthFailed,
    ChannelOpenFailed,
    TargetAuthFailed,
    RemoteReadFailed,
    RemoteWriteFailed,
    CredentialStoreUnavailable,
    NotFound,
    EmptyRemoteFile,
    InvalidRequest,
    Config,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidKeyFormat => ErrorKind::InvalidKeyFormat,
            Error::EmptyCredentialInput(_) => ErrorKind::EmptyCredentialInput,
            Error::BastionAuthFailed(_) => ErrorKind::BastionAuthFailed,
            Error::ChannelOpenFailed(_) => ErrorKind::ChannelOpenFailed,
            Error::TargetAuthFailed(_) => ErrorKind::TargetAuthFailed,
            Error::RemoteReadFailed(_) => ErrorKind::RemoteReadFailed,
            Error::RemoteWriteFailed(_) => ErrorKind::RemoteWriteFailed,
            Error::CredentialStoreUnavailable(_) => ErrorKind::CredentialStoreUnavailable,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::EmptyRemoteFile(_) => ErrorKind::EmptyRemoteFile,
            Error::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Error::AlreadyExists(_)
            | Error::ConfigNotFound(_)
            | Error::MissingEnvVar(_)
            | Error::InvalidConfig(_)
            | Error::Yaml(_) => ErrorKind::Config,
            Error::Io(_) => ErrorKind::Io,
            Error::PartialRegistration { source, .. } => source.kind(),
        }
    }

    /// Message safe to show to an untrusted caller.
    ///
    /// Store faults are reported without the underlying cause; everything
    /// else is already phrased in caller terms.
    pub fn public_message(&self) -> String {
        match self {
            Error::CredentialStoreUnavailable(_) => "credential store unavailable".to_string(),
            Error::PartialRegistration {
                written,
                failed,
                source,
            } => format!(
                "target {} not registered after {} mapping(s) written: {}",
                failed,
                written.len(),
                source.public_message()
            ),
            other => other.to_string(),
        }
    }
}

impl From<KeyError> for Error {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::Empty => Error::EmptyCredentialInput("private key"),
            KeyError::NotPem | KeyError::Unsupported => Error::InvalidKeyFormat,
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(path) => Error::NotFound(path),
            other => Error::CredentialStoreUnavailable(other.to_string()),
        }
    }
}

impl From<TunnelError> for Error {
    fn from(err: TunnelError) -> Self {
        match err {
            TunnelError::BastionAuth(reason) => Error::BastionAuthFailed(reason),
            TunnelError::ChannelOpen(reason) => Error::ChannelOpenFailed(reason),
            TunnelError::TargetAuth(reason) => Error::TargetAuthFailed(reason),
            TunnelError::OutOfOrder { .. } => Error::InvalidRequest(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
