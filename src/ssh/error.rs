// ABOUTME: SSH-specific error types.
// ABOUTME: Covers connection, authentication, forwarding and SFTP failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("authentication rejected for user {0}")]
    AuthenticationFailed(String),

    #[error("direct-tcpip channel to {destination} refused: {reason}")]
    ChannelOpen { destination: String, reason: String },

    #[error("forwarded channel already carries a session")]
    ChannelConsumed,

    #[error("SFTP error: {0}")]
    Sftp(String),

    #[error("SSH protocol error: {0}")]
    Protocol(#[from] russh::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<russh_sftp::client::error::Error> for Error {
    fn from(err: russh_sftp::client::error::Error) -> Self {
        Error::Sftp(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
