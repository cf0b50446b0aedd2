//! # Network Errors
//!
//! Connection establishment failures, disconnect causes and dispatch failures.

use shard_core::ClientError;
use shard_protocol::PacketId;
use std::io;

/// Why a connection could not be established
///
/// Each variant renders as a short, human-readable reason suitable for
/// showing to the user. None of them are retried automatically.
#[derive(thiserror::Error, Debug)]
pub enum ConnectError {
    #[error("Invalid host")]
    InvalidHost,

    #[error("Invalid port: {0}")]
    InvalidPort(String),

    #[error("Unknown host: {0}")]
    UnresolvedHost(String),

    #[error("{0}")]
    Io(#[from] io::Error),
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectCause {
    /// The caller asked for the disconnect
    Local,

    /// The server closed the connection
    Remote,

    /// The socket failed
    Error(String),
}

/// Failure to route or handle one packet
#[derive(thiserror::Error, Debug)]
pub enum DispatchError {
    #[error("No handler registered for packet {0:?}")]
    NoHandler(PacketId),

    #[error("Handler for {id:?} failed: {source}")]
    Handler {
        id: PacketId,
        #[source]
        source: ClientError,
    },

    #[error("Handler for {id:?} panicked: {message}")]
    Panicked { id: PacketId, message: String },
}
