//! Protocol error types

use shard_core::ClientError;

/// Failure to frame or decode a single packet
///
/// Protocol errors are local to one frame: the caller logs them and discards
/// the frame, the connection stays up.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Empty frame")]
    Empty,

    #[error("Truncated frame: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("Frame 0x{id:02X} is {declared} bytes but its layout needs {expected}")]
    LengthMismatch { id: u8, declared: usize, expected: usize },

    #[error("Unknown packet identifier 0x{0:02X}")]
    UnknownPacket(u8),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: u32 },
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        ClientError::Protocol(err.to_string())
    }
}
