//! # Shard Protocol Library
//!
//! Binary codec for the shard wire protocol.
//!
//! ## Architecture
//!
//! ### 1. Codecs Layer ([`codecs`])
//! Fixed-width big-endian field readers and writers:
//! - `u8` / `i8`: single byte values (ids, flags, elevation)
//! - `u16`: graphics, hues, coordinates, amounts
//! - `u32`: serials, colors
//! - fixed 30-byte NUL-padded names and NUL-terminated text
//!
//! ### 2. Packet Identifiers ([`packets`])
//! The identifier catalogue and the per-identifier frame length table.
//!
//! ### 3. Packet Structures ([`packet_types`])
//! The typed [`Packet`] enum with [`decode`] and [`encode`].
//!
//! ### 4. Framing ([`framing`])
//! [`FrameDecoder`] turns a TCP byte stream back into frames.
//!
//! ## Usage Example
//!
//! ```rust
//! use shard_protocol::{decode, Packet};
//! use shard_core::Serial;
//!
//! let frame = [0x0E, 0x00, 0x00, 0x00, 0x01, 0x00, 0x05];
//! let packet = decode(&frame, frame.len()).unwrap();
//! assert_eq!(packet, Packet::Drag { serial: Serial::new(1), amount: 5 });
//!
//! let bytes = packet.encode();
//! assert_eq!(&bytes[..], &frame[..]);
//! ```

pub mod codecs;
pub mod error;
pub mod framing;
pub mod packets;
pub mod packet_types;

// Re-export commonly used items
pub use error::ProtocolError;
pub use framing::{Frame, FrameDecoder};
pub use packets::{frame_length, FrameLength, PacketId};
pub use packet_types::*;
