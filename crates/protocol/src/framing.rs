//! Stream framing
//!
//! TCP delivers a byte stream; [`FrameDecoder`] cuts it back into frames using
//! the per-identifier length table and decodes each complete frame.
//!
//! # Resynchronisation
//!
//! An unknown identifier or an impossible dynamic length means the end of the
//! current frame cannot be found. Everything buffered at that point is dropped
//! and reported once as [`Frame::Unrecognized`]; reading continues with the next
//! bytes that arrive.
//!
//! The drop is not limited to the bad frame. Valid frames that arrived behind
//! it in the same read are lost with it, since their start cannot be located.
//! Only frames decoded before the bad identifier survive.

use crate::packet_types::{decode, Packet};
use crate::packets::{frame_length, FrameLength, MAX_DYNAMIC_LENGTH, MIN_DYNAMIC_LENGTH};
use crate::ProtocolError;
use bytes::{Buf, BytesMut};

/// Outcome of framing one unit of the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A complete, decoded packet
    Packet(Packet),

    /// A complete frame whose contents did not match its layout
    Malformed { id: u8, error: ProtocolError },

    /// Framing was lost; `discarded` bytes were thrown away
    Unrecognized { id: u8, discarded: usize },
}

/// Incremental frame splitter
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: BytesMut,
}

impl FrameDecoder {
    /// Create a decoder with an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes received from the stream
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Number of bytes waiting for the rest of their frame
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Take the next frame out of the buffer
    ///
    /// # Returns
    /// `None` when the buffer does not yet hold a complete frame.
    pub fn next_frame(&mut self) -> Option<Frame> {
        let id = *self.buffer.first()?;

        let length = match frame_length(id) {
            Some(FrameLength::Fixed(size)) => size,
            Some(FrameLength::Dynamic) => {
                if self.buffer.len() < MIN_DYNAMIC_LENGTH {
                    return None;
                }
                let declared = u16::from_be_bytes([self.buffer[1], self.buffer[2]]) as usize;
                if !(MIN_DYNAMIC_LENGTH..=MAX_DYNAMIC_LENGTH).contains(&declared) {
                    tracing::debug!("Frame 0x{:02X} declares impossible length {}", id, declared);
                    return Some(self.discard(id));
                }
                declared
            }
            None => {
                tracing::debug!("Unrecognized packet identifier 0x{:02X}", id);
                return Some(self.discard(id));
            }
        };

        if self.buffer.len() < length {
            return None;
        }

        let frame = self.buffer.split_to(length);
        Some(match decode(&frame, length) {
            Ok(packet) => Frame::Packet(packet),
            Err(error) => Frame::Malformed { id, error },
        })
    }

    fn discard(&mut self, id: u8) -> Frame {
        let discarded = self.buffer.len();
        self.buffer.advance(discarded);
        Frame::Unrecognized { id, discarded }
    }
}

impl Iterator for FrameDecoder {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        self.next_frame()
    }
}
