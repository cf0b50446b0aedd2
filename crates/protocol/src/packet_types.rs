//! # Packet Structures
//!
//! Typed representation of every catalogued packet and the codec that maps
//! between frames and [`Packet`] values.
//!
//! ## Design
//!
//! - **Closed set**: one enum variant per identifier, matched exhaustively
//! - **Total decoding**: [`decode`] returns a value or a [`ProtocolError`], it
//!   never panics and never touches shared state
//! - **Exact framing**: a frame must be consumed completely; leftover bytes are
//!   reported as a length mismatch

use crate::codecs::*;
use crate::packets::{FrameLength, PacketId, MAX_DYNAMIC_LENGTH};
use crate::ProtocolError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use shard_core::{Direction, Layer, Point3, Serial};

/// Serial/seed value meaning "log in by character name"
pub const LOGIN_BY_NAME: u32 = 0xFFFF_FFFF;

/// Size of one record in a container contents frame
const CONTAINER_RECORD_SIZE: usize = 14;

/// How a piece of text is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechMode {
    /// Spoken by an object
    Say,
    /// Shouted over the object's head
    Bark,
    /// Emote/description ("you see")
    See,
    /// Message from the system
    System,
    /// Any mode this client does not present
    Other(u8),
}

impl SpeechMode {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x00 => SpeechMode::Say,
            0x01 => SpeechMode::Bark,
            0x02 => SpeechMode::See,
            0x06 => SpeechMode::System,
            other => SpeechMode::Other(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            SpeechMode::Say => 0x00,
            SpeechMode::Bark => 0x01,
            SpeechMode::See => 0x02,
            SpeechMode::System => 0x06,
            SpeechMode::Other(value) => value,
        }
    }
}

/// Why the server refused a login
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginErrorReason {
    CharacterNotFound,
    BadPassword,
    Other(u8),
}

impl LoginErrorReason {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x00 => LoginErrorReason::CharacterNotFound,
            0x01 => LoginErrorReason::BadPassword,
            other => LoginErrorReason::Other(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            LoginErrorReason::CharacterNotFound => 0x00,
            LoginErrorReason::BadPassword => 0x01,
            LoginErrorReason::Other(value) => value,
        }
    }
}

/// One item record inside a container
///
/// `x`/`y` are the item's position inside the container panel, not map
/// coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerItem {
    pub serial: Serial,
    pub graphic: u16,
    pub amount: u16,
    pub x: u16,
    pub y: u16,
    pub hue: u16,
}

/// A decoded packet
///
/// Packets are immutable values; handlers receive them by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    LoginRequest {
        seed: u32,
        serial: u32,
        name: String,
        password: String,
    },
    MoveRequest {
        direction: Direction,
        running: bool,
        sequence: u8,
    },
    SpeechRequest {
        color: u32,
        mode: SpeechMode,
        text: String,
    },
    DoubleClick {
        serial: Serial,
    },
    SingleClick {
        serial: Serial,
    },
    Drag {
        serial: Serial,
        amount: u16,
    },
    WarMode {
        enabled: bool,
    },
    SendObject {
        serial: Serial,
        graphic: u16,
        location: Point3,
        hue: u16,
        facing: Direction,
        amount: u16,
    },
    InitPlayer {
        serial: Serial,
    },
    SendText {
        speaker: Serial,
        graphic: u16,
        mode: SpeechMode,
        color: u32,
        name: String,
        text: String,
    },
    RemoveObject {
        serial: Serial,
    },
    Location {
        serial: Serial,
        graphic: u16,
        location: Point3,
        facing: Direction,
        hue: u16,
    },
    DenyMove {
        sequence: u8,
        location: Point3,
        facing: Direction,
    },
    AllowMove {
        sequence: u8,
    },
    OpenGump {
        serial: Serial,
        gump: u16,
    },
    ItemInContainer {
        container: Serial,
        item: ContainerItem,
    },
    Equip {
        item: Serial,
        graphic: u16,
        layer: Layer,
        mobile: Serial,
        hue: u16,
    },
    ContainerContents {
        container: Serial,
        items: Vec<ContainerItem>,
    },
    Sound {
        sound: u16,
        location: Point3,
    },
    LoginError {
        reason: LoginErrorReason,
    },
}

impl Packet {
    /// Identifier of this packet
    pub fn id(&self) -> PacketId {
        match self {
            Packet::LoginRequest { .. } => PacketId::LoginRequest,
            Packet::MoveRequest { .. } => PacketId::MoveRequest,
            Packet::SpeechRequest { .. } => PacketId::SpeechRequest,
            Packet::DoubleClick { .. } => PacketId::DoubleClick,
            Packet::SingleClick { .. } => PacketId::SingleClick,
            Packet::Drag { .. } => PacketId::Drag,
            Packet::WarMode { .. } => PacketId::WarMode,
            Packet::SendObject { .. } => PacketId::SendObject,
            Packet::InitPlayer { .. } => PacketId::InitPlayer,
            Packet::SendText { .. } => PacketId::SendText,
            Packet::RemoveObject { .. } => PacketId::RemoveObject,
            Packet::Location { .. } => PacketId::Location,
            Packet::DenyMove { .. } => PacketId::DenyMove,
            Packet::AllowMove { .. } => PacketId::AllowMove,
            Packet::OpenGump { .. } => PacketId::OpenGump,
            Packet::ItemInContainer { .. } => PacketId::ItemInContainer,
            Packet::Equip { .. } => PacketId::Equip,
            Packet::ContainerContents { .. } => PacketId::ContainerContents,
            Packet::Sound { .. } => PacketId::Sound,
            Packet::LoginError { .. } => PacketId::LoginError,
        }
    }

    /// Serialize this packet into a complete frame
    pub fn encode(&self) -> Bytes {
        let id = self.id();
        let mut buf = BytesMut::with_capacity(match id.frame_length() {
            FrameLength::Fixed(size) => size,
            FrameLength::Dynamic => 64,
        });
        buf.put_u8(id.as_u8());
        if id.frame_length() == FrameLength::Dynamic {
            // Patched below once the body is written
            buf.put_u16(0);
        }

        self.encode_body(&mut buf);

        if id.frame_length() == FrameLength::Dynamic {
            // Bodies are capped while writing, so the frame always fits
            let length = buf.len().min(MAX_DYNAMIC_LENGTH) as u16;
            buf[1..3].copy_from_slice(&length.to_be_bytes());
        }
        buf.freeze()
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        match self {
            Packet::LoginRequest { seed, serial, name, password } => {
                buf.put_u32(*seed);
                buf.put_u32(*serial);
                write_fixed_str(buf, name, NAME_LENGTH);
                write_fixed_str(buf, password, NAME_LENGTH);
            }
            Packet::MoveRequest { direction, running, sequence } => {
                let flag = if *running { 0x80 } else { 0x00 };
                buf.put_u8(direction.as_u8() | flag);
                buf.put_u8(*sequence);
            }
            Packet::SpeechRequest { color, mode, text } => {
                buf.put_u32(*color);
                buf.put_u8(mode.as_u8());
                write_cstring_within(buf, text, MAX_DYNAMIC_LENGTH - buf.len());
            }
            Packet::DoubleClick { serial }
            | Packet::SingleClick { serial }
            | Packet::InitPlayer { serial }
            | Packet::RemoveObject { serial } => {
                buf.put_u32(serial.get());
            }
            Packet::Drag { serial, amount } => {
                buf.put_u32(serial.get());
                buf.put_u16(*amount);
            }
            Packet::WarMode { enabled } => {
                buf.put_u8(u8::from(*enabled));
                buf.put_bytes(0, 3);
            }
            Packet::SendObject { serial, graphic, location, hue, facing, amount } => {
                buf.put_u32(serial.get());
                buf.put_u16(*graphic);
                put_point(buf, *location);
                buf.put_u16(*hue);
                buf.put_u8(facing.as_u8());
                buf.put_u16(*amount);
            }
            Packet::SendText { speaker, graphic, mode, color, name, text } => {
                buf.put_u32(speaker.get());
                buf.put_u16(*graphic);
                buf.put_u8(mode.as_u8());
                buf.put_u32(*color);
                write_fixed_str(buf, name, NAME_LENGTH);
                write_cstring_within(buf, text, MAX_DYNAMIC_LENGTH - buf.len());
            }
            Packet::Location { serial, graphic, location, facing, hue } => {
                buf.put_u32(serial.get());
                buf.put_u16(*graphic);
                put_point(buf, *location);
                buf.put_u8(facing.as_u8());
                buf.put_u16(*hue);
            }
            Packet::DenyMove { sequence, location, facing } => {
                buf.put_u8(*sequence);
                put_point(buf, *location);
                buf.put_u8(facing.as_u8());
            }
            Packet::AllowMove { sequence } => {
                buf.put_u8(*sequence);
            }
            Packet::OpenGump { serial, gump } => {
                buf.put_u32(serial.get());
                buf.put_u16(*gump);
            }
            Packet::ItemInContainer { container, item } => {
                buf.put_u32(item.serial.get());
                buf.put_u16(item.graphic);
                buf.put_u16(item.amount);
                buf.put_u16(item.x);
                buf.put_u16(item.y);
                buf.put_u32(container.get());
                buf.put_u16(item.hue);
            }
            Packet::Equip { item, graphic, layer, mobile, hue } => {
                buf.put_u32(item.get());
                buf.put_u16(*graphic);
                buf.put_u8(layer.get());
                buf.put_u32(mobile.get());
                buf.put_u16(*hue);
            }
            Packet::ContainerContents { container, items } => {
                buf.put_u32(container.get());
                let room = (MAX_DYNAMIC_LENGTH - buf.len() - 2) / CONTAINER_RECORD_SIZE;
                let count = items.len().min(room);
                buf.put_u16(count as u16);
                for item in &items[..count] {
                    buf.put_u32(item.serial.get());
                    buf.put_u16(item.graphic);
                    buf.put_u16(item.amount);
                    buf.put_u16(item.x);
                    buf.put_u16(item.y);
                    buf.put_u16(item.hue);
                }
            }
            Packet::Sound { sound, location } => {
                buf.put_u16(*sound);
                put_point(buf, *location);
            }
            Packet::LoginError { reason } => {
                buf.put_u8(reason.as_u8());
            }
        }
    }

    fn decode_body(id: PacketId, buf: &mut &[u8]) -> Result<Packet, ProtocolError> {
        let packet = match id {
            PacketId::LoginRequest => Packet::LoginRequest {
                seed: read_u32(buf)?,
                serial: read_u32(buf)?,
                name: read_fixed_str(buf, NAME_LENGTH)?,
                password: read_fixed_str(buf, NAME_LENGTH)?,
            },
            PacketId::MoveRequest => {
                let raw = read_u8(buf)?;
                if raw & 0x78 != 0 {
                    return Err(ProtocolError::InvalidValue {
                        field: "direction",
                        value: raw as u32,
                    });
                }
                Packet::MoveRequest {
                    direction: Direction::from_wire(raw),
                    running: raw & 0x80 != 0,
                    sequence: read_u8(buf)?,
                }
            }
            PacketId::SpeechRequest => Packet::SpeechRequest {
                color: read_u32(buf)?,
                mode: SpeechMode::from_u8(read_u8(buf)?),
                text: read_cstring(buf)?,
            },
            PacketId::DoubleClick => Packet::DoubleClick { serial: read_serial(buf)? },
            PacketId::SingleClick => Packet::SingleClick { serial: read_serial(buf)? },
            PacketId::Drag => Packet::Drag {
                serial: read_serial(buf)?,
                amount: read_u16(buf)?,
            },
            PacketId::WarMode => {
                let enabled = match read_u8(buf)? {
                    0 => false,
                    1 => true,
                    other => {
                        return Err(ProtocolError::InvalidValue {
                            field: "war mode",
                            value: other as u32,
                        })
                    }
                };
                ensure_padding(buf, 3)?;
                Packet::WarMode { enabled }
            }
            PacketId::SendObject => Packet::SendObject {
                serial: read_serial(buf)?,
                graphic: read_u16(buf)?,
                location: read_point(buf)?,
                hue: read_u16(buf)?,
                facing: Direction::from_wire(read_u8(buf)?),
                amount: read_u16(buf)?,
            },
            PacketId::InitPlayer => Packet::InitPlayer { serial: read_serial(buf)? },
            PacketId::SendText => Packet::SendText {
                speaker: read_serial(buf)?,
                graphic: read_u16(buf)?,
                mode: SpeechMode::from_u8(read_u8(buf)?),
                color: read_u32(buf)?,
                name: read_fixed_str(buf, NAME_LENGTH)?,
                text: read_cstring(buf)?,
            },
            PacketId::RemoveObject => Packet::RemoveObject { serial: read_serial(buf)? },
            PacketId::Location => Packet::Location {
                serial: read_serial(buf)?,
                graphic: read_u16(buf)?,
                location: read_point(buf)?,
                facing: Direction::from_wire(read_u8(buf)?),
                hue: read_u16(buf)?,
            },
            PacketId::DenyMove => Packet::DenyMove {
                sequence: read_u8(buf)?,
                location: read_point(buf)?,
                facing: Direction::from_wire(read_u8(buf)?),
            },
            PacketId::AllowMove => Packet::AllowMove { sequence: read_u8(buf)? },
            PacketId::OpenGump => Packet::OpenGump {
                serial: read_serial(buf)?,
                gump: read_u16(buf)?,
            },
            PacketId::ItemInContainer => {
                let serial = read_serial(buf)?;
                let graphic = read_u16(buf)?;
                let amount = read_u16(buf)?;
                let x = read_u16(buf)?;
                let y = read_u16(buf)?;
                let container = read_serial(buf)?;
                let hue = read_u16(buf)?;
                Packet::ItemInContainer {
                    container,
                    item: ContainerItem { serial, graphic, amount, x, y, hue },
                }
            }
            PacketId::Equip => Packet::Equip {
                item: read_serial(buf)?,
                graphic: read_u16(buf)?,
                layer: Layer::new(read_u8(buf)?),
                mobile: read_serial(buf)?,
                hue: read_u16(buf)?,
            },
            PacketId::ContainerContents => {
                let container = read_serial(buf)?;
                let count = read_u16(buf)? as usize;
                let needed = count * CONTAINER_RECORD_SIZE;
                if buf.remaining() < needed {
                    return Err(ProtocolError::Truncated {
                        needed,
                        remaining: buf.remaining(),
                    });
                }
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(ContainerItem {
                        serial: read_serial(buf)?,
                        graphic: read_u16(buf)?,
                        amount: read_u16(buf)?,
                        x: read_u16(buf)?,
                        y: read_u16(buf)?,
                        hue: read_u16(buf)?,
                    });
                }
                Packet::ContainerContents { container, items }
            }
            PacketId::Sound => Packet::Sound {
                sound: read_u16(buf)?,
                location: read_point(buf)?,
            },
            PacketId::LoginError => Packet::LoginError {
                reason: LoginErrorReason::from_u8(read_u8(buf)?),
            },
        };
        Ok(packet)
    }
}

/// Decode one frame
///
/// # Arguments
/// * `buffer` - Bytes starting at the identifier; may extend past the frame
/// * `declared_length` - Total frame size as determined by the framing layer
///
/// # Errors
/// - [`ProtocolError::UnknownPacket`] for identifiers outside the catalogue
/// - [`ProtocolError::Truncated`] when `buffer` is shorter than the frame or a
///   field runs past the end
/// - [`ProtocolError::LengthMismatch`] when the declared length disagrees with
///   the packet layout
pub fn decode(buffer: &[u8], declared_length: usize) -> Result<Packet, ProtocolError> {
    let id_byte = *buffer.first().ok_or(ProtocolError::Empty)?;
    if declared_length == 0 {
        return Err(ProtocolError::Empty);
    }
    let id = PacketId::from_u8(id_byte).ok_or(ProtocolError::UnknownPacket(id_byte))?;

    if buffer.len() < declared_length {
        return Err(ProtocolError::Truncated {
            needed: declared_length,
            remaining: buffer.len(),
        });
    }

    let mut body = &buffer[1..declared_length];
    match id.frame_length() {
        FrameLength::Fixed(expected) => {
            if declared_length != expected {
                return Err(ProtocolError::LengthMismatch {
                    id: id_byte,
                    declared: declared_length,
                    expected,
                });
            }
        }
        FrameLength::Dynamic => {
            let embedded = read_u16(&mut body)? as usize;
            if embedded != declared_length {
                return Err(ProtocolError::LengthMismatch {
                    id: id_byte,
                    declared: declared_length,
                    expected: embedded,
                });
            }
        }
    }

    let packet = Packet::decode_body(id, &mut body)?;
    if body.has_remaining() {
        return Err(ProtocolError::LengthMismatch {
            id: id_byte,
            declared: declared_length,
            expected: declared_length - body.remaining(),
        });
    }
    Ok(packet)
}

/// Serialize a packet into a complete frame
pub fn encode(packet: &Packet) -> Bytes {
    packet.encode()
}

fn read_serial(buf: &mut &[u8]) -> Result<Serial, ProtocolError> {
    Ok(Serial::new(read_u32(buf)?))
}

fn read_point(buf: &mut &[u8]) -> Result<Point3, ProtocolError> {
    Ok(Point3 {
        x: read_u16(buf)?,
        y: read_u16(buf)?,
        z: read_i8(buf)?,
    })
}

fn put_point(buf: &mut BytesMut, point: Point3) {
    buf.put_u16(point.x);
    buf.put_u16(point.y);
    buf.put_i8(point.z);
}

fn ensure_padding(buf: &mut &[u8], width: usize) -> Result<(), ProtocolError> {
    if buf.remaining() < width {
        return Err(ProtocolError::Truncated {
            needed: width,
            remaining: buf.remaining(),
        });
    }
    buf.advance(width);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_drag_exact_layout() {
        let frame = [0x0E, 0x00, 0x00, 0x00, 0x01, 0x00, 0x05];
        let packet = decode(&frame, frame.len()).unwrap();
        assert_eq!(
            packet,
            Packet::Drag {
                serial: Serial::new(1),
                amount: 5
            }
        );
    }

    #[test]
    fn test_decode_unknown_identifier() {
        let frame = [0xF0, 0x01, 0x02];
        assert_eq!(decode(&frame, 3), Err(ProtocolError::UnknownPacket(0xF0)));
    }

    #[test]
    fn test_decode_truncated_buffer() {
        let frame = [0x0E, 0x00, 0x00, 0x00];
        assert!(matches!(
            decode(&frame, 7),
            Err(ProtocolError::Truncated { needed: 7, remaining: 4 })
        ));
    }

    #[test]
    fn test_decode_wrong_fixed_length() {
        let frame = [0x22, 0x05, 0x00];
        assert_eq!(
            decode(&frame, 3),
            Err(ProtocolError::LengthMismatch {
                id: 0x22,
                declared: 3,
                expected: 2
            })
        );
    }

    #[test]
    fn test_decode_ignores_bytes_after_frame() {
        let buffer = [0x22, 0x07, 0x1D, 0x00];
        assert_eq!(decode(&buffer, 2).unwrap(), Packet::AllowMove { sequence: 7 });
    }

    #[test]
    fn test_encode_location_layout() {
        let packet = Packet::Location {
            serial: Serial::new(0x0000_1234),
            graphic: 0x0190,
            location: Point3::new(0x0102, 0x0304, -5),
            facing: Direction::South,
            hue: 0x83EA,
        };
        let bytes = packet.encode();
        assert_eq!(
            &bytes[..],
            &[0x20, 0x00, 0x00, 0x12, 0x34, 0x01, 0x90, 0x01, 0x02, 0x03, 0x04, 0xFB, 0x04, 0x83, 0xEA]
        );
        assert_eq!(decode(&bytes, bytes.len()).unwrap(), packet);
    }

    #[test]
    fn test_dynamic_length_is_patched() {
        let packet = Packet::SpeechRequest {
            color: 0x0000_00FF,
            mode: SpeechMode::Bark,
            text: "vendor buy".into(),
        };
        let bytes = packet.encode();
        let declared = u16::from_be_bytes([bytes[1], bytes[2]]) as usize;
        assert_eq!(declared, bytes.len());
        assert_eq!(bytes.len(), 1 + 2 + 4 + 1 + "vendor buy".len() + 1);
        assert_eq!(decode(&bytes, declared).unwrap(), packet);
    }

    #[test]
    fn test_oversized_text_is_cut_to_fit() {
        let packet = Packet::SpeechRequest {
            color: 0,
            mode: SpeechMode::Say,
            text: "x".repeat(70_000),
        };
        let bytes = packet.encode();
        let declared = u16::from_be_bytes([bytes[1], bytes[2]]) as usize;
        assert_eq!(declared, bytes.len());
        assert_eq!(bytes.len(), MAX_DYNAMIC_LENGTH);

        match decode(&bytes, declared).unwrap() {
            Packet::SpeechRequest { text, .. } => assert_eq!(text.len(), MAX_DYNAMIC_LENGTH - 9),
            other => panic!("Unexpected packet {:?}", other),
        }

        // Multi-byte characters are never split
        let wide = Packet::SendText {
            speaker: Serial::new(1),
            graphic: 0,
            mode: SpeechMode::Say,
            color: 0,
            name: "Bard".into(),
            text: "\u{e9}".repeat(20_000),
        };
        let bytes = wide.encode();
        let declared = u16::from_be_bytes([bytes[1], bytes[2]]) as usize;
        assert_eq!(declared, bytes.len());
        assert!(bytes.len() <= MAX_DYNAMIC_LENGTH);
        match decode(&bytes, declared).unwrap() {
            Packet::SendText { text, .. } => {
                assert!(text.chars().all(|c| c == '\u{e9}'));
                assert!(text.len() < 40_000);
            }
            other => panic!("Unexpected packet {:?}", other),
        }
    }

    #[test]
    fn test_oversized_container_contents_are_capped() {
        let items: Vec<ContainerItem> = (0..3000)
            .map(|n| ContainerItem {
                serial: Serial::new(0x4000_0100 + n),
                graphic: 0x0EED,
                amount: 1,
                x: 0,
                y: 0,
                hue: 0,
            })
            .collect();
        let bytes = Packet::ContainerContents {
            container: Serial::new(0x4000_0010),
            items,
        }
        .encode();
        let declared = u16::from_be_bytes([bytes[1], bytes[2]]) as usize;
        assert_eq!(declared, bytes.len());
        assert!(bytes.len() <= MAX_DYNAMIC_LENGTH);

        match decode(&bytes, declared).unwrap() {
            Packet::ContainerContents { items, .. } => {
                assert_eq!(items.len(), (MAX_DYNAMIC_LENGTH - 9) / CONTAINER_RECORD_SIZE);
            }
            other => panic!("Unexpected packet {:?}", other),
        }
    }

    #[test]
    fn test_dynamic_length_disagreement() {
        let mut bytes = Packet::SpeechRequest {
            color: 0,
            mode: SpeechMode::Say,
            text: "hi".into(),
        }
        .encode()
        .to_vec();
        bytes.push(0);
        assert!(matches!(
            decode(&bytes, bytes.len()),
            Err(ProtocolError::LengthMismatch { id: 0x03, .. })
        ));
    }

    #[test]
    fn test_container_contents_count_must_fit() {
        let packet = Packet::ContainerContents {
            container: Serial::new(0x4000_0010),
            items: vec![ContainerItem {
                serial: Serial::new(0x4000_0011),
                graphic: 0x0EED,
                amount: 250,
                x: 40,
                y: 60,
                hue: 0,
            }],
        };
        let mut bytes = packet.encode().to_vec();
        assert_eq!(bytes.len(), 9 + CONTAINER_RECORD_SIZE);
        assert_eq!(decode(&bytes, bytes.len()).unwrap(), packet);

        // Claim two records while only one is present
        bytes[8] = 2;
        assert!(matches!(
            decode(&bytes, bytes.len()),
            Err(ProtocolError::Truncated { .. })
        ));
    }

    #[test]
    fn test_move_request_rejects_garbage_direction() {
        let frame = [0x02, 0x18, 0x00];
        assert!(matches!(
            decode(&frame, 3),
            Err(ProtocolError::InvalidValue { field: "direction", .. })
        ));

        let running = [0x02, 0x83, 0x09];
        assert_eq!(
            decode(&running, 3).unwrap(),
            Packet::MoveRequest {
                direction: Direction::SouthEast,
                running: true,
                sequence: 9
            }
        );
    }

    #[test]
    fn test_login_error_reasons() {
        let frame = [0x82, 0x01];
        assert_eq!(
            decode(&frame, 2).unwrap(),
            Packet::LoginError {
                reason: LoginErrorReason::BadPassword
            }
        );
        assert_eq!(LoginErrorReason::from_u8(0x09), LoginErrorReason::Other(0x09));
    }

    #[test]
    fn test_every_fixed_layout_matches_table() {
        let samples = vec![
            Packet::LoginRequest {
                seed: LOGIN_BY_NAME,
                serial: LOGIN_BY_NAME,
                name: "Iolo".into(),
                password: "lute".into(),
            },
            Packet::MoveRequest { direction: Direction::West, running: false, sequence: 3 },
            Packet::DoubleClick { serial: Serial::new(9) },
            Packet::SingleClick { serial: Serial::new(9) },
            Packet::Drag { serial: Serial::new(9), amount: 1 },
            Packet::WarMode { enabled: true },
            Packet::SendObject {
                serial: Serial::new(0x4000_0001),
                graphic: 0x0EED,
                location: Point3::new(1, 2, 3),
                hue: 0,
                facing: Direction::North,
                amount: 12,
            },
            Packet::InitPlayer { serial: Serial::new(1) },
            Packet::RemoveObject { serial: Serial::new(1) },
            Packet::DenyMove { sequence: 1, location: Point3::new(1, 2, 3), facing: Direction::East },
            Packet::AllowMove { sequence: 1 },
            Packet::OpenGump { serial: Serial::new(1), gump: 0x3C },
            Packet::ItemInContainer {
                container: Serial::new(0x4000_0002),
                item: ContainerItem { serial: Serial::new(0x4000_0003), graphic: 1, amount: 1, x: 1, y: 1, hue: 0 },
            },
            Packet::Equip {
                item: Serial::new(0x4000_0004),
                graphic: 0x13B9,
                layer: Layer::new(1),
                mobile: Serial::new(1),
                hue: 0,
            },
            Packet::Sound { sound: 0x2A, location: Point3::new(1, 2, 0) },
            Packet::LoginError { reason: LoginErrorReason::CharacterNotFound },
        ];

        for packet in samples {
            let bytes = packet.encode();
            assert_eq!(
                packet.id().frame_length(),
                FrameLength::Fixed(bytes.len()),
                "layout size for {:?}",
                packet.id()
            );
        }
    }
}
