//! # Packet Identifiers
//!
//! Every frame starts with a one-byte identifier. The identifier alone fixes the
//! layout of the rest of the frame, including how long the frame is: most packets
//! have a fixed size, a few carry their own `u16` total length right after the
//! identifier. There is no length prefix shared by all packets.
//!
//! ## Direction
//!
//! - **Client-to-server**: login, movement, speech and object interaction requests
//! - **Server-to-client**: world updates, movement acknowledgements, text, sounds
//!
//! The codec decodes and encodes both directions so that either side of a
//! connection can be exercised in tests.

/// Size of a frame, identifier included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameLength {
    /// Frame is always exactly this many bytes
    Fixed(usize),

    /// A big-endian `u16` total length follows the identifier
    Dynamic,
}

/// Smallest legal dynamic frame: identifier plus the length field
pub const MIN_DYNAMIC_LENGTH: usize = 3;

/// Largest dynamic frame the client accepts
pub const MAX_DYNAMIC_LENGTH: usize = 0x8000;

/// Packet identifier catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketId {
    //=== Client to server ===//

    /// Log in with account name and password
    ///
    /// # Packet Format
    /// ```text
    /// {0x01}{u32 seed}{u32 serial}{char[30] name}{char[30] password}
    /// ```
    LoginRequest = 0x01,

    /// Ask to turn or take a step
    ///
    /// # Packet Format
    /// ```text
    /// {0x02}{u8 direction | 0x80 running}{u8 sequence}
    /// ```
    MoveRequest = 0x02,

    /// Say something
    ///
    /// # Packet Format
    /// ```text
    /// {0x03}{u16 length}{u32 color}{u8 mode}{text\0}
    /// ```
    SpeechRequest = 0x03,

    /// Use an object
    ///
    /// # Packet Format
    /// ```text
    /// {0x06}{u32 serial}
    /// ```
    DoubleClick = 0x06,

    /// Ask for an object's name
    ///
    /// # Packet Format
    /// ```text
    /// {0x09}{u32 serial}
    /// ```
    SingleClick = 0x09,

    /// Pick up (part of) an item stack
    ///
    /// # Packet Format
    /// ```text
    /// {0x0E}{u32 serial}{u16 amount}
    /// ```
    Drag = 0x0E,

    /// Enter or leave war mode
    ///
    /// # Packet Format
    /// ```text
    /// {0x72}{u8 enabled}{u8[3] padding}
    /// ```
    WarMode = 0x72,

    //=== Server to client ===//

    /// Create or update a world object
    ///
    /// # Packet Format
    /// ```text
    /// {0x1A}{u32 serial}{u16 graphic}{u16 x}{u16 y}{i8 z}{u16 hue}{u8 facing}{u16 amount}
    /// ```
    ///
    /// `facing` is meaningful for mobiles, `amount` for items.
    SendObject = 0x1A,

    /// Announce the serial of the character that is logging in
    ///
    /// # Packet Format
    /// ```text
    /// {0x1B}{u32 serial}
    /// ```
    InitPlayer = 0x1B,

    /// Text from an object or the system
    ///
    /// # Packet Format
    /// ```text
    /// {0x1C}{u16 length}{u32 serial}{u16 graphic}{u8 mode}{u32 color}{char[30] name}{text\0}
    /// ```
    SendText = 0x1C,

    /// Forget an object
    ///
    /// # Packet Format
    /// ```text
    /// {0x1D}{u32 serial}
    /// ```
    RemoveObject = 0x1D,

    /// The player's own appearance and position
    ///
    /// # Packet Format
    /// ```text
    /// {0x20}{u32 serial}{u16 graphic}{u16 x}{u16 y}{i8 z}{u8 facing}{u16 hue}
    /// ```
    Location = 0x20,

    /// Move request refused, carries the authoritative position
    ///
    /// # Packet Format
    /// ```text
    /// {0x21}{u8 sequence}{u16 x}{u16 y}{i8 z}{u8 facing}
    /// ```
    DenyMove = 0x21,

    /// Move request accepted
    ///
    /// # Packet Format
    /// ```text
    /// {0x22}{u8 sequence}
    /// ```
    AllowMove = 0x22,

    /// Open a server-driven UI panel
    ///
    /// # Packet Format
    /// ```text
    /// {0x24}{u32 serial}{u16 gump}
    /// ```
    OpenGump = 0x24,

    /// A single item placed in a container
    ///
    /// # Packet Format
    /// ```text
    /// {0x25}{u32 serial}{u16 graphic}{u16 amount}{u16 x}{u16 y}{u32 container}{u16 hue}
    /// ```
    ItemInContainer = 0x25,

    /// An item equipped on a mobile
    ///
    /// # Packet Format
    /// ```text
    /// {0x2E}{u32 item}{u16 graphic}{u8 layer}{u32 mobile}{u16 hue}
    /// ```
    Equip = 0x2E,

    /// Full contents of a container
    ///
    /// # Packet Format
    /// ```text
    /// {0x3C}{u16 length}{u32 container}{u16 count}
    ///     count * {u32 serial}{u16 graphic}{u16 amount}{u16 x}{u16 y}{u16 hue}
    /// ```
    ContainerContents = 0x3C,

    /// Play a sound effect
    ///
    /// # Packet Format
    /// ```text
    /// {0x54}{u16 sound}{u16 x}{u16 y}{i8 z}
    /// ```
    Sound = 0x54,

    /// Login refused
    ///
    /// # Packet Format
    /// ```text
    /// {0x82}{u8 reason}
    /// ```
    LoginError = 0x82,
}

impl PacketId {
    /// Convert a byte to a packet identifier
    ///
    /// # Returns
    /// - `Some(PacketId)` for catalogued identifiers
    /// - `None` for anything else; such frames cannot be decoded
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(PacketId::LoginRequest),
            0x02 => Some(PacketId::MoveRequest),
            0x03 => Some(PacketId::SpeechRequest),
            0x06 => Some(PacketId::DoubleClick),
            0x09 => Some(PacketId::SingleClick),
            0x0E => Some(PacketId::Drag),
            0x1A => Some(PacketId::SendObject),
            0x1B => Some(PacketId::InitPlayer),
            0x1C => Some(PacketId::SendText),
            0x1D => Some(PacketId::RemoveObject),
            0x20 => Some(PacketId::Location),
            0x21 => Some(PacketId::DenyMove),
            0x22 => Some(PacketId::AllowMove),
            0x24 => Some(PacketId::OpenGump),
            0x25 => Some(PacketId::ItemInContainer),
            0x2E => Some(PacketId::Equip),
            0x3C => Some(PacketId::ContainerContents),
            0x54 => Some(PacketId::Sound),
            0x72 => Some(PacketId::WarMode),
            0x82 => Some(PacketId::LoginError),
            _ => None,
        }
    }

    /// Convert packet identifier to its byte
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Frame size for this identifier
    pub fn frame_length(self) -> FrameLength {
        match self {
            PacketId::LoginRequest => FrameLength::Fixed(69),
            PacketId::MoveRequest => FrameLength::Fixed(3),
            PacketId::SpeechRequest => FrameLength::Dynamic,
            PacketId::DoubleClick => FrameLength::Fixed(5),
            PacketId::SingleClick => FrameLength::Fixed(5),
            PacketId::Drag => FrameLength::Fixed(7),
            PacketId::WarMode => FrameLength::Fixed(5),
            PacketId::SendObject => FrameLength::Fixed(17),
            PacketId::InitPlayer => FrameLength::Fixed(5),
            PacketId::SendText => FrameLength::Dynamic,
            PacketId::RemoveObject => FrameLength::Fixed(5),
            PacketId::Location => FrameLength::Fixed(15),
            PacketId::DenyMove => FrameLength::Fixed(8),
            PacketId::AllowMove => FrameLength::Fixed(2),
            PacketId::OpenGump => FrameLength::Fixed(7),
            PacketId::ItemInContainer => FrameLength::Fixed(19),
            PacketId::Equip => FrameLength::Fixed(14),
            PacketId::ContainerContents => FrameLength::Dynamic,
            PacketId::Sound => FrameLength::Fixed(8),
            PacketId::LoginError => FrameLength::Fixed(2),
        }
    }
}

/// Frame size for a raw identifier byte, `None` if the identifier is unknown
pub fn frame_length(id: u8) -> Option<FrameLength> {
    PacketId::from_u8(id).map(PacketId::frame_length)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_roundtrip() {
        for byte in 0..=u8::MAX {
            if let Some(id) = PacketId::from_u8(byte) {
                assert_eq!(id.as_u8(), byte);
            }
        }
    }

    #[test]
    fn test_drag_layout() {
        assert_eq!(PacketId::from_u8(0x0E), Some(PacketId::Drag));
        assert_eq!(frame_length(0x0E), Some(FrameLength::Fixed(7)));
    }

    #[test]
    fn test_unknown_identifier() {
        assert_eq!(PacketId::from_u8(0xFF), None);
        assert_eq!(frame_length(0x00), None);
    }
}
