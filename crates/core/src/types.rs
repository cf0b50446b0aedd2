//! Core type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned object identity (32-bit on the wire)
///
/// Serials below [`Serial::ITEM_FIRST`] address mobiles, serials at or above
/// it address items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Serial(pub u32);

impl Serial {
    /// First serial of the item sub-range
    pub const ITEM_FIRST: u32 = 0x4000_0000;

    pub const fn new(serial: u32) -> Self {
        Self(serial)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn is_item(&self) -> bool {
        self.0 >= Self::ITEM_FIRST
    }

    pub fn is_mobile(&self) -> bool {
        !self.is_item()
    }
}

impl From<u32> for Serial {
    fn from(serial: u32) -> Self {
        Self(serial)
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

/// Equip slot an item occupies on a mobile
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Layer(pub u8);

impl Layer {
    pub const fn new(layer: u8) -> Self {
        Self(layer)
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl From<u8> for Layer {
    fn from(layer: u8) -> Self {
        Self(layer)
    }
}
