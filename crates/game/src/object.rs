//! # World Objects
//!
//! Everything the server can address by serial is a [`WorldObject`]: either
//! an item or a mobile. The set of kinds is closed, so the kind-specific data
//! lives in the [`ObjectKind`] enum and call sites match on it (or use the
//! `as_item`/`as_mobile` views) instead of downcasting.

use serde::{Deserialize, Serialize};
use shard_core::{Direction, Layer, Point3, Serial};
use std::collections::BTreeMap;

/// Where an item currently is
///
/// An item is in exactly one of these places at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Placement {
    /// Lying loose in the world
    #[default]
    Ground,

    /// Worn by a mobile on `layer`
    Equipped { mobile: Serial, layer: Layer },

    /// Inside another item; the item's location is relative to the container
    Contained { container: Serial },
}

impl Placement {
    /// Serial of the object holding this one, if any
    pub fn parent(&self) -> Option<Serial> {
        match *self {
            Placement::Ground => None,
            Placement::Equipped { mobile, .. } => Some(mobile),
            Placement::Contained { container } => Some(container),
        }
    }
}

/// Item-specific state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemData {
    /// Stack size
    pub amount: u16,

    /// Equip slot, set while worn
    pub layer: Option<Layer>,

    pub placement: Placement,

    /// Serials of items inside this one
    pub contents: Vec<Serial>,
}

/// Mobile-specific state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MobileData {
    pub facing: Direction,

    /// Worn items by layer
    pub equipment: BTreeMap<Layer, Serial>,
}

/// Kind-specific payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    Item(ItemData),
    Mobile(MobileData),
}

/// An addressable object in the world
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldObject {
    pub serial: Serial,

    /// Appearance id
    pub graphic: u16,

    /// Color variant
    pub hue: u16,

    /// Map position, or position inside the container for contained items
    pub location: Point3,

    pub kind: ObjectKind,
}

impl WorldObject {
    /// Create an object whose kind follows from the serial range
    pub fn new(serial: Serial, graphic: u16) -> Self {
        if serial.is_item() {
            Self::item(serial, graphic)
        } else {
            Self::mobile(serial, graphic)
        }
    }

    /// Create a ground item with an amount of 1
    pub fn item(serial: Serial, graphic: u16) -> Self {
        Self {
            serial,
            graphic,
            hue: 0,
            location: Point3::default(),
            kind: ObjectKind::Item(ItemData {
                amount: 1,
                ..ItemData::default()
            }),
        }
    }

    /// Create a mobile facing north with nothing equipped
    pub fn mobile(serial: Serial, graphic: u16) -> Self {
        Self {
            serial,
            graphic,
            hue: 0,
            location: Point3::default(),
            kind: ObjectKind::Mobile(MobileData::default()),
        }
    }

    pub fn with_location(mut self, location: Point3) -> Self {
        self.location = location;
        self
    }

    pub fn with_hue(mut self, hue: u16) -> Self {
        self.hue = hue;
        self
    }

    pub fn is_item(&self) -> bool {
        matches!(self.kind, ObjectKind::Item(_))
    }

    pub fn is_mobile(&self) -> bool {
        matches!(self.kind, ObjectKind::Mobile(_))
    }

    pub fn as_item(&self) -> Option<&ItemData> {
        match &self.kind {
            ObjectKind::Item(item) => Some(item),
            ObjectKind::Mobile(_) => None,
        }
    }

    pub fn as_item_mut(&mut self) -> Option<&mut ItemData> {
        match &mut self.kind {
            ObjectKind::Item(item) => Some(item),
            ObjectKind::Mobile(_) => None,
        }
    }

    pub fn as_mobile(&self) -> Option<&MobileData> {
        match &self.kind {
            ObjectKind::Mobile(mobile) => Some(mobile),
            ObjectKind::Item(_) => None,
        }
    }

    pub fn as_mobile_mut(&mut self) -> Option<&mut MobileData> {
        match &mut self.kind {
            ObjectKind::Mobile(mobile) => Some(mobile),
            ObjectKind::Item(_) => None,
        }
    }

    /// Placement of this object; mobiles are always on the ground
    pub fn placement(&self) -> Placement {
        match &self.kind {
            ObjectKind::Item(item) => item.placement,
            ObjectKind::Mobile(_) => Placement::Ground,
        }
    }

    /// Whether the object takes part in map range queries
    pub fn is_on_ground(&self) -> bool {
        self.placement() == Placement::Ground
    }

    /// Serials of the objects this one carries (equipment or contents)
    pub fn children(&self) -> Vec<Serial> {
        match &self.kind {
            ObjectKind::Item(item) => item.contents.clone(),
            ObjectKind::Mobile(mobile) => mobile.equipment.values().copied().collect(),
        }
    }
}
