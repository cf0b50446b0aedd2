//! Position and orientation types for world objects

use serde::{Deserialize, Serialize};
use std::fmt;

/// Map tile position without elevation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point2 {
    pub x: u16,
    pub y: u16,
}

impl Point2 {
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Chebyshev (king-move) distance, the metric used for visibility
    pub fn distance_to(self, other: Point2) -> u32 {
        let dx = (self.x as i32 - other.x as i32).unsigned_abs();
        let dy = (self.y as i32 - other.y as i32).unsigned_abs();
        dx.max(dy)
    }

    /// Whether `other` lies within `range` tiles of this point
    pub fn in_range(self, other: Point2, range: u32) -> bool {
        self.distance_to(other) <= range
    }

    /// Step one tile in `direction`
    ///
    /// Returns `None` when the step would leave the `u16` coordinate space.
    pub fn step(self, direction: Direction) -> Option<Point2> {
        let (dx, dy) = direction.offset();
        let x = u16::try_from(self.x as i32 + dx).ok()?;
        let y = u16::try_from(self.y as i32 + dy).ok()?;
        Some(Point2 { x, y })
    }
}

/// Tile position with elevation
///
/// # Wire Format
/// `x` and `y` travel as big-endian `u16`, `z` as a signed byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: u16,
    pub y: u16,
    pub z: i8,
}

impl Point3 {
    pub const fn new(x: u16, y: u16, z: i8) -> Self {
        Self { x, y, z }
    }

    /// Drop the elevation
    pub const fn to_2d(self) -> Point2 {
        Point2 { x: self.x, y: self.y }
    }

    /// Chebyshev distance on the map plane, elevation ignored
    pub fn distance_to(self, other: Point3) -> u32 {
        self.to_2d().distance_to(other.to_2d())
    }
}

impl From<Point3> for Point2 {
    fn from(point: Point3) -> Self {
        point.to_2d()
    }
}

impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// One of the eight compass directions a mobile can face
///
/// The discriminants are the wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    #[default]
    North = 0,
    NorthEast = 1,
    East = 2,
    SouthEast = 3,
    South = 4,
    SouthWest = 5,
    West = 6,
    NorthWest = 7,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// Decode a facing byte
    ///
    /// Only the low three bits carry the direction; higher bits are flags
    /// (e.g. running) and are ignored here.
    pub const fn from_wire(value: u8) -> Self {
        Self::ALL[(value & 0x07) as usize]
    }

    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Unit step `(dx, dy)` for this direction, y grows southwards
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::NorthEast => (1, -1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::South => (0, 1),
            Direction::SouthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, -1),
        }
    }
}
