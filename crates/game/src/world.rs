//! # World Data
//!
//! Static map data (terrain, buildings, decorations) and the walkability
//! rules that go with it live outside this crate. [`WorldData`] is the seam
//! the game state calls through; [`FlatWorld`] is a minimal stand-in.

use crate::object::WorldObject;
use shard_core::{Direction, Point2, Point3};
use std::collections::HashMap;

/// A fixed map decoration, or a dynamic item described the same way
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticObject {
    pub graphic: u16,
    pub location: Point3,
    pub hue: u16,

    /// Height of the object's top above its own elevation
    pub height: u8,
}

impl StaticObject {
    /// Describe a dynamic item as an obstacle
    pub fn from_object(object: &WorldObject) -> Self {
        Self {
            graphic: object.graphic,
            location: object.location,
            hue: object.hue,
            height: 0,
        }
    }

    /// Elevation of the top surface
    pub fn top(&self) -> i16 {
        self.location.z as i16 + self.height as i16
    }
}

/// What stands on a tile: a tracked object or a static decoration
#[derive(Debug, Clone, PartialEq)]
pub enum MapObject<'a> {
    Dynamic(&'a WorldObject),
    Static(StaticObject),
}

/// Provider of static world data
pub trait WorldData {
    /// Static decorations on a tile
    fn statics_at(&self, point: Point2) -> Vec<StaticObject>;

    /// Where a step from `origin` in `direction` lands
    ///
    /// `obstacles` lists everything standing on a tile, combining this
    /// provider's statics with the client's own dynamic items.
    ///
    /// # Returns
    /// `None` when the step is not possible.
    fn elevated_destination(
        &self,
        origin: Point3,
        direction: Direction,
        obstacles: &dyn Fn(Point2) -> Vec<StaticObject>,
    ) -> Option<Point3>;
}

/// A bounded, flat map with optional placed statics
///
/// Walking keeps the current elevation. An obstacle whose top is within
/// [`FlatWorld::CLIMB_HEIGHT`] of the walker's feet is stepped onto; a
/// taller one blocks the tile.
#[derive(Debug, Clone)]
pub struct FlatWorld {
    width: u16,
    height: u16,
    statics: HashMap<Point2, Vec<StaticObject>>,
}

impl FlatWorld {
    /// Largest elevation difference a single step can climb
    pub const CLIMB_HEIGHT: i16 = 2;

    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            statics: HashMap::new(),
        }
    }

    /// Place a static decoration
    pub fn with_static(mut self, object: StaticObject) -> Self {
        self.statics.entry(object.location.to_2d()).or_default().push(object);
        self
    }

    fn contains(&self, point: Point2) -> bool {
        point.x < self.width && point.y < self.height
    }
}

impl Default for FlatWorld {
    fn default() -> Self {
        Self::new(1024, 1024)
    }
}

impl WorldData for FlatWorld {
    fn statics_at(&self, point: Point2) -> Vec<StaticObject> {
        self.statics.get(&point).cloned().unwrap_or_default()
    }

    fn elevated_destination(
        &self,
        origin: Point3,
        direction: Direction,
        obstacles: &dyn Fn(Point2) -> Vec<StaticObject>,
    ) -> Option<Point3> {
        let target = origin.to_2d().step(direction)?;
        if !self.contains(target) {
            return None;
        }

        let feet = origin.z as i16;
        let mut z = feet;
        for obstacle in obstacles(target) {
            let top = obstacle.top();
            if top <= feet {
                continue;
            }
            if top - feet > Self::CLIMB_HEIGHT {
                return None;
            }
            z = z.max(top);
        }

        let z = i8::try_from(z).ok()?;
        Some(Point3::new(target.x, target.y, z))
    }
}
