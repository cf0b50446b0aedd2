//! # Object Registry
//!
//! All world objects the client currently knows about, keyed by serial.
//!
//! # Spatial Index
//!
//! Objects on the ground (loose items and all mobiles) are bucketed into
//! 8×8-tile grid cells so range queries only visit nearby cells. Equipped and
//! contained items are not indexed: their `location` is not a map position.
//!
//! # Invariants
//!
//! - One entry per serial
//! - An item is in exactly one place: on the ground, worn by one mobile, or
//!   inside one container; the parent's equipment/contents list agrees with
//!   the item's placement
//! - Removing an object removes everything it carries

use crate::object::{ObjectKind, Placement, WorldObject};
use shard_core::{Layer, Point2, Serial};
use std::collections::{HashMap, HashSet};

/// Edge length of a grid cell in tiles
const CELL_SIZE: u16 = 8;

type Cell = (u16, u16);

fn cell_of(point: Point2) -> Cell {
    (point.x / CELL_SIZE, point.y / CELL_SIZE)
}

/// Registry of known world objects
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    objects: HashMap<Serial, WorldObject>,
    grid: HashMap<Cell, HashSet<Serial>>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, serial: Serial) -> bool {
        self.objects.contains_key(&serial)
    }

    pub fn get(&self, serial: Serial) -> Option<&WorldObject> {
        self.objects.get(&serial)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorldObject> {
        self.objects.values()
    }

    /// Insert an object or replace the entry with the same serial
    ///
    /// When the placement changes, the object is unlinked from its previous
    /// parent and linked to the new one (if that parent is known). A replaced
    /// entry keeps what it was carrying; equipment and contents are only
    /// changed through [`equip`](Self::equip) and
    /// [`put_in_container`](Self::put_in_container).
    pub fn upsert(&mut self, mut object: WorldObject) {
        let serial = object.serial;
        let new_placement = object.placement();
        let mut orphans = Vec::new();

        if let Some(old) = self.objects.remove(&serial) {
            self.unindex(&old);
            if old.placement() != new_placement {
                self.unlink(serial, old.placement());
            }
            match (&mut object.kind, old.kind) {
                (ObjectKind::Item(new), ObjectKind::Item(old)) => new.contents = old.contents,
                (ObjectKind::Mobile(new), ObjectKind::Mobile(old)) => new.equipment = old.equipment,
                (_, ObjectKind::Item(old)) => orphans = old.contents,
                (_, ObjectKind::Mobile(old)) => orphans = old.equipment.into_values().collect(),
            }
        }

        self.index(&object);
        self.objects.insert(serial, object);
        self.link(serial, new_placement);

        for orphan in orphans {
            self.remove(orphan);
        }
    }

    /// Apply `f` to an object in place, keeping the index and links current
    ///
    /// # Returns
    /// The closure's result, or `None` if the serial is unknown.
    pub fn update<R>(&mut self, serial: Serial, f: impl FnOnce(&mut WorldObject) -> R) -> Option<R> {
        let mut object = self.objects.remove(&serial)?;
        self.unindex(&object);
        let old_placement = object.placement();

        let result = f(&mut object);
        // The serial is the key; it cannot change under us
        object.serial = serial;

        let new_placement = object.placement();
        if old_placement != new_placement {
            self.unlink(serial, old_placement);
        }
        self.index(&object);
        self.objects.insert(serial, object);
        if old_placement != new_placement {
            self.link(serial, new_placement);
        }
        Some(result)
    }

    /// Remove an object together with everything it carries
    ///
    /// # Returns
    /// The removed object itself, or `None` if the serial is unknown.
    pub fn remove(&mut self, serial: Serial) -> Option<WorldObject> {
        let mut removed = Vec::new();
        let object = self.remove_tree(serial, &mut removed)?;
        if removed.len() > 1 {
            tracing::trace!("Removed {} with {} carried objects", serial, removed.len() - 1);
        }
        Some(object)
    }

    /// Forget every object
    pub fn clear(&mut self) {
        self.objects.clear();
        self.grid.clear();
    }

    /// Ground objects within `range` tiles (Chebyshev) of `point`
    pub fn objects_within(&self, point: Point2, range: u32) -> Vec<&WorldObject> {
        let reach = range.min(u16::MAX as u32) as u16;
        let low = cell_of(Point2::new(point.x.saturating_sub(reach), point.y.saturating_sub(reach)));
        let high = cell_of(Point2::new(point.x.saturating_add(reach), point.y.saturating_add(reach)));

        let mut found = Vec::new();
        for cx in low.0..=high.0 {
            for cy in low.1..=high.1 {
                let Some(cell) = self.grid.get(&(cx, cy)) else {
                    continue;
                };
                found.extend(
                    cell.iter()
                        .filter_map(|serial| self.objects.get(serial))
                        .filter(|object| object.location.to_2d().in_range(point, range)),
                );
            }
        }
        found
    }

    /// Ground objects standing exactly on `point`
    pub fn objects_at(&self, point: Point2) -> Vec<&WorldObject> {
        self.objects_within(point, 0)
    }

    /// Evict every ground object farther than `range` from `origin`
    ///
    /// Objects carried by an evicted object go with it.
    ///
    /// # Returns
    /// Serials of all removed objects, carried ones included.
    pub fn remove_farther(&mut self, origin: Point2, range: u32) -> Vec<Serial> {
        let distant: Vec<Serial> = self
            .objects
            .values()
            .filter(|object| object.is_on_ground())
            .filter(|object| !object.location.to_2d().in_range(origin, range))
            .map(|object| object.serial)
            .collect();

        let mut removed = Vec::new();
        for serial in distant {
            // May already be gone as part of an earlier tree
            self.remove_tree(serial, &mut removed);
        }
        if !removed.is_empty() {
            tracing::debug!("Evicted {} objects beyond range {} of {:?}", removed.len(), range, origin);
        }
        removed
    }

    /// Put `item` on `mobile`'s `layer`
    ///
    /// Any entry for the item is taken out of its current place first; items
    /// it contained stay with it. Whatever the mobile wore on that layer
    /// before is removed.
    ///
    /// # Returns
    /// `false` without changes if `item` is not an item or its serial lies
    /// in the mobile range. `false` if the mobile is unknown; the item's old
    /// entry, and anything it carried, is forgotten in that case.
    pub fn equip(&mut self, mut item: WorldObject, mobile: Serial, layer: Layer) -> bool {
        if !item.is_item() || !item.serial.is_item() {
            return false;
        }
        let previous = match self.objects.get(&mobile).and_then(WorldObject::as_mobile) {
            Some(data) => data.equipment.get(&layer).copied(),
            None => {
                self.remove(item.serial);
                return false;
            }
        };

        let carried = self.detach(item.serial);
        if let Some(previous) = previous.filter(|&p| p != item.serial) {
            self.remove(previous);
        }

        let Some(data) = item.as_item_mut() else {
            return false;
        };
        data.layer = Some(layer);
        data.placement = Placement::Equipped { mobile, layer };
        data.contents = carried;
        self.upsert(item);
        true
    }

    /// Put `item` inside `container`
    ///
    /// # Returns
    /// `false`, leaving the registry untouched, if `item` is not an item or
    /// has a mobile serial, or if the container is unknown, is not an item,
    /// or is the item itself or something inside it.
    pub fn put_in_container(&mut self, mut item: WorldObject, container: Serial) -> bool {
        if !item.is_item() || !item.serial.is_item() {
            return false;
        }
        match self.objects.get(&container) {
            Some(target) if target.is_item() => {}
            _ => return false,
        }
        if self.is_within(container, item.serial) {
            return false;
        }

        let carried = self.detach(item.serial);
        let Some(data) = item.as_item_mut() else {
            return false;
        };
        data.layer = None;
        data.placement = Placement::Contained { container };
        data.contents = carried;
        self.upsert(item);
        true
    }

    /// Whether `serial` is `ancestor` or is carried by it, directly or not
    fn is_within(&self, serial: Serial, ancestor: Serial) -> bool {
        let mut current = Some(serial);
        let mut steps = 0;
        while let Some(s) = current {
            if s == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.objects.len() {
                break;
            }
            current = self.objects.get(&s).and_then(|o| o.placement().parent());
        }
        false
    }

    /// Take an entry out without removing what it carries
    ///
    /// # Returns
    /// The serials it carried, empty for unknown serials and mobiles.
    fn detach(&mut self, serial: Serial) -> Vec<Serial> {
        let Some(old) = self.objects.remove(&serial) else {
            return Vec::new();
        };
        self.unindex(&old);
        self.unlink(serial, old.placement());
        old.as_item().map(|item| item.contents.clone()).unwrap_or_default()
    }

    fn remove_tree(&mut self, serial: Serial, removed: &mut Vec<Serial>) -> Option<WorldObject> {
        let object = self.objects.remove(&serial)?;
        self.unindex(&object);
        self.unlink(serial, object.placement());
        removed.push(serial);

        for child in object.children() {
            self.remove_tree(child, removed);
        }
        Some(object)
    }

    fn index(&mut self, object: &WorldObject) {
        if object.is_on_ground() {
            self.grid
                .entry(cell_of(object.location.to_2d()))
                .or_default()
                .insert(object.serial);
        }
    }

    fn unindex(&mut self, object: &WorldObject) {
        if !object.is_on_ground() {
            return;
        }
        let cell = cell_of(object.location.to_2d());
        if let Some(bucket) = self.grid.get_mut(&cell) {
            bucket.remove(&object.serial);
            if bucket.is_empty() {
                self.grid.remove(&cell);
            }
        }
    }

    fn link(&mut self, serial: Serial, placement: Placement) {
        match placement {
            Placement::Ground => {}
            Placement::Equipped { mobile, layer } => {
                if let Some(data) = self.objects.get_mut(&mobile).and_then(WorldObject::as_mobile_mut) {
                    data.equipment.insert(layer, serial);
                }
            }
            Placement::Contained { container } => {
                if let Some(data) = self.objects.get_mut(&container).and_then(WorldObject::as_item_mut) {
                    if !data.contents.contains(&serial) {
                        data.contents.push(serial);
                    }
                }
            }
        }
    }

    fn unlink(&mut self, serial: Serial, placement: Placement) {
        match placement {
            Placement::Ground => {}
            Placement::Equipped { mobile, layer } => {
                if let Some(data) = self.objects.get_mut(&mobile).and_then(WorldObject::as_mobile_mut) {
                    if data.equipment.get(&layer) == Some(&serial) {
                        data.equipment.remove(&layer);
                    }
                }
            }
            Placement::Contained { container } => {
                if let Some(data) = self.objects.get_mut(&container).and_then(WorldObject::as_item_mut) {
                    data.contents.retain(|&s| s != serial);
                }
            }
        }
    }
}
