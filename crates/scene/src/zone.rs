//! Zone-owning capability trait and the built-in owner types.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use zonespace_common::{mask, ObjectId, ZoneId, OUTSIDE_ZONE};
use zonespace_geom::Aabb;

use crate::object::SceneObject;

/// Capability trait for objects that own a contiguous range of zone ids.
///
/// Implemented only by zone-owning types; plain occupants never see these
/// calls. The registry talks to owners exclusively through this interface.
pub trait ZoneOwner: SceneObject {
    /// Called by the registry when a zone range is assigned (`Some`) or
    /// revoked (`None`).
    fn set_zone_range(&mut self, range: Option<(ZoneId, u32)>);

    fn zone_range(&self) -> Option<(ZoneId, u32)>;

    /// Append the subset of this owner's zones that `bounds` overlaps to
    /// `out`. Returns true when `bounds` also extends beyond everything this
    /// owner owns (the caller must keep walking outward).
    fn overlapping_zones(&self, bounds: &Aabb, out: &mut Vec<ZoneId>) -> bool;

    /// Which of this owner's zones contains `point`, if any.
    fn point_zone(&self, point: Vec3) -> Option<ZoneId>;

    /// Mark this owner's zones within `distance` of `point` in `flags`.
    /// Returns whether scoping should continue into the enclosing zone.
    fn scope_zones(&self, point: Vec3, distance: f32, flags: &mut [bool]) -> bool;
}

/// Record of one owner's contiguous zone id range, in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneRange {
    pub owner: ObjectId,
    pub start: ZoneId,
    pub count: u32,
}

impl ZoneRange {
    pub fn contains(&self, zone: ZoneId) -> bool {
        zone >= self.start && zone < self.start + self.count
    }
}

/// The always-present owner of zone 0. Everything not claimed by a nested
/// owner falls through to it; scoping from it never ascends further.
#[derive(Debug)]
pub struct SceneRoot {
    id: ObjectId,
    range: Option<(ZoneId, u32)>,
}

impl SceneRoot {
    pub fn new() -> Self {
        Self {
            id: ObjectId::new(),
            range: None,
        }
    }
}

impl Default for SceneRoot {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneObject for SceneRoot {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn type_mask(&self) -> u32 {
        mask::ZONE
    }

    fn world_bounds(&self) -> Aabb {
        Aabb::everything()
    }

    fn set_world_bounds(&mut self, _bounds: Aabb) {
        // The outside zone is unbounded.
    }

    fn as_zone_owner(&self) -> Option<&dyn ZoneOwner> {
        Some(self)
    }

    fn as_zone_owner_mut(&mut self) -> Option<&mut dyn ZoneOwner> {
        Some(self)
    }
}

impl ZoneOwner for SceneRoot {
    fn set_zone_range(&mut self, range: Option<(ZoneId, u32)>) {
        if let Some((start, count)) = range {
            assert_eq!(start, OUTSIDE_ZONE, "root must own zone 0");
            assert_eq!(count, 1, "root manages exactly one zone");
        }
        self.range = range;
    }

    fn zone_range(&self) -> Option<(ZoneId, u32)> {
        self.range
    }

    fn overlapping_zones(&self, _bounds: &Aabb, out: &mut Vec<ZoneId>) -> bool {
        out.push(OUTSIDE_ZONE);
        // Nothing lies outside the outside zone: the rezone walk stops here.
        false
    }

    fn point_zone(&self, _point: Vec3) -> Option<ZoneId> {
        Some(OUTSIDE_ZONE)
    }

    fn scope_zones(&self, _point: Vec3, _distance: f32, flags: &mut [bool]) -> bool {
        flags[OUTSIDE_ZONE as usize] = true;
        false
    }
}

/// A single-zone axis-aligned room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomZone {
    id: ObjectId,
    bounds: Aabb,
    range: Option<(ZoneId, u32)>,
}

impl RoomZone {
    pub fn new(bounds: Aabb) -> Self {
        Self {
            id: ObjectId::new(),
            bounds,
            range: None,
        }
    }

    pub fn zone(&self) -> Option<ZoneId> {
        self.range.map(|(start, _)| start)
    }
}

impl SceneObject for RoomZone {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn type_mask(&self) -> u32 {
        mask::ZONE
    }

    fn world_bounds(&self) -> Aabb {
        self.bounds
    }

    fn set_world_bounds(&mut self, bounds: Aabb) {
        self.bounds = bounds;
    }

    fn as_zone_owner(&self) -> Option<&dyn ZoneOwner> {
        Some(self)
    }

    fn as_zone_owner_mut(&mut self) -> Option<&mut dyn ZoneOwner> {
        Some(self)
    }
}

impl ZoneOwner for RoomZone {
    fn set_zone_range(&mut self, range: Option<(ZoneId, u32)>) {
        if let Some((_, count)) = range {
            assert_eq!(count, 1, "rooms own a single zone");
        }
        self.range = range;
    }

    fn zone_range(&self) -> Option<(ZoneId, u32)> {
        self.range
    }

    fn overlapping_zones(&self, bounds: &Aabb, out: &mut Vec<ZoneId>) -> bool {
        let Some(zone) = self.zone() else {
            return true;
        };
        if self.bounds.overlaps(bounds) {
            out.push(zone);
        }
        !self.bounds.contains_aabb(bounds)
    }

    fn point_zone(&self, point: Vec3) -> Option<ZoneId> {
        if self.bounds.contains_point(point) {
            self.zone()
        } else {
            None
        }
    }

    fn scope_zones(&self, point: Vec3, distance: f32, flags: &mut [bool]) -> bool {
        if let Some(zone) = self.zone() {
            if self.bounds.distance_to_point(point) <= distance {
                flags[zone as usize] = true;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(min: f32, max: f32) -> RoomZone {
        let mut r = RoomZone::new(Aabb::new(Vec3::splat(min), Vec3::splat(max)));
        r.set_zone_range(Some((1, 1)));
        r
    }

    #[test]
    fn root_always_reports_outside() {
        let root = SceneRoot::new();
        let mut out = Vec::new();
        let huge = Aabb::from_center_extents(Vec3::splat(1.0e6), Vec3::splat(1.0e5));
        assert!(!root.overlapping_zones(&huge, &mut out));
        assert_eq!(out, vec![OUTSIDE_ZONE]);
    }

    #[test]
    fn root_scope_marks_zone_zero_and_stops() {
        let root = SceneRoot::new();
        let mut flags = vec![false; 4];
        assert!(!root.scope_zones(Vec3::ZERO, 10.0, &mut flags));
        assert!(flags[0]);
    }

    #[test]
    fn room_overlap_reports_containment() {
        let r = room(0.0, 10.0);
        let inside = Aabb::new(Vec3::splat(2.0), Vec3::splat(3.0));
        let straddling = Aabb::new(Vec3::splat(8.0), Vec3::splat(12.0));

        let mut out = Vec::new();
        assert!(!r.overlapping_zones(&inside, &mut out));
        assert_eq!(out, vec![1]);

        out.clear();
        assert!(r.overlapping_zones(&straddling, &mut out));
        assert_eq!(out, vec![1]);
    }

    #[test]
    fn room_point_zone() {
        let r = room(0.0, 10.0);
        assert_eq!(r.point_zone(Vec3::splat(5.0)), Some(1));
        assert_eq!(r.point_zone(Vec3::splat(20.0)), None);
    }

    #[test]
    fn room_scope_respects_distance() {
        let r = room(0.0, 10.0);
        let mut flags = vec![false; 4];
        // Point 5 units from the box face, scope distance 2: no flag.
        assert!(r.scope_zones(Vec3::new(15.0, 5.0, 5.0), 2.0, &mut flags));
        assert!(!flags[1]);
        // Distance 6 reaches the box.
        assert!(r.scope_zones(Vec3::new(15.0, 5.0, 5.0), 6.0, &mut flags));
        assert!(flags[1]);
    }

    #[test]
    fn zone_range_round_trip() {
        let mut r = RoomZone::new(Aabb::new(Vec3::ZERO, Vec3::ONE));
        assert_eq!(r.zone(), None);
        r.set_zone_range(Some((7, 1)));
        assert_eq!(r.zone(), Some(7));
        r.set_zone_range(None);
        assert_eq!(r.zone(), None);
    }
}
